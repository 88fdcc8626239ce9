use super::id::{Id, Identifier};

/// Dense storage addressed by typed ids.
///
/// Removing an entry leaves an empty slot behind, so ids of the remaining
/// entries stay valid until [`Arena::compact`] renumbers them.
#[derive(Debug, Clone)]
pub struct Arena<I: Identifier, T> {
    slots: Vec<Option<T>>,
    live: usize,
    marker: std::marker::PhantomData<I>,
}

impl<I: Identifier, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
            marker: std::marker::PhantomData,
        }
    }
}

impl<I: Identifier, T> Arena<I, T> {
    pub fn next_id(&self) -> I {
        I::from(Id(self.slots.len()))
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Whether an entry was removed since the last compaction.
    pub fn has_tombstones(&self) -> bool {
        self.live != self.slots.len()
    }

    pub fn alloc(&mut self, value: T) -> I {
        let id = self.next_id();
        self.slots.push(Some(value));
        self.live += 1;
        id
    }

    pub fn get(&self, id: I) -> Option<&T> {
        self.slots.get(slot(id)).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        self.slots.get_mut(slot(id)).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: I) -> bool {
        self.get(id).is_some()
    }

    /// Remove an entry, returning it if it was live.
    pub fn delete(&mut self, id: I) -> Option<T> {
        let removed = self.slots.get_mut(slot(id))?.take();
        if removed.is_some() {
            self.live -= 1;
        }
        removed
    }

    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(raw, slot)| slot.as_ref().map(|value| (I::from(Id(raw)), value)))
    }

    pub fn ids(&self) -> impl Iterator<Item = I> + '_ {
        self.iter().map(|(id, _)| id)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (I, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(raw, slot)| slot.as_mut().map(|value| (I::from(Id(raw)), value)))
    }

    /// Drop empty slots and return the old-to-new id mapping, indexed by old
    /// raw id.
    pub fn compact(&mut self) -> Vec<Option<I>> {
        let mut next = 0;
        let mapping = self
            .slots
            .iter()
            .map(|slot| {
                slot.as_ref().map(|_| {
                    next += 1;
                    I::from(Id(next - 1))
                })
            })
            .collect();
        self.slots.retain(Option::is_some);
        mapping
    }
}

fn slot<I: Identifier>(id: I) -> usize {
    Into::<Id>::into(id).raw()
}

impl<T, I: Identifier> std::ops::Index<I> for Arena<I, T> {
    type Output = T;

    fn index(&self, index: I) -> &Self::Output {
        match self.get(index) {
            Some(value) => value,
            None => panic!("no live entry for {index:?} in arena"),
        }
    }
}

impl<T, I: Identifier> std::ops::IndexMut<I> for Arena<I, T> {
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        match self.get_mut(index) {
            Some(value) => value,
            None => panic!("no live entry for {index:?} in arena"),
        }
    }
}
