use rustc_hash::FxHashMap;

pub trait InternKey:
    From<usize> + Into<usize> + Clone + Copy + PartialEq + Eq + std::hash::Hash
{
}

impl InternKey for usize {}

/// Declare a copyable key type for an [`InternTable`].
#[macro_export(local_inner_macros)]
macro_rules! intern_key {
    ($(#[$attr:meta])* struct $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub(crate) usize);

        impl From<usize> for $name {
            fn from(value: usize) -> Self {
                Self(value)
            }
        }

        impl From<$name> for usize {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl crate::intern::InternKey for $name {}
    };
}

/// Deduplicating table handing out dense keys in insertion order.
#[derive(Clone, Debug)]
pub struct InternTable<T: Clone + Eq + std::hash::Hash, Key: InternKey = usize> {
    entries: Vec<T>,
    lookup: FxHashMap<T, Key>,
}

impl<T, K> Default for InternTable<T, K>
where
    T: Clone + Eq + std::hash::Hash,
    K: InternKey,
{
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            lookup: FxHashMap::default(),
        }
    }
}

impl<T: Clone + Eq + std::hash::Hash, Key: InternKey> InternTable<T, Key> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, value: T) -> Key {
        if let Some(&key) = self.lookup.get(&value) {
            return key;
        }
        let key = Key::from(self.entries.len());
        self.entries.push(value.clone());
        self.lookup.insert(value, key);
        key
    }

    /// Look up an already interned item without inserting it.
    pub fn get<Q>(&self, value: &Q) -> Option<Key>
    where
        T: std::borrow::Borrow<Q>,
        Q: std::hash::Hash + Eq + ?Sized,
    {
        self.lookup.get(value).copied()
    }

    pub fn resolve(&self, key: Key) -> Option<&T> {
        self.entries.get(key.into())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
