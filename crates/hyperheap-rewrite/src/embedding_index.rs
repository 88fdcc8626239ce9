use hyperheap_graph::{HeapConfiguration, Index, IndexSymbol, Morphism, Nonterminal};

use crate::index_matcher::{IndexMatcher, Symbols};

/// Index rewriting that makes an embedding of an indexed rule valid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbeddingIndexMatch {
    /// Abstract symbols of the target heap to unfold before folding,
    /// as `(symbol, replacement)` pairs with distinct symbols.
    pub materializations: Vec<(IndexSymbol, Symbols)>,
    /// The rule's left-hand side with its index variable instantiated.
    pub lhs: Nonterminal,
}

/// Checks that the indices along an embedding of a rule's right-hand side
/// fit the indices of the target heap.
pub struct EmbeddingIndexChecker<'a> {
    matcher: &'a IndexMatcher,
}

impl<'a> EmbeddingIndexChecker<'a> {
    pub fn new(matcher: &'a IndexMatcher) -> Self {
        Self { matcher }
    }

    /// `morphism` embeds `pattern` (a right-hand side of `lhs`) into `target`
    /// with labels compared up to their index.
    pub fn check(
        &self,
        morphism: &Morphism,
        pattern: &HeapConfiguration,
        target: &HeapConfiguration,
        lhs: &Nonterminal,
    ) -> Option<EmbeddingIndexMatch> {
        let mut materializations: Vec<(IndexSymbol, Symbols)> = Vec::new();
        let mut instantiation: Option<Symbols> = None;

        for edge in pattern.edges() {
            let image = morphism.edge_image(edge)?;
            let (Some(pattern_index), Some(target_index)) =
                (pattern.label_of(edge).index(), target.label_of(image).index())
            else {
                continue;
            };
            let target_index = apply(&materializations, target_index)?;
            let pattern_index = instantiate(pattern_index, instantiation.as_deref())?;
            let found = self.matcher.compute_match(&target_index, &pattern_index)?;

            if found.needs_materialization() {
                let symbol = target_index.last()?;
                add_materialization(
                    &mut materializations,
                    instantiation.as_mut(),
                    symbol,
                    &found.materialization,
                );
            }
            if !found.instantiation.is_empty() {
                match &instantiation {
                    None => instantiation = Some(found.instantiation),
                    Some(existing) if *existing != found.instantiation => return None,
                    Some(_) => {}
                }
            }
        }

        for edge in pattern.edges() {
            let image = morphism.edge_image(edge)?;
            let (Some(pattern_index), Some(target_index)) =
                (pattern.label_of(edge).index(), target.label_of(image).index())
            else {
                continue;
            };
            let expected = instantiate(pattern_index, instantiation.as_deref())?;
            if expected.ends_with(IndexSymbol::Variable) || apply(&materializations, target_index)? != expected {
                return None;
            }
        }

        let lhs = match lhs.index() {
            Some(index) if index.ends_with(IndexSymbol::Variable) => {
                lhs.with_index(index.prolonged(instantiation.as_deref()?).ok()?)
            }
            _ => lhs.clone(),
        };
        Some(EmbeddingIndexMatch {
            materializations,
            lhs,
        })
    }
}

/// Index after applying the pending materializations.
fn apply(materializations: &[(IndexSymbol, Symbols)], index: &Index) -> Option<Index> {
    match materializations.iter().find(|(symbol, _)| index.ends_with(*symbol)) {
        Some((_, replacement)) => index.prolonged(replacement).ok(),
        None => Some(index.clone()),
    }
}

/// Rule index with its trailing variable replaced, if already known.
fn instantiate(index: &Index, instantiation: Option<&[IndexSymbol]>) -> Option<Index> {
    match instantiation {
        Some(suffix) if index.ends_with(IndexSymbol::Variable) => index.prolonged(suffix).ok(),
        _ => Some(index.clone()),
    }
}

fn add_materialization(
    materializations: &mut Vec<(IndexSymbol, Symbols)>,
    instantiation: Option<&mut Symbols>,
    symbol: IndexSymbol,
    replacement: &[IndexSymbol],
) {
    let substitute = |symbols: &mut Symbols| {
        if symbols.last() == Some(&symbol) {
            symbols.pop();
            symbols.extend_from_slice(replacement);
        }
    };
    let mut known = false;
    for (key, existing) in materializations.iter_mut() {
        substitute(existing);
        known |= *key == symbol;
    }
    if let Some(instantiation) = instantiation {
        substitute(instantiation);
    }
    if !known {
        materializations.push((symbol, replacement.iter().copied().collect()));
    }
}
