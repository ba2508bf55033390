//! Resolution of `base` inheritance between top-level cases.

use crate::types::{BuildError, CaseSpec, Document, Params, VariationNode};
use std::collections::HashMap;

/// The contribution of one document entry to a resolved case.
///
/// A case inheriting through `base` carries one layer per entry of its base
/// chain, outermost ancestor first. Each layer's variation tree is an
/// independent dimension of the final expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// The document entry that declared this layer.
    pub origin: String,
    pub harness: Option<String>,
    pub params: Params,
    pub variations: Vec<VariationNode>,
}

impl Layer {
    fn declared_by(origin: &str, spec: &CaseSpec) -> Self {
        Self {
            origin: origin.to_string(),
            harness: spec.harness.clone(),
            params: spec.params.clone(),
            variations: spec.variations.clone(),
        }
    }

    /// Copy of this layer without the params keys `shadowing` re-declares.
    fn shadowed_by(&self, shadowing: &Params) -> Self {
        let mut layer = self.clone();
        layer.params.retain(|key, _| !shadowing.contains_key(key));
        layer
    }
}

/// A case with its whole base chain inlined.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSpec {
    pub name: String,
    /// As declared by this entry; never inherited.
    pub is_abstract: bool,
    pub layers: Vec<Layer>,
}

impl ResolvedSpec {
    fn root(name: &str, spec: &CaseSpec) -> Self {
        Self {
            name: name.to_string(),
            is_abstract: spec.is_abstract,
            layers: vec![Layer::declared_by(name, spec)],
        }
    }

    fn inherit(&self, name: &str, spec: &CaseSpec) -> Self {
        let mut layers: Vec<Layer> = self
            .layers
            .iter()
            .map(|layer| layer.shadowed_by(&spec.params))
            .collect();
        layers.push(Layer::declared_by(name, spec));

        Self {
            name: name.to_string(),
            is_abstract: spec.is_abstract,
            layers,
        }
    }

    /// Variation trees to combine, outermost (base-most) first.
    pub fn dimensions(&self) -> impl Iterator<Item = &[VariationNode]> {
        self.layers
            .iter()
            .filter(|layer| !layer.variations.is_empty())
            .map(|layer| layer.variations.as_slice())
    }
}

/// Resolve every entry of `document` against its base chain.
///
/// Entries are merged in dependency order, so each base is fully resolved
/// before anything inherits from it. The result follows document order.
///
/// # Errors
/// Returns `BuildError::MissingBase` when a `base` names no entry and
/// `BuildError::CyclicBase` when a chain loops back on itself.
pub fn resolve(document: &Document) -> Result<Vec<ResolvedSpec>, BuildError> {
    let index: HashMap<&str, &CaseSpec> = document.iter().collect();
    let mut resolved: HashMap<&str, ResolvedSpec> = HashMap::with_capacity(index.len());

    for (name, spec) in document.iter() {
        if resolved.contains_key(name) {
            continue;
        }

        // Walk up the base chain until a resolved entry or a root.
        let mut chain: Vec<(&str, &CaseSpec)> = vec![(name, spec)];
        while let Some(&(current, current_spec)) = chain.last() {
            let Some(base) = current_spec.base.as_deref() else {
                break;
            };
            if resolved.contains_key(base) {
                break;
            }
            if let Some(start) = chain.iter().position(|(n, _)| *n == base) {
                let mut cycle: Vec<String> =
                    chain[start..].iter().map(|(n, _)| (*n).to_string()).collect();
                cycle.push(base.to_string());
                return Err(BuildError::CyclicBase { cycle });
            }
            let base_spec = index
                .get(base)
                .copied()
                .ok_or_else(|| BuildError::MissingBase {
                    name: current.to_string(),
                    referenced: base.to_string(),
                })?;
            chain.push((base, base_spec));
        }

        for (current, current_spec) in chain.into_iter().rev() {
            let merged = match current_spec.base.as_deref() {
                None => ResolvedSpec::root(current, current_spec),
                Some(base) => resolved
                    .get(base)
                    .ok_or_else(|| BuildError::MissingBase {
                        name: current.to_string(),
                        referenced: base.to_string(),
                    })?
                    .inherit(current, current_spec),
            };
            resolved.insert(current, merged);
        }
    }

    Ok(document
        .iter()
        .filter_map(|(name, _)| resolved.remove(name))
        .collect())
}
