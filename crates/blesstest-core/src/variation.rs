//! Expansion of variation trees into leaves.
//!
//! Every node merges its params over what it inherited, expands its own
//! bracket keys, and then either emits a leaf per bracket variant or recurses
//! into its child variations. Leaves come out strictly in declaration order.

use crate::bracket::{
    BracketVariant, expand_brackets, has_bracket_keys, is_bracket_key, label_value,
};
use crate::resolver::{Layer, ResolvedSpec};
use crate::types::{BuildError, Params, VariationNode};

/// What a path step contributes to the case name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// An explicit `name`, used verbatim.
    Named(String),
    /// `(param, value)` pairs the step set. Empty means no name segment.
    Changes(Vec<(String, String)>),
}

/// A fully expanded branch, before naming.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub segments: Vec<Segment>,
    pub harness: Option<String>,
    pub params: Params,
    /// Location of the branch in the document, for error reports.
    pub path: String,
}

impl Leaf {
    /// The empty starting point for a case.
    #[must_use]
    pub fn root(path: impl Into<String>) -> Self {
        Self {
            segments: Vec::new(),
            harness: None,
            params: Params::new(),
            path: path.into(),
        }
    }
}

/// A node of the expansion: either a case layer or a variation.
struct Node<'a> {
    name: Option<&'a str>,
    harness: Option<&'a str>,
    params: &'a Params,
    variations: &'a [VariationNode],
    path: String,
    /// Variation nodes name their static params; case layers do not.
    names_static_params: bool,
}

impl<'a> Node<'a> {
    fn layer(layer: &'a Layer, path: String) -> Self {
        Self {
            name: None,
            harness: layer.harness.as_deref(),
            params: &layer.params,
            variations: &layer.variations,
            path,
            names_static_params: false,
        }
    }

    fn variation(node: &'a VariationNode, path: String) -> Self {
        Self {
            name: node.name.as_deref(),
            harness: node.harness.as_deref(),
            params: &node.params,
            variations: &node.variations,
            path,
            names_static_params: true,
        }
    }

    fn segment(&self, variant: &BracketVariant) -> Segment {
        if let Some(name) = self.name {
            return Segment::Named(name.to_string());
        }
        let mut changes = variant.label.clone();
        if self.names_static_params {
            for (key, value) in self.params {
                if is_bracket_key(key) || changes.iter().any(|(bound, _)| bound == key) {
                    continue;
                }
                changes.push((key.clone(), label_value(value)));
            }
        }
        Segment::Changes(changes)
    }
}

/// Expand a resolved case into its leaves.
///
/// Each layer of the base chain is expanded under every leaf of the layer
/// before it, so the base-most variation tree is the outermost dimension.
///
/// # Errors
/// Returns `BuildError::ConflictingVariationSyntax` or
/// `BuildError::MalformedBracketKey` from any node of any layer.
pub fn expand_spec(spec: &ResolvedSpec) -> Result<Vec<Leaf>, BuildError> {
    let mut leaves = vec![Leaf::root(spec.name.clone())];
    let multi_layer = spec.layers.len() > 1;

    for (depth, layer) in spec.layers.iter().enumerate() {
        let step = if multi_layer && layer.origin != spec.name {
            format!("{}({})", spec.name, layer.origin)
        } else {
            spec.name.clone()
        };

        let mut next = Vec::with_capacity(leaves.len());
        for leaf in &leaves {
            let path = if depth == 0 {
                step.clone()
            } else {
                format!("{} > {step}", leaf.path)
            };
            expand_node(&Node::layer(layer, path), leaf, &mut next)?;
        }
        leaves = next;
    }

    Ok(leaves)
}

fn expand_node(node: &Node<'_>, inherited: &Leaf, out: &mut Vec<Leaf>) -> Result<(), BuildError> {
    if !node.variations.is_empty() && has_bracket_keys(node.params) {
        return Err(BuildError::ConflictingVariationSyntax {
            path: node.path.clone(),
        });
    }

    let harness = node
        .harness
        .map(str::to_string)
        .or_else(|| inherited.harness.clone());

    let mut merged = inherited.params.clone();
    for (key, value) in node.params {
        merged.insert(key.clone(), value.clone());
    }

    let variants = expand_brackets(&merged, &node.path)?;
    let several = variants.len() > 1;

    for (index, variant) in variants.into_iter().enumerate() {
        let mut segments = inherited.segments.clone();
        segments.push(node.segment(&variant));
        let branch = Leaf {
            segments,
            harness: harness.clone(),
            params: variant.params,
            path: if several {
                format!("{}#{index}", node.path)
            } else {
                node.path.clone()
            },
        };

        if node.variations.is_empty() {
            out.push(branch);
            continue;
        }
        for (position, child) in node.variations.iter().enumerate() {
            let path = format!("{}.variations[{position}]", branch.path);
            expand_node(&Node::variation(child, path), &branch, out)?;
        }
    }

    Ok(())
}
