// Copyright 2026 the Aura Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Highlight declarations and mode resolution.
//!
//! Every node carries a [`HighlightSpec`] describing what visual (if any)
//! should represent its focus highlight, plus an optional [`GroupHighlight`]
//! opt-in consulted for its descendants. [`resolve`] is the pure decision
//! function mapping a declaration and the node's local bounds into one of
//! four closed [`ResolvedHighlight`] variants. Keeping the set closed as an
//! exhaustive match means adding a fifth representation is a compile-checked
//! change, not a scattered `if`-chain edit.

use kurbo::{BezPath, Rect, RoundedRect};

use crate::scene::NodeId;
use crate::trail::Trail;

/// Geometry supplied directly by a highlight declaration.
#[derive(Clone, Debug, PartialEq)]
pub enum HighlightShape {
    /// An axis-aligned rectangle.
    Rect(Rect),
    /// A rectangle with rounded corners.
    RoundedRect(RoundedRect),
    /// An arbitrary path.
    Path(BezPath),
}

/// A node's declaration of how its focus highlight should look.
///
/// Owned by the application; the overlay only reads and observes it.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum HighlightSpec {
    /// No declaration — a rectangle is generated from the node's local
    /// bounds and regenerated whenever those bounds change.
    #[default]
    Default,
    /// Focus is tracked but nothing is drawn.
    Invisible,
    /// The declaration supplies its own geometry, stroked with theme colors.
    Shape(HighlightShape),
    /// A caller-supplied node is the visual.
    Node {
        /// The node to show while the highlight is active.
        node: NodeId,
        /// When `true` the application has already placed `node` in the
        /// scene; the overlay only toggles its visibility and never
        /// reparents it. When `false` the overlay parents `node` under its
        /// own highlight root for the duration of activation.
        layered: bool,
        /// Track this other trail's transform instead of the focused one.
        /// Must share the focused trail's scene root.
        transform_source: Option<Trail>,
    },
}

/// A node's opt-in to ancestor ("group") highlighting.
///
/// Consulted while walking a focused trail from the scene root toward the
/// leaf; the first node whose value is not [`Off`](Self::Off) anchors the
/// group highlight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GroupHighlight {
    /// Not opted in.
    #[default]
    Off,
    /// Synthesize a rectangle from this node's local bounds, drawn with the
    /// theme's group colors and widths.
    Bounds,
    /// Show this caller-supplied node while the group highlight is active.
    Node(NodeId),
}

/// The four closed highlight representations the overlay can maintain.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolvedHighlight {
    /// Track focus, draw nothing.
    Invisible,
    /// Stroke declaration-supplied geometry with theme colors.
    Shape(HighlightShape),
    /// Show a caller-supplied node.
    Node {
        /// The visual node.
        node: NodeId,
        /// Whether the application keeps ownership of the node's placement.
        layered: bool,
    },
    /// Stroke a rectangle generated from the target's local bounds,
    /// regenerated on every bounds change.
    Bounds(Rect),
}

/// Discriminant of [`ResolvedHighlight`], for queries and comparisons that
/// do not care about the payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HighlightMode {
    /// Nothing drawn.
    Invisible,
    /// Declaration-supplied geometry.
    Shape,
    /// Caller-supplied node.
    Node,
    /// Generated from local bounds.
    Bounds,
}

impl ResolvedHighlight {
    /// Returns the mode discriminant.
    #[must_use]
    pub const fn mode(&self) -> HighlightMode {
        match self {
            Self::Invisible => HighlightMode::Invisible,
            Self::Shape(_) => HighlightMode::Shape,
            Self::Node { .. } => HighlightMode::Node,
            Self::Bounds(_) => HighlightMode::Bounds,
        }
    }
}

/// Resolves a highlight declaration against the target's local bounds.
///
/// Pure: same declaration and bounds always resolve to the same
/// representation, which is what makes an activate → deactivate → activate
/// round trip with an unchanged declaration land on the same mode.
#[must_use]
pub fn resolve(spec: &HighlightSpec, local_bounds: Rect) -> ResolvedHighlight {
    match spec {
        HighlightSpec::Default => ResolvedHighlight::Bounds(local_bounds),
        HighlightSpec::Invisible => ResolvedHighlight::Invisible,
        HighlightSpec::Shape(shape) => ResolvedHighlight::Shape(shape.clone()),
        HighlightSpec::Node { node, layered, .. } => ResolvedHighlight::Node {
            node: *node,
            layered: *layered,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneStore;

    #[test]
    fn default_resolves_to_bounds() {
        let bounds = Rect::new(0.0, 0.0, 10.0, 10.0);
        let resolved = resolve(&HighlightSpec::Default, bounds);
        assert_eq!(resolved, ResolvedHighlight::Bounds(bounds));
        assert_eq!(resolved.mode(), HighlightMode::Bounds);
    }

    #[test]
    fn invisible_resolves_to_invisible() {
        let resolved = resolve(&HighlightSpec::Invisible, Rect::ZERO);
        assert_eq!(resolved.mode(), HighlightMode::Invisible);
    }

    #[test]
    fn shape_passes_geometry_through() {
        let shape = HighlightShape::Rect(Rect::new(1.0, 2.0, 3.0, 4.0));
        let resolved = resolve(&HighlightSpec::Shape(shape.clone()), Rect::ZERO);
        assert_eq!(resolved, ResolvedHighlight::Shape(shape));
    }

    #[test]
    fn node_keeps_layering_flag() {
        let mut store = SceneStore::new();
        let visual = store.create_node();
        for layered in [false, true] {
            let spec = HighlightSpec::Node {
                node: visual,
                layered,
                transform_source: None,
            };
            let resolved = resolve(&spec, Rect::ZERO);
            assert_eq!(
                resolved,
                ResolvedHighlight::Node {
                    node: visual,
                    layered,
                }
            );
        }
    }

    #[test]
    fn resolution_is_deterministic() {
        let bounds = Rect::new(0.0, 0.0, 5.0, 5.0);
        let spec = HighlightSpec::Default;
        assert_eq!(resolve(&spec, bounds), resolve(&spec, bounds));
    }
}
