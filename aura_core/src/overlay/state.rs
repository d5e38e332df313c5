// Copyright 2026 the Aura Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-channel highlight state and subscription bundles.

use kurbo::{Affine, Rect};

use crate::highlight::ResolvedHighlight;
use crate::scene::{NodeId, SceneStore, WatchId};
use crate::trail::Trail;

use super::surface::StrokeStyle;

/// Every watch one activation registered, disposable as a unit.
///
/// Symmetric by construction: activation builds exactly one bundle,
/// deactivation disposes exactly one, so the store's watch count returns to
/// baseline after any number of cycles.
#[derive(Debug)]
pub(super) struct WatchBundle {
    /// Transform watch over the tracked trail.
    pub(super) transform: WatchId,
    /// Watch on the target's highlight declarations.
    pub(super) highlight: WatchId,
    /// Watch on the target's local bounds; present only in Bounds mode.
    pub(super) bounds: Option<WatchId>,
}

impl WatchBundle {
    /// Releases every watch this bundle registered.
    pub(super) fn dispose(self, scene: &mut SceneStore) {
        scene.release_watch(self.transform);
        scene.release_watch(self.highlight);
        if let Some(bounds) = self.bounds {
            scene.release_watch(bounds);
        }
    }
}

/// State of the primary or reading-block channel while a highlight is shown.
#[derive(Debug)]
pub(super) struct ActiveHighlight {
    /// The focused trail, as captured at activation. Identity for change
    /// comparison.
    pub(super) trail: Trail,
    /// The trail the transform watch follows — the focused trail, or the
    /// declaration's alternate transform source.
    pub(super) tracked: Trail,
    /// The focused node.
    pub(super) target: NodeId,
    /// The resolved representation.
    pub(super) resolved: ResolvedHighlight,
    /// Subscriptions registered by this activation.
    pub(super) bundle: WatchBundle,
    /// Last applied trail transform.
    pub(super) matrix: Affine,
    /// Cached inner stroke style (unused in Node mode).
    pub(super) inner: StrokeStyle,
    /// Cached outer stroke style (unused in Node mode).
    pub(super) outer: StrokeStyle,
}

/// The visual anchoring a group highlight at an ancestor.
#[derive(Debug)]
pub(super) enum GroupVisual {
    /// Rectangle synthesized from the ancestor's local bounds.
    Bounds(Rect),
    /// Caller-supplied node.
    Node {
        /// The visual node.
        node: NodeId,
        /// Whether the overlay parented it under its group container (it had
        /// no parent at activation). When `false` the application had
        /// already placed it, so deactivation only hides it.
        attached: bool,
    },
}

/// State of the group channel while an ancestor highlight is shown.
///
/// Exists only while the primary channel is active.
#[derive(Debug)]
pub(super) struct GroupState {
    /// The opted-in ancestor anchoring the highlight.
    pub(super) ancestor: NodeId,
    /// Trail prefix from scene root to the ancestor.
    pub(super) prefix: Trail,
    /// What is drawn at the ancestor.
    pub(super) visual: GroupVisual,
    /// Transform watch over the prefix, independent of the primary watch.
    pub(super) watch: WatchId,
    /// Last applied prefix transform.
    pub(super) matrix: Affine,
    /// Cached inner stroke style (bounds visual only).
    pub(super) inner: StrokeStyle,
    /// Cached outer stroke style (bounds visual only).
    pub(super) outer: StrokeStyle,
}
