// Copyright 2026 the Aura Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The highlight overlay orchestrator.
//!
//! [`HighlightOverlay`] decides which node currently deserves a visible
//! focus ring and maintains that ring as the scene animates. It runs three
//! independent highlight lifecycles:
//!
//! - **primary** — driven by input (keyboard) focus or pointer focus,
//!   arbitrated by [`resolve_primary_focus`](HighlightOverlay::resolve_primary_focus);
//! - **group** — an ancestor ring shown while the primary highlight is
//!   active and an ancestor on its trail opts in;
//! - **reading block** — driven by the speech system's reading-block focus
//!   signal, fully independent of the primary channel.
//!
//! Hosts call [`update`](HighlightOverlay::update) once per frame. The
//! overlay drains scene changes, re-resolves focus when the focus epoch
//! moved, reapplies tracked transforms with line-width correction, and
//! rebuilds its surface's display list — but only when something actually
//! changed, so a quiet frame does zero redraw work.
//!
//! Every activation registers its watches in one [`WatchBundle`];
//! deactivation disposes the bundle, so watch counts return to baseline and
//! nothing can fire into half-torn-down state.

mod state;
mod surface;

use kurbo::{Affine, Size};

use crate::display::DisplayId;
use crate::focus::FocusState;
use crate::highlight::{
    GroupHighlight, HighlightMode, HighlightShape, HighlightSpec, ResolvedHighlight, resolve,
};
use crate::scene::{NodeId, SceneChanges, SceneStore};
use crate::theme::HighlightTheme;
use crate::trace::{
    ActivateEvent, DeactivateEvent, FocusResolvedEvent, HighlightChannel, RedrawEvent, Tracer,
};
use crate::trail::Trail;

use state::{ActiveHighlight, GroupState, GroupVisual, WatchBundle};
pub use surface::{HighlightItem, HighlightPlan, OverlaySurface, StrokeStyle};

/// Construction parameters for a [`HighlightOverlay`].
#[derive(Debug, Default)]
pub struct OverlayOptions {
    /// The display this overlay serves. Focus targets on other displays are
    /// ignored.
    pub display: DisplayId,
    /// Stroke colors and widths.
    pub theme: HighlightTheme,
    /// The host's intentional pan/zoom transform. Highlight strokes scale
    /// with this but not with a target's own scale.
    pub zoom: Affine,
}

/// Decides which node deserves a focus ring and maintains it frame to frame.
#[derive(Debug)]
pub struct HighlightOverlay {
    display: DisplayId,
    theme: HighlightTheme,
    theme_epoch_seen: u64,
    zoom: Affine,

    // Overlay-owned container nodes in the observed store.
    primary_root: NodeId,
    group_root: NodeId,
    reading_root: NodeId,

    primary: Option<ActiveHighlight>,
    group: Option<GroupState>,
    reading: Option<ActiveHighlight>,

    primary_transform_dirty: bool,
    reading_transform_dirty: bool,
    focus_epoch_seen: Option<u64>,
    needs_redraw: bool,

    surface: OverlaySurface,
    tracer: Tracer,
}

impl HighlightOverlay {
    /// Creates an overlay observing `scene`.
    ///
    /// Three container nodes are created in the store to host unlayered
    /// caller-supplied visuals for the primary, group, and reading-block
    /// channels.
    #[must_use]
    pub fn new(scene: &mut SceneStore, options: OverlayOptions) -> Self {
        let theme_epoch_seen = options.theme.epoch();
        Self {
            display: options.display,
            theme: options.theme,
            theme_epoch_seen,
            zoom: options.zoom,
            primary_root: scene.create_node(),
            group_root: scene.create_node(),
            reading_root: scene.create_node(),
            primary: None,
            group: None,
            reading: None,
            primary_transform_dirty: false,
            reading_transform_dirty: false,
            focus_epoch_seen: None,
            needs_redraw: false,
            surface: OverlaySurface::new(),
            tracer: Tracer::off(),
        }
    }

    /// Replaces the tracer used for lifecycle diagnostics.
    pub fn set_tracer(&mut self, tracer: Tracer) {
        self.tracer = tracer;
    }

    /// Returns the overlay's display.
    #[inline]
    #[must_use]
    pub const fn display(&self) -> DisplayId {
        self.display
    }

    /// Returns the theme.
    #[inline]
    #[must_use]
    pub const fn theme(&self) -> &HighlightTheme {
        &self.theme
    }

    /// Returns the theme for live recoloring. Edits are picked up by the
    /// next [`update`](Self::update) via the theme's epoch.
    #[inline]
    pub const fn theme_mut(&mut self) -> &mut HighlightTheme {
        &mut self.theme
    }

    /// Sets the host's intentional pan/zoom transform.
    pub fn set_zoom(&mut self, zoom: Affine) {
        self.zoom = zoom;
        self.primary_transform_dirty = self.primary.is_some();
        self.reading_transform_dirty = self.reading.is_some();
    }

    /// Returns the overlay's private surface.
    #[inline]
    #[must_use]
    pub const fn surface(&self) -> &OverlaySurface {
        &self.surface
    }

    /// Returns whether a primary highlight is active (it may still draw
    /// nothing, e.g. in Invisible mode).
    #[inline]
    #[must_use]
    pub const fn has_primary_highlight(&self) -> bool {
        self.primary.is_some()
    }

    /// Returns whether a group highlight is active.
    #[inline]
    #[must_use]
    pub const fn has_group_highlight(&self) -> bool {
        self.group.is_some()
    }

    /// Returns whether a reading-block highlight is active.
    #[inline]
    #[must_use]
    pub const fn has_reading_block_highlight(&self) -> bool {
        self.reading.is_some()
    }

    /// Returns the resolved mode of the active primary highlight.
    #[must_use]
    pub fn primary_mode(&self) -> Option<HighlightMode> {
        self.primary.as_ref().map(|a| a.resolved.mode())
    }

    /// Returns the resolved mode of the active reading-block highlight.
    #[must_use]
    pub fn reading_block_mode(&self) -> Option<HighlightMode> {
        self.reading.as_ref().map(|a| a.resolved.mode())
    }

    /// Returns the target of the active primary highlight.
    #[must_use]
    pub fn primary_target(&self) -> Option<NodeId> {
        self.primary.as_ref().map(|a| a.target)
    }

    /// Returns the ancestor anchoring the active group highlight.
    #[must_use]
    pub fn group_anchor(&self) -> Option<NodeId> {
        self.group.as_ref().map(|g| g.ancestor)
    }

    // -- Primary channel --

    /// Activates the primary highlight for `trail`.
    ///
    /// Resolves the leaf node's highlight declaration, registers the watch
    /// bundle, attaches or unhides a Node-mode visual, and resolves any
    /// applicable group highlight.
    ///
    /// Precondition (development builds): no primary highlight is active.
    /// Release builds return silently instead.
    pub fn activate_primary(&mut self, scene: &mut SceneStore, trail: &Trail) {
        debug_assert!(
            self.primary.is_none(),
            "primary highlight already active; deactivate first"
        );
        if self.primary.is_some() {
            return;
        }
        let Some(active) = self.activate_channel(scene, trail, false) else {
            return;
        };
        self.tracer.activate(&ActivateEvent {
            channel: HighlightChannel::Primary,
            mode: active.resolved.mode(),
            target_index: active.target.index(),
        });
        self.primary = Some(active);
        self.activate_group(scene, trail);
        self.primary_transform_dirty = true;
        self.needs_redraw = true;
    }

    /// Deactivates the primary highlight (and any group highlight).
    ///
    /// Precondition (development builds): a primary highlight is active.
    /// Release builds return silently instead.
    pub fn deactivate_primary(&mut self, scene: &mut SceneStore) {
        debug_assert!(self.primary.is_some(), "no active primary highlight");
        // State leaves the overlay before any teardown side effect runs, so
        // nothing can observe a half-torn-down channel.
        let Some(active) = self.primary.take() else {
            return;
        };
        self.deactivate_group(scene);
        Self::teardown_channel(scene, active, self.primary_root);
        self.tracer.deactivate(&DeactivateEvent {
            channel: HighlightChannel::Primary,
        });
        self.primary_transform_dirty = false;
        self.needs_redraw = true;
    }

    /// Re-arbitrates the primary channel from the current focus signals.
    ///
    /// Input focus wins outright while input-focus highlights are visible —
    /// pointer focus is never considered in that state, even when no input
    /// target exists, which avoids flicker when switching input modalities.
    /// Otherwise the locked pointer (an in-progress interaction) beats the
    /// ordinary pointer, and the target must be eligible for pointer
    /// highlighting.
    pub fn resolve_primary_focus(&mut self, scene: &mut SceneStore, focus: &FocusState) {
        let desired = self.desired_primary(scene, focus).cloned();

        if let (Some(active), Some(trail)) = (&self.primary, &desired) {
            if active.trail == *trail {
                return;
            }
        }
        if desired.is_none() && self.primary.is_none() {
            return;
        }

        self.tracer.focus_resolved(&FocusResolvedEvent {
            target_index: desired.as_ref().map(|t| t.leaf().index()),
        });
        if self.primary.is_some() {
            self.deactivate_primary(scene);
        }
        if let Some(trail) = desired {
            self.activate_primary(scene, &trail);
        }
    }

    fn desired_primary<'a>(&self, scene: &SceneStore, focus: &'a FocusState) -> Option<&'a Trail> {
        let target = if focus.input_highlights_visible() {
            // Pointer focus is intentionally not a fallback here.
            focus.input()
        } else if focus.interactive_highlights_visible() {
            focus
                .locked_pointer()
                .or_else(|| focus.pointer())
                .filter(|t| {
                    let leaf = t.trail.leaf();
                    scene.is_alive(leaf)
                        && (scene.pointer_highlightable(leaf)
                            || (scene.reading_block(leaf)
                                && focus.reading_block_highlights_visible()))
                })
        } else {
            None
        };
        target
            .filter(|t| t.display == self.display)
            .map(|t| &t.trail)
    }

    // -- Reading-block channel --

    /// Activates the reading-block highlight for `trail`, resolving the leaf
    /// node's speaking highlight declaration.
    ///
    /// Precondition (development builds): no reading-block highlight is
    /// active. Release builds return silently instead.
    pub fn activate_reading_block(&mut self, scene: &mut SceneStore, trail: &Trail) {
        debug_assert!(
            self.reading.is_none(),
            "reading-block highlight already active; deactivate first"
        );
        if self.reading.is_some() {
            return;
        }
        let Some(active) = self.activate_channel(scene, trail, true) else {
            return;
        };
        self.tracer.activate(&ActivateEvent {
            channel: HighlightChannel::ReadingBlock,
            mode: active.resolved.mode(),
            target_index: active.target.index(),
        });
        self.reading = Some(active);
        self.reading_transform_dirty = true;
        self.needs_redraw = true;
    }

    /// Deactivates the reading-block highlight.
    ///
    /// Precondition (development builds): a reading-block highlight is
    /// active. Release builds return silently instead.
    pub fn deactivate_reading_block(&mut self, scene: &mut SceneStore) {
        debug_assert!(self.reading.is_some(), "no active reading-block highlight");
        let Some(active) = self.reading.take() else {
            return;
        };
        Self::teardown_channel(scene, active, self.reading_root);
        self.tracer.deactivate(&DeactivateEvent {
            channel: HighlightChannel::ReadingBlock,
        });
        self.reading_transform_dirty = false;
        self.needs_redraw = true;
    }

    fn resolve_reading_block(&mut self, scene: &mut SceneStore, focus: &FocusState) {
        let desired = focus
            .reading_block()
            .filter(|t| t.display == self.display && focus.reading_block_highlights_visible())
            // Never highlight the same node on both channels at once.
            .filter(|t| self.primary_target() != Some(t.trail.leaf()))
            .map(|t| t.trail.clone());

        if let (Some(active), Some(trail)) = (&self.reading, &desired) {
            if active.trail == *trail {
                return;
            }
        }
        if self.reading.is_some() {
            self.deactivate_reading_block(scene);
        }
        if let Some(trail) = desired {
            self.activate_reading_block(scene, &trail);
        }
    }

    // -- Shared activation machinery --

    /// Resolves and activates one channel's highlight. Returns `None` when
    /// the trail's leaf is already gone (a benign race with host teardown).
    fn activate_channel(
        &mut self,
        scene: &mut SceneStore,
        trail: &Trail,
        speaking: bool,
    ) -> Option<ActiveHighlight> {
        let target = trail.leaf();
        if !scene.is_alive(target) {
            return None;
        }

        let spec = if speaking {
            scene.speaking_highlight(target).clone()
        } else {
            scene.highlight(target).clone()
        };
        let resolved = resolve(&spec, scene.local_bounds(target));

        // A Node-mode declaration may track another trail's transform
        // instead of the focused one, resolved against shared ancestry.
        let tracked = match &spec {
            HighlightSpec::Node {
                transform_source: Some(source),
                ..
            } => {
                debug_assert!(
                    source.starts_at_same_root(trail),
                    "transform source must share the focused trail's scene root"
                );
                if source.starts_at_same_root(trail) {
                    source.clone()
                } else {
                    trail.clone()
                }
            }
            _ => trail.clone(),
        };

        let bundle = WatchBundle {
            transform: scene.track_trail(&tracked),
            highlight: scene.watch_highlight(target),
            bounds: matches!(resolved, ResolvedHighlight::Bounds(_))
                .then(|| scene.watch_bounds(target)),
        };

        if let ResolvedHighlight::Node { node, layered } = &resolved {
            if scene.is_alive(*node) {
                if !layered {
                    let root = if speaking {
                        self.reading_root
                    } else {
                        self.primary_root
                    };
                    scene.add_child(root, *node);
                }
                scene.set_visible(*node, true);
            }
        }

        let (inner_color, outer_color) = (self.theme.inner_color(), self.theme.outer_color());
        Some(ActiveHighlight {
            trail: trail.clone(),
            tracked,
            target,
            resolved,
            bundle,
            matrix: Affine::IDENTITY,
            inner: StrokeStyle {
                color: inner_color,
                width: self.theme.inner_width(),
            },
            outer: StrokeStyle {
                color: outer_color,
                width: self.theme.outer_width(),
            },
        })
    }

    /// Tears down one channel's visual and subscriptions.
    fn teardown_channel(scene: &mut SceneStore, active: ActiveHighlight, root: NodeId) {
        if let ResolvedHighlight::Node { node, layered } = active.resolved {
            // The application may have destroyed the visual already; skip
            // silently rather than touching a stale handle.
            if scene.is_alive(node) {
                if !layered && scene.parent(node) == Some(root) {
                    scene.remove_from_parent(node);
                }
                scene.set_visible(node, false);
            }
        }
        active.bundle.dispose(scene);
    }

    // -- Group channel --

    /// Walks `trail` root-to-leaf and anchors a group highlight at the first
    /// opted-in node. The outermost opted-in ancestor wins; nodes closer to
    /// the leaf are not considered once a match is found.
    fn activate_group(&mut self, scene: &mut SceneStore, trail: &Trail) {
        debug_assert!(self.group.is_none(), "group highlight already active");
        let mut found = None;
        for (depth, &node) in trail.nodes().iter().enumerate() {
            if !scene.is_alive(node) {
                continue;
            }
            match scene.group_highlight(node) {
                GroupHighlight::Off => {}
                group => {
                    found = Some((depth, node, group));
                    break;
                }
            }
        }
        let Some((depth, ancestor, group)) = found else {
            return;
        };

        let prefix = trail.prefix(depth + 1);
        let watch = scene.track_trail(&prefix);
        let visual = match group {
            GroupHighlight::Off => unreachable!("Off was filtered above"),
            GroupHighlight::Bounds => GroupVisual::Bounds(scene.local_bounds(ancestor)),
            GroupHighlight::Node(node) => {
                let mut attached = false;
                if scene.is_alive(node) {
                    // An already-placed visual is layered by the
                    // application; only toggle its visibility.
                    if scene.parent(node).is_none() {
                        scene.add_child(self.group_root, node);
                        attached = true;
                    }
                    scene.set_visible(node, true);
                }
                GroupVisual::Node { node, attached }
            }
        };

        self.tracer.activate(&ActivateEvent {
            channel: HighlightChannel::Group,
            mode: match visual {
                GroupVisual::Bounds(_) => HighlightMode::Bounds,
                GroupVisual::Node { .. } => HighlightMode::Node,
            },
            target_index: ancestor.index(),
        });
        self.group = Some(GroupState {
            ancestor,
            prefix,
            visual,
            watch,
            matrix: Affine::IDENTITY,
            inner: StrokeStyle {
                color: self.theme.group_inner_color(),
                width: self.theme.group_inner_width(),
            },
            outer: StrokeStyle {
                color: self.theme.group_outer_color(),
                width: self.theme.group_outer_width(),
            },
        });
    }

    fn deactivate_group(&mut self, scene: &mut SceneStore) {
        let Some(group) = self.group.take() else {
            return;
        };
        if let GroupVisual::Node { node, attached } = group.visual {
            if scene.is_alive(node) {
                if attached && scene.parent(node) == Some(self.group_root) {
                    scene.remove_from_parent(node);
                }
                scene.set_visible(node, false);
            }
        }
        scene.release_watch(group.watch);
        self.tracer.deactivate(&DeactivateEvent {
            channel: HighlightChannel::Group,
        });
    }

    // -- Per-frame update --

    /// Advances the overlay by one host frame.
    ///
    /// Drains scene changes, re-resolves focus if the focus epoch moved,
    /// applies theme recoloring, reapplies tracked transforms with
    /// line-width correction, resizes the surface if the host diverged, and
    /// redraws the display list — only when something actually changed.
    pub fn update(&mut self, scene: &mut SceneStore, focus: &FocusState, host_size: Size) {
        let changes = scene.evaluate();
        self.apply_scene_changes(scene, &changes);

        if self.focus_epoch_seen != Some(focus.epoch()) {
            self.focus_epoch_seen = Some(focus.epoch());
            self.resolve_primary_focus(scene, focus);
            self.resolve_reading_block(scene, focus);
        }

        self.update_colors();

        if self.primary_transform_dirty {
            self.primary_transform_dirty = false;
            self.refresh_primary_transform(scene);
            self.needs_redraw = true;
        }
        if self.reading_transform_dirty {
            self.reading_transform_dirty = false;
            self.refresh_reading_transform(scene);
            self.needs_redraw = true;
        }

        if self.surface.size() != host_size {
            self.surface.set_size(host_size);
            self.needs_redraw = true;
        }

        if self.needs_redraw {
            self.needs_redraw = false;
            let plan = self.build_plan();
            self.tracer.redraw(&RedrawEvent {
                items: plan.items.len(),
            });
            self.surface.submit(plan);
        }
    }

    /// Routes drained scene changes into channel bookkeeping: fired
    /// transform watches set dirty flags, a highlight-declaration edit on an
    /// active target triggers full re-activation, and a bounds edit on a
    /// Bounds-mode target regenerates the shape in place.
    fn apply_scene_changes(&mut self, scene: &mut SceneStore, changes: &SceneChanges) {
        if changes.fired.is_empty() {
            return;
        }

        // Declaration edits force a deactivate/activate cycle so the new
        // declaration is re-resolved from scratch.
        let respec = match &self.primary {
            Some(a) if changes.fired.contains(&a.bundle.highlight) => Some(a.trail.clone()),
            _ => None,
        };
        if let Some(trail) = respec {
            self.deactivate_primary(scene);
            self.activate_primary(scene, &trail);
        }
        let respec = match &self.reading {
            Some(a) if changes.fired.contains(&a.bundle.highlight) => Some(a.trail.clone()),
            _ => None,
        };
        if let Some(trail) = respec {
            self.deactivate_reading_block(scene);
            self.activate_reading_block(scene, &trail);
        }

        if let Some(active) = &mut self.primary {
            if changes.fired.contains(&active.bundle.transform) {
                self.primary_transform_dirty = true;
            }
            if let Some(bounds_watch) = active.bundle.bounds {
                if changes.fired.contains(&bounds_watch) {
                    if let ResolvedHighlight::Bounds(rect) = &mut active.resolved {
                        // Regenerated in place; no re-activation.
                        *rect = scene.local_bounds(active.target);
                        self.needs_redraw = true;
                    }
                }
            }
        }
        if let Some(group) = &self.group {
            if changes.fired.contains(&group.watch) {
                self.primary_transform_dirty = true;
            }
        }
        if let Some(active) = &mut self.reading {
            if changes.fired.contains(&active.bundle.transform) {
                self.reading_transform_dirty = true;
            }
            if let Some(bounds_watch) = active.bundle.bounds {
                if changes.fired.contains(&bounds_watch) {
                    if let ResolvedHighlight::Bounds(rect) = &mut active.resolved {
                        *rect = scene.local_bounds(active.target);
                        self.needs_redraw = true;
                    }
                }
            }
        }
    }

    /// Rewrites cached stroke colors when the theme epoch moved. Node-mode
    /// highlights are skipped — the theme does not apply to caller-supplied
    /// visuals.
    fn update_colors(&mut self) {
        if self.theme_epoch_seen == self.theme.epoch() {
            return;
        }
        self.theme_epoch_seen = self.theme.epoch();

        if let Some(active) = &mut self.primary {
            if !matches!(active.resolved, ResolvedHighlight::Node { .. }) {
                active.inner.color = self.theme.inner_color();
                active.outer.color = self.theme.outer_color();
                self.needs_redraw = true;
            }
        }
        if let Some(group) = &mut self.group {
            if matches!(group.visual, GroupVisual::Bounds(_)) {
                group.inner.color = self.theme.group_inner_color();
                group.outer.color = self.theme.group_outer_color();
                self.needs_redraw = true;
            }
        }
        if let Some(active) = &mut self.reading {
            if !matches!(active.resolved, ResolvedHighlight::Node { .. }) {
                active.inner.color = self.theme.inner_color();
                active.outer.color = self.theme.outer_color();
                self.needs_redraw = true;
            }
        }
    }

    fn refresh_primary_transform(&mut self, scene: &mut SceneStore) {
        let Some(active) = &self.primary else {
            return;
        };
        let tracked = active.tracked.clone();
        let node_mode = matches!(active.resolved, ResolvedHighlight::Node { .. });

        let Some(matrix) = scene.trail_transform(&tracked) else {
            // A trail node was destroyed under us; the highlight is gone.
            self.deactivate_primary(scene);
            return;
        };
        let inner_width = corrected_width(self.theme.inner_width(), matrix, self.zoom);
        let outer_width = corrected_width(self.theme.outer_width(), matrix, self.zoom);
        if let Some(active) = &mut self.primary {
            active.matrix = matrix;
            if !node_mode {
                active.inner.width = inner_width;
                active.outer.width = outer_width;
            }
        }

        // The group highlight rides the primary dirty flag but has its own
        // tracked prefix and widths.
        let prefix = match &self.group {
            Some(group) => group.prefix.clone(),
            None => return,
        };
        let Some(matrix) = scene.trail_transform(&prefix) else {
            self.deactivate_group(scene);
            return;
        };
        let inner_width = corrected_width(self.theme.group_inner_width(), matrix, self.zoom);
        let outer_width = corrected_width(self.theme.group_outer_width(), matrix, self.zoom);
        if let Some(group) = &mut self.group {
            group.matrix = matrix;
            if matches!(group.visual, GroupVisual::Bounds(_)) {
                group.inner.width = inner_width;
                group.outer.width = outer_width;
            }
        }
    }

    fn refresh_reading_transform(&mut self, scene: &mut SceneStore) {
        let Some(active) = &self.reading else {
            return;
        };
        let tracked = active.tracked.clone();
        let node_mode = matches!(active.resolved, ResolvedHighlight::Node { .. });

        let Some(matrix) = scene.trail_transform(&tracked) else {
            self.deactivate_reading_block(scene);
            return;
        };
        let inner_width = corrected_width(self.theme.inner_width(), matrix, self.zoom);
        let outer_width = corrected_width(self.theme.outer_width(), matrix, self.zoom);
        if let Some(active) = &mut self.reading {
            active.matrix = matrix;
            if !node_mode {
                active.inner.width = inner_width;
                active.outer.width = outer_width;
            }
        }
    }

    /// Builds the display list, back to front: group, primary, reading
    /// block. Invisible and layered Node highlights contribute nothing.
    fn build_plan(&self) -> HighlightPlan {
        let mut plan = HighlightPlan::default();

        if let Some(group) = &self.group {
            match &group.visual {
                GroupVisual::Bounds(rect) => plan.items.push(HighlightItem::Stroke {
                    shape: HighlightShape::Rect(*rect),
                    transform: group.matrix,
                    inner: group.inner,
                    outer: group.outer,
                }),
                GroupVisual::Node { attached: true, .. } => {
                    plan.items.push(HighlightItem::Subtree {
                        root: self.group_root,
                        transform: group.matrix,
                    });
                }
                GroupVisual::Node { attached: false, .. } => {}
            }
        }

        for (active, root) in [
            (&self.primary, self.primary_root),
            (&self.reading, self.reading_root),
        ] {
            let Some(active) = active else { continue };
            match &active.resolved {
                ResolvedHighlight::Invisible => {}
                ResolvedHighlight::Shape(shape) => plan.items.push(HighlightItem::Stroke {
                    shape: shape.clone(),
                    transform: active.matrix,
                    inner: active.inner,
                    outer: active.outer,
                }),
                ResolvedHighlight::Bounds(rect) => plan.items.push(HighlightItem::Stroke {
                    shape: HighlightShape::Rect(*rect),
                    transform: active.matrix,
                    inner: active.inner,
                    outer: active.outer,
                }),
                ResolvedHighlight::Node { layered: false, .. } => {
                    plan.items.push(HighlightItem::Subtree {
                        root,
                        transform: active.matrix,
                    });
                }
                ResolvedHighlight::Node { layered: true, .. } => {}
            }
        }

        plan
    }
}

/// Geometric mean of an affine transform's axis scales.
fn approximate_scale(transform: Affine) -> f64 {
    transform.determinant().abs().sqrt()
}

/// Stroke width that holds constant apparent thickness under the target's
/// own scale while still following the host's intentional zoom.
fn corrected_width(base: f64, tracked: Affine, zoom: Affine) -> f64 {
    let tracked_scale = approximate_scale(tracked);
    let zoom_scale = approximate_scale(zoom);
    if tracked_scale.is_finite() && tracked_scale > f64::EPSILON && zoom_scale.is_finite() {
        base * zoom_scale / tracked_scale
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use kurbo::Rect;

    use super::*;
    use crate::focus::FocusTarget;
    use crate::theme::Rgba;

    const HOST: Size = Size::new(800.0, 600.0);

    struct Fixture {
        scene: SceneStore,
        focus: FocusState,
        overlay: HighlightOverlay,
        root: NodeId,
        leaf: NodeId,
        trail: Trail,
    }

    fn fixture() -> Fixture {
        let mut scene = SceneStore::new();
        let root = scene.create_node();
        let leaf = scene.create_node();
        scene.add_child(root, leaf);
        scene.set_bounds(leaf, Rect::new(0.0, 0.0, 10.0, 10.0));
        let overlay = HighlightOverlay::new(&mut scene, OverlayOptions::default());
        Fixture {
            scene,
            focus: FocusState::new(),
            overlay,
            root,
            leaf,
            trail: Trail::new(vec![root, leaf]),
        }
    }

    /// Runs enough updates for activation-time scene mutations to drain.
    fn settle(f: &mut Fixture) {
        for _ in 0..3 {
            f.overlay.update(&mut f.scene, &f.focus, HOST);
        }
    }

    fn input_target(f: &Fixture) -> FocusTarget {
        FocusTarget::new(DisplayId(0), f.trail.clone())
    }

    fn stroke_rects(plan: &HighlightPlan) -> Vec<Rect> {
        plan.items
            .iter()
            .filter_map(|item| match item {
                HighlightItem::Stroke {
                    shape: HighlightShape::Rect(rect),
                    ..
                } => Some(*rect),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn input_focus_activates_bounds_highlight() {
        let mut f = fixture();
        f.focus.set_input(Some(input_target(&f)));
        settle(&mut f);

        assert!(f.overlay.has_primary_highlight());
        assert_eq!(f.overlay.primary_mode(), Some(HighlightMode::Bounds));
        assert_eq!(
            stroke_rects(f.overlay.surface().plan()),
            vec![Rect::new(0.0, 0.0, 10.0, 10.0)]
        );
    }

    #[test]
    fn clearing_input_focus_deactivates() {
        let mut f = fixture();
        f.focus.set_input(Some(input_target(&f)));
        settle(&mut f);
        assert!(f.overlay.has_primary_highlight());

        f.focus.set_input(None);
        settle(&mut f);
        assert!(!f.overlay.has_primary_highlight());
        assert!(f.overlay.surface().plan().is_empty());
    }

    #[test]
    fn input_visibility_suppresses_pointer_even_without_input_target() {
        // Scenario D: the input-focus toggle alone vetoes pointer highlights.
        let mut f = fixture();
        f.scene.set_pointer_highlightable(f.leaf, true);
        f.focus.set_interactive_highlights_visible(true);
        f.focus.set_pointer(Some(input_target(&f)));
        settle(&mut f);

        assert!(!f.overlay.has_primary_highlight());
    }

    #[test]
    fn pointer_highlight_shown_when_input_highlights_hidden() {
        let mut f = fixture();
        f.scene.set_pointer_highlightable(f.leaf, true);
        f.focus.set_input_highlights_visible(false);
        f.focus.set_interactive_highlights_visible(true);
        f.focus.set_pointer(Some(input_target(&f)));
        settle(&mut f);

        assert_eq!(f.overlay.primary_target(), Some(f.leaf));
    }

    #[test]
    fn pointer_focus_requires_eligibility() {
        let mut f = fixture();
        f.focus.set_input_highlights_visible(false);
        f.focus.set_interactive_highlights_visible(true);
        f.focus.set_pointer(Some(input_target(&f)));
        settle(&mut f);

        // Not pointer-highlightable and not a reading block: nothing shown.
        assert!(!f.overlay.has_primary_highlight());

        // Reading-block capability plus visible reading-block highlights is
        // an alternative eligibility route.
        f.scene.set_reading_block(f.leaf, true);
        f.focus.set_reading_block_highlights_visible(true);
        settle(&mut f);
        assert_eq!(f.overlay.primary_target(), Some(f.leaf));
    }

    #[test]
    fn locked_pointer_beats_ordinary_pointer() {
        let mut f = fixture();
        let other = f.scene.create_node();
        f.scene.add_child(f.root, other);
        f.scene.set_pointer_highlightable(f.leaf, true);
        f.scene.set_pointer_highlightable(other, true);

        f.focus.set_input_highlights_visible(false);
        f.focus.set_interactive_highlights_visible(true);
        f.focus.set_pointer(Some(input_target(&f)));
        f.focus.set_locked_pointer(Some(FocusTarget::new(
            DisplayId(0),
            Trail::new(vec![f.root, other]),
        )));
        settle(&mut f);

        assert_eq!(f.overlay.primary_target(), Some(other));
    }

    #[test]
    fn at_most_one_primary_highlight() {
        let mut f = fixture();
        let other = f.scene.create_node();
        f.scene.add_child(f.root, other);
        f.scene.set_pointer_highlightable(other, true);

        f.focus.set_interactive_highlights_visible(true);
        f.focus.set_input(Some(input_target(&f)));
        f.focus
            .set_pointer(Some(FocusTarget::new(DisplayId(0), Trail::new(vec![f.root, other]))));
        settle(&mut f);

        // Input wins; only one highlight exists and it targets the input leaf.
        assert_eq!(f.overlay.primary_target(), Some(f.leaf));
        assert_eq!(f.overlay.surface().plan().items.len(), 1);
    }

    #[test]
    fn cross_display_focus_is_ignored() {
        let mut f = fixture();
        f.focus
            .set_input(Some(FocusTarget::new(DisplayId(7), f.trail.clone())));
        settle(&mut f);
        assert!(!f.overlay.has_primary_highlight());
    }

    #[test]
    fn bounds_change_regenerates_without_reactivation() {
        // Scenario A.
        let mut f = fixture();
        f.focus.set_input(Some(input_target(&f)));
        settle(&mut f);

        let bundle_before = f.overlay.primary.as_ref().map(|a| a.bundle.transform);
        f.scene.set_bounds(f.leaf, Rect::new(0.0, 0.0, 20.0, 20.0));
        settle(&mut f);

        assert_eq!(
            stroke_rects(f.overlay.surface().plan()),
            vec![Rect::new(0.0, 0.0, 20.0, 20.0)]
        );
        // The same activation survived: its watch bundle is unchanged.
        let bundle_after = f.overlay.primary.as_ref().map(|a| a.bundle.transform);
        assert_eq!(bundle_before, bundle_after);
    }

    #[test]
    fn invisible_highlight_tracks_but_draws_nothing() {
        // Scenario B.
        let mut f = fixture();
        f.scene.set_highlight(f.leaf, HighlightSpec::Invisible);
        f.focus.set_input(Some(input_target(&f)));
        settle(&mut f);

        assert!(f.overlay.has_primary_highlight());
        assert_eq!(f.overlay.primary_mode(), Some(HighlightMode::Invisible));
        assert!(f.overlay.surface().plan().is_empty());
    }

    #[test]
    fn group_prefers_outermost_ancestor() {
        // Scenario C: root → a(group) → b(group) → leaf anchors at a, never b.
        let mut scene = SceneStore::new();
        let root = scene.create_node();
        let a = scene.create_node();
        let b = scene.create_node();
        let leaf = scene.create_node();
        scene.add_child(root, a);
        scene.add_child(a, b);
        scene.add_child(b, leaf);
        scene.set_group_highlight(a, GroupHighlight::Bounds);
        scene.set_group_highlight(b, GroupHighlight::Bounds);
        scene.set_bounds(a, Rect::new(0.0, 0.0, 40.0, 40.0));
        scene.set_bounds(b, Rect::new(0.0, 0.0, 30.0, 30.0));

        let mut overlay = HighlightOverlay::new(&mut scene, OverlayOptions::default());
        let mut focus = FocusState::new();
        focus.set_input(Some(FocusTarget::new(
            DisplayId(0),
            Trail::new(vec![root, a, b, leaf]),
        )));
        for _ in 0..3 {
            overlay.update(&mut scene, &focus, HOST);
        }

        assert_eq!(overlay.group_anchor(), Some(a));
        // Exactly one group ring: the plan holds the group rect and the
        // primary bounds rect, nothing else.
        let rects = stroke_rects(overlay.surface().plan());
        assert_eq!(rects.len(), 2);
        assert!(rects.contains(&Rect::new(0.0, 0.0, 40.0, 40.0)));
        assert!(!rects.contains(&Rect::new(0.0, 0.0, 30.0, 30.0)));
    }

    #[test]
    fn group_deactivates_with_primary() {
        let mut f = fixture();
        f.scene.set_group_highlight(f.root, GroupHighlight::Bounds);
        f.focus.set_input(Some(input_target(&f)));
        settle(&mut f);
        assert!(f.overlay.has_group_highlight());

        f.focus.set_input(None);
        settle(&mut f);
        assert!(!f.overlay.has_group_highlight());
        assert_eq!(f.scene.watch_count(), 0);
    }

    #[test]
    fn group_custom_node_is_attached_and_released() {
        let mut f = fixture();
        let badge = f.scene.create_node();
        f.scene.set_visible(badge, false);
        f.scene.set_group_highlight(f.root, GroupHighlight::Node(badge));

        f.focus.set_input(Some(input_target(&f)));
        settle(&mut f);
        assert_eq!(f.scene.parent(badge), Some(f.overlay.group_root));
        assert!(f.scene.visible(badge));

        f.focus.set_input(None);
        settle(&mut f);
        assert_eq!(f.scene.parent(badge), None);
        assert!(!f.scene.visible(badge));
    }

    #[test]
    fn reading_block_and_primary_coexist_on_different_nodes() {
        let mut f = fixture();
        let spoken = f.scene.create_node();
        f.scene.add_child(f.root, spoken);
        f.scene.set_bounds(spoken, Rect::new(0.0, 0.0, 6.0, 6.0));

        f.focus.set_reading_block_highlights_visible(true);
        f.focus.set_input(Some(input_target(&f)));
        f.focus.set_reading_block(Some(FocusTarget::new(
            DisplayId(0),
            Trail::new(vec![f.root, spoken]),
        )));
        settle(&mut f);

        assert!(f.overlay.has_primary_highlight());
        assert!(f.overlay.has_reading_block_highlight());
        assert_ne!(
            f.overlay.primary_target(),
            f.overlay.reading.as_ref().map(|a| a.target)
        );
        assert_eq!(f.overlay.surface().plan().items.len(), 2);
    }

    #[test]
    fn reading_block_never_doubles_the_primary_target() {
        let mut f = fixture();
        f.focus.set_reading_block_highlights_visible(true);
        f.focus.set_input(Some(input_target(&f)));
        f.focus.set_reading_block(Some(input_target(&f)));
        settle(&mut f);

        assert!(f.overlay.has_primary_highlight());
        assert!(!f.overlay.has_reading_block_highlight());
    }

    #[test]
    fn reading_block_clears_when_speech_stops() {
        let mut f = fixture();
        f.focus.set_reading_block_highlights_visible(true);
        f.focus.set_reading_block(Some(input_target(&f)));
        settle(&mut f);
        assert!(f.overlay.has_reading_block_highlight());
        assert_eq!(
            f.overlay.reading_block_mode(),
            Some(HighlightMode::Bounds),
            "speaking highlight defaults to bounds mode"
        );

        f.focus.set_reading_block(None);
        settle(&mut f);
        assert!(!f.overlay.has_reading_block_highlight());
        assert_eq!(f.scene.watch_count(), 0);
    }

    #[test]
    fn quiet_updates_do_zero_redraw_work() {
        let mut f = fixture();
        f.focus.set_input(Some(input_target(&f)));
        settle(&mut f);

        let drawn = f.overlay.surface().draw_count();
        f.overlay.update(&mut f.scene, &f.focus, HOST);
        f.overlay.update(&mut f.scene, &f.focus, HOST);
        assert_eq!(f.overlay.surface().draw_count(), drawn);
    }

    #[test]
    fn round_trip_resolves_the_same_mode() {
        let mut f = fixture();
        f.scene.set_highlight(
            f.leaf,
            HighlightSpec::Shape(HighlightShape::Rect(Rect::new(1.0, 1.0, 9.0, 9.0))),
        );
        settle(&mut f);

        let trail = f.trail.clone();
        f.overlay.activate_primary(&mut f.scene, &trail);
        let first = f.overlay.primary_mode();
        f.overlay.deactivate_primary(&mut f.scene);
        f.overlay.activate_primary(&mut f.scene, &trail);
        let second = f.overlay.primary_mode();

        assert_eq!(first, Some(HighlightMode::Shape));
        assert_eq!(first, second);
    }

    #[test]
    fn layered_node_is_never_reparented() {
        let mut f = fixture();
        let holder = f.scene.create_node();
        f.scene.add_child(f.root, holder);
        let visual = f.scene.create_node();
        f.scene.add_child(holder, visual);
        f.scene.set_visible(visual, false);
        f.scene.set_highlight(
            f.leaf,
            HighlightSpec::Node {
                node: visual,
                layered: true,
                transform_source: None,
            },
        );

        f.focus.set_input(Some(input_target(&f)));
        settle(&mut f);
        assert_eq!(f.scene.parent(visual), Some(holder));
        assert!(f.scene.visible(visual));

        f.focus.set_input(None);
        settle(&mut f);
        assert_eq!(f.scene.parent(visual), Some(holder));
        assert!(!f.scene.visible(visual));
    }

    #[test]
    fn unlayered_node_attaches_on_activation_and_detaches_on_deactivation() {
        let mut f = fixture();
        let visual = f.scene.create_node();
        f.scene.set_visible(visual, false);
        f.scene.set_highlight(
            f.leaf,
            HighlightSpec::Node {
                node: visual,
                layered: false,
                transform_source: None,
            },
        );

        f.focus.set_input(Some(input_target(&f)));
        settle(&mut f);
        assert_eq!(f.scene.parent(visual), Some(f.overlay.primary_root));
        assert!(f.scene.visible(visual));

        f.focus.set_input(None);
        settle(&mut f);
        assert_eq!(f.scene.parent(visual), None);
        assert!(!f.scene.visible(visual));
    }

    #[test]
    fn externally_disposed_visual_is_skipped_on_deactivation() {
        let mut f = fixture();
        let visual = f.scene.create_node();
        f.scene.set_highlight(
            f.leaf,
            HighlightSpec::Node {
                node: visual,
                layered: false,
                transform_source: None,
            },
        );
        f.focus.set_input(Some(input_target(&f)));
        settle(&mut f);

        // The application destroys the visual while the highlight is active.
        f.scene.destroy_node(visual);

        f.focus.set_input(None);
        settle(&mut f);
        assert!(!f.overlay.has_primary_highlight());
        assert_eq!(f.scene.watch_count(), 0);
    }

    #[test]
    fn watch_count_returns_to_baseline_after_cycles() {
        let mut f = fixture();
        f.scene.set_group_highlight(f.root, GroupHighlight::Bounds);
        assert_eq!(f.scene.watch_count(), 0);

        for _ in 0..4 {
            f.focus.set_input(Some(input_target(&f)));
            settle(&mut f);
            assert!(f.scene.watch_count() > 0);

            f.focus.set_input(None);
            settle(&mut f);
            assert_eq!(f.scene.watch_count(), 0);
        }
    }

    #[test]
    fn ancestor_move_reapplies_the_tracked_matrix() {
        let mut f = fixture();
        f.focus.set_input(Some(input_target(&f)));
        settle(&mut f);

        f.scene.set_transform(f.root, Affine::translate((12.0, 3.0)));
        settle(&mut f);

        let matrix = f.overlay.primary.as_ref().map(|a| a.matrix);
        assert_eq!(matrix, Some(Affine::translate((12.0, 3.0))));
    }

    #[test]
    fn stroke_width_holds_constant_under_target_scale() {
        let mut f = fixture();
        f.focus.set_input(Some(input_target(&f)));
        settle(&mut f);

        f.scene.set_transform(f.root, Affine::scale(2.0));
        settle(&mut f);

        let base = f.overlay.theme().inner_width();
        let inner = f.overlay.primary.as_ref().map(|a| a.inner.width);
        assert_eq!(inner, Some(base / 2.0));
    }

    #[test]
    fn stroke_width_follows_global_zoom() {
        let mut f = fixture();
        f.focus.set_input(Some(input_target(&f)));
        settle(&mut f);

        // The whole scene is scaled 2× by the host's zoom: the tracked trail
        // carries the scale and the zoom cancels it out.
        f.scene.set_transform(f.root, Affine::scale(2.0));
        f.overlay.set_zoom(Affine::scale(2.0));
        settle(&mut f);

        let base = f.overlay.theme().inner_width();
        let inner = f.overlay.primary.as_ref().map(|a| a.inner.width);
        assert_eq!(inner, Some(base));
    }

    #[test]
    fn theme_edit_recolors_active_highlight() {
        let mut f = fixture();
        f.focus.set_input(Some(input_target(&f)));
        settle(&mut f);

        f.overlay
            .theme_mut()
            .set_colors(Rgba::rgb(255, 0, 0), Rgba::rgb(0, 0, 0));
        f.overlay.update(&mut f.scene, &f.focus, HOST);

        let inner = f.overlay.primary.as_ref().map(|a| a.inner.color);
        assert_eq!(inner, Some(Rgba::rgb(255, 0, 0)));
    }

    #[test]
    fn theme_edit_skips_node_mode_highlight() {
        let mut f = fixture();
        let visual = f.scene.create_node();
        f.scene.set_highlight(
            f.leaf,
            HighlightSpec::Node {
                node: visual,
                layered: false,
                transform_source: None,
            },
        );
        f.focus.set_input(Some(input_target(&f)));
        settle(&mut f);

        let before = f.overlay.primary.as_ref().map(|a| a.inner.color);
        f.overlay
            .theme_mut()
            .set_colors(Rgba::rgb(255, 0, 0), Rgba::rgb(0, 0, 0));
        f.overlay.update(&mut f.scene, &f.focus, HOST);
        let after = f.overlay.primary.as_ref().map(|a| a.inner.color);
        assert_eq!(before, after);
    }

    #[test]
    fn declaration_edit_while_focused_reactivates() {
        let mut f = fixture();
        f.focus.set_input(Some(input_target(&f)));
        settle(&mut f);
        assert_eq!(f.overlay.primary_mode(), Some(HighlightMode::Bounds));

        f.scene.set_highlight(
            f.leaf,
            HighlightSpec::Shape(HighlightShape::Rect(Rect::new(2.0, 2.0, 8.0, 8.0))),
        );
        settle(&mut f);
        assert_eq!(f.overlay.primary_mode(), Some(HighlightMode::Shape));
    }

    #[test]
    fn transform_source_tracks_the_alternate_trail() {
        let mut f = fixture();
        let anchor = f.scene.create_node();
        f.scene.add_child(f.root, anchor);
        let visual = f.scene.create_node();
        f.scene.set_highlight(
            f.leaf,
            HighlightSpec::Node {
                node: visual,
                layered: false,
                transform_source: Some(Trail::new(vec![f.root, anchor])),
            },
        );

        f.focus.set_input(Some(input_target(&f)));
        settle(&mut f);

        // Moving the anchor (not the focused leaf) moves the highlight.
        f.scene.set_transform(anchor, Affine::translate((5.0, 0.0)));
        settle(&mut f);
        let matrix = f.overlay.primary.as_ref().map(|a| a.matrix);
        assert_eq!(matrix, Some(Affine::translate((5.0, 0.0))));

        // Moving the focused leaf does not.
        f.scene.set_transform(f.leaf, Affine::translate((0.0, 9.0)));
        settle(&mut f);
        let matrix = f.overlay.primary.as_ref().map(|a| a.matrix);
        assert_eq!(matrix, Some(Affine::translate((5.0, 0.0))));
    }

    #[test]
    fn surface_resizes_to_host_dimensions() {
        let mut f = fixture();
        settle(&mut f);
        assert_eq!(f.overlay.surface().size(), HOST);

        let grown = Size::new(1024.0, 768.0);
        f.overlay.update(&mut f.scene, &f.focus, grown);
        assert_eq!(f.overlay.surface().size(), grown);
    }

    #[test]
    #[should_panic(expected = "no active primary highlight")]
    fn deactivating_without_active_state_is_a_contract_violation() {
        let mut f = fixture();
        f.overlay.deactivate_primary(&mut f.scene);
    }

    #[test]
    #[should_panic(expected = "already active")]
    fn double_activation_is_a_contract_violation() {
        let mut f = fixture();
        let trail = f.trail.clone();
        f.overlay.activate_primary(&mut f.scene, &trail);
        f.overlay.activate_primary(&mut f.scene, &trail);
    }
}
