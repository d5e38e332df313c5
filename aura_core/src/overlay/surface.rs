// Copyright 2026 the Aura Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The overlay's private drawing surface.
//!
//! [`OverlaySurface`] is fully owned by the overlay. Each redraw replaces its
//! [`HighlightPlan`] — an ordered list of draw items the embedding renderer
//! composites above host content. Items carry no hit-testing data, so the
//! surface can never intercept pointer or keyboard input.

use alloc::vec::Vec;

use kurbo::{Affine, Size};

use crate::highlight::HighlightShape;
use crate::scene::NodeId;
use crate::theme::Rgba;

/// One stroke of a highlight ring: a color and a corrected width.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    /// Stroke color.
    pub color: Rgba,
    /// Stroke width after line-width correction, in scene units.
    pub width: f64,
}

/// A single draw command in the highlight plan.
///
/// Items are produced in back-to-front order: group highlight first, then
/// the primary highlight, then the reading-block highlight.
#[derive(Clone, Debug)]
pub enum HighlightItem {
    /// Stroke a shape twice — outer ring beneath, inner ring on top — so the
    /// highlight reads on both light and dark content.
    Stroke {
        /// Geometry in the tracked node's local space.
        shape: HighlightShape,
        /// Placement of the geometry in scene space.
        transform: Affine,
        /// Inner ring style.
        inner: StrokeStyle,
        /// Outer ring style.
        outer: StrokeStyle,
    },
    /// Composite the subtree under an overlay-owned container node, placed
    /// at the tracked transform. Used for unlayered caller-supplied visuals.
    Subtree {
        /// The overlay's container node holding the visual.
        root: NodeId,
        /// Placement of the container in scene space.
        transform: Affine,
    },
}

/// The ordered draw items for one redraw of the overlay surface.
#[derive(Clone, Debug, Default)]
pub struct HighlightPlan {
    /// Draw items in back-to-front order.
    pub items: Vec<HighlightItem>,
}

impl HighlightPlan {
    /// Returns whether the plan draws nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The overlay-owned surface: current size, latest plan, and a redraw
/// counter.
///
/// The counter only advances when a redraw actually happens, which is what
/// lets tests pin the "two updates with no change do zero redraw work"
/// property.
#[derive(Debug)]
pub struct OverlaySurface {
    size: Size,
    plan: HighlightPlan,
    draw_count: u64,
}

impl OverlaySurface {
    pub(crate) fn new() -> Self {
        Self {
            size: Size::ZERO,
            plan: HighlightPlan::default(),
            draw_count: 0,
        }
    }

    /// Returns the current surface size.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    pub(crate) fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    /// Returns the most recently drawn plan — the composable output handle
    /// the embedding renderer stacks above host content.
    #[inline]
    #[must_use]
    pub const fn plan(&self) -> &HighlightPlan {
        &self.plan
    }

    /// Returns how many times the surface has been redrawn.
    #[inline]
    #[must_use]
    pub const fn draw_count(&self) -> u64 {
        self.draw_count
    }

    pub(crate) fn submit(&mut self, plan: HighlightPlan) {
        self.plan = plan;
        self.draw_count += 1;
    }
}
