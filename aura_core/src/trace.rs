// Copyright 2026 the Aura Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the overlay lifecycle.
//!
//! This module provides a [`TraceSink`] trait with per-event methods the
//! overlay calls as highlights activate, deactivate, and redraw. All method
//! bodies default to no-ops, so implementing only the events you care about
//! is fine.
//!
//! [`Tracer`] wraps an optional boxed sink. When the `trace` feature is
//! **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace` — enables the `Tracer` method bodies (one branch per call).

use core::fmt;

#[cfg(feature = "trace")]
use alloc::boxed::Box;
#[cfg(not(feature = "trace"))]
use core::marker::PhantomData;

use crate::highlight::HighlightMode;

/// Which highlight channel an event belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HighlightChannel {
    /// The primary (input/pointer focus) channel.
    Primary,
    /// The ancestor group channel.
    Group,
    /// The reading-block (speech) channel.
    ReadingBlock,
}

/// Emitted when a highlight activates on a channel.
#[derive(Clone, Copy, Debug)]
pub struct ActivateEvent {
    /// Which channel activated.
    pub channel: HighlightChannel,
    /// The resolved representation.
    pub mode: HighlightMode,
    /// Raw slot index of the target node (diagnostics only).
    pub target_index: u32,
}

/// Emitted when a highlight deactivates on a channel.
#[derive(Clone, Copy, Debug)]
pub struct DeactivateEvent {
    /// Which channel deactivated.
    pub channel: HighlightChannel,
}

/// Emitted when focus resolution picks (or clears) a primary target.
#[derive(Clone, Copy, Debug)]
pub struct FocusResolvedEvent {
    /// Raw slot index of the chosen target, if any.
    pub target_index: Option<u32>,
}

/// Emitted when the overlay surface is redrawn.
#[derive(Clone, Copy, Debug)]
pub struct RedrawEvent {
    /// Number of items in the new plan.
    pub items: usize,
}

/// Receives overlay lifecycle events. All methods default to no-ops.
pub trait TraceSink {
    /// A highlight activated.
    fn on_activate(&mut self, event: &ActivateEvent) {
        let _ = event;
    }

    /// A highlight deactivated.
    fn on_deactivate(&mut self, event: &DeactivateEvent) {
        let _ = event;
    }

    /// Focus resolution picked or cleared a primary target.
    fn on_focus_resolved(&mut self, event: &FocusResolvedEvent) {
        let _ = event;
    }

    /// The overlay surface was redrawn.
    fn on_redraw(&mut self, event: &RedrawEvent) {
        let _ = event;
    }
}

/// Zero-overhead dispatch wrapper around an optional [`TraceSink`].
///
/// With the `trace` feature disabled this type is a unit and every method
/// body is empty; nothing is ever allocated or branched on.
#[derive(Default)]
pub struct Tracer {
    #[cfg(feature = "trace")]
    sink: Option<Box<dyn TraceSink>>,
    #[cfg(not(feature = "trace"))]
    _off: PhantomData<()>,
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        #[cfg(feature = "trace")]
        let attached = self.sink.is_some();
        #[cfg(not(feature = "trace"))]
        let attached = false;
        f.debug_struct("Tracer").field("attached", &attached).finish()
    }
}

impl Tracer {
    /// Creates a tracer with no sink attached.
    #[must_use]
    pub fn off() -> Self {
        Self::default()
    }

    /// Attaches a sink (only meaningful with the `trace` feature).
    #[cfg(feature = "trace")]
    #[must_use]
    pub fn new(sink: Box<dyn TraceSink>) -> Self {
        Self { sink: Some(sink) }
    }

    #[inline]
    pub(crate) fn activate(&mut self, event: &ActivateEvent) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_activate(event);
        }
        #[cfg(not(feature = "trace"))]
        let _ = event;
    }

    #[inline]
    pub(crate) fn deactivate(&mut self, event: &DeactivateEvent) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_deactivate(event);
        }
        #[cfg(not(feature = "trace"))]
        let _ = event;
    }

    #[inline]
    pub(crate) fn focus_resolved(&mut self, event: &FocusResolvedEvent) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_focus_resolved(event);
        }
        #[cfg(not(feature = "trace"))]
        let _ = event;
    }

    #[inline]
    pub(crate) fn redraw(&mut self, event: &RedrawEvent) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_redraw(event);
        }
        #[cfg(not(feature = "trace"))]
        let _ = event;
    }
}
