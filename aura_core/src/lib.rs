// Copyright 2026 the Aura Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Focus-highlight overlay state machine for retained scene graphs.
//!
//! `aura_core` decides which node of a retained-mode scene currently
//! deserves a visible "focus ring" and maintains that ring as the scene
//! animates, pans, zooms, or re-focuses. It is `no_std` compatible (with
//! `alloc`) and uses array-based struct-of-arrays storage with index handles
//! for the scene substrate it observes.
//!
//! # Architecture
//!
//! The crate is organized around a frame loop that turns focus-signal and
//! scene mutations into incremental highlight updates:
//!
//! ```text
//!   Host mutations ──► SceneStore (dirty channels, watches)
//!   Focus mutations ──► FocusState (epoch)
//!            │
//!            ▼
//!   HighlightOverlay::update() ──► SceneStore::evaluate() ──► SceneChanges
//!            │
//!            ├─ focus epoch moved ──► activate / deactivate per channel
//!            ├─ watches fired ──► transform dirty, re-resolve, regenerate
//!            ▼
//!   OverlaySurface::plan() ──► composited above host content
//! ```
//!
//! **[`scene`]** — Struct-of-arrays node tree with generational handles,
//! multi-channel dirty tracking via `understory_dirty`, and the watch
//! registry (the transform-tracker primitive).
//!
//! **[`trail`]** — Immutable root-to-leaf node paths; focus identity as a
//! value rather than a live reference chain.
//!
//! **[`focus`]** — The four focus signals (input, pointer, locked pointer,
//! reading block) and three visibility toggles, epoch-counted.
//!
//! **[`highlight`]** — Highlight declarations and the pure resolver mapping
//! a declaration to one of four closed representation modes.
//!
//! **[`overlay`]** — The orchestrator: three highlight lifecycles (primary,
//! group, reading block), focus precedence, line-width correction, and the
//! overlay-owned surface.
//!
//! **[`theme`]** — Stroke colors/widths with epoch-based change detection.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! lifecycle instrumentation, with zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one
//!   branch per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod dirty;
pub mod display;
pub mod focus;
pub mod highlight;
pub mod overlay;
pub mod scene;
pub mod theme;
pub mod trace;
pub mod trail;
