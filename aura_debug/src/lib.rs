// Copyright 2026 the Aura Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording and pretty-printing for aura overlay diagnostics.
//!
//! This crate provides [`TraceSink`](aura_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`] — human-readable one-line-per-event output.
//! - [`record::RecorderSink`] — in-memory event recording with JSON-lines
//!   export for offline analysis.

pub mod pretty;
pub mod record;
