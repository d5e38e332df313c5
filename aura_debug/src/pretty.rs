// Copyright 2026 the Aura Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per
//! event to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use aura_core::trace::{
    ActivateEvent, DeactivateEvent, FocusResolvedEvent, HighlightChannel, RedrawEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write)
/// destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }
}

fn channel_name(channel: HighlightChannel) -> &'static str {
    match channel {
        HighlightChannel::Primary => "primary",
        HighlightChannel::Group => "group",
        HighlightChannel::ReadingBlock => "reading-block",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_activate(&mut self, e: &ActivateEvent) {
        let _ = writeln!(
            self.writer,
            "[activate] channel={} mode={:?} target={}",
            channel_name(e.channel),
            e.mode,
            e.target_index,
        );
    }

    fn on_deactivate(&mut self, e: &DeactivateEvent) {
        let _ = writeln!(
            self.writer,
            "[deactivate] channel={}",
            channel_name(e.channel),
        );
    }

    fn on_focus_resolved(&mut self, e: &FocusResolvedEvent) {
        match e.target_index {
            Some(idx) => {
                let _ = writeln!(self.writer, "[focus] target={idx}");
            }
            None => {
                let _ = writeln!(self.writer, "[focus] target=none");
            }
        }
    }

    fn on_redraw(&mut self, e: &RedrawEvent) {
        let _ = writeln!(self.writer, "[redraw] items={}", e.items);
    }
}
