// Copyright 2026 the Aura Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event recording with JSON-lines export.
//!
//! [`RecorderSink`] implements [`TraceSink`] and collects events into a
//! `Vec<RecordedEvent>`. [`RecorderSink::to_json_lines`] serializes them one
//! JSON object per line for offline analysis (grep, jq, spreadsheets).

use aura_core::highlight::HighlightMode;
use aura_core::trace::{
    ActivateEvent, DeactivateEvent, FocusResolvedEvent, HighlightChannel, RedrawEvent, TraceSink,
};
use serde_json::json;

/// One recorded overlay lifecycle event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A highlight activated.
    Activate {
        /// The channel that activated.
        channel: HighlightChannel,
        /// The resolved representation.
        mode: HighlightMode,
        /// Raw slot index of the target node.
        target_index: u32,
    },
    /// A highlight deactivated.
    Deactivate {
        /// The channel that deactivated.
        channel: HighlightChannel,
    },
    /// Focus resolution picked or cleared a primary target.
    FocusResolved {
        /// Raw slot index of the chosen target, if any.
        target_index: Option<u32>,
    },
    /// The overlay surface was redrawn.
    Redraw {
        /// Number of items in the new plan.
        items: usize,
    },
}

/// A [`TraceSink`] that records events in memory.
#[derive(Debug, Default)]
pub struct RecorderSink {
    events: Vec<RecordedEvent>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded events in order.
    #[must_use]
    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// Consumes the recorder and returns the recorded events.
    #[must_use]
    pub fn into_events(self) -> Vec<RecordedEvent> {
        self.events
    }

    /// Serializes the recording as one JSON object per line.
    #[must_use]
    pub fn to_json_lines(&self) -> String {
        let mut out = String::new();
        for event in &self.events {
            let value = match *event {
                RecordedEvent::Activate {
                    channel,
                    mode,
                    target_index,
                } => json!({
                    "event": "activate",
                    "channel": format!("{channel:?}"),
                    "mode": format!("{mode:?}"),
                    "target": target_index,
                }),
                RecordedEvent::Deactivate { channel } => json!({
                    "event": "deactivate",
                    "channel": format!("{channel:?}"),
                }),
                RecordedEvent::FocusResolved { target_index } => json!({
                    "event": "focus_resolved",
                    "target": target_index,
                }),
                RecordedEvent::Redraw { items } => json!({
                    "event": "redraw",
                    "items": items,
                }),
            };
            out.push_str(&value.to_string());
            out.push('\n');
        }
        out
    }
}

impl TraceSink for RecorderSink {
    fn on_activate(&mut self, e: &ActivateEvent) {
        self.events.push(RecordedEvent::Activate {
            channel: e.channel,
            mode: e.mode,
            target_index: e.target_index,
        });
    }

    fn on_deactivate(&mut self, e: &DeactivateEvent) {
        self.events
            .push(RecordedEvent::Deactivate { channel: e.channel });
    }

    fn on_focus_resolved(&mut self, e: &FocusResolvedEvent) {
        self.events.push(RecordedEvent::FocusResolved {
            target_index: e.target_index,
        });
    }

    fn on_redraw(&mut self, e: &RedrawEvent) {
        self.events.push(RecordedEvent::Redraw { items: e.items });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let mut sink = RecorderSink::new();
        sink.on_activate(&ActivateEvent {
            channel: HighlightChannel::Primary,
            mode: HighlightMode::Shape,
            target_index: 2,
        });
        sink.on_redraw(&RedrawEvent { items: 1 });
        sink.on_deactivate(&DeactivateEvent {
            channel: HighlightChannel::Primary,
        });

        assert_eq!(
            sink.events(),
            &[
                RecordedEvent::Activate {
                    channel: HighlightChannel::Primary,
                    mode: HighlightMode::Shape,
                    target_index: 2,
                },
                RecordedEvent::Redraw { items: 1 },
                RecordedEvent::Deactivate {
                    channel: HighlightChannel::Primary,
                },
            ]
        );
    }

    #[test]
    fn json_lines_round_trip_through_parser() {
        let mut sink = RecorderSink::new();
        sink.on_focus_resolved(&FocusResolvedEvent {
            target_index: Some(9),
        });
        sink.on_focus_resolved(&FocusResolvedEvent { target_index: None });

        let lines: Vec<serde_json::Value> = sink
            .to_json_lines()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "focus_resolved");
        assert_eq!(lines[0]["target"], 9);
        assert!(lines[1]["target"].is_null());
    }
}
