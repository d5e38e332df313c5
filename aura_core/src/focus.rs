// Copyright 2026 the Aura Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Focus signals and highlight visibility toggles.
//!
//! [`FocusState`] owns the four independent focus signals the overlay
//! consumes — input (keyboard) focus, pointer focus, locked-pointer focus,
//! and reading-block focus — plus the three visibility toggles. Each signal
//! is either empty or a [`FocusTarget`] naming a display and a trail.
//!
//! Every mutation bumps a single epoch counter. Consumers cache the epoch
//! they last saw and re-resolve only when it moved; there are no retained
//! listener callbacks to leak or to fire mid-teardown.

use crate::display::DisplayId;
use crate::trail::Trail;

/// A focused element: the display it lives on and the trail to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FocusTarget {
    /// Display the focused element belongs to.
    pub display: DisplayId,
    /// Root-to-target trail captured when focus changed.
    pub trail: Trail,
}

impl FocusTarget {
    /// Creates a focus target.
    #[must_use]
    pub fn new(display: DisplayId, trail: Trail) -> Self {
        Self { display, trail }
    }
}

/// The four focus signals and three visibility toggles.
///
/// Defaults match a keyboard-first host: input-focus highlights are visible,
/// interactive (pointer) and reading-block highlights start hidden until the
/// host enables those modalities.
#[derive(Clone, Debug)]
pub struct FocusState {
    input: Option<FocusTarget>,
    pointer: Option<FocusTarget>,
    locked_pointer: Option<FocusTarget>,
    reading_block: Option<FocusTarget>,
    input_highlights_visible: bool,
    interactive_highlights_visible: bool,
    reading_block_highlights_visible: bool,
    epoch: u64,
}

impl Default for FocusState {
    fn default() -> Self {
        Self {
            input: None,
            pointer: None,
            locked_pointer: None,
            reading_block: None,
            input_highlights_visible: true,
            interactive_highlights_visible: false,
            reading_block_highlights_visible: false,
            epoch: 0,
        }
    }
}

impl FocusState {
    /// Creates an empty focus state with default toggles.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the change epoch. Bumped by every setter.
    #[inline]
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Current input (keyboard) focus.
    #[inline]
    #[must_use]
    pub const fn input(&self) -> Option<&FocusTarget> {
        self.input.as_ref()
    }

    /// Current pointer focus.
    #[inline]
    #[must_use]
    pub const fn pointer(&self) -> Option<&FocusTarget> {
        self.pointer.as_ref()
    }

    /// Current locked-pointer focus (an in-progress interaction).
    #[inline]
    #[must_use]
    pub const fn locked_pointer(&self) -> Option<&FocusTarget> {
        self.locked_pointer.as_ref()
    }

    /// Current reading-block focus. Set by the embedding speech system only
    /// once it begins speaking, cleared when speaking stops.
    #[inline]
    #[must_use]
    pub const fn reading_block(&self) -> Option<&FocusTarget> {
        self.reading_block.as_ref()
    }

    /// Whether input-focus highlights are shown at all.
    #[inline]
    #[must_use]
    pub const fn input_highlights_visible(&self) -> bool {
        self.input_highlights_visible
    }

    /// Whether pointer ("interactive") highlights are shown at all.
    #[inline]
    #[must_use]
    pub const fn interactive_highlights_visible(&self) -> bool {
        self.interactive_highlights_visible
    }

    /// Whether reading-block highlights are shown at all.
    #[inline]
    #[must_use]
    pub const fn reading_block_highlights_visible(&self) -> bool {
        self.reading_block_highlights_visible
    }

    /// Sets or clears the input focus signal.
    pub fn set_input(&mut self, target: Option<FocusTarget>) {
        self.input = target;
        self.epoch += 1;
    }

    /// Sets or clears the pointer focus signal.
    pub fn set_pointer(&mut self, target: Option<FocusTarget>) {
        self.pointer = target;
        self.epoch += 1;
    }

    /// Sets or clears the locked-pointer focus signal.
    pub fn set_locked_pointer(&mut self, target: Option<FocusTarget>) {
        self.locked_pointer = target;
        self.epoch += 1;
    }

    /// Sets or clears the reading-block focus signal.
    pub fn set_reading_block(&mut self, target: Option<FocusTarget>) {
        self.reading_block = target;
        self.epoch += 1;
    }

    /// Toggles visibility of input-focus highlights.
    pub fn set_input_highlights_visible(&mut self, visible: bool) {
        self.input_highlights_visible = visible;
        self.epoch += 1;
    }

    /// Toggles visibility of pointer highlights.
    pub fn set_interactive_highlights_visible(&mut self, visible: bool) {
        self.interactive_highlights_visible = visible;
        self.epoch += 1;
    }

    /// Toggles visibility of reading-block highlights.
    pub fn set_reading_block_highlights_visible(&mut self, visible: bool) {
        self.reading_block_highlights_visible = visible;
        self.epoch += 1;
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::scene::SceneStore;

    fn target(display: u32, store: &mut SceneStore) -> FocusTarget {
        let root = store.create_node();
        let leaf = store.create_node();
        FocusTarget::new(DisplayId(display), Trail::new(vec![root, leaf]))
    }

    #[test]
    fn signals_are_independent() {
        let mut store = SceneStore::new();
        let mut focus = FocusState::new();

        let a = target(0, &mut store);
        let b = target(0, &mut store);
        focus.set_input(Some(a.clone()));
        focus.set_pointer(Some(b.clone()));

        assert_eq!(focus.input(), Some(&a));
        assert_eq!(focus.pointer(), Some(&b));
        assert!(focus.locked_pointer().is_none());
        assert!(focus.reading_block().is_none());

        focus.set_input(None);
        assert!(focus.input().is_none());
        assert_eq!(focus.pointer(), Some(&b));
    }

    #[test]
    fn every_setter_bumps_epoch() {
        let mut store = SceneStore::new();
        let mut focus = FocusState::new();
        let t = target(0, &mut store);

        let mut last = focus.epoch();
        focus.set_input(Some(t.clone()));
        assert!(focus.epoch() > last);
        last = focus.epoch();

        focus.set_reading_block(Some(t));
        assert!(focus.epoch() > last);
        last = focus.epoch();

        focus.set_interactive_highlights_visible(true);
        assert!(focus.epoch() > last);
    }

    #[test]
    fn default_toggles_are_keyboard_first() {
        let focus = FocusState::new();
        assert!(focus.input_highlights_visible());
        assert!(!focus.interactive_highlights_visible());
        assert!(!focus.reading_block_highlights_visible());
    }
}
