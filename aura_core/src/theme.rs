// Copyright 2026 the Aura Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Highlight stroke colors and widths.
//!
//! [`HighlightTheme`] is an explicit value passed into the overlay's
//! constructor, not process-wide state. Every setter bumps an epoch counter,
//! so the overlay can detect live recoloring with a single integer compare
//! per frame and rewrite its cached stroke styles only when something
//! actually changed.

use core::fmt;

/// An 8-bit-per-channel RGBA color.
///
/// This type covers the subset of color handling the overlay actually needs
/// (store a value, compare it, hand it to the compositor) without pulling in
/// a color-management crate.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (255 = opaque).
    pub a: u8,
}

impl Rgba {
    /// Creates an opaque color from red, green, and blue channels.
    #[inline]
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Creates a color from all four channels.
    #[inline]
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl fmt::Debug for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

/// Stroke colors and widths for focus and group highlights.
///
/// Widths are in unscaled scene units; the overlay corrects them per frame so
/// apparent thickness stays constant under a target's own scale while still
/// following intentional global zoom.
#[derive(Clone, Debug, PartialEq)]
pub struct HighlightTheme {
    inner_color: Rgba,
    outer_color: Rgba,
    inner_width: f64,
    outer_width: f64,
    group_inner_color: Rgba,
    group_outer_color: Rgba,
    group_inner_width: f64,
    group_outer_width: f64,
    epoch: u64,
}

impl Default for HighlightTheme {
    fn default() -> Self {
        // The classic two-tone focus ring: a light inner stroke wrapped in a
        // darker outer stroke, readable on both light and dark content.
        Self {
            inner_color: Rgba::rgb(0x99, 0xcc, 0xff),
            outer_color: Rgba::rgb(0x2e, 0x44, 0x8c),
            inner_width: 2.5,
            outer_width: 4.0,
            group_inner_color: Rgba::rgb(0x99, 0xcc, 0xff),
            group_outer_color: Rgba::rgb(0x2e, 0x44, 0x8c),
            group_inner_width: 2.0,
            group_outer_width: 3.0,
            epoch: 0,
        }
    }
}

impl HighlightTheme {
    /// Creates the default theme.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the change epoch. Bumped by every setter; consumers cache the
    /// last epoch they applied and skip work while it is unchanged.
    #[inline]
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Inner stroke color for the primary and reading-block highlights.
    #[inline]
    #[must_use]
    pub const fn inner_color(&self) -> Rgba {
        self.inner_color
    }

    /// Outer stroke color for the primary and reading-block highlights.
    #[inline]
    #[must_use]
    pub const fn outer_color(&self) -> Rgba {
        self.outer_color
    }

    /// Inner stroke width in unscaled scene units.
    #[inline]
    #[must_use]
    pub const fn inner_width(&self) -> f64 {
        self.inner_width
    }

    /// Outer stroke width in unscaled scene units.
    #[inline]
    #[must_use]
    pub const fn outer_width(&self) -> f64 {
        self.outer_width
    }

    /// Inner stroke color for group highlights.
    #[inline]
    #[must_use]
    pub const fn group_inner_color(&self) -> Rgba {
        self.group_inner_color
    }

    /// Outer stroke color for group highlights.
    #[inline]
    #[must_use]
    pub const fn group_outer_color(&self) -> Rgba {
        self.group_outer_color
    }

    /// Inner stroke width for group highlights.
    #[inline]
    #[must_use]
    pub const fn group_inner_width(&self) -> f64 {
        self.group_inner_width
    }

    /// Outer stroke width for group highlights.
    #[inline]
    #[must_use]
    pub const fn group_outer_width(&self) -> f64 {
        self.group_outer_width
    }

    /// Sets the inner/outer colors of the primary highlight.
    pub fn set_colors(&mut self, inner: Rgba, outer: Rgba) {
        self.inner_color = inner;
        self.outer_color = outer;
        self.epoch += 1;
    }

    /// Sets the inner/outer colors of group highlights.
    pub fn set_group_colors(&mut self, inner: Rgba, outer: Rgba) {
        self.group_inner_color = inner;
        self.group_outer_color = outer;
        self.epoch += 1;
    }

    /// Sets the inner/outer stroke widths of the primary highlight.
    pub fn set_widths(&mut self, inner: f64, outer: f64) {
        self.inner_width = inner;
        self.outer_width = outer;
        self.epoch += 1;
    }

    /// Sets the inner/outer stroke widths of group highlights.
    pub fn set_group_widths(&mut self, inner: f64, outer: f64) {
        self.group_inner_width = inner;
        self.group_outer_width = outer;
        self.epoch += 1;
    }
}
