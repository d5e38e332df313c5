// Copyright 2026 the Aura Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display identification.
//!
//! [`DisplayId`] is a lightweight handle identifying the display a focus
//! target lives on. Hosts assign these; core treats them as opaque.

use core::fmt;

/// Identifies a specific display.
///
/// Hosts running several displays create one overlay per display and tag
/// focus targets with the display they belong to. Core code passes the value
/// through without interpreting it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DisplayId(pub u32);

impl fmt::Debug for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DisplayId({})", self.0)
    }
}
