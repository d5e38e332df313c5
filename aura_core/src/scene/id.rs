// Copyright 2026 the Aura Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node and watch identity types.

use core::fmt;

/// Sentinel value indicating "no node" in index fields.
pub const INVALID: u32 = u32::MAX;

/// Bit tag distinguishing watch keys from node slot indices inside the shared
/// dirty-tracker keyspace. Node slot indices stay below this bit.
pub(crate) const WATCH_KEY_TAG: u32 = 0x8000_0000;

/// A handle to a node in a [`SceneStore`](super::SceneStore).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after a node is destroyed and the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    /// Slot index into the store's arrays.
    pub(crate) idx: u32,
    /// Generation counter — must match the store's generation for this slot.
    pub(crate) generation: u32,
}

impl NodeId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}@gen{})", self.idx, self.generation)
    }
}

/// A handle to a registered watch in a [`SceneStore`](super::SceneStore).
///
/// Watches observe either every node along a trail (transform watches) or a
/// single node on a single channel (bounds/highlight watches). Like
/// [`NodeId`], the handle carries a generation counter so releasing a watch
/// invalidates outstanding copies.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId {
    /// Slot index into the store's watch table.
    pub(crate) idx: u32,
    /// Generation counter for the watch slot.
    pub(crate) generation: u32,
}

impl WatchId {
    /// Returns the raw watch slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }
}

impl fmt::Debug for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WatchId({}@gen{})", self.idx, self.generation)
    }
}
