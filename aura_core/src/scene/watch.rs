// Copyright 2026 the Aura Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Watch registry: the transform-tracker primitive.
//!
//! A *watch* is a registration that observes scene state through the dirty
//! tracker. Watches are synthetic keys in the same keyspace as node slots
//! (distinguished by a high bit), with dependency edges to the nodes they
//! observe. An eager mark on any observed node propagates to the watch key,
//! and [`SceneStore::evaluate`](super::SceneStore::evaluate) reports the
//! watch as fired.
//!
//! Two kinds exist:
//!
//! - **Transform watches** ([`SceneStore::track_trail`]) — edges to every
//!   node along a trail on the TRANSFORM channel; fire when anything along
//!   the trail moves, including visibility toggles routed through that
//!   channel.
//! - **Node watches** ([`SceneStore::watch_bounds`],
//!   [`SceneStore::watch_highlight`]) — one edge to one node on the BOUNDS
//!   or HIGHLIGHT channel.
//!
//! Releasing a watch removes exactly the edges it registered, so watch
//! counts return to baseline after symmetric register/release sequences —
//! the property the overlay's leak tests pin down.

use alloc::vec::Vec;

use kurbo::Affine;
use understory_dirty::Channel;

use crate::dirty;
use crate::trail::Trail;

use super::id::{NodeId, WATCH_KEY_TAG, WatchId};
use super::store::SceneStore;

/// Internal bookkeeping for one watch slot.
#[derive(Debug)]
pub(crate) struct WatchSlot {
    pub(crate) generation: u32,
    pub(crate) live: bool,
    /// The exact dependency edges this watch registered, as
    /// `(node slot, channel)` pairs, so release can remove them precisely.
    pub(crate) edges: Vec<(u32, Channel)>,
}

impl SceneStore {
    /// Registers a transform watch over every node of `trail`.
    ///
    /// The watch fires whenever a local transform or visibility flag changes
    /// anywhere along the trail.
    ///
    /// # Panics
    ///
    /// Panics if any trail node handle is stale.
    pub fn track_trail(&mut self, trail: &Trail) -> WatchId {
        let edges: Vec<(u32, Channel)> = trail
            .nodes()
            .iter()
            .map(|&node| {
                self.validate(node);
                (node.idx, dirty::TRANSFORM)
            })
            .collect();
        self.register_watch(edges)
    }

    /// Registers a watch on one node's local bounds.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn watch_bounds(&mut self, node: NodeId) -> WatchId {
        self.validate(node);
        self.register_watch(alloc::vec![(node.idx, dirty::BOUNDS)])
    }

    /// Registers a watch on one node's highlight declarations.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn watch_highlight(&mut self, node: NodeId) -> WatchId {
        self.validate(node);
        self.register_watch(alloc::vec![(node.idx, dirty::HIGHLIGHT)])
    }

    /// Releases a watch, removing every dependency edge it registered.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale (already released).
    pub fn release_watch(&mut self, id: WatchId) {
        self.validate_watch(id);
        let key = WATCH_KEY_TAG | id.idx;

        let slot = &mut self.watches[id.idx as usize];
        slot.live = false;
        slot.generation += 1;
        let edges = core::mem::take(&mut slot.edges);
        for (node_idx, channel) in edges {
            self.dirty.remove_dependency(key, node_idx, channel);
        }
        // Drop any mark still pending on the watch key itself.
        self.dirty.remove_key(key);

        self.watch_free.push(id.idx);
        self.live_watches -= 1;
    }

    /// Returns the number of live watches.
    ///
    /// Leak tests assert this returns to its baseline after N symmetric
    /// activate/deactivate cycles.
    #[must_use]
    pub fn watch_count(&self) -> usize {
        self.live_watches
    }

    /// Returns whether the given watch handle is live.
    #[must_use]
    pub fn watch_is_alive(&self, id: WatchId) -> bool {
        (id.idx as usize) < self.watches.len() && {
            let slot = &self.watches[id.idx as usize];
            slot.live && slot.generation == id.generation
        }
    }

    /// Composes the local transforms along `trail`, root to leaf.
    ///
    /// Returns `None` if any trail node has been destroyed — the caller
    /// treats the whole trail as gone rather than observing a half-valid
    /// matrix.
    #[must_use]
    pub fn trail_transform(&self, trail: &Trail) -> Option<Affine> {
        let mut matrix = Affine::IDENTITY;
        for &node in trail.nodes() {
            if !self.is_alive(node) {
                return None;
            }
            matrix = matrix * self.local_transform[node.idx as usize];
        }
        Some(matrix)
    }

    // -- Internal --

    fn register_watch(&mut self, edges: Vec<(u32, Channel)>) -> WatchId {
        let idx = if let Some(idx) = self.watch_free.pop() {
            let slot = &mut self.watches[idx as usize];
            slot.live = true;
            slot.edges = edges;
            idx
        } else {
            let idx = u32::try_from(self.watches.len()).expect("watch table overflow");
            self.watches.push(WatchSlot {
                generation: 0,
                live: true,
                edges,
            });
            idx
        };

        let key = WATCH_KEY_TAG | idx;
        for &(node_idx, channel) in &self.watches[idx as usize].edges {
            let _ = self.dirty.add_dependency(key, node_idx, channel);
        }

        self.live_watches += 1;
        WatchId {
            idx,
            generation: self.watches[idx as usize].generation,
        }
    }

    /// Panics if the watch handle is stale.
    fn validate_watch(&self, id: WatchId) {
        assert!(
            (id.idx as usize) < self.watches.len()
                && self.watches[id.idx as usize].live
                && self.watches[id.idx as usize].generation == id.generation,
            "stale WatchId: {id:?}"
        );
    }

    /// Maps a drained dirty-tracker key back to a live watch handle.
    pub(crate) fn watch_id_from_key(&self, key: u32) -> Option<WatchId> {
        if key & WATCH_KEY_TAG == 0 {
            return None;
        }
        let idx = key & !WATCH_KEY_TAG;
        let slot = self.watches.get(idx as usize)?;
        slot.live.then_some(WatchId {
            idx,
            generation: slot.generation,
        })
    }
}
