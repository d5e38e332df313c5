// Copyright 2026 the Aura Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame evaluation and change tracking.
//!
//! Evaluation follows a drain-recompute pattern for each dirty channel:
//!
//! 1. **TRANSFORM** — Drain dirty keys. Node keys get their
//!    `world_transform` recomputed as `parent_world * local_transform`,
//!    walking the cached pre-order traversal so parents are always refreshed
//!    before children regardless of drain order. Watch keys are reported as
//!    fired.
//! 2. **BOUNDS** / **HIGHLIGHT** — Drain dirty keys (no recomputation; the
//!    overlay reads current values directly from the store). Watch keys are
//!    reported as fired.
//! 3. **TOPOLOGY** — Drain and discard (the traversal order was already
//!    rebuilt at the start of evaluation if needed).
//!
//! [`SceneChanges`] uses raw slot indices (`u32`) for node lists, matching
//! how hosts consume them, and resolved [`WatchId`] handles for fired
//! watches, which is what the overlay keys its bookkeeping on.

use alloc::vec::Vec;

use kurbo::Affine;

use crate::dirty;

use super::id::{INVALID, WATCH_KEY_TAG, WatchId};
use super::store::SceneStore;

/// The set of changes produced by a single [`SceneStore::evaluate`] call.
#[derive(Clone, Debug, Default)]
pub struct SceneChanges {
    /// Nodes whose world transform was recomputed (includes visibility
    /// toggles, which are routed through the same channel).
    pub transforms: Vec<u32>,
    /// Nodes whose local bounds changed.
    pub bounds: Vec<u32>,
    /// Nodes whose highlight declarations changed.
    pub highlights: Vec<u32>,
    /// Nodes added since the last evaluate.
    pub added: Vec<u32>,
    /// Nodes removed since the last evaluate.
    pub removed: Vec<u32>,
    /// Whether the tree topology changed (traversal order was rebuilt).
    pub topology_changed: bool,
    /// Watches whose observed state changed, across all channels.
    pub fired: Vec<WatchId>,
}

impl SceneChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.transforms.clear();
        self.bounds.clear();
        self.highlights.clear();
        self.added.clear();
        self.removed.clear();
        self.topology_changed = false;
        self.fired.clear();
    }

    /// Returns whether this evaluation observed no change at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
            && self.bounds.is_empty()
            && self.highlights.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && !self.topology_changed
            && self.fired.is_empty()
    }
}

impl SceneStore {
    /// Evaluates the scene, recomputing dirty properties and returning the
    /// set of changes.
    pub fn evaluate(&mut self) -> SceneChanges {
        let mut changes = SceneChanges::default();
        self.evaluate_into(&mut changes);
        changes
    }

    /// Like [`evaluate`](Self::evaluate), but reuses a caller-provided
    /// buffer to avoid allocation.
    pub fn evaluate_into(&mut self, changes: &mut SceneChanges) {
        changes.clear();

        // Rebuild traversal order if needed.
        if self.traversal_dirty {
            self.rebuild_traversal_order();
            changes.topology_changed = true;
            self.traversal_dirty = false;
        }

        // Drain TRANSFORM — split node keys from watch keys.
        let drained: Vec<u32> = self
            .dirty
            .drain(dirty::TRANSFORM)
            .affected()
            .deterministic()
            .run()
            .collect();
        let mut dirty_nodes: Vec<u32> = Vec::with_capacity(drained.len());
        for key in drained {
            if key & WATCH_KEY_TAG != 0 {
                if let Some(id) = self.watch_id_from_key(key) {
                    changes.fired.push(id);
                }
            } else {
                dirty_nodes.push(key);
            }
        }

        // Recompute world transforms in pre-order so a parent is always
        // refreshed before its children, whatever order the drain produced.
        for i in 0..self.traversal_order.len() {
            let idx = self.traversal_order[i];
            if !dirty_nodes.contains(&idx) {
                continue;
            }
            let parent_idx = self.parent[idx as usize];
            let parent_world = if parent_idx != INVALID {
                self.world_transform[parent_idx as usize]
            } else {
                Affine::IDENTITY
            };
            self.world_transform[idx as usize] =
                parent_world * self.local_transform[idx as usize];
        }
        changes.transforms = dirty_nodes;

        // Drain BOUNDS.
        let drained: Vec<u32> = self
            .dirty
            .drain(dirty::BOUNDS)
            .affected()
            .deterministic()
            .run()
            .collect();
        for key in drained {
            if key & WATCH_KEY_TAG != 0 {
                if let Some(id) = self.watch_id_from_key(key) {
                    changes.fired.push(id);
                }
            } else {
                changes.bounds.push(key);
            }
        }

        // Drain HIGHLIGHT.
        let drained: Vec<u32> = self
            .dirty
            .drain(dirty::HIGHLIGHT)
            .affected()
            .deterministic()
            .run()
            .collect();
        for key in drained {
            if key & WATCH_KEY_TAG != 0 {
                if let Some(id) = self.watch_id_from_key(key) {
                    changes.fired.push(id);
                }
            } else {
                changes.highlights.push(key);
            }
        }

        // Drain TOPOLOGY (just consume, changes are structural).
        let _: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();

        // Move lifecycle lists.
        core::mem::swap(&mut self.pending_added, &mut changes.added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);
    }

    /// Returns the current traversal order (depth-first pre-order).
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called at
    /// least once.
    #[must_use]
    pub fn traversal_order(&self) -> &[u32] {
        &self.traversal_order
    }

    /// Rebuilds the depth-first pre-order traversal of all live nodes.
    fn rebuild_traversal_order(&mut self) {
        self.traversal_order.clear();
        // Start from roots.
        for idx in 0..self.len {
            if self.parent[idx as usize] == INVALID && !self.free_list.contains(&idx) {
                self.dfs_collect(idx);
            }
        }
    }

    /// Depth-first pre-order collection starting from `idx`.
    fn dfs_collect(&mut self, idx: u32) {
        self.traversal_order.push(idx);
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            self.dfs_collect(child);
            child = self.next_sibling[child as usize];
        }
    }
}
