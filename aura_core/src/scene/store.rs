// Copyright 2026 the Aura Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays scene storage with allocation, topology, and property
//! management.

use alloc::vec::Vec;

use kurbo::{Affine, Rect};
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use crate::dirty;
use crate::highlight::{GroupHighlight, HighlightSpec};

use super::id::{INVALID, NodeId};
use super::traverse::Children;
use super::watch::WatchSlot;

/// Struct-of-arrays storage for all scene nodes the overlay observes.
///
/// Nodes are addressed by [`NodeId`] handles. Internally, each node occupies
/// a slot in parallel arrays. Destroyed nodes are recycled via a free list,
/// and generation counters prevent stale handle access.
///
/// Property mutations automatically mark the appropriate dirty channel;
/// [`evaluate`](Self::evaluate) drains all channels once per frame.
#[derive(Debug)]
pub struct SceneStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Local properties (set by callers) --
    pub(crate) local_transform: Vec<Affine>,
    pub(crate) local_bounds: Vec<Rect>,
    pub(crate) visible: Vec<bool>,
    pub(crate) highlight: Vec<HighlightSpec>,
    pub(crate) speaking_highlight: Vec<HighlightSpec>,
    pub(crate) group_highlight: Vec<GroupHighlight>,
    pub(crate) pointer_highlightable: Vec<bool>,
    pub(crate) reading_block: Vec<bool>,

    // -- Computed properties (written by evaluate) --
    pub(crate) world_transform: Vec<Affine>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Traversal cache --
    pub(crate) traversal_order: Vec<u32>,
    pub(crate) traversal_dirty: bool,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,

    // -- Watch registry --
    pub(crate) watches: Vec<WatchSlot>,
    pub(crate) watch_free: Vec<u32>,
    pub(crate) live_watches: usize,
}

impl Default for SceneStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneStore {
    /// Creates an empty scene store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            local_transform: Vec::new(),
            local_bounds: Vec::new(),
            visible: Vec::new(),
            highlight: Vec::new(),
            speaking_highlight: Vec::new(),
            group_highlight: Vec::new(),
            pointer_highlightable: Vec::new(),
            reading_block: Vec::new(),
            world_transform: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            traversal_order: Vec::new(),
            traversal_dirty: true,
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
            watches: Vec::new(),
            watch_free: Vec::new(),
            live_watches: 0,
        }
    }

    // -- Allocation API --

    /// Creates a new node and returns its handle.
    ///
    /// The node starts with an identity transform, empty bounds, visible,
    /// default highlight declarations, and no parent.
    pub fn create_node(&mut self) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            self.generation[idx as usize] += 1;
            self.parent[idx as usize] = INVALID;
            self.first_child[idx as usize] = INVALID;
            self.next_sibling[idx as usize] = INVALID;
            self.prev_sibling[idx as usize] = INVALID;
            self.local_transform[idx as usize] = Affine::IDENTITY;
            self.local_bounds[idx as usize] = Rect::ZERO;
            self.visible[idx as usize] = true;
            self.highlight[idx as usize] = HighlightSpec::default();
            self.speaking_highlight[idx as usize] = HighlightSpec::default();
            self.group_highlight[idx as usize] = GroupHighlight::default();
            self.pointer_highlightable[idx as usize] = false;
            self.reading_block[idx as usize] = false;
            self.world_transform[idx as usize] = Affine::IDENTITY;
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.local_transform.push(Affine::IDENTITY);
            self.local_bounds.push(Rect::ZERO);
            self.visible.push(true);
            self.highlight.push(HighlightSpec::default());
            self.speaking_highlight.push(HighlightSpec::default());
            self.group_highlight.push(GroupHighlight::default());
            self.pointer_highlightable.push(false);
            self.reading_block.push(false);
            self.world_transform.push(Affine::IDENTITY);
            self.generation.push(0);
            idx
        };

        self.traversal_dirty = true;
        self.pending_added.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);

        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Destroys a node, freeing its slot for reuse.
    ///
    /// If the node is attached to a parent it is unlinked first, so a host
    /// may destroy a highlight visual while the overlay still references it;
    /// the overlay detects the stale handle and skips its teardown touch.
    ///
    /// # Panics
    ///
    /// Panics if the node has children (remove them first) or if the handle
    /// is stale.
    pub fn destroy_node(&mut self, id: NodeId) {
        self.validate(id);
        let idx = id.idx;
        assert!(
            self.first_child[idx as usize] == INVALID,
            "cannot destroy node with children"
        );

        if self.parent[idx as usize] != INVALID {
            self.unlink_from_parent(idx);
        }

        // Remove dirty tracking dependencies (including edges from watches).
        self.dirty.remove_key(idx);

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;

        self.free_list.push(idx);
        self.traversal_dirty = true;
        self.pending_removed.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    // -- Topology API --

    /// Adds `child` as the last child of `parent`.
    ///
    /// Marks the TRANSFORM channel for `child`'s subtree so world transforms
    /// are recomputed under the new ancestry.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or if `child` already has a parent.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );

        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            // Walk to last child.
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }

        // Dirty dependency edge: child depends on parent for TRANSFORM.
        let _ = self.dirty.add_dependency(c, p, dirty::TRANSFORM);

        self.dirty.mark_with(c, dirty::TRANSFORM, &EagerPolicy);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Removes `child` from its current parent.
    ///
    /// Marks the TRANSFORM channel for `child`'s subtree so world transforms
    /// are recomputed after detaching from the old ancestry.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node has no parent.
    pub fn remove_from_parent(&mut self, child: NodeId) {
        self.validate(child);
        let c = child.idx;
        assert!(self.parent[c as usize] != INVALID, "node has no parent");

        let p = self.parent[c as usize];
        self.unlink_from_parent(c);

        self.dirty.remove_dependency(c, p, dirty::TRANSFORM);

        self.dirty.mark_with(c, dirty::TRANSFORM, &EagerPolicy);
        self.traversal_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Returns the parent of a node, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        if p == INVALID {
            None
        } else {
            Some(NodeId {
                idx: p,
                generation: self.generation[p as usize],
            })
        }
    }

    /// Returns an iterator over the direct children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    // -- Property getters (read-only, no dirty marking) --

    /// Returns the local transform of a node.
    #[must_use]
    pub fn local_transform(&self, id: NodeId) -> Affine {
        self.validate(id);
        self.local_transform[id.idx as usize]
    }

    /// Returns the local bounds of a node.
    #[must_use]
    pub fn local_bounds(&self, id: NodeId) -> Rect {
        self.validate(id);
        self.local_bounds[id.idx as usize]
    }

    /// Returns whether the node's visibility flag is set.
    #[must_use]
    pub fn visible(&self, id: NodeId) -> bool {
        self.validate(id);
        self.visible[id.idx as usize]
    }

    /// Returns the node's focus highlight declaration.
    #[must_use]
    pub fn highlight(&self, id: NodeId) -> &HighlightSpec {
        self.validate(id);
        &self.highlight[id.idx as usize]
    }

    /// Returns the node's speaking ("reading block") highlight declaration.
    #[must_use]
    pub fn speaking_highlight(&self, id: NodeId) -> &HighlightSpec {
        self.validate(id);
        &self.speaking_highlight[id.idx as usize]
    }

    /// Returns the node's group-highlight opt-in.
    #[must_use]
    pub fn group_highlight(&self, id: NodeId) -> GroupHighlight {
        self.validate(id);
        self.group_highlight[id.idx as usize]
    }

    /// Returns whether pointer focus may highlight this node.
    #[must_use]
    pub fn pointer_highlightable(&self, id: NodeId) -> bool {
        self.validate(id);
        self.pointer_highlightable[id.idx as usize]
    }

    /// Returns whether the node is a reading block (speakable content with
    /// its own highlight channel).
    #[must_use]
    pub fn reading_block(&self, id: NodeId) -> bool {
        self.validate(id);
        self.reading_block[id.idx as usize]
    }

    /// Returns the computed world transform of a node.
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called.
    #[must_use]
    pub fn world_transform(&self, id: NodeId) -> Affine {
        self.validate(id);
        self.world_transform[id.idx as usize]
    }

    // -- Mutation API (auto-marks dirty) --

    /// Sets the local transform of a node.
    ///
    /// Marks the TRANSFORM channel with eager propagation, reaching the
    /// node's subtree and any transform watch whose trail crosses it.
    pub fn set_transform(&mut self, id: NodeId, transform: Affine) {
        self.validate(id);
        self.local_transform[id.idx as usize] = transform;
        self.dirty.mark_with(id.idx, dirty::TRANSFORM, &EagerPolicy);
    }

    /// Sets the local bounds of a node.
    ///
    /// Marks the BOUNDS channel; bounds watches registered on this node fire
    /// at the next evaluation.
    pub fn set_bounds(&mut self, id: NodeId, bounds: Rect) {
        self.validate(id);
        self.local_bounds[id.idx as usize] = bounds;
        self.dirty.mark_with(id.idx, dirty::BOUNDS, &EagerPolicy);
    }

    /// Sets the visibility flag of a node.
    ///
    /// Routed through the TRANSFORM channel so presentation and watches see
    /// the change in the same drain pass.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        self.validate(id);
        self.visible[id.idx as usize] = visible;
        self.dirty.mark_with(id.idx, dirty::TRANSFORM, &EagerPolicy);
    }

    /// Sets the node's focus highlight declaration.
    ///
    /// Marks the HIGHLIGHT channel; an overlay with this node focused
    /// re-activates the highlight at the next evaluation.
    pub fn set_highlight(&mut self, id: NodeId, spec: HighlightSpec) {
        self.validate(id);
        self.highlight[id.idx as usize] = spec;
        self.dirty.mark_with(id.idx, dirty::HIGHLIGHT, &EagerPolicy);
    }

    /// Sets the node's speaking highlight declaration.
    pub fn set_speaking_highlight(&mut self, id: NodeId, spec: HighlightSpec) {
        self.validate(id);
        self.speaking_highlight[id.idx as usize] = spec;
        self.dirty.mark_with(id.idx, dirty::HIGHLIGHT, &EagerPolicy);
    }

    /// Sets the node's group-highlight opt-in.
    pub fn set_group_highlight(&mut self, id: NodeId, group: GroupHighlight) {
        self.validate(id);
        self.group_highlight[id.idx as usize] = group;
        self.dirty.mark_with(id.idx, dirty::HIGHLIGHT, &EagerPolicy);
    }

    /// Sets whether pointer focus may highlight this node.
    ///
    /// Eligibility is read at focus-resolution time, so no channel is marked.
    pub fn set_pointer_highlightable(&mut self, id: NodeId, eligible: bool) {
        self.validate(id);
        self.pointer_highlightable[id.idx as usize] = eligible;
    }

    /// Sets whether the node is a reading block.
    pub fn set_reading_block(&mut self, id: NodeId, reading_block: bool) {
        self.validate(id);
        self.reading_block[id.idx as usize] = reading_block;
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: NodeId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale NodeId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Removes `idx` from its parent's child list without touching dirty
    /// state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            // Was first child.
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }
}
