// Copyright 2026 the Aura Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Aura uses multi-channel dirty tracking (via [`understory_dirty`]) to
//! propagate invalidation through the scene tree and into registered watches.
//! Each channel represents an independent category of change.
//!
//! # Propagation semantics
//!
//! All property channels are marked with
//! [`EagerPolicy`](understory_dirty::EagerPolicy) so that marks reach
//! dependents:
//!
//! - **[`TRANSFORM`]** — Local transform or visibility changed. Child layers
//!   have dependency edges to their parents, so marking a node reaches its
//!   whole subtree; transform watches add edges to every node of their trail
//!   and fire when anything along the trail moves.
//!
//! - **[`BOUNDS`]** — A node's local bounds changed. No child edges exist on
//!   this channel; only node watches registered on the mutated node are
//!   reached.
//!
//! - **[`HIGHLIGHT`]** — A node's highlight declaration (focus or speaking)
//!   changed. Like [`BOUNDS`], reaches only node watches.
//!
//! - **[`TOPOLOGY`]** — Structural mutation (create/destroy node, attach or
//!   detach a child). Triggers a traversal-order rebuild during evaluation
//!   but does not propagate.
//!
//! # Consumption
//!
//! Callers never query dirty state directly. Each
//! [`SceneStore::evaluate`](crate::scene::SceneStore::evaluate) call drains
//! all channels and surfaces the results as
//! [`SceneChanges`](crate::scene::SceneChanges), including the set of watches
//! that fired.

use understory_dirty::Channel;

/// Transform or visibility flag changed — requires world transform
/// recomputation for descendants and fires transform watches.
pub const TRANSFORM: Channel = Channel::new(0);

/// Local bounds changed — fires bounds watches on the node.
pub const BOUNDS: Channel = Channel::new(1);

/// Highlight declaration changed — fires highlight watches on the node.
pub const HIGHLIGHT: Channel = Channel::new(2);

/// Tree topology changed — triggers traversal order rebuild.
pub const TOPOLOGY: Channel = Channel::new(3);
