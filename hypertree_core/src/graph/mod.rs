// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Graph storage: a spanning tree plus non-tree links over dense indices.
//!
//! - [`GraphBuilder`]: write-once topology construction.
//! - [`GraphStore`]: struct-of-arrays storage with fixed topology and
//!   attributes that may be mutated through a shared reference.
//! - Visibility shaping (`prune_*`, `narrow`, `widen_*`) and diagnostics
//!   live on [`GraphStore`].

mod attr;
mod builder;
mod id;
mod store;
mod visibility;

pub use builder::{ChildLinks, DEFAULT_LINK_COLOR, DEFAULT_NODE_COLOR, GraphBuilder, NontreeLinks};
pub use id::{LinkIndex, LinkKind, Links, NodeIndex};
pub use store::{GraphStore, Reachability, pack_rgb, unpack_rgb};
