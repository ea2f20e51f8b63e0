// Copyright 2026 the Limelight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display nodes: slot-based storage, tree topology, and coordinate spaces.
//!
//! A [`NodeStore`] holds every display node in parallel arrays and hands out
//! generational [`NodeId`] handles. Each node carries a boxed
//! [`TransformState`](crate::spatial::TransformState), display attributes
//! (name, flags, blend mode, filter, content texture), an optional
//! [`MovieClip`](crate::clip::MovieClip), and a parent back-link.
//!
//! The store is split across three files:
//!
//! - `id`: handle types and the `INVALID` index sentinel.
//! - `store`: allocation, topology, property access, and the animation tick.
//! - `space`: root/base resolution and coordinate conversion between nodes.

mod id;
mod space;
mod store;

pub use id::{FilterId, INVALID, NodeId, SoundId, TextureId};
pub use store::{AnimationChanges, BlendMode, NodeFlags, NodeStore};
