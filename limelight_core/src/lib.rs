// Copyright 2026 the Limelight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display-object transform core for the Limelight 2D scene graph.
//!
//! `limelight_core` provides the coordinate-space math underneath a
//! GPU-accelerated 2D scene graph: per-node transform state with lazy matrix
//! caching, tree-relative coordinate conversion, and a time-driven frame
//! sequencer. It is `no_std` compatible (with `alloc`) and uses array-based
//! storage with index handles for cache-friendly per-frame access.
//!
//! # Architecture
//!
//! The crate is organized around a render tick that positions every visible
//! node and advances every animated one:
//!
//! ```text
//!   Container collaborator ──► NodeStore::attach / detach
//!                                   │
//!   Render pass ──► NodeStore::matrix_to / matrix ──► kurbo::Affine
//!                                   │
//!   Tick ──► NodeStore::advance_animations ──► AnimationChanges
//!                      │
//!                      └──► SoundPlayer (fire-and-forget audio)
//! ```
//!
//! **[`spatial`]** — The [`TransformState`](spatial::TransformState) trait
//! and its default implementation [`Spatial`](spatial::Spatial): position,
//! pivot, scale, skew, rotation, plus a dirty-flagged cached affine matrix.
//! Matrix synthesis and its inverse decomposition live here.
//!
//! **[`node`]** — Slot-based node storage with generational handles.
//! Nodes hold a boxed transform state, display attributes, and a parent
//! back-link; child ownership belongs to an external container, so the
//! store never owns a child list. Coordinate conversion between arbitrary
//! nodes resolves a common ancestor and concatenates matrices up both
//! chains.
//!
//! **[`clip`]** — [`MovieClip`](clip::MovieClip): a per-frame
//! texture/sound/duration table with named sub-sequences and a
//! stopped/playing state machine driven by `advance_time`.
//!
//! **[`backend`]** — Narrow collaborator traits for audio playback and
//! texture disposal. Rendering, container ownership, and event dispatch are
//! external systems that consume this crate.
//!
//! **[`error`]** — [`SceneError`](error::SceneError), the synchronous,
//! caller-recoverable failure type shared by all operations.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//!   Without it, float math is routed through `libm` via kurbo.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod backend;
pub mod clip;
pub mod error;
pub mod node;
pub mod spatial;

pub use error::SceneError;
