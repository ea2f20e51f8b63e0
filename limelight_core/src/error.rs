// Copyright 2026 the Limelight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Synchronous, caller-recoverable failures.
//!
//! Every fallible operation in this crate fails *before* mutating any state,
//! so a returned error never leaves a node store or movie clip half-updated.
//! None of these conditions is fatal; the caller decides whether to retry
//! with different arguments or ignore the failure.
//!
//! Stale-handle misuse (a [`NodeId`](crate::node::NodeId) used after its
//! node was destroyed) is a programming error and panics instead of
//! returning a `SceneError`.

use alloc::string::String;

use thiserror::Error;

/// The failure type shared by all fallible operations in this crate.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    /// A constructor or setter was given an out-of-domain value, such as a
    /// non-positive fps, an empty texture list, or inconsistent sequence
    /// definitions.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A frame index was outside the valid range.
    #[error("frame index {index} out of range ({len} frames)")]
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// The number of frames at the time of the call.
        len: usize,
    },

    /// The operation is not valid in the current state, such as removing the
    /// last remaining frame of a clip.
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    /// A named sequence lookup failed.
    #[error("unknown sequence `{0}`")]
    InvalidSequence(String),

    /// Attaching the node would make it its own ancestor.
    #[error("node cannot be attached under itself or one of its descendants")]
    Cycle,

    /// The two nodes share no common ancestor, so no transform between their
    /// coordinate spaces exists.
    #[error("nodes are not connected through a common ancestor")]
    NotConnected,
}
