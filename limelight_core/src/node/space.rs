// Copyright 2026 the Limelight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree-relative coordinate-space resolution.
//!
//! Every node's [`TransformState`](crate::spatial::TransformState) maps the
//! node's local space into its parent's space. The methods here concatenate
//! those per-node matrices along ancestor chains so callers can convert
//! between the spaces of arbitrary connected nodes.

use core::mem;

use kurbo::{Affine, Point};

use crate::error::SceneError;

use super::id::{INVALID, NodeId};
use super::store::NodeStore;

impl NodeStore {
    /// Returns the node's root: the ancestor whose parent is a stage.
    ///
    /// `None` if the node is not attached under a stage (including stages
    /// themselves and free-floating subtrees).
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn root(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let mut cursor = id.idx;
        loop {
            let parent = self.parent[cursor as usize];
            if parent == INVALID {
                return None;
            }
            if self.stage[parent as usize] {
                return Some(NodeId {
                    idx: cursor,
                    generation: self.generation[cursor as usize],
                });
            }
            cursor = parent;
        }
    }

    /// Returns the node's base: its topmost ancestor (the node itself if it
    /// has no parent).
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn base(&self, id: NodeId) -> NodeId {
        self.validate(id);
        let idx = self.base_idx(id.idx);
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Returns the matrix transforming `id`'s local coordinates into
    /// `target`'s local coordinates. `None` targets the base of `id`'s tree.
    ///
    /// Fast paths cover the common callers (self, direct parent, base,
    /// direct child) without touching the ancestor chain; everything else
    /// resolves a common ancestor and concatenates matrices up both chains.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotConnected`] if the two nodes share no common
    /// ancestor.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn matrix_to(&mut self, id: NodeId, target: Option<NodeId>) -> Result<Affine, SceneError> {
        self.validate(id);
        if let Some(t) = target {
            self.validate(t);
        }
        let parent = self.parent[id.idx as usize];

        // Target is the node itself.
        if target == Some(id) {
            return Ok(Affine::IDENTITY);
        }

        // Target is the direct parent, or both are unattached roots.
        match target {
            Some(t) if t.idx == parent => {
                return Ok(self.spatial[id.idx as usize].matrix());
            }
            None if parent == INVALID => {
                return Ok(self.spatial[id.idx as usize].matrix());
            }
            _ => {}
        }

        // Target is the base, or unspecified (meaning the base).
        let base = self.base_idx(id.idx);
        let Some(t) = target else {
            return Ok(self.concat_up_to(id.idx, base));
        };
        if t.idx == base {
            return Ok(self.concat_up_to(id.idx, base));
        }

        // Target is a direct child of this node.
        if self.parent[t.idx as usize] == id.idx {
            return Ok(self.spatial[t.idx as usize].matrix().inverse());
        }

        // General case: find the common ancestor by collecting this node's
        // full ancestor chain (self included) and walking up from the target
        // until it meets the chain.
        let mut chain = mem::take(&mut self.chain_scratch);
        chain.clear();
        let mut cursor = id.idx;
        while cursor != INVALID {
            chain.push(cursor);
            cursor = self.parent[cursor as usize];
        }
        let mut common = INVALID;
        let mut cursor = t.idx;
        while cursor != INVALID {
            if chain.contains(&cursor) {
                common = cursor;
                break;
            }
            cursor = self.parent[cursor as usize];
        }
        self.chain_scratch = chain;

        if common == INVALID {
            return Err(SceneError::NotConnected);
        }
        let up = self.concat_up_to(id.idx, common);
        if common == t.idx {
            return Ok(up);
        }
        let down = self.concat_up_to(t.idx, common);
        Ok(down.inverse() * up)
    }

    /// Converts a point from `id`'s local space into the space of its base.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn local_to_global(&mut self, id: NodeId, point: Point) -> Point {
        self.validate(id);
        let base = self.base_idx(id.idx);
        self.concat_up_to(id.idx, base) * point
    }

    /// Converts a point from the space of `id`'s base into `id`'s local
    /// space.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn global_to_local(&mut self, id: NodeId, point: Point) -> Point {
        self.validate(id);
        let base = self.base_idx(id.idx);
        self.concat_up_to(id.idx, base).inverse() * point
    }

    fn base_idx(&self, mut idx: u32) -> u32 {
        while self.parent[idx as usize] != INVALID {
            idx = self.parent[idx as usize];
        }
        idx
    }

    /// Concatenates node-to-parent matrices from `from` upward to (not
    /// including) `ancestor`. `ancestor` must be on `from`'s chain.
    fn concat_up_to(&mut self, from: u32, ancestor: u32) -> Affine {
        let mut acc = Affine::IDENTITY;
        let mut cursor = from;
        while cursor != ancestor {
            acc = self.spatial[cursor as usize].matrix() * acc;
            cursor = self.parent[cursor as usize];
        }
        acc
    }
}
