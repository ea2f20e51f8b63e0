// Copyright 2026 the Limelight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Slot-based node storage with allocation, parent links, and property
//! management.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use kurbo::Affine;

use crate::backend::SoundPlayer;
use crate::clip::MovieClip;
use crate::error::SceneError;
use crate::spatial::{Spatial, TransformState};

use super::id::{FilterId, INVALID, NodeId, TextureId};

/// Per-node boolean flags consumed by the event and hit-testing
/// collaborators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeFlags {
    /// Whether the node (and its subtree) receives touch input.
    pub touchable: bool,
    /// Whether fully transparent pixels count as hits.
    pub hit_transparent: bool,
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self {
            touchable: true,
            hit_transparent: false,
        }
    }
}

/// How a node's pixels are blended over the background.
///
/// The actual blending is performed by the render collaborator; this core
/// only stores the selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Inherit the blend mode of the parent.
    #[default]
    Auto,
    /// Source-over blending.
    Normal,
    /// Additive blending.
    Add,
    /// Multiplicative blending.
    Multiply,
    /// Screen blending.
    Screen,
    /// Erases the background where the node is drawn.
    Erase,
    /// No blending; the node's pixels replace the background.
    None,
}

/// The set of changes produced by a single
/// [`advance_animations`](NodeStore::advance_animations) call.
///
/// Raw slot indices are reported so the caller can feed them straight back
/// into the store without generation checks.
#[derive(Clone, Debug, Default)]
pub struct AnimationChanges {
    /// Non-looping clips that reached their final time during this tick.
    /// Each clip appears here exactly once, on the tick it completes.
    pub completed: Vec<u32>,
}

/// Slot-based storage for all display nodes.
///
/// Nodes are addressed by [`NodeId`] handles. Internally, each node occupies
/// a slot in parallel arrays. Destroyed nodes are recycled via a free list,
/// and generation counters prevent stale handle access.
///
/// Topology is parent back-links only: ownership of children belongs to the
/// container collaborator, which calls [`attach`](Self::attach) and
/// [`detach`](Self::detach) when its structure changes. The store therefore
/// never walks downward, only upward along ancestor chains.
#[derive(Debug)]
pub struct NodeStore {
    // -- Topology (non-owning back-links) --
    pub(crate) parent: Vec<u32>,
    pub(crate) stage: Vec<bool>,

    // -- Per-node properties --
    pub(crate) spatial: Vec<Box<dyn TransformState>>,
    pub(crate) name: Vec<Option<String>>,
    pub(crate) flags: Vec<NodeFlags>,
    pub(crate) blend_mode: Vec<BlendMode>,
    pub(crate) filter: Vec<Option<FilterId>>,
    pub(crate) content: Vec<Option<TextureId>>,
    pub(crate) movie: Vec<Option<MovieClip>>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Per-call scratch for coordinate-space resolution --
    //
    // Reused across `matrix_to` calls to avoid a per-call allocation. Not
    // per-node state; the exclusive borrow makes reentrant use impossible.
    pub(crate) chain_scratch: Vec<u32>,
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore {
    /// Creates an empty node store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            stage: Vec::new(),
            spatial: Vec::new(),
            name: Vec::new(),
            flags: Vec::new(),
            blend_mode: Vec::new(),
            filter: Vec::new(),
            content: Vec::new(),
            movie: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            chain_scratch: Vec::new(),
        }
    }

    // -- Allocation API --

    /// Creates a new node and returns its handle.
    ///
    /// The node starts with default transform state ([`Spatial::new`]), no
    /// name, no parent, default flags and blend mode, and no content.
    pub fn create_node(&mut self) -> NodeId {
        self.create(false)
    }

    /// Creates a top-level stage node.
    ///
    /// Stages anchor [`root`](Self::root) resolution: a node's root is its
    /// ancestor whose parent is a stage.
    pub fn create_stage(&mut self) -> NodeId {
        self.create(true)
    }

    fn create(&mut self, stage: bool) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            self.generation[idx as usize] += 1;
            self.parent[idx as usize] = INVALID;
            self.stage[idx as usize] = stage;
            self.spatial[idx as usize] = Box::new(Spatial::new());
            self.name[idx as usize] = None;
            self.flags[idx as usize] = NodeFlags::default();
            self.blend_mode[idx as usize] = BlendMode::Auto;
            self.filter[idx as usize] = None;
            self.content[idx as usize] = None;
            self.movie[idx as usize] = None;
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.stage.push(stage);
            self.spatial.push(Box::new(Spatial::new()));
            self.name.push(None);
            self.flags.push(NodeFlags::default());
            self.blend_mode.push(BlendMode::Auto);
            self.filter.push(None);
            self.content.push(None);
            self.movie.push(None);
            self.generation.push(0);
            idx
        };

        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Destroys a node, freeing its slot for reuse.
    ///
    /// Returns the node's movie clip, if it had one, so the caller can run
    /// the texture dispose hook
    /// ([`MovieClip::dispose`](crate::clip::MovieClip::dispose)).
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, or if other nodes are still attached
    /// under this one (the container collaborator must detach them first).
    pub fn destroy_node(&mut self, id: NodeId) -> Option<MovieClip> {
        self.validate(id);
        let idx = id.idx;
        assert!(
            !self
                .live_indices()
                .any(|i| i != idx && self.parent[i as usize] == idx),
            "cannot destroy a node that still has attached children"
        );

        log::debug!("destroy node {idx}");
        self.parent[idx as usize] = INVALID;
        let movie = self.movie[idx as usize].take();
        self.content[idx as usize] = None;

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;
        self.free_list.push(idx);
        movie
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    // -- Topology API --

    /// Stores `parent` as `child`'s parent back-link.
    ///
    /// This records the relation only; ownership of the child stays with the
    /// container collaborator. A child that already has a parent is simply
    /// re-linked.
    ///
    /// # Errors
    ///
    /// [`SceneError::Cycle`] if `parent` is `child` itself or one of its
    /// descendants; the link is left unchanged in that case.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn attach(&mut self, child: NodeId, parent: NodeId) -> Result<(), SceneError> {
        self.validate(child);
        self.validate(parent);

        // Walk the prospective parent's own ancestor chain; meeting `child`
        // there would make the child its own ancestor.
        let mut cursor = parent.idx;
        while cursor != INVALID {
            if cursor == child.idx {
                return Err(SceneError::Cycle);
            }
            cursor = self.parent[cursor as usize];
        }

        log::debug!("attach node {} under {}", child.idx, parent.idx);
        self.parent[child.idx as usize] = parent.idx;
        Ok(())
    }

    /// Clears `child`'s parent back-link.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn detach(&mut self, child: NodeId) {
        self.validate(child);
        log::debug!("detach node {}", child.idx);
        self.parent[child.idx as usize] = INVALID;
    }

    /// Returns the parent of a node, if any.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
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

    /// Returns whether the node is a stage.
    #[must_use]
    pub fn is_stage(&self, id: NodeId) -> bool {
        self.validate(id);
        self.stage[id.idx as usize]
    }

    // -- Transform state --

    /// Returns the node's transform state.
    #[must_use]
    pub fn spatial(&self, id: NodeId) -> &dyn TransformState {
        self.validate(id);
        &*self.spatial[id.idx as usize]
    }

    /// Returns the node's transform state for mutation.
    pub fn spatial_mut(&mut self, id: NodeId) -> &mut dyn TransformState {
        self.validate(id);
        &mut *self.spatial[id.idx as usize]
    }

    /// Replaces the node's transform state with an externally supplied
    /// variant. This is the capability-substitution point; the node itself
    /// is untouched.
    pub fn set_transform_state(&mut self, id: NodeId, state: Box<dyn TransformState>) {
        self.validate(id);
        self.spatial[id.idx as usize] = state;
    }

    /// Returns the node-to-parent matrix, recomputing it only if a geometric
    /// attribute changed since the last call.
    pub fn matrix(&mut self, id: NodeId) -> Affine {
        self.validate(id);
        self.spatial[id.idx as usize].matrix()
    }

    // -- Display attributes --

    /// Returns the node's name.
    #[must_use]
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.validate(id);
        self.name[id.idx as usize].as_deref()
    }

    /// Sets the node's name.
    pub fn set_name(&mut self, id: NodeId, name: Option<String>) {
        self.validate(id);
        self.name[id.idx as usize] = name;
    }

    /// Returns the node's flags.
    #[must_use]
    pub fn flags(&self, id: NodeId) -> NodeFlags {
        self.validate(id);
        self.flags[id.idx as usize]
    }

    /// Sets the node's flags.
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) {
        self.validate(id);
        self.flags[id.idx as usize] = flags;
    }

    /// Returns the node's blend mode.
    #[must_use]
    pub fn blend_mode(&self, id: NodeId) -> BlendMode {
        self.validate(id);
        self.blend_mode[id.idx as usize]
    }

    /// Sets the node's blend mode.
    pub fn set_blend_mode(&mut self, id: NodeId, blend_mode: BlendMode) {
        self.validate(id);
        self.blend_mode[id.idx as usize] = blend_mode;
    }

    /// Returns the node's fragment filter.
    #[must_use]
    pub fn filter(&self, id: NodeId) -> Option<FilterId> {
        self.validate(id);
        self.filter[id.idx as usize]
    }

    /// Sets the node's fragment filter.
    pub fn set_filter(&mut self, id: NodeId, filter: Option<FilterId>) {
        self.validate(id);
        self.filter[id.idx as usize] = filter;
    }

    /// Returns the texture the node currently presents.
    #[must_use]
    pub fn content(&self, id: NodeId) -> Option<TextureId> {
        self.validate(id);
        self.content[id.idx as usize]
    }

    /// Sets the texture the node presents. For nodes with a movie clip this
    /// is overwritten on the next [`advance_animations`](Self::advance_animations).
    pub fn set_content(&mut self, id: NodeId, content: Option<TextureId>) {
        self.validate(id);
        self.content[id.idx as usize] = content;
    }

    // -- Frame sequencing --

    /// Installs a movie clip on the node and presents its current frame.
    pub fn set_movie(&mut self, id: NodeId, movie: MovieClip) {
        self.validate(id);
        self.content[id.idx as usize] = Some(movie.current_texture());
        self.movie[id.idx as usize] = Some(movie);
    }

    /// Returns the node's movie clip.
    #[must_use]
    pub fn movie(&self, id: NodeId) -> Option<&MovieClip> {
        self.validate(id);
        self.movie[id.idx as usize].as_ref()
    }

    /// Returns the node's movie clip for mutation.
    pub fn movie_mut(&mut self, id: NodeId) -> Option<&mut MovieClip> {
        self.validate(id);
        self.movie[id.idx as usize].as_mut()
    }

    /// Removes and returns the node's movie clip, leaving the last presented
    /// texture in place.
    pub fn take_movie(&mut self, id: NodeId) -> Option<MovieClip> {
        self.validate(id);
        self.movie[id.idx as usize].take()
    }

    /// Advances every movie clip in the store by `dt` seconds.
    ///
    /// Frame sounds fire into `audio` as they are entered, each node's
    /// presented texture is updated to its clip's current frame, and clips
    /// that completed during this tick are reported by raw slot index.
    pub fn advance_animations(
        &mut self,
        dt: f64,
        audio: &mut dyn SoundPlayer,
    ) -> AnimationChanges {
        let mut changes = AnimationChanges::default();
        for idx in 0..self.len {
            if let Some(clip) = self.movie[idx as usize].as_mut() {
                if clip.advance_time(dt, audio) {
                    changes.completed.push(idx);
                }
                self.content[idx as usize] = Some(clip.current_texture());
            }
        }
        changes
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

    /// Iterates the slot indices of live nodes.
    fn live_indices(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.len).filter(|idx| !self.free_list.contains(idx))
    }
}
