// Copyright 2026 the Limelight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collaborator traits for the systems that surround the scene core.
//!
//! Rendering, audio, and texture lifetime management live outside this
//! crate. The core only ever routes opaque handles; these traits are the
//! narrow seams through which it calls back into the owning application.

use crate::node::{SoundId, TextureId};

/// Fire-and-forget audio playback.
///
/// A [`MovieClip`](crate::clip::MovieClip) calls
/// [`play_sound`](SoundPlayer::play_sound) once for every frame with an
/// attached sound as that frame is entered during `advance_time`. There is
/// no completion callback and no way to stop a sound from this crate.
pub trait SoundPlayer {
    /// Starts playback of the given sound.
    fn play_sound(&mut self, sound: SoundId);
}

/// Texture disposal, called during teardown.
///
/// Textures are created by the render collaborator; this crate never
/// allocates or frees one. When a movie clip is torn down
/// ([`MovieClip::dispose`](crate::clip::MovieClip::dispose)), every frame
/// texture is handed back through this trait. A handle may be reported more
/// than once if frames share a texture; deduplication is the host's concern.
pub trait TextureHost {
    /// Releases the given texture.
    fn dispose_texture(&mut self, texture: TextureId);
}

/// A [`SoundPlayer`] that drops every sound. Useful for headless ticking
/// and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullAudio;

impl SoundPlayer for NullAudio {
    fn play_sound(&mut self, _sound: SoundId) {}
}

/// A [`TextureHost`] that ignores every disposal. Useful when texture
/// lifetime is managed elsewhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullTextures;

impl TextureHost for NullTextures {
    fn dispose_texture(&mut self, _texture: TextureId) {}
}
