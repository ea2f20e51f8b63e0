// Copyright 2026 the Limelight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Time-driven frame sequencing.
//!
//! A [`MovieClip`] is a table of frames, each with a texture, an optional
//! sound, and a duration, plus a `{stopped, playing}` state machine driven
//! by [`advance_time`](MovieClip::advance_time). Contiguous frame ranges can
//! be labeled as named sequences; activating a sequence confines playback
//! (and looping) to that range.
//!
//! The clip never talks to the screen: it exposes
//! [`current_texture`](MovieClip::current_texture) and the
//! [`NodeStore`](crate::node::NodeStore) copies that handle into the node's
//! content during [`advance_animations`](crate::node::NodeStore::advance_animations).

use alloc::string::String;
use alloc::vec::Vec;

use crate::backend::{SoundPlayer, TextureHost};
use crate::error::SceneError;
use crate::node::{SoundId, TextureId};

#[derive(Clone, Debug, PartialEq)]
struct Frame {
    texture: TextureId,
    sound: Option<SoundId>,
    duration: f64,
    /// Seconds from clip start to this frame. Rebuilt after every mutation.
    start_time: f64,
}

/// A labeled, contiguous run of frames.
#[derive(Clone, Debug, PartialEq)]
struct Sequence {
    label: String,
    start: usize,
    len: usize,
}

/// A frame-by-frame animation over externally owned textures.
///
/// Time is in seconds. Frames play in order, each for its own duration
/// (initially `1 / fps`). A non-looping clip clamps at its final time and
/// reports completion exactly once; a looping clip wraps back to the start
/// of the active range, consuming leftover time in the same call.
#[derive(Clone, Debug, PartialEq)]
pub struct MovieClip {
    frames: Vec<Frame>,
    sequences: Vec<Sequence>,
    active: Option<usize>,
    fps: f64,
    default_duration: f64,
    looping: bool,
    playing: bool,
    current_time: f64,
    current_frame: usize,
}

impl MovieClip {
    /// Creates a clip with one frame per texture, each lasting `1 / fps`
    /// seconds.
    ///
    /// The clip starts stopped and non-looping.
    ///
    /// # Errors
    ///
    /// [`SceneError::InvalidArgument`] if the texture list is empty or
    /// `fps` is not positive.
    pub fn new(
        textures: impl IntoIterator<Item = TextureId>,
        fps: f64,
    ) -> Result<Self, SceneError> {
        if fps <= 0.0 {
            return Err(SceneError::InvalidArgument("fps must be positive"));
        }
        let default_duration = 1.0 / fps;
        let frames: Vec<Frame> = textures
            .into_iter()
            .map(|texture| Frame {
                texture,
                sound: None,
                duration: default_duration,
                start_time: 0.0,
            })
            .collect();
        if frames.is_empty() {
            return Err(SceneError::InvalidArgument("texture list must not be empty"));
        }
        let mut clip = Self {
            frames,
            sequences: Vec::new(),
            active: None,
            fps,
            default_duration,
            looping: false,
            playing: false,
            current_time: 0.0,
            current_frame: 0,
        };
        clip.rebuild_start_times();
        Ok(clip)
    }

    /// Creates a clip whose frames are partitioned into named sequences.
    ///
    /// `labels[i]` names a sequence of `lengths[i]` consecutive frames; the
    /// sequences cover the clip front to back.
    ///
    /// # Errors
    ///
    /// [`SceneError::InvalidArgument`] under the [`new`](Self::new)
    /// conditions, or if the label and length counts differ, a length is
    /// zero, a label repeats, or the lengths do not sum to the frame count.
    pub fn with_sequences(
        textures: impl IntoIterator<Item = TextureId>,
        fps: f64,
        labels: &[&str],
        lengths: &[usize],
    ) -> Result<Self, SceneError> {
        let mut clip = Self::new(textures, fps)?;
        if labels.len() != lengths.len() {
            return Err(SceneError::InvalidArgument(
                "labels and lengths must have matching counts",
            ));
        }
        if lengths.contains(&0) {
            return Err(SceneError::InvalidArgument("sequence lengths must be positive"));
        }
        if lengths.iter().sum::<usize>() != clip.frames.len() {
            return Err(SceneError::InvalidArgument(
                "sequence lengths must cover every frame",
            ));
        }
        let mut start = 0;
        for (label, &len) in labels.iter().zip(lengths) {
            if clip.sequences.iter().any(|s| s.label == *label) {
                return Err(SceneError::InvalidArgument("duplicate sequence label"));
            }
            clip.sequences.push(Sequence {
                label: String::from(*label),
                start,
                len,
            });
            start += len;
        }
        Ok(clip)
    }

    // -- Playback state machine --

    /// Starts playback from the current position.
    pub fn play(&mut self) {
        self.playing = true;
    }

    /// Stops playback, retaining the current position.
    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Stops playback and rewinds to the start of the active range (the
    /// active sequence, or the whole clip).
    pub fn stop(&mut self) {
        self.playing = false;
        let (start, _) = self.window();
        self.current_frame = start;
        self.current_time = self.frames[start].start_time;
    }

    /// Advances playback by `dt` seconds, firing frame sounds into `audio`
    /// as frames are entered.
    ///
    /// A no-op unless the clip is playing, `dt` is positive, and the final
    /// time has not yet been reached. A looping clip wraps back to the start
    /// of the active range (firing the start frame's sound) and keeps
    /// consuming the remaining time; a non-looping clip clamps at the final
    /// time.
    ///
    /// Returns `true` if the clip completed during this call. Completion
    /// fires at most once per arrival at the final time; subsequent calls
    /// return `false` until playback is rewound.
    pub fn advance_time(&mut self, dt: f64, audio: &mut dyn SoundPlayer) -> bool {
        let final_time = self.final_time();
        if !self.playing || dt <= 0.0 || self.current_time >= final_time {
            return false;
        }
        let (start, last) = self.window();
        let mut remaining = dt;
        loop {
            self.current_time += remaining;
            remaining = 0.0;
            while self.current_frame < last && self.current_time >= self.frame_end(self.current_frame)
            {
                self.current_frame += 1;
                self.fire_sound(self.current_frame, audio);
            }
            if self.current_time < final_time {
                return false;
            }
            if !self.looping {
                self.current_time = final_time;
                self.current_frame = last;
                return true;
            }
            remaining = self.current_time - final_time;
            self.current_frame = start;
            self.current_time = self.frames[start].start_time;
            self.fire_sound(start, audio);
            if remaining <= 0.0 {
                // Landed exactly on the boundary.
                return false;
            }
        }
    }

    // -- Named sequences --

    /// Activates the named sequence, rewinds to its first frame, and starts
    /// playback.
    ///
    /// # Errors
    ///
    /// [`SceneError::InvalidSequence`] if no sequence has that label.
    pub fn goto_and_play(&mut self, label: &str) -> Result<(), SceneError> {
        self.goto_sequence(label)?;
        self.playing = true;
        Ok(())
    }

    /// Activates the named sequence, rewinds to its first frame, and stops.
    ///
    /// # Errors
    ///
    /// [`SceneError::InvalidSequence`] if no sequence has that label.
    pub fn goto_and_stop(&mut self, label: &str) -> Result<(), SceneError> {
        self.goto_sequence(label)?;
        self.playing = false;
        Ok(())
    }

    fn goto_sequence(&mut self, label: &str) -> Result<(), SceneError> {
        let idx = self
            .sequences
            .iter()
            .position(|s| s.label == label)
            .ok_or_else(|| SceneError::InvalidSequence(String::from(label)))?;
        self.active = Some(idx);
        let start = self.sequences[idx].start;
        self.current_frame = start;
        self.current_time = self.frames[start].start_time;
        Ok(())
    }

    /// Returns the label of the active sequence, if any.
    #[must_use]
    pub fn active_sequence(&self) -> Option<&str> {
        self.active.map(|idx| self.sequences[idx].label.as_str())
    }

    /// Returns `(start frame, frame count)` of the named sequence, if it
    /// exists.
    #[must_use]
    pub fn sequence_bounds(&self, label: &str) -> Option<(usize, usize)> {
        self.sequences
            .iter()
            .find(|s| s.label == label)
            .map(|s| (s.start, s.len))
    }

    // -- Frame mutation --

    /// Appends a frame with the default duration and no sound.
    pub fn add_frame(&mut self, texture: TextureId) {
        self.frames.push(Frame {
            texture,
            sound: None,
            duration: self.default_duration,
            start_time: 0.0,
        });
        self.rebuild_start_times();
    }

    /// Inserts a frame before `index` (`index == num_frames` appends).
    ///
    /// Sequence boundaries shift to keep covering the same frames: a
    /// sequence starting at or after `index` moves forward; a sequence
    /// containing `index` grows.
    ///
    /// # Errors
    ///
    /// [`SceneError::IndexOutOfBounds`] if `index > num_frames`;
    /// [`SceneError::InvalidArgument`] if an explicit duration is not
    /// positive. `None` for `duration` uses the clip's default.
    pub fn add_frame_at(
        &mut self,
        index: usize,
        texture: TextureId,
        sound: Option<SoundId>,
        duration: Option<f64>,
    ) -> Result<(), SceneError> {
        if index > self.frames.len() {
            return Err(SceneError::IndexOutOfBounds {
                index,
                len: self.frames.len(),
            });
        }
        let duration = duration.unwrap_or(self.default_duration);
        if duration <= 0.0 {
            return Err(SceneError::InvalidArgument("frame duration must be positive"));
        }
        for seq in &mut self.sequences {
            if index <= seq.start {
                seq.start += 1;
            } else if index < seq.start + seq.len {
                seq.len += 1;
            }
        }
        self.frames.insert(
            index,
            Frame {
                texture,
                sound,
                duration,
                start_time: 0.0,
            },
        );
        self.rebuild_start_times();
        Ok(())
    }

    /// Removes the frame at `index`.
    ///
    /// Sequence boundaries shift to keep covering the same frames; a
    /// sequence shrunk to zero frames is deleted (deactivating it if it was
    /// active). Afterwards the current frame is clamped into the active
    /// range and the current time snaps to that frame's start.
    ///
    /// # Errors
    ///
    /// [`SceneError::IndexOutOfBounds`] if `index >= num_frames`;
    /// [`SceneError::InvalidOperation`] if this would remove the last
    /// remaining frame.
    pub fn remove_frame_at(&mut self, index: usize) -> Result<(), SceneError> {
        if index >= self.frames.len() {
            return Err(SceneError::IndexOutOfBounds {
                index,
                len: self.frames.len(),
            });
        }
        if self.frames.len() == 1 {
            return Err(SceneError::InvalidOperation(
                "cannot remove the last remaining frame",
            ));
        }
        let mut i = 0;
        while i < self.sequences.len() {
            let seq = &mut self.sequences[i];
            if index < seq.start {
                seq.start -= 1;
            } else if index < seq.start + seq.len {
                seq.len -= 1;
            }
            if seq.len == 0 {
                self.sequences.remove(i);
                match self.active {
                    Some(a) if a == i => self.active = None,
                    Some(a) if a > i => self.active = Some(a - 1),
                    _ => {}
                }
            } else {
                i += 1;
            }
        }
        self.frames.remove(index);
        self.rebuild_start_times();

        let (start, last) = self.window();
        self.current_frame = self.current_frame.clamp(start, last);
        self.current_time = self.frames[self.current_frame].start_time;
        Ok(())
    }

    /// Overrides the duration of one frame.
    ///
    /// # Errors
    ///
    /// [`SceneError::IndexOutOfBounds`] if `index >= num_frames`;
    /// [`SceneError::InvalidArgument`] if `duration` is not positive.
    pub fn set_frame_duration(&mut self, index: usize, duration: f64) -> Result<(), SceneError> {
        self.check_frame(index)?;
        if duration <= 0.0 {
            return Err(SceneError::InvalidArgument("frame duration must be positive"));
        }
        self.frames[index].duration = duration;
        self.rebuild_start_times();
        Ok(())
    }

    /// Returns the duration of one frame.
    ///
    /// # Errors
    ///
    /// [`SceneError::IndexOutOfBounds`] if `index >= num_frames`.
    pub fn frame_duration(&self, index: usize) -> Result<f64, SceneError> {
        self.check_frame(index)?;
        Ok(self.frames[index].duration)
    }

    /// Returns the texture of one frame.
    ///
    /// # Errors
    ///
    /// [`SceneError::IndexOutOfBounds`] if `index >= num_frames`.
    pub fn frame_texture(&self, index: usize) -> Result<TextureId, SceneError> {
        self.check_frame(index)?;
        Ok(self.frames[index].texture)
    }

    /// Replaces the texture of one frame.
    ///
    /// # Errors
    ///
    /// [`SceneError::IndexOutOfBounds`] if `index >= num_frames`.
    pub fn set_frame_texture(&mut self, index: usize, texture: TextureId) -> Result<(), SceneError> {
        self.check_frame(index)?;
        self.frames[index].texture = texture;
        Ok(())
    }

    /// Returns the sound attached to one frame.
    ///
    /// # Errors
    ///
    /// [`SceneError::IndexOutOfBounds`] if `index >= num_frames`.
    pub fn frame_sound(&self, index: usize) -> Result<Option<SoundId>, SceneError> {
        self.check_frame(index)?;
        Ok(self.frames[index].sound)
    }

    /// Attaches a sound to one frame (or clears it with `None`). The sound
    /// fires whenever playback enters the frame.
    ///
    /// # Errors
    ///
    /// [`SceneError::IndexOutOfBounds`] if `index >= num_frames`.
    pub fn set_frame_sound(
        &mut self,
        index: usize,
        sound: Option<SoundId>,
    ) -> Result<(), SceneError> {
        self.check_frame(index)?;
        self.frames[index].sound = sound;
        Ok(())
    }

    /// Changes the clip's frame rate, rescaling every frame duration and the
    /// current time so the relative playback position is preserved.
    ///
    /// # Errors
    ///
    /// [`SceneError::InvalidArgument`] if `fps` is not positive.
    pub fn set_fps(&mut self, fps: f64) -> Result<(), SceneError> {
        if fps <= 0.0 {
            return Err(SceneError::InvalidArgument("fps must be positive"));
        }
        let ratio = self.fps / fps;
        for frame in &mut self.frames {
            frame.duration *= ratio;
        }
        self.current_time *= ratio;
        self.default_duration = 1.0 / fps;
        self.fps = fps;
        self.rebuild_start_times();
        Ok(())
    }

    /// Tears the clip down, handing every frame texture back to the host
    /// for disposal. Shared textures are reported once per frame that uses
    /// them.
    pub fn dispose(self, host: &mut dyn TextureHost) {
        for frame in self.frames {
            host.dispose_texture(frame.texture);
        }
    }

    // -- Queries --

    /// Number of frames in the clip.
    #[must_use]
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Index of the frame currently shown.
    #[must_use]
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Playback position in seconds from clip start.
    #[must_use]
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Total duration of the whole clip in seconds, ignoring any active
    /// sequence.
    #[must_use]
    pub fn total_time(&self) -> f64 {
        let last = self.frames.len() - 1;
        self.frame_end(last)
    }

    /// Whether the clip is in the playing state.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Whether a non-looping clip has reached its final time. Always `false`
    /// for looping clips.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.looping && self.current_time >= self.final_time()
    }

    /// Whether the clip wraps around at the end of its active range.
    #[must_use]
    pub fn looping(&self) -> bool {
        self.looping
    }

    /// Sets whether the clip wraps around at the end of its active range.
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// The clip's frame rate.
    #[must_use]
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// The texture of the frame currently shown.
    #[must_use]
    pub fn current_texture(&self) -> TextureId {
        self.frames[self.current_frame].texture
    }

    // -- Internal helpers --

    /// The playable frame range: `(first, last)` of the active sequence, or
    /// the whole clip.
    fn window(&self) -> (usize, usize) {
        match self.active {
            Some(idx) => {
                let seq = &self.sequences[idx];
                (seq.start, seq.start + seq.len - 1)
            }
            None => (0, self.frames.len() - 1),
        }
    }

    fn final_time(&self) -> f64 {
        let (_, last) = self.window();
        self.frame_end(last)
    }

    fn frame_end(&self, index: usize) -> f64 {
        self.frames[index].start_time + self.frames[index].duration
    }

    fn fire_sound(&self, index: usize, audio: &mut dyn SoundPlayer) {
        if let Some(sound) = self.frames[index].sound {
            audio.play_sound(sound);
        }
    }

    fn rebuild_start_times(&mut self) {
        let mut elapsed = 0.0;
        for frame in &mut self.frames {
            frame.start_time = elapsed;
            elapsed += frame.duration;
        }
    }

    fn check_frame(&self, index: usize) -> Result<(), SceneError> {
        if index >= self.frames.len() {
            Err(SceneError::IndexOutOfBounds {
                index,
                len: self.frames.len(),
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    struct RecordingAudio {
        sounds: Vec<SoundId>,
    }

    impl RecordingAudio {
        fn new() -> Self {
            Self { sounds: Vec::new() }
        }
    }

    impl SoundPlayer for RecordingAudio {
        fn play_sound(&mut self, sound: SoundId) {
            self.sounds.push(sound);
        }
    }

    struct RecordingHost {
        disposed: Vec<TextureId>,
    }

    impl TextureHost for RecordingHost {
        fn dispose_texture(&mut self, texture: TextureId) {
            self.disposed.push(texture);
        }
    }

    fn textures(n: u32) -> impl Iterator<Item = TextureId> {
        (0..n).map(TextureId)
    }

    fn time_close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn construction_is_validated() {
        assert_eq!(
            MovieClip::new(textures(0), 12.0),
            Err(SceneError::InvalidArgument("texture list must not be empty"))
        );
        assert_eq!(
            MovieClip::new(textures(3), 0.0),
            Err(SceneError::InvalidArgument("fps must be positive"))
        );
        assert_eq!(
            MovieClip::new(textures(3), -24.0),
            Err(SceneError::InvalidArgument("fps must be positive"))
        );

        let clip = MovieClip::new(textures(3), 12.0).unwrap();
        assert_eq!(clip.num_frames(), 3);
        assert!(time_close(clip.total_time(), 0.25));
        assert!(!clip.is_playing());
        assert!(!clip.looping());
        assert_eq!(clip.current_frame(), 0);
        assert_eq!(clip.current_texture(), TextureId(0));
    }

    #[test]
    fn sequence_construction_is_validated() {
        assert_eq!(
            MovieClip::with_sequences(textures(4), 12.0, &["a", "b"], &[2]),
            Err(SceneError::InvalidArgument(
                "labels and lengths must have matching counts"
            ))
        );
        assert_eq!(
            MovieClip::with_sequences(textures(4), 12.0, &["a", "b"], &[4, 0]),
            Err(SceneError::InvalidArgument("sequence lengths must be positive"))
        );
        assert_eq!(
            MovieClip::with_sequences(textures(4), 12.0, &["a", "b"], &[2, 3]),
            Err(SceneError::InvalidArgument(
                "sequence lengths must cover every frame"
            ))
        );
        assert_eq!(
            MovieClip::with_sequences(textures(4), 12.0, &["a", "a"], &[2, 2]),
            Err(SceneError::InvalidArgument("duplicate sequence label"))
        );

        let clip = MovieClip::with_sequences(textures(4), 12.0, &["walk", "run"], &[3, 1]).unwrap();
        assert_eq!(clip.sequence_bounds("walk"), Some((0, 3)));
        assert_eq!(clip.sequence_bounds("run"), Some((3, 1)));
        assert_eq!(clip.active_sequence(), None);
    }

    #[test]
    fn advance_is_a_noop_when_stopped_or_nonpositive_dt() {
        let mut clip = MovieClip::new(textures(3), 12.0).unwrap();
        let mut audio = RecordingAudio::new();

        assert!(!clip.advance_time(1.0, &mut audio));
        assert_eq!(clip.current_frame(), 0);

        clip.play();
        assert!(!clip.advance_time(0.0, &mut audio));
        assert!(!clip.advance_time(-0.5, &mut audio));
        assert_eq!(clip.current_frame(), 0);
        assert!(time_close(clip.current_time(), 0.0));
        assert!(audio.sounds.is_empty());
    }

    #[test]
    fn one_call_can_cross_several_frames_and_complete() {
        // Three frames at 12 fps last 0.25 s in total; a single 0.25 s tick
        // walks through every frame, fires each entered frame's sound, and
        // completes.
        let mut clip = MovieClip::new(textures(3), 12.0).unwrap();
        clip.set_frame_sound(1, Some(SoundId(1))).unwrap();
        clip.set_frame_sound(2, Some(SoundId(2))).unwrap();
        clip.play();
        let mut audio = RecordingAudio::new();

        assert!(clip.advance_time(0.25, &mut audio));
        assert_eq!(clip.current_frame(), 2);
        assert!(time_close(clip.current_time(), 0.25));
        assert_eq!(audio.sounds, [SoundId(1), SoundId(2)]);
        assert!(clip.is_complete());
        assert!(clip.is_playing(), "completion does not change the state");

        // Completion fires exactly once; further ticks are no-ops.
        assert!(!clip.advance_time(0.1, &mut audio));
        assert_eq!(audio.sounds.len(), 2);
    }

    #[test]
    fn looping_clip_wraps_and_consumes_leftover_time() {
        // Two frames at 10 fps span 0.2 s; a 0.3 s tick enters frame 1,
        // wraps to frame 0, and spends the leftover 0.1 s entering frame 1
        // again.
        let mut clip = MovieClip::new(textures(2), 10.0).unwrap();
        clip.set_frame_sound(0, Some(SoundId(10))).unwrap();
        clip.set_frame_sound(1, Some(SoundId(11))).unwrap();
        clip.set_looping(true);
        clip.play();
        let mut audio = RecordingAudio::new();

        assert!(!clip.advance_time(0.3, &mut audio));
        assert_eq!(clip.current_frame(), 1);
        assert!(time_close(clip.current_time(), 0.1));
        assert_eq!(audio.sounds, [SoundId(11), SoundId(10), SoundId(11)]);
        assert!(!clip.is_complete());
    }

    #[test]
    fn exact_boundary_wraps_to_the_start_frame() {
        let mut clip = MovieClip::new(textures(2), 10.0).unwrap();
        clip.set_frame_sound(0, Some(SoundId(10))).unwrap();
        clip.set_looping(true);
        clip.play();
        let mut audio = RecordingAudio::new();

        assert!(!clip.advance_time(0.2, &mut audio));
        assert_eq!(clip.current_frame(), 0);
        assert!(time_close(clip.current_time(), 0.0));
        assert_eq!(audio.sounds, [SoundId(10)]);
    }

    #[test]
    fn pause_retains_position_and_stop_rewinds() {
        let mut clip = MovieClip::new(textures(3), 10.0).unwrap();
        clip.play();
        let mut audio = RecordingAudio::new();
        clip.advance_time(0.15, &mut audio);
        assert_eq!(clip.current_frame(), 1);

        clip.pause();
        assert!(!clip.is_playing());
        assert_eq!(clip.current_frame(), 1);
        assert!(time_close(clip.current_time(), 0.15));

        clip.stop();
        assert_eq!(clip.current_frame(), 0);
        assert!(time_close(clip.current_time(), 0.0));
    }

    #[test]
    fn unknown_sequence_is_an_error() {
        let mut clip =
            MovieClip::with_sequences(textures(2), 10.0, &["walk"], &[2]).unwrap();
        assert_eq!(
            clip.goto_and_play("fly"),
            Err(SceneError::InvalidSequence("fly".into()))
        );
        assert_eq!(clip.active_sequence(), None);
        assert!(!clip.is_playing());
    }

    #[test]
    fn sequence_confines_playback() {
        // "run" covers frames 2..4. Activating it rewinds to frame 2 and a
        // non-looping run completes at frame 3 without leaving the range.
        let mut clip =
            MovieClip::with_sequences(textures(4), 10.0, &["walk", "run"], &[2, 2]).unwrap();
        let mut audio = RecordingAudio::new();

        clip.goto_and_play("run").unwrap();
        assert_eq!(clip.active_sequence(), Some("run"));
        assert_eq!(clip.current_frame(), 2);
        assert!(time_close(clip.current_time(), 0.2));
        assert!(clip.is_playing());

        assert!(clip.advance_time(0.2, &mut audio));
        assert_eq!(clip.current_frame(), 3);
        assert!(clip.is_complete());
    }

    #[test]
    fn looping_sequence_wraps_to_its_own_start() {
        let mut clip =
            MovieClip::with_sequences(textures(4), 10.0, &["walk", "run"], &[2, 2]).unwrap();
        clip.set_looping(true);
        clip.goto_and_play("run").unwrap();
        let mut audio = RecordingAudio::new();

        // 0.25 s inside a 0.2 s sequence: wrap to frame 2, then 0.05 s in.
        assert!(!clip.advance_time(0.25, &mut audio));
        assert_eq!(clip.current_frame(), 2);
        assert!(time_close(clip.current_time(), 0.25));
    }

    #[test]
    fn goto_and_stop_rewinds_without_playing() {
        let mut clip =
            MovieClip::with_sequences(textures(4), 10.0, &["walk", "run"], &[2, 2]).unwrap();
        clip.goto_and_stop("walk").unwrap();
        assert_eq!(clip.current_frame(), 0);
        assert!(!clip.is_playing());
        assert_eq!(clip.active_sequence(), Some("walk"));
    }

    #[test]
    fn insertion_shifts_sequence_boundaries() {
        let mut clip =
            MovieClip::with_sequences(textures(4), 10.0, &["walk", "run"], &[2, 2]).unwrap();

        // Insert before "walk": both sequences move forward.
        clip.add_frame_at(0, TextureId(90), None, None).unwrap();
        assert_eq!(clip.sequence_bounds("walk"), Some((1, 2)));
        assert_eq!(clip.sequence_bounds("run"), Some((3, 2)));

        // Insert inside "run": it grows.
        clip.add_frame_at(4, TextureId(91), None, None).unwrap();
        assert_eq!(clip.sequence_bounds("walk"), Some((1, 2)));
        assert_eq!(clip.sequence_bounds("run"), Some((3, 3)));
        assert_eq!(clip.num_frames(), 6);
    }

    #[test]
    fn removal_shifts_and_deletes_emptied_sequences() {
        let mut clip =
            MovieClip::with_sequences(textures(3), 10.0, &["intro", "loop"], &[1, 2]).unwrap();
        clip.goto_and_stop("intro").unwrap();

        // Removing the only frame of the active "intro" deletes and
        // deactivates it; "loop" slides forward.
        clip.remove_frame_at(0).unwrap();
        assert_eq!(clip.sequence_bounds("intro"), None);
        assert_eq!(clip.active_sequence(), None);
        assert_eq!(clip.sequence_bounds("loop"), Some((0, 2)));
        assert_eq!(clip.current_frame(), 0);
        assert!(time_close(clip.current_time(), 0.0));
    }

    #[test]
    fn removal_clamps_the_current_frame() {
        let mut clip = MovieClip::new(textures(3), 10.0).unwrap();
        clip.play();
        let mut audio = RecordingAudio::new();
        clip.advance_time(0.25, &mut audio);
        assert_eq!(clip.current_frame(), 2);

        clip.remove_frame_at(2).unwrap();
        assert_eq!(clip.current_frame(), 1);
        assert!(time_close(clip.current_time(), 0.1));
    }

    #[test]
    fn frame_mutation_bounds_are_checked_first() {
        let mut clip = MovieClip::new(textures(2), 10.0).unwrap();

        assert_eq!(
            clip.add_frame_at(3, TextureId(9), None, None),
            Err(SceneError::IndexOutOfBounds { index: 3, len: 2 })
        );
        assert_eq!(
            clip.remove_frame_at(2),
            Err(SceneError::IndexOutOfBounds { index: 2, len: 2 })
        );
        assert_eq!(
            clip.set_frame_duration(5, 1.0),
            Err(SceneError::IndexOutOfBounds { index: 5, len: 2 })
        );
        assert_eq!(
            clip.set_frame_duration(0, 0.0),
            Err(SceneError::InvalidArgument("frame duration must be positive"))
        );
        assert_eq!(clip.num_frames(), 2, "failed calls mutate nothing");
    }

    #[test]
    fn the_last_frame_cannot_be_removed() {
        let mut clip = MovieClip::new(textures(1), 10.0).unwrap();
        assert_eq!(
            clip.remove_frame_at(0),
            Err(SceneError::InvalidOperation(
                "cannot remove the last remaining frame"
            ))
        );
        assert_eq!(clip.num_frames(), 1);
    }

    #[test]
    fn frame_accessors_round_trip() {
        let mut clip = MovieClip::new(textures(2), 10.0).unwrap();

        clip.set_frame_texture(1, TextureId(42)).unwrap();
        assert_eq!(clip.frame_texture(1), Ok(TextureId(42)));

        clip.set_frame_sound(0, Some(SoundId(7))).unwrap();
        assert_eq!(clip.frame_sound(0), Ok(Some(SoundId(7))));
        clip.set_frame_sound(0, None).unwrap();
        assert_eq!(clip.frame_sound(0), Ok(None));

        assert_eq!(
            clip.frame_texture(2),
            Err(SceneError::IndexOutOfBounds { index: 2, len: 2 })
        );
    }

    #[test]
    fn custom_durations_move_the_frame_boundaries() {
        let mut clip = MovieClip::new(textures(2), 4.0).unwrap();
        clip.set_frame_duration(0, 1.0).unwrap();
        assert!(time_close(clip.total_time(), 1.25));

        clip.play();
        let mut audio = RecordingAudio::new();
        clip.advance_time(0.9, &mut audio);
        assert_eq!(clip.current_frame(), 0, "first frame lasts a full second");
        clip.advance_time(0.2, &mut audio);
        assert_eq!(clip.current_frame(), 1);
    }

    #[test]
    fn fps_change_preserves_relative_position() {
        let mut clip = MovieClip::new(textures(2), 10.0).unwrap();
        clip.play();
        let mut audio = RecordingAudio::new();
        clip.advance_time(0.05, &mut audio);
        assert_eq!(clip.current_frame(), 0);

        // Doubling the rate halves every duration and the elapsed time.
        clip.set_fps(20.0).unwrap();
        assert!(time_close(clip.total_time(), 0.1));
        assert!(time_close(clip.current_time(), 0.025));
        assert_eq!(clip.current_frame(), 0);
        assert!(time_close(clip.frame_duration(1).unwrap(), 0.05));

        assert_eq!(
            clip.set_fps(0.0),
            Err(SceneError::InvalidArgument("fps must be positive"))
        );
    }

    #[test]
    fn dispose_hands_every_texture_to_the_host() {
        let clip = MovieClip::new(textures(3), 10.0).unwrap();
        let mut host = RecordingHost {
            disposed: Vec::new(),
        };
        clip.dispose(&mut host);
        assert_eq!(host.disposed, [TextureId(0), TextureId(1), TextureId(2)]);
    }
}
