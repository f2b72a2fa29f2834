//! Animation tracks and clips
//!
//! A [`JointTrack`] bundles the three channel tracks (translation,
//! rotation, scale) for one joint; a [`Clip`] is a named collection of
//! joint tracks sampled as a whole into a [`Pose`] at a playback time.

use crate::error::{AnimError, Result};
use crate::pose::Pose;
use crate::track::{QuaternionTrack, VectorTrack};
use crate::transform::Transform;

/// The animated channels of a single joint
///
/// A joint need not animate all three channels: sampling overrides only the
/// channels that carry animation data and leaves the rest at the base
/// transform's values.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct JointTrack {
    /// Index of the joint this track animates
    pub joint: u32,
    /// Translation channel
    pub translation: VectorTrack,
    /// Rotation channel
    pub rotation: QuaternionTrack,
    /// Scale channel
    pub scale: VectorTrack,
}

impl JointTrack {
    /// Empty track for `joint`
    pub fn new(joint: u32) -> Self {
        Self {
            joint,
            ..Default::default()
        }
    }

    /// Whether any channel carries animation data (at least two keyframes)
    pub fn is_animated(&self) -> bool {
        self.translation.is_animated() || self.rotation.is_animated() || self.scale.is_animated()
    }

    /// Earliest start time across the animated channels
    pub fn start_time(&self) -> f32 {
        let mut start = f32::MAX;
        if self.translation.is_animated() {
            start = start.min(self.translation.start_time());
        }
        if self.rotation.is_animated() {
            start = start.min(self.rotation.start_time());
        }
        if self.scale.is_animated() {
            start = start.min(self.scale.start_time());
        }
        if start == f32::MAX { 0.0 } else { start }
    }

    /// Latest end time across the animated channels
    pub fn end_time(&self) -> f32 {
        let mut end = f32::MIN;
        if self.translation.is_animated() {
            end = end.max(self.translation.end_time());
        }
        if self.rotation.is_animated() {
            end = end.max(self.rotation.end_time());
        }
        if self.scale.is_animated() {
            end = end.max(self.scale.end_time());
        }
        if end == f32::MIN { 0.0 } else { end }
    }

    /// Sample the track at `time`, overriding only animated channels of `base`
    pub fn sample(&self, base: Transform, time: f32, looping: bool) -> Transform {
        let mut result = base;
        if self.translation.is_animated() {
            result.translation = self.translation.sample(time, looping);
        }
        if self.rotation.is_animated() {
            result.rotation = self.rotation.sample(time, looping);
        }
        if self.scale.is_animated() {
            result.scale = self.scale.sample(time, looping);
        }
        result
    }
}

/// A named animation: one track per animated joint plus looping behavior
///
/// The clip's time range is derived from its tracks at construction and
/// after [`recalculate_duration`](Clip::recalculate_duration).
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Clip {
    /// Clip name, as authored
    pub name: String,
    /// Whether playback wraps at the end of the clip
    pub looping: bool,
    tracks: Vec<JointTrack>,
    start_time: f32,
    end_time: f32,
}

impl Clip {
    /// Empty, looping clip
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            looping: true,
            tracks: Vec::new(),
            start_time: 0.0,
            end_time: 0.0,
        }
    }

    /// Build a clip from joint tracks, deriving its time range
    pub fn from_tracks(name: impl Into<String>, tracks: Vec<JointTrack>) -> Self {
        let mut clip = Self {
            name: name.into(),
            looping: true,
            tracks,
            start_time: 0.0,
            end_time: 0.0,
        };
        clip.recalculate_duration();
        log::debug!(
            "clip '{}': {} tracks, duration {:.3}s",
            clip.name,
            clip.tracks.len(),
            clip.duration()
        );
        clip
    }

    /// Append a joint track and refresh the derived time range
    pub fn add_track(&mut self, track: JointTrack) {
        self.tracks.push(track);
        self.recalculate_duration();
    }

    /// Joint tracks in authored order
    pub fn tracks(&self) -> &[JointTrack] {
        &self.tracks
    }

    /// Track animating `joint`, if the clip contains one
    pub fn track_for_joint(&self, joint: u32) -> Option<&JointTrack> {
        self.tracks.iter().find(|t| t.joint == joint)
    }

    /// Earliest animated keyframe time
    pub fn start_time(&self) -> f32 {
        self.start_time
    }

    /// Latest animated keyframe time
    pub fn end_time(&self) -> f32 {
        self.end_time
    }

    /// Clip duration (`end_time - start_time`)
    pub fn duration(&self) -> f32 {
        self.end_time - self.start_time
    }

    /// Re-derive the clip's time range from its animated tracks
    pub fn recalculate_duration(&mut self) {
        self.start_time = 0.0;
        self.end_time = 0.0;
        let mut first = true;
        for track in self.tracks.iter().filter(|t| t.is_animated()) {
            if first {
                self.start_time = track.start_time();
                self.end_time = track.end_time();
                first = false;
            } else {
                self.start_time = self.start_time.min(track.start_time());
                self.end_time = self.end_time.max(track.end_time());
            }
        }
    }

    /// Check every track's joint index against a skeleton's joint count
    ///
    /// Load-time validation; [`sample`](Clip::sample) itself skips
    /// out-of-range joints rather than failing mid-frame.
    pub fn validate(&self, joint_count: usize) -> Result<()> {
        for track in &self.tracks {
            if track.joint as usize >= joint_count {
                return Err(AnimError::JointOutOfRange {
                    joint: track.joint as usize,
                    joint_count,
                });
            }
        }
        Ok(())
    }

    fn adjust_time(&self, time: f32) -> f32 {
        let duration = self.duration();
        if duration <= 0.0 {
            return 0.0;
        }
        if self.looping {
            self.start_time + (time - self.start_time).rem_euclid(duration)
        } else {
            time.clamp(self.start_time, self.end_time)
        }
    }

    /// Sample the whole clip into `pose` at `time`
    ///
    /// Returns the adjusted playback time actually used, so the caller's
    /// stored cursor advances consistently across loop wraps. A clip with
    /// no animated range leaves the pose untouched and returns 0.
    pub fn sample(&self, pose: &mut Pose, time: f32) -> f32 {
        if self.duration() <= 0.0 {
            return 0.0;
        }
        let time = self.adjust_time(time);
        for track in &self.tracks {
            let joint = track.joint as usize;
            if joint >= pose.len() {
                continue;
            }
            let local = track.sample(pose.local(joint), time, self.looping);
            pose.set_local(joint, local);
        }
        time
    }
}
