//! Keyframe tracks
//!
//! A track is an ordered sequence of timestamped keyframes for one animated
//! channel, sampled every frame with constant, linear, or cubic Hermite
//! interpolation. Tracks exist for a closed set of value types — scalars,
//! vectors, and quaternions — sharing one sampling interface; quaternion
//! tracks additionally apply shortest-arc neighborhood correction.

use std::cmp::Ordering;

use glam::{Quat, Vec3};

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for glam::Vec3 {}
    impl Sealed for glam::Quat {}
}

/// Values a track can animate: `f32`, [`Vec3`], or [`Quat`]
///
/// The set is closed so each variant keeps its own interpolation semantics;
/// the quaternion implementation carries the shortest-arc sign flip and
/// post-interpolation normalization the other variants do not need.
pub trait TrackValue: Copy + sealed::Sealed {
    /// Value returned when a track has no keyframes
    const DEFAULT: Self;
    /// Additive zero, used for default tangents
    const ZERO: Self;

    /// Linear interpolation between `a` and `b`
    fn lerp(a: Self, b: Self, t: f32) -> Self;
    /// Bring `b` into the neighborhood of `a` (quaternion sign flip; identity otherwise)
    fn neighborhood(a: Self, b: Self) -> Self;
    /// Scale by a scalar
    fn scale(self, s: f32) -> Self;
    /// Component-wise addition
    fn add(self, other: Self) -> Self;
    /// Post-interpolation fixup (quaternion normalization; identity otherwise)
    fn finalize(self) -> Self;
}

impl TrackValue for f32 {
    const DEFAULT: Self = 0.0;
    const ZERO: Self = 0.0;

    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a + (b - a) * t
    }

    fn neighborhood(_a: Self, b: Self) -> Self {
        b
    }

    fn scale(self, s: f32) -> Self {
        self * s
    }

    fn add(self, other: Self) -> Self {
        self + other
    }

    fn finalize(self) -> Self {
        self
    }
}

impl TrackValue for Vec3 {
    const DEFAULT: Self = Vec3::ZERO;
    const ZERO: Self = Vec3::ZERO;

    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a + (b - a) * t
    }

    fn neighborhood(_a: Self, b: Self) -> Self {
        b
    }

    fn scale(self, s: f32) -> Self {
        self * s
    }

    fn add(self, other: Self) -> Self {
        self + other
    }

    fn finalize(self) -> Self {
        self
    }
}

impl TrackValue for Quat {
    const DEFAULT: Self = Quat::IDENTITY;
    const ZERO: Self = Quat::from_xyzw(0.0, 0.0, 0.0, 0.0);

    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a + (b - a) * t
    }

    fn neighborhood(a: Self, b: Self) -> Self {
        if a.dot(b) < 0.0 { -b } else { b }
    }

    fn scale(self, s: f32) -> Self {
        self * s
    }

    fn add(self, other: Self) -> Self {
        self + other
    }

    fn finalize(self) -> Self {
        self.normalize()
    }
}

/// A single timestamped sample with Hermite tangents
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Keyframe<T> {
    /// Sample time in seconds
    pub time: f32,
    /// Sampled value
    pub value: T,
    /// Incoming tangent (cubic interpolation only)
    pub in_tangent: T,
    /// Outgoing tangent (cubic interpolation only)
    pub out_tangent: T,
}

impl<T: TrackValue> Keyframe<T> {
    /// Keyframe with zero tangents
    pub fn new(time: f32, value: T) -> Self {
        Self {
            time,
            value,
            in_tangent: T::ZERO,
            out_tangent: T::ZERO,
        }
    }

    /// Keyframe with explicit Hermite tangents
    pub fn with_tangents(time: f32, value: T, in_tangent: T, out_tangent: T) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }
}

/// How values between keyframes are computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum Interpolation {
    /// Hold the left keyframe's value across the segment
    Constant,
    /// Linear blend between the bracketing keyframes
    #[default]
    Linear,
    /// Cubic Hermite using the standard basis
    /// (`h00 = 2t³−3t²+1`, `h10 = t³−2t²+t`, `h01 = −2t³+3t²`, `h11 = t³−t²`)
    /// with `out_tangent`/`in_tangent` scaled by the segment duration,
    /// giving C¹-continuous curves
    Cubic,
}

/// An ordered keyframe sequence for one animated channel
///
/// Built once from clip data, immutable afterwards, queried every frame.
/// Keyframes are sorted by time at construction; a track needs at least two
/// keyframes before [`start_time`](Track::start_time)/
/// [`end_time`](Track::end_time) are meaningful.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Track<T> {
    keyframes: Vec<Keyframe<T>>,
    interpolation: Interpolation,
}

/// Track animating a scalar channel
pub type ScalarTrack = Track<f32>;
/// Track animating a vector channel (position or scale)
pub type VectorTrack = Track<Vec3>;
/// Track animating a rotation channel
pub type QuaternionTrack = Track<Quat>;

impl<T: TrackValue> Track<T> {
    /// Empty track with the given interpolation mode
    pub fn new(interpolation: Interpolation) -> Self {
        Self {
            keyframes: Vec::new(),
            interpolation,
        }
    }

    /// Build a track from keyframes, sorting them by time
    ///
    /// Out-of-order input is tolerated by sorting here; duplicate timestamps
    /// collapse onto the left keyframe of the degenerate segment.
    pub fn from_keyframes(mut keyframes: Vec<Keyframe<T>>, interpolation: Interpolation) -> Self {
        keyframes.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(Ordering::Equal));
        Self {
            keyframes,
            interpolation,
        }
    }

    /// Number of keyframes
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    /// Whether the track has no keyframes
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Whether the track carries animation data (at least two keyframes)
    pub fn is_animated(&self) -> bool {
        self.keyframes.len() >= 2
    }

    /// Interpolation mode
    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Keyframes in time order
    pub fn keyframes(&self) -> &[Keyframe<T>] {
        &self.keyframes
    }

    /// First keyframe time (meaningful only when [`is_animated`](Track::is_animated))
    pub fn start_time(&self) -> f32 {
        self.keyframes.first().map_or(0.0, |k| k.time)
    }

    /// Last keyframe time (meaningful only when [`is_animated`](Track::is_animated))
    pub fn end_time(&self) -> f32 {
        self.keyframes.last().map_or(0.0, |k| k.time)
    }

    /// Sample the track at `time`
    ///
    /// Out-of-range times wrap modulo the track duration when `looping`,
    /// otherwise clamp to the keyframe range. A track with fewer than two
    /// keyframes returns its single value or the type default.
    pub fn sample(&self, time: f32, looping: bool) -> T {
        match self.keyframes.len() {
            0 => T::DEFAULT,
            1 => self.keyframes[0].value,
            _ => self.sample_animated(time, looping),
        }
    }

    fn adjust_time(&self, time: f32, looping: bool) -> f32 {
        let start = self.start_time();
        let end = self.end_time();
        let duration = end - start;
        if duration <= 0.0 {
            return start;
        }
        if looping {
            start + (time - start).rem_euclid(duration)
        } else {
            time.clamp(start, end)
        }
    }

    fn sample_animated(&self, time: f32, looping: bool) -> T {
        let t = self.adjust_time(time, looping);
        let last = self.keyframes.len() - 1;
        if t >= self.keyframes[last].time {
            return self.keyframes[last].value;
        }

        // Largest index whose time is <= t, capped to the last segment start
        let index = self
            .keyframes
            .partition_point(|k| k.time <= t)
            .saturating_sub(1)
            .min(last - 1);
        let left = &self.keyframes[index];
        let right = &self.keyframes[index + 1];

        let dt = right.time - left.time;
        if dt <= f32::EPSILON {
            return left.value;
        }
        let u = (t - left.time) / dt;

        match self.interpolation {
            Interpolation::Constant => left.value,
            Interpolation::Linear => {
                let to = T::neighborhood(left.value, right.value);
                T::lerp(left.value, to, u).finalize()
            }
            Interpolation::Cubic => {
                let p0 = left.value;
                let m0 = left.out_tangent.scale(dt);
                let p1 = T::neighborhood(p0, right.value);
                let m1 = right.in_tangent.scale(dt);

                let u2 = u * u;
                let u3 = u2 * u;
                let h00 = 2.0 * u3 - 3.0 * u2 + 1.0;
                let h10 = u3 - 2.0 * u2 + u;
                let h01 = -2.0 * u3 + 3.0 * u2;
                let h11 = u3 - u2;

                p0.scale(h00)
                    .add(m0.scale(h10))
                    .add(p1.scale(h01))
                    .add(m1.scale(h11))
                    .finalize()
            }
        }
    }
}
