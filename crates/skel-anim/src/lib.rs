//! Skeletal animation runtime
//!
//! This crate provides the animation core for rigged characters:
//! - Flattened joint hierarchies ([`Pose`]) with global-transform
//!   resolution and matrix-palette extraction
//! - Keyframe tracks and clips with constant, linear, and cubic Hermite
//!   sampling ([`Track`], [`Clip`])
//! - Pose blending and cross-fade clip playback
//! - CPU vertex skinning and the joint matrix palette for GPU skinning
//! - FABRIK and CCD chain solvers ([`IkChain`])
//!
//! All operations are synchronous call-and-return, run once per frame on
//! the thread driving the update loop. [`Skeleton`] is immutable after
//! construction and safe to share; per-character state (poses, chains,
//! controllers) must be confined to one thread at a time.

pub mod clip;
pub mod crossfade;
pub mod error;
pub mod ik;
pub mod pose;
pub mod skeleton;
pub mod skinning;
pub mod track;
pub mod transform;

pub use clip::{Clip, JointTrack};
pub use crossfade::CrossFadeController;
pub use error::{AnimError, Result};
pub use ik::{IkChain, IkLink, IkSettings};
pub use pose::Pose;
pub use skeleton::Skeleton;
pub use skinning::{Skinner, VertexInfluences, skin_matrices, skin_vertex};
pub use track::{
    Interpolation, Keyframe, QuaternionTrack, ScalarTrack, Track, TrackValue, VectorTrack,
};
pub use transform::Transform;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
