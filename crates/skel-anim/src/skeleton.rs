//! Immutable per-character binding data
//!
//! A skeleton bundles the rest pose, the bind pose, the precomputed inverse
//! bind-pose matrices, and the joint names. It is built once at load time,
//! validated there, and shared read-only afterwards.

use glam::Mat4;

use crate::error::{AnimError, Result};
use crate::pose::Pose;

/// Rest pose, bind pose, inverse bind matrices, and joint names
///
/// `inverse_bind_pose[i]` is the inverse of the bind pose's global
/// transform for joint `i`, computed once here. After construction a
/// skeleton never changes and is safe to share across threads.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Skeleton {
    rest_pose: Pose,
    bind_pose: Pose,
    inverse_bind_pose: Vec<Mat4>,
    joint_names: Vec<String>,
}

impl Skeleton {
    /// Build a skeleton, validating joint counts and precomputing the
    /// inverse bind-pose matrices
    pub fn new(rest_pose: Pose, bind_pose: Pose, joint_names: Vec<String>) -> Result<Self> {
        if rest_pose.len() != bind_pose.len() || bind_pose.len() != joint_names.len() {
            return Err(AnimError::MismatchedJointCounts {
                rest: rest_pose.len(),
                bind: bind_pose.len(),
                names: joint_names.len(),
            });
        }

        let joint_count = bind_pose.len();
        let mut inverse_bind_pose = Vec::with_capacity(joint_count);
        for joint in 0..joint_count {
            inverse_bind_pose.push(bind_pose.global_transform(joint).to_mat4().inverse());
        }

        if (0..joint_count).any(|i| bind_pose.parent(i) > i as i32) {
            log::warn!(
                "skeleton parents are not in ascending order; matrix palette \
                 extraction will fall back to per-joint chain walks"
            );
        }
        log::debug!("skeleton built: {joint_count} joints");

        Ok(Self {
            rest_pose,
            bind_pose,
            inverse_bind_pose,
            joint_names,
        })
    }

    /// Number of joints
    pub fn len(&self) -> usize {
        self.joint_names.len()
    }

    /// Whether the skeleton has no joints
    pub fn is_empty(&self) -> bool {
        self.joint_names.is_empty()
    }

    /// The default/neutral pose absent any animation
    pub fn rest_pose(&self) -> &Pose {
        &self.rest_pose
    }

    /// The pose the mesh's vertices were skinned against
    pub fn bind_pose(&self) -> &Pose {
        &self.bind_pose
    }

    /// Precomputed inverse bind-pose matrices, one per joint
    pub fn inverse_bind_pose(&self) -> &[Mat4] {
        &self.inverse_bind_pose
    }

    /// Joint names in index order
    pub fn joint_names(&self) -> &[String] {
        &self.joint_names
    }

    /// Name of `joint`, if in range
    pub fn joint_name(&self, joint: usize) -> Option<&str> {
        self.joint_names.get(joint).map(String::as_str)
    }

    /// Index of the joint named `name`, if present
    pub fn joint_index(&self, name: &str) -> Option<usize> {
        self.joint_names.iter().position(|n| n == name)
    }
}
