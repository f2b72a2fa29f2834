//! Vertex skinning
//!
//! Applies a pose (combined with a skeleton's inverse bind pose) to mesh
//! vertex data. The CPU path produces skinned position/normal buffers; for
//! the GPU path the crate's responsibility ends at the per-joint skin
//! matrices, which the renderer uploads and applies in a shader.
//!
//! Every vertex carries up to four joint influences. Weights are applied
//! as authored — a weighted sum with no renormalization — so zero-weight
//! vertices skin to zero.

use glam::{Mat4, Vec3};

use crate::pose::Pose;
use crate::skeleton::Skeleton;

/// Joint influences for one vertex: up to four joint indices with weights
///
/// Authoring is expected to supply weights summing to ~1. Unused slots
/// carry weight 0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexInfluences {
    /// Influencing joint indices
    pub joints: [u16; 4],
    /// Blend weight per joint
    pub weights: [f32; 4],
}

impl VertexInfluences {
    /// Full weight on a single joint
    pub fn single(joint: u16) -> Self {
        Self {
            joints: [joint, 0, 0, 0],
            weights: [1.0, 0.0, 0.0, 0.0],
        }
    }
}

/// Fill `out` with the per-joint skin matrices for the current pose:
/// `palette[i] * inverse_bind_pose[i]`
///
/// This is the GPU-path product; the CPU path consumes it too.
pub fn skin_matrices(pose: &Pose, skeleton: &Skeleton, out: &mut Vec<Mat4>) {
    pose.matrix_palette(out);
    for (matrix, inverse_bind) in out.iter_mut().zip(skeleton.inverse_bind_pose()) {
        *matrix = *matrix * *inverse_bind;
    }
}

/// Skin one vertex against precomputed skin matrices
///
/// Each influence transforms the bind-pose position and normal by its skin
/// matrix; the four results are blended by the authored weights. Influences
/// referencing joints outside the matrix array contribute nothing.
pub fn skin_vertex(
    skin_matrices: &[Mat4],
    influences: &VertexInfluences,
    position: Vec3,
    normal: Vec3,
) -> (Vec3, Vec3) {
    let mut skinned_position = Vec3::ZERO;
    let mut skinned_normal = Vec3::ZERO;
    for slot in 0..4 {
        let weight = influences.weights[slot];
        if weight == 0.0 {
            continue;
        }
        let Some(matrix) = skin_matrices.get(influences.joints[slot] as usize) else {
            continue;
        };
        skinned_position += matrix.transform_point3(position) * weight;
        skinned_normal += matrix.transform_vector3(normal) * weight;
    }
    (skinned_position, skinned_normal)
}

/// CPU skinner with reusable output and scratch buffers
///
/// Holds the skin-matrix scratch array and the skinned vertex buffers so
/// per-frame skinning allocates nothing after the first call.
#[derive(Debug, Default)]
pub struct Skinner {
    skin_matrices: Vec<Mat4>,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
}

impl Skinner {
    /// Skinner with empty buffers
    pub fn new() -> Self {
        Self::default()
    }

    /// Skin the given bind-pose vertex data against `pose` and `skeleton`
    ///
    /// Returns the skinned position and normal buffers, valid until the
    /// next call. Inputs are consumed index-aligned; the shortest of the
    /// three slices bounds the output, and empty input produces empty
    /// output.
    pub fn skin(
        &mut self,
        positions: &[Vec3],
        normals: &[Vec3],
        influences: &[VertexInfluences],
        pose: &Pose,
        skeleton: &Skeleton,
    ) -> (&[Vec3], &[Vec3]) {
        skin_matrices(pose, skeleton, &mut self.skin_matrices);

        let vertex_count = positions.len().min(normals.len()).min(influences.len());
        self.positions.clear();
        self.normals.clear();
        self.positions.reserve(vertex_count);
        self.normals.reserve(vertex_count);

        for i in 0..vertex_count {
            let (position, normal) =
                skin_vertex(&self.skin_matrices, &influences[i], positions[i], normals[i]);
            self.positions.push(position);
            self.normals.push(normal);
        }
        (&self.positions, &self.normals)
    }

    /// Skinned positions from the most recent [`skin`](Skinner::skin) call
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Skinned normals from the most recent [`skin`](Skinner::skin) call
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Transform;
    use glam::Quat;
    use std::f32::consts::FRAC_PI_2;

    /// Two-joint skeleton: root at origin, child one unit up, bind == rest
    fn test_skeleton() -> Skeleton {
        let mut bind = Pose::new(2);
        bind.set_parent(1, 0);
        bind.set_local(1, Transform::from_translation(Vec3::new(0.0, 1.0, 0.0)));
        Skeleton::new(bind.clone(), bind, vec!["root".into(), "arm".into()])
            .expect("valid skeleton")
    }

    #[test]
    fn test_skin_matrices_identity_at_bind_pose() {
        let skeleton = test_skeleton();
        let pose = skeleton.bind_pose().clone();

        let mut matrices = Vec::new();
        skin_matrices(&pose, &skeleton, &mut matrices);
        assert_eq!(matrices.len(), 2);
        for matrix in &matrices {
            for (a, b) in matrix
                .to_cols_array()
                .iter()
                .zip(Mat4::IDENTITY.to_cols_array().iter())
            {
                assert!((a - b).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_single_influence_matches_direct_transform() {
        let skeleton = test_skeleton();
        let mut pose = skeleton.bind_pose().clone();
        pose.set_local(
            1,
            Transform::new(
                Vec3::new(0.0, 1.0, 0.0),
                Quat::from_rotation_z(FRAC_PI_2),
                Vec3::ONE,
            ),
        );

        let mut matrices = Vec::new();
        skin_matrices(&pose, &skeleton, &mut matrices);

        let position = Vec3::new(0.0, 2.0, 0.0);
        let normal = Vec3::new(0.0, 1.0, 0.0);
        let (skinned_position, skinned_normal) = skin_vertex(
            &matrices,
            &VertexInfluences::single(1),
            position,
            normal,
        );

        // Full weight on one joint reproduces that joint's skin transform
        let expected_position = matrices[1].transform_point3(position);
        let expected_normal = matrices[1].transform_vector3(normal);
        assert!(skinned_position.distance(expected_position) < 0.001);
        assert!(skinned_normal.distance(expected_normal) < 0.001);
    }

    #[test]
    fn test_weighted_blend_of_two_joints() {
        let skeleton = test_skeleton();
        let mut pose = skeleton.bind_pose().clone();
        // Move the child joint one extra unit up from its bind position
        pose.set_local(1, Transform::from_translation(Vec3::new(0.0, 2.0, 0.0)));

        let mut matrices = Vec::new();
        skin_matrices(&pose, &skeleton, &mut matrices);

        let influences = VertexInfluences {
            joints: [0, 1, 0, 0],
            weights: [0.5, 0.5, 0.0, 0.0],
        };
        let position = Vec3::new(0.0, 1.0, 0.0);
        let (skinned, _) = skin_vertex(&matrices, &influences, position, Vec3::Y);

        // Root keeps the vertex at (0,1,0); the child carries it to (0,2,0);
        // equal weights average the two
        assert!(skinned.distance(Vec3::new(0.0, 1.5, 0.0)) < 0.001);
    }

    #[test]
    fn test_zero_weights_skin_to_zero() {
        let skeleton = test_skeleton();
        let pose = skeleton.bind_pose().clone();
        let mut matrices = Vec::new();
        skin_matrices(&pose, &skeleton, &mut matrices);

        let influences = VertexInfluences::default();
        let (position, normal) =
            skin_vertex(&matrices, &influences, Vec3::new(1.0, 2.0, 3.0), Vec3::Y);
        assert_eq!(position, Vec3::ZERO);
        assert_eq!(normal, Vec3::ZERO);
    }

    #[test]
    fn test_out_of_range_joint_contributes_nothing() {
        let skeleton = test_skeleton();
        let pose = skeleton.bind_pose().clone();
        let mut matrices = Vec::new();
        skin_matrices(&pose, &skeleton, &mut matrices);

        let influences = VertexInfluences {
            joints: [0, 99, 0, 0],
            weights: [0.5, 0.5, 0.0, 0.0],
        };
        let (skinned, _) = skin_vertex(&matrices, &influences, Vec3::ONE, Vec3::Y);
        // Only the valid half contributes
        assert!(skinned.distance(Vec3::ONE * 0.5) < 0.001);
    }

    #[test]
    fn test_skinner_reuses_buffers_and_handles_empty() {
        let skeleton = test_skeleton();
        let pose = skeleton.bind_pose().clone();
        let mut skinner = Skinner::new();

        let (positions, normals) = skinner.skin(&[], &[], &[], &pose, &skeleton);
        assert!(positions.is_empty());
        assert!(normals.is_empty());

        let bind_positions = [Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0)];
        let bind_normals = [Vec3::Y, Vec3::Y];
        let influences = [VertexInfluences::single(0), VertexInfluences::single(1)];
        let (positions, _) = skinner.skin(
            &bind_positions,
            &bind_normals,
            &influences,
            &pose,
            &skeleton,
        );
        // At bind pose, skinning is the identity
        assert!(positions[0].distance(bind_positions[0]) < 0.001);
        assert!(positions[1].distance(bind_positions[1]) < 0.001);
    }
}
