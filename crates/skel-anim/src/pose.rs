//! Flattened joint hierarchy
//!
//! A pose stores the hierarchy as two parallel arrays — integer parent
//! indices and local transforms — instead of a pointer tree. Parents are
//! expected (not required) to come before their children in index order:
//! while that holds, matrix-palette extraction runs incrementally in O(n);
//! where it is violated the palette falls back to per-joint parent-chain
//! walks for the remaining joints.

use glam::Mat4;

use crate::error::{AnimError, Result};
use crate::transform::Transform;

/// A complete set of local joint transforms plus the parent index array
///
/// `parents[i] == -1` marks a root. Created from a skeleton's rest/bind
/// data or by cloning, then mutated in place every frame by clip sampling.
/// Cycle-free parent graphs are a construction-time responsibility
/// ([`Pose::from_parts`] validates them); per-frame accessors do not check.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Pose {
    parents: Vec<i32>,
    locals: Vec<Transform>,
}

impl Pose {
    /// Pose with `joint_count` root joints at identity
    pub fn new(joint_count: usize) -> Self {
        Self {
            parents: vec![-1; joint_count],
            locals: vec![Transform::IDENTITY; joint_count],
        }
    }

    /// Build a pose from parallel parent/local arrays, validating structure
    ///
    /// Rejects mismatched array lengths, parent indices outside
    /// `-1..joint_count`, and cyclic parent chains.
    pub fn from_parts(parents: Vec<i32>, locals: Vec<Transform>) -> Result<Self> {
        if parents.len() != locals.len() {
            return Err(AnimError::MismatchedArrayLengths {
                parents: parents.len(),
                locals: locals.len(),
            });
        }
        let joint_count = parents.len();
        for (joint, &parent) in parents.iter().enumerate() {
            if parent < -1 || parent >= joint_count as i32 {
                return Err(AnimError::ParentOutOfRange {
                    joint,
                    parent,
                    joint_count,
                });
            }
        }
        // A chain longer than the joint count can only mean a cycle
        for joint in 0..joint_count {
            let mut current = parents[joint];
            let mut steps = 0;
            while current >= 0 {
                steps += 1;
                if steps > joint_count {
                    return Err(AnimError::CyclicHierarchy { joint });
                }
                current = parents[current as usize];
            }
        }
        Ok(Self { parents, locals })
    }

    /// Resize to `joint_count` joints
    ///
    /// New joints default to identity transforms with no parent.
    pub fn resize(&mut self, joint_count: usize) {
        self.parents.resize(joint_count, -1);
        self.locals.resize(joint_count, Transform::IDENTITY);
    }

    /// Number of joints
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Whether the pose has no joints
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Local transform of `joint`
    pub fn local(&self, joint: usize) -> Transform {
        self.locals[joint]
    }

    /// Set the local transform of `joint`
    pub fn set_local(&mut self, joint: usize, transform: Transform) {
        self.locals[joint] = transform;
    }

    /// Parent index of `joint` (-1 for roots)
    pub fn parent(&self, joint: usize) -> i32 {
        self.parents[joint]
    }

    /// Set the parent index of `joint`
    pub fn set_parent(&mut self, joint: usize, parent: i32) {
        self.parents[joint] = parent;
    }

    /// Global transform of `joint`: its local transform composed with every
    /// ancestor's, right to left, up to a root
    pub fn global_transform(&self, joint: usize) -> Transform {
        let mut result = self.locals[joint];
        let mut parent = self.parents[joint];
        while parent >= 0 {
            let index = parent as usize;
            result = self.locals[index].combine(&result);
            parent = self.parents[index];
        }
        result
    }

    /// Fill `out` with one global-transform matrix per joint
    ///
    /// Two-phase: joints whose parent index does not exceed their own are
    /// composed incrementally against the already-computed parent matrix;
    /// from the first joint that breaks the ordering onward, every
    /// remaining joint falls back to [`global_transform`](Pose::global_transform).
    /// The fallback is correct but O(depth) per joint.
    pub fn matrix_palette(&self, out: &mut Vec<Mat4>) {
        let joint_count = self.locals.len();
        out.clear();
        out.reserve(joint_count);

        let mut i = 0;
        while i < joint_count {
            let parent = self.parents[i];
            if parent > i as i32 {
                break;
            }
            let mut global = self.locals[i].to_mat4();
            if parent >= 0 {
                global = out[parent as usize] * global;
            }
            out.push(global);
            i += 1;
        }
        for joint in i..joint_count {
            out.push(self.global_transform(joint).to_mat4());
        }
    }

    /// Whether `node` lies in the sub-hierarchy rooted at `ancestor`
    /// (inclusive: a joint is in its own hierarchy)
    pub fn is_in_hierarchy(&self, ancestor: usize, node: usize) -> bool {
        let mut current = node as i32;
        while current >= 0 {
            if current as usize == ancestor {
                return true;
            }
            current = self.parents[current as usize];
        }
        false
    }

    /// Blend poses `a` and `b` at factor `t` into `out`
    ///
    /// With `root < 0` every joint is blended; otherwise only joints inside
    /// the sub-hierarchy rooted at `root` are written and the rest of `out`
    /// is left untouched (callers pre-seed `out`, typically from `a`).
    pub fn blend(out: &mut Pose, a: &Pose, b: &Pose, t: f32, root: i32) {
        let joint_count = out.len().min(a.len()).min(b.len());
        for joint in 0..joint_count {
            if root >= 0 && !out.is_in_hierarchy(root as usize, joint) {
                continue;
            }
            out.set_local(joint, a.local(joint).lerp(&b.local(joint), t));
        }
    }

    /// In-place variant of [`blend`](Pose::blend): `self` is both the left
    /// input and the output
    pub fn blend_with(&mut self, other: &Pose, t: f32, root: i32) {
        let joint_count = self.len().min(other.len());
        for joint in 0..joint_count {
            if root >= 0 && !self.is_in_hierarchy(root as usize, joint) {
                continue;
            }
            let blended = self.locals[joint].lerp(&other.local(joint), t);
            self.locals[joint] = blended;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};
    use pretty_assertions::assert_eq;
    use std::f32::consts::FRAC_PI_2;

    /// root -> spine -> head, offset one unit along Y each
    fn chain_pose() -> Pose {
        let mut pose = Pose::new(3);
        pose.set_parent(1, 0);
        pose.set_parent(2, 1);
        pose.set_local(0, Transform::from_translation(Vec3::new(0.0, 1.0, 0.0)));
        pose.set_local(1, Transform::from_translation(Vec3::new(0.0, 1.0, 0.0)));
        pose.set_local(2, Transform::from_translation(Vec3::new(0.0, 1.0, 0.0)));
        pose
    }

    /// Same chain, but children stored before their parents
    fn out_of_order_pose() -> Pose {
        let mut pose = Pose::new(3);
        // joint 0 is the leaf, joint 2 is the root
        pose.set_parent(0, 1);
        pose.set_parent(1, 2);
        pose.set_local(0, Transform::from_translation(Vec3::new(0.0, 1.0, 0.0)));
        pose.set_local(1, Transform::from_translation(Vec3::new(0.0, 1.0, 0.0)));
        pose.set_local(2, Transform::from_rotation(Quat::from_rotation_z(FRAC_PI_2)));
        pose
    }

    fn assert_mat4_eq(a: &Mat4, b: &Mat4) {
        let a = a.to_cols_array();
        let b = b.to_cols_array();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-4, "matrix mismatch: {a:?} vs {b:?}");
        }
    }

    #[test]
    fn test_new_defaults() {
        let pose = Pose::new(4);
        assert_eq!(pose.len(), 4);
        for i in 0..4 {
            assert_eq!(pose.parent(i), -1);
            assert_eq!(pose.local(i), Transform::IDENTITY);
        }
    }

    #[test]
    fn test_from_parts_validation() {
        let err = Pose::from_parts(vec![-1, 0], vec![Transform::IDENTITY]).unwrap_err();
        assert_eq!(
            err,
            AnimError::MismatchedArrayLengths {
                parents: 2,
                locals: 1
            }
        );

        let err =
            Pose::from_parts(vec![-1, 5], vec![Transform::IDENTITY; 2]).unwrap_err();
        assert_eq!(
            err,
            AnimError::ParentOutOfRange {
                joint: 1,
                parent: 5,
                joint_count: 2
            }
        );

        // 1 -> 2 -> 1 cycle
        let err =
            Pose::from_parts(vec![-1, 2, 1], vec![Transform::IDENTITY; 3]).unwrap_err();
        assert!(matches!(err, AnimError::CyclicHierarchy { .. }));
    }

    #[test]
    fn test_global_transform_chain() {
        let pose = chain_pose();
        assert!(
            pose.global_transform(2)
                .translation
                .distance(Vec3::new(0.0, 3.0, 0.0))
                < 0.001
        );
    }

    #[test]
    fn test_global_transform_with_rotation() {
        let mut pose = chain_pose();
        // Rotating the root swings the whole chain onto -X
        pose.set_local(
            0,
            Transform::from_rotation(Quat::from_rotation_z(FRAC_PI_2)),
        );
        let head = pose.global_transform(2).translation;
        assert!(head.distance(Vec3::new(-2.0, 0.0, 0.0)) < 0.001);
    }

    #[test]
    fn test_palette_matches_global_transforms_fast_path() {
        let mut pose = chain_pose();
        pose.set_local(
            1,
            Transform::new(
                Vec3::new(0.0, 1.0, 0.0),
                Quat::from_rotation_y(0.5),
                Vec3::ONE,
            ),
        );

        let mut palette = Vec::new();
        pose.matrix_palette(&mut palette);
        assert_eq!(palette.len(), pose.len());
        for i in 0..pose.len() {
            assert_mat4_eq(&palette[i], &pose.global_transform(i).to_mat4());
        }
    }

    #[test]
    fn test_palette_matches_global_transforms_fallback_path() {
        let pose = out_of_order_pose();

        let mut palette = Vec::new();
        pose.matrix_palette(&mut palette);
        assert_eq!(palette.len(), pose.len());
        for i in 0..pose.len() {
            assert_mat4_eq(&palette[i], &pose.global_transform(i).to_mat4());
        }
    }

    #[test]
    fn test_palette_empty_pose() {
        let pose = Pose::new(0);
        let mut palette = vec![Mat4::IDENTITY; 8];
        pose.matrix_palette(&mut palette);
        assert!(palette.is_empty());
    }

    #[test]
    fn test_is_in_hierarchy() {
        let pose = chain_pose();
        // Reflexive
        assert!(pose.is_in_hierarchy(0, 0));
        assert!(pose.is_in_hierarchy(1, 1));
        // Descendants
        assert!(pose.is_in_hierarchy(0, 2));
        assert!(pose.is_in_hierarchy(1, 2));
        // Not ancestors
        assert!(!pose.is_in_hierarchy(2, 0));
        assert!(!pose.is_in_hierarchy(1, 0));
    }

    #[test]
    fn test_blend_identical_inputs() {
        let a = chain_pose();
        let mut out = a.clone();
        for t in [0.0, 0.3, 0.7, 1.0] {
            Pose::blend(&mut out, &a, &a, t, -1);
            assert_eq!(out, a);
        }
    }

    #[test]
    fn test_blend_endpoints_exact() {
        let a = chain_pose();
        let mut b = chain_pose();
        b.set_local(1, Transform::from_translation(Vec3::new(4.0, 2.0, 0.0)));
        b.set_local(
            2,
            Transform::from_rotation(Quat::from_xyzw(0.0, 0.0, 1.0, 0.0)),
        );

        let mut out = a.clone();
        Pose::blend(&mut out, &a, &b, 0.0, -1);
        assert_eq!(out, a);

        Pose::blend(&mut out, &a, &b, 1.0, -1);
        assert_eq!(out, b);
    }

    #[test]
    fn test_blend_sub_hierarchy_untouched_outside() {
        let a = chain_pose();
        let mut b = chain_pose();
        b.set_local(0, Transform::from_translation(Vec3::new(9.0, 0.0, 0.0)));
        b.set_local(2, Transform::from_translation(Vec3::new(0.0, 9.0, 0.0)));

        // Blend only the sub-hierarchy rooted at joint 1: joint 0 keeps the
        // pre-seeded value from a
        let mut out = a.clone();
        Pose::blend(&mut out, &a, &b, 1.0, 1);
        assert_eq!(out.local(0), a.local(0));
        assert_eq!(out.local(2), b.local(2));
    }

    #[test]
    fn test_blend_with_matches_blend() {
        let a = chain_pose();
        let mut b = chain_pose();
        b.set_local(1, Transform::from_translation(Vec3::new(2.0, 0.0, 2.0)));

        let mut expected = a.clone();
        Pose::blend(&mut expected, &a, &b, 0.5, -1);

        let mut in_place = a.clone();
        in_place.blend_with(&b, 0.5, -1);
        assert_eq!(in_place, expected);
    }

    #[test]
    fn test_resize_preserves_and_defaults() {
        let mut pose = chain_pose();
        pose.resize(5);
        assert_eq!(pose.len(), 5);
        assert_eq!(pose.parent(4), -1);
        assert_eq!(pose.local(4), Transform::IDENTITY);
        assert_eq!(pose.parent(2), 1);
    }
}
