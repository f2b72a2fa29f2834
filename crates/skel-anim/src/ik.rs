//! Inverse kinematics chain solvers
//!
//! An [`IkChain`] is an independent, flat sequence of links (root first,
//! end effector last), not tied to any skeleton. [`IkChain::solve`] runs a
//! FABRIK pass — backward and forward reaching sweeps over the joint
//! positions, then a write-back into link-local rotations — and
//! [`IkChain::solve_ccd`] offers the classic CCD alternative. Both preserve
//! link lengths, run a bounded number of iterations, and treat degenerate
//! zero-length links as pass-throughs.

use glam::{Quat, Vec3};

use crate::transform::Transform;

/// One chain link: a local offset and orientation relative to the previous link
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct IkLink {
    /// Offset from the previous joint, in its space
    pub translation: Vec3,
    /// Orientation relative to the previous link
    pub rotation: Quat,
}

impl IkLink {
    /// Link with the given offset and no rotation
    pub fn offset(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Default for IkLink {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

/// Solver iteration budget and convergence tolerance
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct IkSettings {
    /// Upper bound on solver iterations per call
    pub max_iterations: u32,
    /// End-effector distance below which the solve stops early
    pub threshold: f32,
}

impl Default for IkSettings {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            threshold: 1e-5,
        }
    }
}

/// An ordered joint chain solved toward a target position
///
/// Mutating a solve updates the link-local rotations in place; the joint
/// positions are available afterwards for debug visualization via
/// [`joint_positions`](IkChain::joint_positions).
#[derive(Debug, Clone, Default)]
pub struct IkChain {
    links: Vec<IkLink>,
    settings: IkSettings,
    // Scratch reused across solves
    points: Vec<Vec3>,
    lengths: Vec<f32>,
}

impl IkChain {
    /// Empty chain with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty chain with explicit solver settings
    pub fn with_settings(settings: IkSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Solver settings
    pub fn settings(&self) -> IkSettings {
        self.settings
    }

    /// Replace the solver settings
    pub fn set_settings(&mut self, settings: IkSettings) {
        self.settings = settings;
    }

    /// Number of links
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether the chain has no links
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Resize to `link_count` links; new links are identity
    pub fn resize(&mut self, link_count: usize) {
        self.links.resize(link_count, IkLink::default());
    }

    /// Link at `index`
    pub fn link(&self, index: usize) -> &IkLink {
        &self.links[index]
    }

    /// Mutable link at `index`, for setting up chain geometry
    pub fn link_mut(&mut self, index: usize) -> &mut IkLink {
        &mut self.links[index]
    }

    /// Replace the link at `index`
    pub fn set_link(&mut self, index: usize, link: IkLink) {
        self.links[index] = link;
    }

    /// Transform of link `index` in chain space (links composed root-first)
    pub fn global_transform(&self, index: usize) -> Transform {
        let mut result = Transform::new(
            self.links[0].translation,
            self.links[0].rotation,
            Vec3::ONE,
        );
        for link in &self.links[1..=index] {
            result = result.combine(&Transform::new(link.translation, link.rotation, Vec3::ONE));
        }
        result
    }

    /// Position of joint `index` in chain space
    pub fn global_position(&self, index: usize) -> Vec3 {
        self.global_transform(index).translation
    }

    /// Fill `out` with every joint position, root first (debug visualization)
    pub fn joint_positions(&self, out: &mut Vec<Vec3>) {
        out.clear();
        out.reserve(self.links.len());
        let mut current = Transform::IDENTITY;
        for link in &self.links {
            current = current.combine(&Transform::new(link.translation, link.rotation, Vec3::ONE));
            out.push(current.translation);
        }
    }

    /// Solve the chain toward the target position with FABRIK
    ///
    /// Backward passes re-anchor the end effector at the target, forward
    /// passes re-anchor the root, repeating up to the iteration budget or
    /// until the end-effector error drops under the threshold. Targets
    /// beyond the chain's total reach fully extend it along the ray from
    /// the root toward the target. Link lengths are invariant.
    ///
    /// Only the target's translation is consumed. Returns whether the end
    /// effector converged within the threshold.
    pub fn solve(&mut self, target: &Transform) -> bool {
        let link_count = self.links.len();
        if link_count == 0 {
            return false;
        }
        let goal = target.translation;
        let threshold_sq = self.settings.threshold * self.settings.threshold;

        self.flatten();
        let root = self.points[0];
        let total_reach: f32 = self.lengths.iter().sum();

        if root.distance(goal) > total_reach {
            // Unreachable: best effort is the fully extended chain on the
            // ray from the root toward the target
            let direction = (goal - root).normalize_or_zero();
            for i in 1..link_count {
                self.points[i] = self.points[i - 1] + direction * self.lengths[i];
            }
        } else {
            for iteration in 0..self.settings.max_iterations {
                if self.points[link_count - 1].distance_squared(goal) < threshold_sq {
                    log::trace!("ik converged after {iteration} iterations");
                    break;
                }
                self.iterate_backward(goal);
                self.iterate_forward(root);
            }
        }

        self.write_back();
        self.points[link_count - 1].distance_squared(goal) < threshold_sq
    }

    /// Solve the chain toward the target position with cyclic coordinate
    /// descent
    ///
    /// Rotates each link (end of the chain inward) so the end effector
    /// swings toward the goal, bounded by the same iteration budget and
    /// threshold as [`solve`](IkChain::solve). Link lengths are invariant
    /// by construction since only rotations change.
    pub fn solve_ccd(&mut self, target: &Transform) -> bool {
        let link_count = self.links.len();
        if link_count == 0 {
            return false;
        }
        let goal = target.translation;
        let threshold_sq = self.settings.threshold * self.settings.threshold;
        let last = link_count - 1;

        for iteration in 0..self.settings.max_iterations {
            if self.global_position(last).distance_squared(goal) < threshold_sq {
                log::trace!("ccd converged after {iteration} iterations");
                return true;
            }

            for joint in (0..last).rev() {
                let world = self.global_transform(joint);
                let effector = self.global_position(last);

                let to_effector = effector - world.translation;
                let to_goal = goal - world.translation;
                if to_effector.length_squared() < 1e-10 || to_goal.length_squared() < 1e-10 {
                    continue;
                }

                let world_delta =
                    Quat::from_rotation_arc(to_effector.normalize(), to_goal.normalize());
                let parent_rotation = if joint == 0 {
                    Quat::IDENTITY
                } else {
                    self.global_transform(joint - 1).rotation
                };
                let local_delta = parent_rotation.inverse() * world_delta * parent_rotation;
                self.links[joint].rotation = (local_delta * self.links[joint].rotation).normalize();
            }
        }

        self.global_position(last).distance_squared(goal) < threshold_sq
    }

    /// Flatten the links into world joint points and segment lengths
    fn flatten(&mut self) {
        let link_count = self.links.len();
        self.points.clear();
        self.lengths.clear();
        for i in 0..link_count {
            self.points.push(self.global_position(i));
        }
        self.lengths.push(0.0);
        for i in 1..link_count {
            self.lengths.push(self.points[i].distance(self.points[i - 1]));
        }
    }

    /// Backward reaching pass: pin the end effector to the goal and pull
    /// the chain toward it, preserving segment lengths
    fn iterate_backward(&mut self, goal: Vec3) {
        let last = self.points.len() - 1;
        self.points[last] = goal;
        for i in (0..last).rev() {
            // Zero-length segments collapse onto their neighbor (no-rotation
            // pass-through); normalize_or_zero avoids the divide
            let direction = (self.points[i] - self.points[i + 1]).normalize_or_zero();
            self.points[i] = self.points[i + 1] + direction * self.lengths[i + 1];
        }
    }

    /// Forward reaching pass: re-anchor the root and push the chain back out
    fn iterate_forward(&mut self, root: Vec3) {
        self.points[0] = root;
        for i in 1..self.points.len() {
            let direction = (self.points[i] - self.points[i - 1]).normalize_or_zero();
            self.points[i] = self.points[i - 1] + direction * self.lengths[i];
        }
    }

    /// Convert solved world points back into link-local rotations
    ///
    /// Walks the chain root-first so each link's correction sees the
    /// already-updated ancestors; every correction is a shortest-arc
    /// rotation applied in the link's local space, leaving offsets (and so
    /// link lengths) untouched.
    fn write_back(&mut self) {
        let link_count = self.links.len();
        for i in 0..link_count.saturating_sub(1) {
            let world = self.global_transform(i);
            let next_position = self.global_position(i + 1);

            let inverse_rotation = world.rotation.inverse();
            let to_next = inverse_rotation * (next_position - world.translation);
            let to_desired = inverse_rotation * (self.points[i + 1] - world.translation);
            if to_next.length_squared() < 1e-10 || to_desired.length_squared() < 1e-10 {
                continue;
            }

            let delta = Quat::from_rotation_arc(to_next.normalize(), to_desired.normalize());
            self.links[i].rotation = (self.links[i].rotation * delta).normalize();
        }
    }
}
