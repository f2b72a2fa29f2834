//! Clip playback with cross-fading
//!
//! A [`CrossFadeController`] owns a playback cursor and a working pose for
//! one character. Fading to another clip queues a fade target that is
//! blended in with a linearly increasing factor each update until the fade
//! completes and the target becomes the active clip. Clips live outside
//! the controller and are passed to [`update`](CrossFadeController::update)
//! by slice, so many characters can share one clip library.

use crate::clip::Clip;
use crate::pose::Pose;
use crate::skeleton::Skeleton;

/// A pending fade: the clip being faded in plus its own playback state
#[derive(Debug, Clone)]
struct CrossFadeTarget {
    clip: usize,
    pose: Pose,
    time: f32,
    duration: f32,
    elapsed: f32,
}

/// Plays one clip at a time and cross-fades into the next
#[derive(Debug, Clone)]
pub struct CrossFadeController {
    rest_pose: Pose,
    pose: Pose,
    clip: Option<usize>,
    time: f32,
    targets: Vec<CrossFadeTarget>,
}

impl CrossFadeController {
    /// Controller seeded with a skeleton's rest pose
    pub fn new(skeleton: &Skeleton) -> Self {
        Self {
            rest_pose: skeleton.rest_pose().clone(),
            pose: skeleton.rest_pose().clone(),
            clip: None,
            time: 0.0,
            targets: Vec::new(),
        }
    }

    /// Start playing `clip` immediately, dropping any pending fades
    pub fn play(&mut self, clip: usize) {
        self.clip = Some(clip);
        self.time = 0.0;
        self.pose = self.rest_pose.clone();
        self.targets.clear();
    }

    /// Queue a fade from the active clip into `clip` over `seconds`
    ///
    /// Without an active clip this plays `clip` directly. Fading into the
    /// clip that is already active (or already the most recent fade target)
    /// is ignored. A non-positive duration completes on the next update.
    pub fn fade_to(&mut self, clip: usize, seconds: f32) {
        let Some(active) = self.clip else {
            self.play(clip);
            return;
        };
        match self.targets.last() {
            Some(last) if last.clip == clip => return,
            None if active == clip => return,
            _ => {}
        }
        self.targets.push(CrossFadeTarget {
            clip,
            pose: self.rest_pose.clone(),
            time: 0.0,
            duration: seconds,
            elapsed: 0.0,
        });
    }

    /// Advance playback by `dt` seconds and rebuild the blended pose
    ///
    /// Finished fades promote their clip to the active one; remaining fade
    /// targets are sampled and blended over the active pose in queue order.
    /// Without an active clip (or with an out-of-range clip index) this is
    /// a no-op.
    pub fn update(&mut self, clips: &[Clip], dt: f32) {
        // Promote fades that completed last frame
        let mut index = 0;
        while index < self.targets.len() {
            if self.targets[index].elapsed >= self.targets[index].duration {
                let target = self.targets.remove(index);
                self.clip = Some(target.clip);
                self.time = target.time;
                self.pose = target.pose;
            } else {
                index += 1;
            }
        }

        let Some(active) = self.clip else {
            return;
        };
        let Some(clip) = clips.get(active) else {
            return;
        };

        self.pose = self.rest_pose.clone();
        self.time = clip.sample(&mut self.pose, self.time + dt);

        for target in &mut self.targets {
            let Some(target_clip) = clips.get(target.clip) else {
                continue;
            };
            target.pose = self.rest_pose.clone();
            target.time = target_clip.sample(&mut target.pose, target.time + dt);
            target.elapsed += dt;

            let factor = if target.duration > 0.0 {
                (target.elapsed / target.duration).clamp(0.0, 1.0)
            } else {
                1.0
            };
            self.pose.blend_with(&target.pose, factor, -1);
        }
    }

    /// The blended pose from the most recent update
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Index of the active clip, if any
    pub fn current_clip(&self) -> Option<usize> {
        self.clip
    }

    /// Playback time within the active clip
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Number of fades still in flight
    pub fn pending_fades(&self) -> usize {
        self.targets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::{Interpolation, Keyframe, Track};
    use glam::Vec3;

    /// Single-joint skeleton plus two clips translating the joint along
    /// different axes over one second
    fn fixture() -> (Skeleton, Vec<Clip>) {
        let pose = Pose::new(1);
        let skeleton =
            Skeleton::new(pose.clone(), pose, vec!["root".into()]).expect("valid skeleton");

        let make_clip = |name: &str, to: Vec3| {
            let mut track = crate::clip::JointTrack::new(0);
            track.translation = Track::from_keyframes(
                vec![Keyframe::new(0.0, Vec3::ZERO), Keyframe::new(1.0, to)],
                Interpolation::Linear,
            );
            Clip::from_tracks(name, vec![track])
        };

        let clips = vec![
            make_clip("slide_x", Vec3::new(10.0, 0.0, 0.0)),
            make_clip("slide_y", Vec3::new(0.0, 10.0, 0.0)),
        ];
        (skeleton, clips)
    }

    #[test]
    fn test_update_without_clip_is_noop() {
        let (skeleton, clips) = fixture();
        let mut controller = CrossFadeController::new(&skeleton);
        let before = controller.pose().clone();
        controller.update(&clips, 0.25);
        assert_eq!(controller.pose(), &before);
        assert_eq!(controller.current_clip(), None);
    }

    #[test]
    fn test_play_and_advance() {
        let (skeleton, clips) = fixture();
        let mut controller = CrossFadeController::new(&skeleton);
        controller.play(0);
        controller.update(&clips, 0.5);

        assert_eq!(controller.current_clip(), Some(0));
        assert!((controller.time() - 0.5).abs() < 0.001);
        assert!(
            controller
                .pose()
                .local(0)
                .translation
                .distance(Vec3::new(5.0, 0.0, 0.0))
                < 0.001
        );
    }

    #[test]
    fn test_fade_to_same_clip_ignored() {
        let (skeleton, _clips) = fixture();
        let mut controller = CrossFadeController::new(&skeleton);
        controller.play(0);
        controller.fade_to(0, 0.5);
        assert_eq!(controller.pending_fades(), 0);

        controller.fade_to(1, 0.5);
        controller.fade_to(1, 0.5);
        assert_eq!(controller.pending_fades(), 1);
    }

    #[test]
    fn test_mid_fade_pose_between_clips() {
        let (skeleton, clips) = fixture();
        let mut controller = CrossFadeController::new(&skeleton);
        controller.play(0);
        controller.fade_to(1, 1.0);

        // Half way through the fade both clips sit at t=0.5
        controller.update(&clips, 0.5);
        let translation = controller.pose().local(0).translation;
        assert!(translation.distance(Vec3::new(2.5, 2.5, 0.0)) < 0.001);
    }

    #[test]
    fn test_completed_fade_promotes_clip() {
        let (skeleton, clips) = fixture();
        let mut controller = CrossFadeController::new(&skeleton);
        controller.play(0);
        controller.fade_to(1, 0.25);

        controller.update(&clips, 0.25); // fade reaches full weight
        controller.update(&clips, 0.25); // promoted on the next update
        assert_eq!(controller.current_clip(), Some(1));
        assert_eq!(controller.pending_fades(), 0);

        // Pose now tracks the promoted clip alone
        let translation = controller.pose().local(0).translation;
        assert!((translation.x - 0.0).abs() < 0.001);
        assert!(translation.y > 0.0);
    }

    #[test]
    fn test_zero_duration_fade_completes_immediately() {
        let (skeleton, clips) = fixture();
        let mut controller = CrossFadeController::new(&skeleton);
        controller.play(0);
        controller.fade_to(1, 0.0);

        controller.update(&clips, 0.1); // full weight this frame
        controller.update(&clips, 0.1); // promoted
        assert_eq!(controller.current_clip(), Some(1));
    }
}
