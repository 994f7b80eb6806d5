//! Per-frame book poses: idle breathing, hover lift and easing.

use folio_core::BookId;

use crate::math::Vec3;
use crate::scene::{SceneGraph, Transform};

pub const HOVER_LIFT: f32 = 0.25;
pub const HOVER_FORWARD: f32 = 0.15;
pub const HOVER_TILT: f32 = -0.2;
pub const HOVER_SCALE: f32 = 1.06;
pub const IDLE_BOB: f32 = 0.03;
pub const IDLE_SWAY: f32 = 0.025;
pub const IDLE_SPEED: f32 = 1.4;
pub const PHASE_STEP: f32 = 0.9;
pub const EASE_PER_FRAME: f32 = 0.1;
const REFERENCE_FPS: f32 = 60.0;

pub type Pose = Transform;

/// The pose a book is heading toward at `time` seconds.
pub fn target_pose(
    base: &Transform,
    time: f32,
    index: usize,
    hovered: bool,
    reduced_motion: bool,
) -> Pose {
    if hovered {
        return Pose {
            position: base.position + Vec3::new(0.0, HOVER_LIFT, HOVER_FORWARD),
            rotation: base.rotation + Vec3::new(HOVER_TILT, 0.0, 0.0),
            scale: base.scale * HOVER_SCALE,
        };
    }
    if reduced_motion {
        return *base;
    }

    let phase = time * IDLE_SPEED + index as f32 * PHASE_STEP;
    Pose {
        position: base.position + Vec3::new(0.0, phase.sin() * IDLE_BOB, 0.0),
        rotation: base.rotation + Vec3::new(0.0, (phase * 0.7).cos() * IDLE_SWAY, 0.0),
        scale: base.scale,
    }
}

/// Share of the remaining distance covered in a frame of `dt` seconds.
pub fn frame_factor(dt: f32) -> f32 {
    let frames = (dt.max(0.0)) * REFERENCE_FPS;
    1.0 - (1.0 - EASE_PER_FRAME).powf(frames)
}

pub fn ease_toward(current: &Pose, target: &Pose, factor: f32) -> Pose {
    let t = factor.clamp(0.0, 1.0);
    Pose {
        position: current.position.lerp(target.position, t),
        rotation: current.rotation.lerp(target.rotation, t),
        scale: current.scale + (target.scale - current.scale) * t,
    }
}

#[derive(Debug, Clone)]
pub struct PoseAnimator {
    poses: Vec<Pose>,
    time: f32,
    reduced_motion: bool,
}

impl PoseAnimator {
    pub fn new(scene: &SceneGraph) -> Self {
        Self {
            poses: scene.books().iter().map(|mesh| mesh.base).collect(),
            time: 0.0,
            reduced_motion: false,
        }
    }

    pub fn set_reduced_motion(&mut self, reduced: bool) {
        self.reduced_motion = reduced;
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Advances the clock by `dt` and eases every book toward its target.
    pub fn tick(&mut self, scene: &SceneGraph, dt: f32, hovered: Option<&BookId>) {
        self.time += dt.max(0.0);
        if self.poses.len() != scene.books().len() {
            self.poses = scene.books().iter().map(|mesh| mesh.base).collect();
        }
        let factor = frame_factor(dt);
        for (pose, mesh) in self.poses.iter_mut().zip(scene.books()) {
            let is_hovered = hovered.is_some_and(|id| *id == mesh.book_id);
            let target = target_pose(
                &mesh.base,
                self.time,
                mesh.index,
                is_hovered,
                self.reduced_motion,
            );
            *pose = ease_toward(pose, &target, factor);
        }
    }

    pub fn poses(&self) -> &[Pose] {
        &self.poses
    }

    pub fn pose(&self, index: usize) -> Option<&Pose> {
        self.poses.get(index)
    }
}
