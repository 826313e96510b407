//! Camera follow smoothing toward the local centre of mass

use glam::{Vec2, Vec3};

#[derive(Clone, Copy, Debug)]
pub struct CameraFollow {
    pub position: Vec3,
    /// Offset from the followed point; `z` is the fixed camera depth
    pub offset: Vec3,
    pub follow_speed: f32,
}

impl CameraFollow {
    pub fn new(follow_speed: f32) -> Self {
        let offset = Vec3::new(0.0, 1.0, -10.0);
        Self {
            position: offset,
            offset,
            follow_speed,
        }
    }

    /// Ease toward `target`. Without a target the camera holds its last
    /// position.
    pub fn update(&mut self, target: Option<Vec2>, dt: f32) {
        let Some(target) = target else {
            return;
        };
        let goal = Vec3::new(
            target.x + self.offset.x,
            target.y + self.offset.y,
            self.offset.z,
        );
        let t = (self.follow_speed * dt).clamp(0.0, 1.0);
        self.position = self.position.lerp(goal, t);
    }
}
