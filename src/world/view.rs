//! Local visual proxy for one replicated entity

use glam::{Vec2, Vec3};

use super::types::{EntityId, EntityRow, PlayerId};

/// Duration of the interpolation toward a freshly replicated position (seconds)
pub const LERP_DURATION_SECS: f32 = 0.1;

/// Rate at which the display radius eases toward its mass-derived target
const RADIUS_EASE_RATE: f32 = 8.0;

/// Colour used for entities without a controlling player
const ENVIRONMENT_COLOR: Vec3 = Vec3::new(0.6, 0.6, 0.6);

/// Radius of an entity of the given mass
pub fn mass_to_radius(mass: u32) -> f32 {
    (mass as f32).sqrt()
}

/// Locally owned proxy of a replicated entity row.
///
/// `position` is the interpolated view position; the authoritative one only
/// ever becomes the lerp target.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityView {
    entity_id: EntityId,
    owner: Option<PlayerId>,
    pub position: Vec2,
    lerp_start: Vec2,
    lerp_target: Vec2,
    lerp_time: f32,
    pub radius: f32,
    target_radius: f32,
    pub color: Vec3,
}

impl EntityView {
    /// Build a view snapped to the row's authoritative position
    pub fn from_row(row: &EntityRow) -> Self {
        Self {
            entity_id: row.entity_id,
            owner: None,
            position: row.position,
            lerp_start: row.position,
            lerp_target: row.position,
            lerp_time: LERP_DURATION_SECS,
            radius: 0.0,
            target_radius: mass_to_radius(row.mass),
            color: ENVIRONMENT_COLOR,
        }
    }

    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    /// Controlling player, `None` for environment entities
    pub fn owner(&self) -> Option<PlayerId> {
        self.owner
    }

    pub fn set_owner(&mut self, owner: Option<PlayerId>) {
        self.owner = owner;
        self.color = owner.map(player_color).unwrap_or(ENVIRONMENT_COLOR);
    }

    /// Position the view is interpolating toward
    pub fn target_position(&self) -> Vec2 {
        self.lerp_target
    }

    /// Restart interpolation toward the row's authoritative state
    pub fn apply_row(&mut self, row: &EntityRow) {
        self.lerp_time = 0.0;
        self.lerp_start = self.position;
        self.lerp_target = row.position;
        self.target_radius = mass_to_radius(row.mass);
    }

    /// Advance local interpolation by `dt` seconds
    pub fn interpolate(&mut self, dt: f32) {
        self.lerp_time = (self.lerp_time + dt).min(LERP_DURATION_SECS);
        self.position = self
            .lerp_start
            .lerp(self.lerp_target, self.lerp_time / LERP_DURATION_SECS);

        let t = (dt * RADIUS_EASE_RATE).clamp(0.0, 1.0);
        self.radius += (self.target_radius - self.radius) * t;
    }
}

/// Stable per-player colour spread around the hue wheel by the golden ratio
pub fn player_color(player_id: PlayerId) -> Vec3 {
    let hue = (player_id.0 as f32 * 0.618_034).fract();
    hsv_to_rgb(hue, 0.8, 0.9)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Vec3 {
    let h6 = h * 6.0;
    let sector = h6.floor();
    let f = h6 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match sector as i32 % 6 {
        0 => Vec3::new(v, t, p),
        1 => Vec3::new(q, v, p),
        2 => Vec3::new(p, v, t),
        3 => Vec3::new(p, q, v),
        4 => Vec3::new(t, p, v),
        _ => Vec3::new(v, p, q),
    }
}
