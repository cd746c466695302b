use glam::{Quat, Vec3};

use super::{GeometryQuery, PhysicsConfig};
use crate::player::{InputFlags, InputState};
use crate::state::Transform;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    pub grounded: bool,
    pub blocked: bool,
    pub fell_out: bool,
}

pub struct PhysicsSimulator {
    config: PhysicsConfig,
    vertical_velocity: f32,
    grounded: bool,
    ticks: u64,
}

impl Default for PhysicsSimulator {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

impl PhysicsSimulator {
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            vertical_velocity: 0.0,
            grounded: false,
            ticks: 0,
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn vertical_velocity(&self) -> f32 {
        self.vertical_velocity
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Called after a teleport so the player does not keep its fall speed.
    pub fn reset_velocity(&mut self) {
        self.vertical_velocity = 0.0;
        self.grounded = false;
    }

    /// Advances the local player by one frame-locked tick.
    pub fn step<G: GeometryQuery>(
        &mut self,
        input: &mut InputState,
        transform: &mut Transform,
        geometry: &G,
    ) -> StepReport {
        self.ticks += 1;

        let blocked = self.move_lateral(input, transform, geometry);

        self.vertical_velocity -= self.config.gravity;
        self.grounded = self.settle_on_ground(input, transform, geometry);
        transform.position.y += self.vertical_velocity;

        StepReport {
            grounded: self.grounded,
            blocked,
            fell_out: transform.position.y < self.config.fall_limit,
        }
    }

    fn move_lateral<G: GeometryQuery>(
        &self,
        input: &InputState,
        transform: &mut Transform,
        geometry: &G,
    ) -> bool {
        let movement = transform.rotation() * (input.move_axis() * self.config.move_speed);
        if movement == Vec3::ZERO {
            return false;
        }

        let before = transform.position;
        transform.position += movement;

        let blocked = self
            .probe_directions(transform.yaw)
            .any(|direction| {
                geometry
                    .cast(transform.position, direction, 0.0, self.config.probe_range)
                    .iter()
                    .any(|hit| hit.tag.is_platform())
            });

        if blocked {
            transform.position = before;
        }
        blocked
    }

    fn probe_directions(&self, yaw: f32) -> impl Iterator<Item = Vec3> {
        let count = self.config.probe_directions.max(1);
        let step = std::f32::consts::TAU / count as f32;
        (0..count).map(move |k| Quat::from_rotation_y(yaw + step * k as f32) * Vec3::NEG_Z)
    }

    fn settle_on_ground<G: GeometryQuery>(
        &mut self,
        input: &mut InputState,
        transform: &mut Transform,
        geometry: &G,
    ) -> bool {
        let reach = -self.vertical_velocity + 2.0 * self.config.hover_epsilon;
        if reach <= 0.0 {
            return false;
        }

        let ground = geometry
            .cast(transform.position, Vec3::NEG_Y, 0.0, reach)
            .into_iter()
            .find(|hit| hit.tag.is_platform() && hit.distance <= reach);

        let Some(ground) = ground else {
            return false;
        };

        self.vertical_velocity = 0.0;
        transform.position.y = ground.point.y + self.config.hover_epsilon;

        if input.consume(InputFlags::JUMP) {
            self.vertical_velocity = self.config.jump_impulse;
        }
        true
    }
}
