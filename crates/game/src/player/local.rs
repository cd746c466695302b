use glam::{EulerRot, Quat, Vec2, Vec3};

use crate::state::{PlayerState, Transform};

#[derive(Debug, Clone)]
pub struct CameraRig {
    /// Height of the gun pivot above the player origin.
    pub head_height: f32,
    /// Camera position in gun space.
    pub offset: Vec3,
    pub look_sensitivity: f32,
    pub max_pitch: f32,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            head_height: 1.5,
            offset: Vec3::new(0.0, 0.5, -1.0),
            look_sensitivity: 1.0 / 256.0,
            max_pitch: std::f32::consts::FRAC_PI_2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewRay {
    pub origin: Vec3,
    pub direction: Vec3,
}

#[derive(Debug, Clone)]
pub struct LocalPlayer {
    pub transform: Transform,
    pub pitch: f32,
}

impl LocalPlayer {
    pub fn new(transform: Transform) -> Self {
        Self {
            transform,
            pitch: 0.0,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.transform.to_state()
    }

    pub fn teleport(&mut self, state: &PlayerState) {
        self.transform = Transform::from(state);
    }

    pub fn apply_look(&mut self, delta: Vec2, rig: &CameraRig) {
        self.transform.yaw -= delta.x * rig.look_sensitivity;
        let pitch = self.pitch - delta.y * rig.look_sensitivity;
        self.pitch = pitch.clamp(-rig.max_pitch, rig.max_pitch);
    }

    pub fn view_orientation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.transform.yaw, self.pitch, 0.0)
    }

    /// Ray through the centre of the screen.
    pub fn view_ray(&self, rig: &CameraRig) -> ViewRay {
        let orientation = self.view_orientation();
        let pivot = self.transform.position + Vec3::Y * rig.head_height;

        ViewRay {
            origin: pivot + orientation * rig.offset,
            direction: orientation * Vec3::NEG_Z,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    #[test]
    fn look_turns_and_clamps() {
        let rig = CameraRig::default();
        let mut player = LocalPlayer::new(Transform::default());

        player.apply_look(Vec2::new(256.0, 0.0), &rig);
        assert!((player.transform.yaw + 1.0).abs() < 1e-6);

        player.apply_look(Vec2::new(0.0, -10_000.0), &rig);
        assert_eq!(player.pitch, FRAC_PI_2);
    }

    #[test]
    fn view_ray_faces_negative_z_at_rest() {
        let rig = CameraRig::default();
        let player = LocalPlayer::new(Transform::new(Vec3::new(1.0, 0.0, 0.0), 0.0));
        let ray = player.view_ray(&rig);

        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-6);
        assert!((ray.origin - Vec3::new(1.0, 2.0, -1.0)).length() < 1e-6);
    }

    #[test]
    fn view_ray_follows_yaw() {
        let rig = CameraRig::default();
        let player = LocalPlayer::new(Transform::new(Vec3::ZERO, FRAC_PI_2));
        let ray = player.view_ray(&rig);

        // Quarter turn left: forward becomes -X.
        assert!((ray.direction - Vec3::NEG_X).length() < 1e-5);
    }
}
