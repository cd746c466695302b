use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Live pose of the local player. Only yaw is simulated; pitch belongs to the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub yaw: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 0.0)
    }
}

impl Transform {
    pub fn new(position: Vec3, yaw: f32) -> Self {
        Self { position, yaw }
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw)
    }

    pub fn to_state(&self) -> PlayerState {
        PlayerState::new(self.position, self.yaw)
    }
}

impl From<&PlayerState> for Transform {
    fn from(state: &PlayerState) -> Self {
        Self::new(state.position, state.yaw())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    #[serde(with = "xyz")]
    pub position: Vec3,
    #[serde(with = "xyz")]
    pub rotation: Vec3,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub seq: u64,
}

impl PlayerState {
    pub fn new(position: Vec3, yaw: f32) -> Self {
        Self {
            position,
            rotation: Vec3::new(0.0, yaw, 0.0),
            seq: 0,
        }
    }

    pub fn yaw(&self) -> f32 {
        self.rotation.y
    }

    /// Pose equality, ignoring the version counter.
    pub fn same_pose(&self, other: &PlayerState) -> bool {
        self.position == other.position && self.rotation == other.rotation
    }
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

/// `{"x":..,"y":..,"z":..}` object form used on the wire.
mod xyz {
    use glam::Vec3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Xyz {
        x: f32,
        y: f32,
        z: f32,
    }

    pub fn serialize<S: Serializer>(value: &Vec3, serializer: S) -> Result<S::Ok, S::Error> {
        Xyz {
            x: value.x,
            y: value.y,
            z: value.z,
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec3, D::Error> {
        let Xyz { x, y, z } = Xyz::deserialize(deserializer)?;
        Ok(Vec3::new(x, y, z))
    }
}
