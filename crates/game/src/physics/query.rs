use glam::Vec3;

use crate::state::PlayerId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectTag {
    Platform,
    /// Gun node of a remote actor; the only thing a shot can knock out.
    WeaponMarker { owner: PlayerId },
    Actor { owner: PlayerId },
    Scenery,
}

impl ObjectTag {
    pub fn is_platform(&self) -> bool {
        matches!(self, ObjectTag::Platform)
    }

    pub fn weapon_owner(&self) -> Option<&PlayerId> {
        match self {
            ObjectTag::WeaponMarker { owner } => Some(owner),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RayHit {
    pub tag: ObjectTag,
    pub distance: f32,
    pub point: Vec3,
}

pub trait GeometryQuery {
    /// Every hit along the ray within `[min, max]`, nearest first.
    fn cast(&self, origin: Vec3, direction: Vec3, min: f32, max: f32) -> Vec<RayHit>;
}

impl<G: GeometryQuery + ?Sized> GeometryQuery for &G {
    fn cast(&self, origin: Vec3, direction: Vec3, min: f32, max: f32) -> Vec<RayHit> {
        (**self).cast(origin, direction, min, max)
    }
}
