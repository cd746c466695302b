use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;

use crate::state::Transform;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Platform {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl Platform {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    pub fn top(&self) -> f32 {
        self.center.y + self.half_extents.y
    }
}

/// Square region players drop into on join and after falling out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnArea {
    pub center: Vec3,
    pub half_extent: f32,
}

impl SpawnArea {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Transform {
        let offset = if self.half_extent > 0.0 {
            Vec3::new(
                rng.gen_range(-self.half_extent..=self.half_extent),
                0.0,
                rng.gen_range(-self.half_extent..=self.half_extent),
            )
        } else {
            Vec3::ZERO
        };

        Transform::new(self.center + offset, rng.gen_range(0.0..TAU))
    }

    pub fn contains(&self, position: Vec3) -> bool {
        (position.x - self.center.x).abs() <= self.half_extent
            && (position.z - self.center.z).abs() <= self.half_extent
    }
}

#[derive(Debug, Clone)]
pub struct ArenaLayout {
    platforms: Vec<Platform>,
    spawn: SpawnArea,
}

impl Default for ArenaLayout {
    fn default() -> Self {
        Self::arena()
    }
}

impl ArenaLayout {
    const FLOOR_HALF_SIZE: f32 = 50.0;
    const FLOOR_THICKNESS: f32 = 0.5;

    pub fn new(spawn: SpawnArea) -> Self {
        Self {
            platforms: Vec::new(),
            spawn,
        }
    }

    /// Floor with a row of rising blocks and a staircase.
    pub fn arena() -> Self {
        let spawn = SpawnArea {
            center: Vec3::new(-12.0, 4.0, -12.0),
            half_extent: 6.0,
        };

        let mut layout = Self::new(spawn).with_platform(Platform::new(
            Vec3::new(0.0, -Self::FLOOR_THICKNESS, 0.0),
            Vec3::new(
                Self::FLOOR_HALF_SIZE,
                Self::FLOOR_THICKNESS,
                Self::FLOOR_HALF_SIZE,
            ),
        ));

        layout.add_blocks();
        layout.add_stairs();
        layout
    }

    fn add_blocks(&mut self) {
        let blocks = [
            (5.0, 0.25, 1.0),
            (8.0, 0.5, 1.0),
            (11.0, 1.0, 1.0),
            (14.0, 1.5, 1.5),
            (18.0, 2.0, 2.0),
        ];

        for (x, half_height, half_width) in blocks {
            self.platforms.push(Platform::new(
                Vec3::new(x, half_height, 0.0),
                Vec3::new(half_width, half_height, half_width),
            ));
        }
    }

    fn add_stairs(&mut self) {
        let start = Vec3::new(-5.0, 0.0, 5.0);
        let step_height = 0.3;
        let step_depth = 0.4;

        for i in 0..10 {
            let y = step_height * (i as f32 + 0.5);
            let z = start.z + step_depth * i as f32;
            self.platforms.push(Platform::new(
                Vec3::new(start.x, y, z),
                Vec3::new(2.0, step_height * 0.5, step_depth * 0.5),
            ));
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platforms.push(platform);
        self
    }

    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn spawn(&self) -> &SpawnArea {
        &self.spawn
    }
}
