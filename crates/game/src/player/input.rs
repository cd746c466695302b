use bitflags::bitflags;
use glam::{Vec2, Vec3};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct InputFlags: u8 {
        const FORWARD = 1 << 0;
        const BACK = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
        const FIRE = 1 << 4;
        const JUMP = 1 << 5;
    }
}

/// Debounced input snapshot handed to the simulation each tick.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    flags: InputFlags,
    look_delta: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, flags: InputFlags) {
        self.flags.insert(flags);
    }

    pub fn release(&mut self, flags: InputFlags) {
        self.flags.remove(flags);
    }

    pub fn is_active(&self, flag: InputFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn flags(&self) -> InputFlags {
        self.flags
    }

    /// Returns whether `flag` was set, clearing it so it needs a fresh press.
    pub fn consume(&mut self, flag: InputFlags) -> bool {
        let active = self.flags.contains(flag);
        self.flags.remove(flag);
        active
    }

    pub fn add_look(&mut self, dx: f32, dy: f32) {
        self.look_delta += Vec2::new(dx, dy);
    }

    pub fn take_look(&mut self) -> Vec2 {
        std::mem::take(&mut self.look_delta)
    }

    /// Unit input-space direction: x is right minus left, z is back minus forward.
    pub fn move_axis(&self) -> Vec3 {
        let pressed = |flag: InputFlags| f32::from(u8::from(self.is_active(flag)));
        let axis =
            |positive: InputFlags, negative: InputFlags| pressed(positive) - pressed(negative);

        Vec3::new(
            axis(InputFlags::RIGHT, InputFlags::LEFT),
            0.0,
            axis(InputFlags::BACK, InputFlags::FORWARD),
        )
        .normalize_or_zero()
    }
}
