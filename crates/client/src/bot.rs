use arena::{InputFlags, InputState};
use rand::Rng;
use rand::rngs::StdRng;

const WALK_FLAGS: InputFlags = InputFlags::FORWARD
    .union(InputFlags::BACK)
    .union(InputFlags::LEFT)
    .union(InputFlags::RIGHT);

/// Scripted stand-in for a keyboard and mouse: wanders, turns, jumps and fires.
pub struct WanderBot {
    rng: StdRng,
    stride_ticks: u64,
    jump_every: u64,
    fire_every: u64,
    turn: f32,
}

impl WanderBot {
    pub fn new(rng: StdRng) -> Self {
        Self {
            rng,
            stride_ticks: 120,
            jump_every: 90,
            fire_every: 150,
            turn: 0.0,
        }
    }

    pub fn drive(&mut self, tick: u64, input: &mut InputState) {
        if tick % self.stride_ticks == 0 {
            input.release(WALK_FLAGS);
            input.press(self.pick_stride());
            self.turn = self.rng.gen_range(-4.0..4.0);
        }

        input.add_look(self.turn, 0.0);

        if tick % self.jump_every == self.jump_every - 1 {
            input.press(InputFlags::JUMP);
        }
        if tick % self.fire_every == self.fire_every - 1 {
            input.press(InputFlags::FIRE);
        }
    }

    fn pick_stride(&mut self) -> InputFlags {
        const STRIDES: [InputFlags; 5] = [
            InputFlags::FORWARD,
            InputFlags::FORWARD.union(InputFlags::LEFT),
            InputFlags::FORWARD.union(InputFlags::RIGHT),
            InputFlags::BACK,
            InputFlags::empty(),
        ];
        STRIDES[self.rng.gen_range(0..STRIDES.len())]
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn presses_jump_and_fire_on_schedule() {
        let mut bot = WanderBot::new(StdRng::seed_from_u64(9));
        let mut input = InputState::new();

        for tick in 0..89 {
            bot.drive(tick, &mut input);
        }
        assert!(!input.is_active(InputFlags::JUMP));

        bot.drive(89, &mut input);
        assert!(input.is_active(InputFlags::JUMP));

        for tick in 90..150 {
            bot.drive(tick, &mut input);
        }
        assert!(input.is_active(InputFlags::FIRE));
    }

    #[test]
    fn stride_changes_replace_walk_keys() {
        let mut bot = WanderBot::new(StdRng::seed_from_u64(1));
        let mut input = InputState::new();
        input.press(InputFlags::LEFT | InputFlags::BACK | InputFlags::JUMP);

        bot.drive(0, &mut input);

        let walking = input.flags() & WALK_FLAGS;
        assert!(!walking.contains(InputFlags::LEFT | InputFlags::BACK));
        assert!(input.is_active(InputFlags::JUMP));
    }
}
