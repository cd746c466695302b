pub const DEFAULT_TICK_RATE: u32 = 60;

/// Longest frame the accumulator will absorb; anything beyond is dropped.
const MAX_FRAME: f32 = 0.25;

pub struct FixedTimestep {
    dt: f32,
    accumulator: f32,
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_RATE)
    }
}

impl FixedTimestep {
    pub fn new(tick_rate: u32) -> Self {
        Self {
            dt: 1.0 / tick_rate.max(1) as f32,
            accumulator: 0.0,
        }
    }

    pub fn accumulate(&mut self, delta: f32) {
        self.accumulator += delta.clamp(0.0, MAX_FRAME);
    }

    pub fn should_tick(&self) -> bool {
        self.accumulator >= self.dt
    }

    pub fn consume_tick(&mut self) -> bool {
        if self.should_tick() {
            self.accumulator -= self.dt;
            true
        } else {
            false
        }
    }
}
