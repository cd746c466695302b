/// Per-tick constants; the integrator is frame-locked, so none of these scale with time.
#[derive(Debug, Clone)]
pub struct PhysicsConfig {
    pub move_speed: f32,
    pub probe_range: f32,
    pub probe_directions: u32,
    pub gravity: f32,
    pub jump_impulse: f32,
    pub hover_epsilon: f32,
    pub fall_limit: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            move_speed: 1.0 / 8.0,
            probe_range: 0.5,
            probe_directions: 8,
            gravity: 1.0 / 128.0,
            jump_impulse: 1.0 / 4.0,
            hover_epsilon: 1.0 / 64.0,
            fall_limit: -50.0,
        }
    }
}
