mod hit;

pub use hit::{HitResolver, KNOCKOUT_HEIGHT, MAX_SHOT_RANGE};
