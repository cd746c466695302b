mod input;
mod local;

pub use input::{InputFlags, InputState};
pub use local::{CameraRig, LocalPlayer, ViewRay};
