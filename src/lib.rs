mod camera;
pub mod geometry;
pub mod integrator;
mod renderer;
pub mod scene;
mod screen_block;
pub mod util;

pub use crate::renderer::{
    RenderError, RenderProgress, RenderSettings, TileProgress, render, render_tile,
};
pub use camera::{Camera, CameraError};
pub use scene::Scene;
pub use screen_block::ScreenBlockExt;
