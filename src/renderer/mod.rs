mod machinery;
mod worker;

use std::num::NonZeroU32;

use thiserror::Error;

use crate::{integrator::IntegratorSettings, scene::SceneError};

pub use machinery::{RenderProgress, TileProgress, render};
pub use worker::render_tile;

pub const DEFAULT_TILE_SIZE: NonZeroU32 = NonZeroU32::new(32).unwrap();

#[derive(Copy, Clone, Debug)]
pub struct RenderSettings {
    pub tile_size: NonZeroU32,
    pub sample_count: NonZeroU32,
    /// Makes the render reproducible. Without a seed every tile draws its seed from the OS.
    pub seed: Option<u64>,
    pub integrator: IntegratorSettings,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            tile_size: DEFAULT_TILE_SIZE,
            sample_count: NonZeroU32::MIN,
            seed: None,
            integrator: IntegratorSettings::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error("Output image lock was poisoned")]
    PoisonedImage,

    #[error("Worker thread panicked")]
    WorkerPanicked,
}
