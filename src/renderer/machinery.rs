use std::{
    num::NonZeroUsize,
    ops::Deref as _,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    thread::{self, JoinHandle},
};

use image::{GenericImage, GenericImageView, RgbImage};
use rand::{SeedableRng, rngs::SmallRng};

use crate::{
    camera::Camera,
    geometry::ScreenBlock,
    renderer::{RenderError, RenderSettings, worker::render_tile},
    scene::Scene,
    screen_block::ScreenBlockExt,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TileProgress {
    pub finished: usize,
    pub total: usize,
}

/// Starts rendering the scene on background threads, one per CPU core.
/// Fails before spawning anything if the scene can't be queried with the configured mode.
pub fn render<
    F1: Fn(ScreenBlock) + Send + Sync + 'static,
    F2: Fn(ScreenBlock, TileProgress) + Send + Sync + 'static,
>(
    scene: Scene,
    camera: Camera,
    settings: RenderSettings,
    started_tile_callback: F1,
    finished_tile_callback: F2,
) -> anyhow::Result<RenderProgress> {
    scene.validate(settings.integrator.query)?;

    let resolution = camera.resolution();
    let state = Arc::new(RenderState {
        scene,
        camera,
        settings,

        image: Mutex::new(RgbImage::new(resolution.x, resolution.y)),

        tile_ordering: ScreenBlock::from_size(resolution).tile_ordering(settings.tile_size),
        next_tile_index: AtomicUsize::new(0),
        finished_tiles: AtomicUsize::new(0),
    });
    let started_tile_callback = Arc::new(started_tile_callback);
    let finished_tile_callback = Arc::new(finished_tile_callback);

    let threads = worker_cores()
        .into_iter()
        .enumerate()
        .map(|(worker_id, core)| {
            let state = Arc::clone(&state);
            let started_tile_callback = Arc::clone(&started_tile_callback);
            let finished_tile_callback = Arc::clone(&finished_tile_callback);

            thread::Builder::new()
                .name(format!("worker{worker_id}"))
                .spawn(move || {
                    if let Some(core) = core {
                        core_affinity::set_for_current(core);
                    }

                    let result =
                        state.run_worker(&*started_tile_callback, &*finished_tile_callback);
                    if result.is_err() {
                        // Stop the other workers as well
                        state.abort();
                    }
                    result
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    log::info!(
        "Rendering {} tiles on {} threads",
        state.tile_ordering.len(),
        threads.len()
    );

    Ok(RenderProgress {
        render_state: state,
        threads,
    })
}

/// Cores to pin the workers to, or unpinned workers if the core list is unavailable.
fn worker_cores() -> Vec<Option<core_affinity::CoreId>> {
    match core_affinity::get_core_ids() {
        Some(cores) if !cores.is_empty() => cores.into_iter().map(Some).collect(),
        _ => {
            let count = thread::available_parallelism().map_or(1, NonZeroUsize::get);
            log::warn!("CPU core list is not available, running {count} unpinned workers");
            vec![None; count]
        }
    }
}

pub struct RenderProgress {
    render_state: Arc<RenderState>,
    threads: Vec<JoinHandle<Result<(), RenderError>>>,
}

impl RenderProgress {
    pub fn progress(&self) -> TileProgress {
        self.render_state.progress()
    }

    pub fn progress_percent(&self) -> f32 {
        let progress = self.progress();
        if progress.total == 0 {
            100.0
        } else {
            100.0 * (progress.finished as f32) / (progress.total as f32)
        }
    }

    pub fn is_finished(&self) -> bool {
        self.threads.iter().all(|handle| handle.is_finished())
    }

    /// Signal the workers to abort.
    /// Any running workers will still finish their tiles, but no new ones will be started.
    pub fn abort(&self) {
        self.render_state.abort();
    }

    /// Blocks until all workers finish.
    /// Returns the first error any of the workers hit.
    pub fn wait(&mut self) -> Result<(), RenderError> {
        let mut first_error = None;
        for handle in self.threads.drain(..) {
            let result = handle.join().unwrap_or(Err(RenderError::WorkerPanicked));
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn image(&self) -> &Mutex<RgbImage> {
        &self.render_state.image
    }
}

struct RenderState {
    scene: Scene,
    camera: Camera,
    settings: RenderSettings,

    image: Mutex<RgbImage>,

    tile_ordering: Vec<ScreenBlock>,
    next_tile_index: AtomicUsize,
    finished_tiles: AtomicUsize,
}

impl RenderState {
    fn get_next_tile(&self) -> Option<(usize, &ScreenBlock)> {
        let index = self.next_tile_index.fetch_add(1, Ordering::AcqRel);
        self.tile_ordering.get(index).map(|tile| (index, tile))
    }

    fn abort(&self) {
        self.next_tile_index
            .store(self.tile_ordering.len(), Ordering::Release);
    }

    fn progress(&self) -> TileProgress {
        TileProgress {
            finished: self.finished_tiles.load(Ordering::Acquire),
            total: self.tile_ordering.len(),
        }
    }

    fn tile_rng(&self, tile_index: usize) -> SmallRng {
        match self.settings.seed {
            Some(seed) => SmallRng::seed_from_u64(seed.wrapping_add(tile_index as u64)),
            None => SmallRng::from_os_rng(),
        }
    }

    fn run_worker(
        &self,
        started_tile_callback: &dyn Fn(ScreenBlock),
        finished_tile_callback: &dyn Fn(ScreenBlock, TileProgress),
    ) -> Result<(), RenderError> {
        let tile_size = self.settings.tile_size.get();
        let mut buffer = RgbImage::new(tile_size, tile_size);

        while let Some((index, tile)) = self.get_next_tile() {
            started_tile_callback(*tile);

            let mut rng = self.tile_rng(index);
            render_tile(
                &self.scene,
                &self.camera,
                &self.settings,
                tile,
                &mut rng,
                &mut buffer,
            )?;

            self.image
                .lock()
                .map_err(|_| RenderError::PoisonedImage)?
                .copy_from(
                    buffer.view(0, 0, tile.width(), tile.height()).deref(),
                    tile.min.x,
                    tile.min.y,
                )
                .unwrap_or_else(|_| unreachable!("The buffer should always fit into the output"));

            self.finished_tiles.fetch_add(1, Ordering::AcqRel);
            finished_tile_callback(*tile, self.progress());
        }

        Ok(())
    }
}
