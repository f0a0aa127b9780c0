use image::RgbImage;
use rand::Rng;

use crate::{
    camera::Camera,
    geometry::ScreenBlock,
    integrator::Integrator,
    renderer::RenderSettings,
    scene::{Scene, SceneError},
    screen_block::ScreenBlockExt as _,
    util::{Rgb, color_to_image},
};

/// Renders a single tile into the top left corner of `buffer`, which must be at least
/// as large as the tile.
/// Only reads the scene, so disjoint tiles can be rendered concurrently.
pub fn render_tile<R: Rng + ?Sized>(
    scene: &Scene,
    camera: &Camera,
    settings: &RenderSettings,
    tile: &ScreenBlock,
    rng: &mut R,
    buffer: &mut RgbImage,
) -> Result<(), SceneError> {
    let integrator = Integrator::new(scene, &settings.integrator);
    let sample_count = settings.sample_count.get();

    for point in tile.internal_points() {
        let mut pixel_sum = Rgb::new(0.0, 0.0, 0.0);
        for _ in 0..sample_count {
            let ray = camera.sample_ray(&point, rng);
            pixel_sum += integrator.radiance(&ray, rng)?;
        }
        let pixel = pixel_sum * (1.0 / sample_count as f32);

        let buffer_position = point - tile.min;
        buffer.put_pixel(buffer_position.x, buffer_position.y, color_to_image(pixel));
    }

    Ok(())
}
