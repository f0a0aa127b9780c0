mod stats;

pub use stats::Stats;

pub type Rgb = rgb::RGB<f32>;

/// Componentwise product of two colors.
pub fn modulate(a: Rgb, b: Rgb) -> Rgb {
    Rgb::new(a.r * b.r, a.g * b.g, a.b * b.b)
}

/// Maps a 0-1 linear f32 rgb pixel to pixel type compatible with module image.
/// Values outside of the range are clamped.
pub fn color_to_image(color: Rgb) -> image::Rgb<u8> {
    let channel = |value: f32| (value * 255.0).round().clamp(0.0, 255.0) as u8;
    image::Rgb([channel(color.r), channel(color.g), channel(color.b)])
}
