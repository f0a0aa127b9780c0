use bon::bon;
use nalgebra::Unit;
use rand_distr::Distribution as _;
use thiserror::Error;

use crate::geometry::{EPSILON, FloatType, Ray, ScreenPoint, ScreenSize, WorldPoint, WorldVector};

#[derive(Debug, Error, PartialEq)]
pub enum CameraError {
    #[error("Camera target must differ from its position")]
    TargetAtPosition,
    #[error("Up vector must not be parallel to the view direction")]
    DegenerateUp,
    #[error("Resolution must be non-zero, got {0}x{1}")]
    EmptyResolution(u32, u32),
    #[error("Vertical field of view must be between 0 and 180 degrees, got {0}")]
    InvalidFov(FloatType),
    #[error("Focus distance must be positive, got {0}")]
    InvalidFocusDistance(FloatType),
}

/// Perspective camera with an optional thin lens.
/// Pixel (0, 0) is the top left corner of the image.
#[derive(Copy, Clone, Debug)]
pub struct Camera {
    position: WorldPoint,
    resolution: ScreenSize,

    forward: Unit<WorldVector>,
    up: Unit<WorldVector>,
    right: Unit<WorldVector>,

    /// Distance of the image plane, in pixels
    film_distance: FloatType,

    lens_radius: FloatType,
    focus_distance: FloatType,
}

#[bon]
impl Camera {
    #[builder]
    pub fn new(
        position: WorldPoint,
        target: WorldPoint,
        #[builder(default = WorldVector::y())] up: WorldVector,
        resolution: ScreenSize,
        // Degrees
        #[builder(default = 45.0)]
        vertical_fov: FloatType,
        // Zero gives a pinhole camera
        #[builder(default)]
        lens_radius: FloatType,
        // Defaults to the distance to `target`
        focus_distance: Option<FloatType>,
    ) -> Result<Self, CameraError> {
        let to_target = target - position;
        let forward = Unit::try_new(to_target, EPSILON).ok_or(CameraError::TargetAtPosition)?;
        let right =
            Unit::try_new(forward.cross(&up), EPSILON).ok_or(CameraError::DegenerateUp)?;
        let up = Unit::new_normalize(right.cross(forward.as_ref()));

        if resolution.x == 0 || resolution.y == 0 {
            return Err(CameraError::EmptyResolution(resolution.x, resolution.y));
        }
        if !(vertical_fov > 0.0 && vertical_fov < 180.0) {
            return Err(CameraError::InvalidFov(vertical_fov));
        }
        let focus_distance = focus_distance.unwrap_or_else(|| to_target.norm());
        if !(focus_distance > 0.0) {
            return Err(CameraError::InvalidFocusDistance(focus_distance));
        }

        let half_height = resolution.y as FloatType / 2.0;
        let film_distance = half_height / (vertical_fov.to_radians() / 2.0).tan();

        Ok(Camera {
            position,
            resolution,
            forward,
            up,
            right,
            film_distance,
            lens_radius: lens_radius.abs(),
            focus_distance,
        })
    }
}

impl Camera {
    pub fn resolution(&self) -> ScreenSize {
        self.resolution
    }

    /// Direction through a point on the image plane, given in continuous pixel coordinates.
    fn film_direction(&self, u: FloatType, v: FloatType) -> WorldVector {
        let x = u - self.resolution.x as FloatType / 2.0;
        let y = self.resolution.y as FloatType / 2.0 - v;
        self.forward.as_ref() * self.film_distance + self.right.as_ref() * x + self.up.as_ref() * y
    }

    /// Ray through the center of the pixel, from the center of the lens.
    pub fn center_ray(&self, point: &ScreenPoint) -> Ray {
        let direction = self.film_direction(point.x as FloatType + 0.5, point.y as FloatType + 0.5);
        Ray::new_normalized(self.position, direction)
    }

    /// Samples a new ray for the given pixel, jittered inside the pixel and across the lens.
    pub fn sample_ray(&self, point: &ScreenPoint, rng: &mut (impl rand::Rng + ?Sized)) -> Ray {
        let u = point.x as FloatType + rng.random_range(0.0..1.0);
        let v = point.y as FloatType + rng.random_range(0.0..1.0);
        let direction = self.film_direction(u, v).normalize();

        if self.lens_radius == 0.0 {
            return Ray::new(self.position, direction);
        }

        // All rays through the pixel meet on the plane of focus
        let focus_t = self.focus_distance / direction.dot(self.forward.as_ref());
        let focus_point = self.position + direction * focus_t;
        let [lens_u, lens_v]: [FloatType; 2] = rand_distr::UnitDisc.sample(rng);
        let origin = self.position
            + self.right.as_ref() * (lens_u * self.lens_radius)
            + self.up.as_ref() * (lens_v * self.lens_radius);

        Ray::new_normalized(origin, focus_point - origin)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert2::{assert, let_assert};
    use rand::{SeedableRng, rngs::SmallRng};

    fn camera(lens_radius: FloatType) -> Camera {
        Camera::builder()
            .position(WorldPoint::new(0.0, 0.0, 4.0))
            .target(WorldPoint::origin())
            .resolution(ScreenSize::new(800, 600))
            .lens_radius(lens_radius)
            .build()
            .unwrap()
    }

    #[test]
    fn left_right_up_down() {
        let camera = camera(0.0);
        let mut rng = SmallRng::seed_from_u64(0);

        let center = camera.sample_ray(&ScreenPoint::new(400, 300), &mut rng);
        let left = camera.sample_ray(&ScreenPoint::new(0, 300), &mut rng);
        let right = camera.sample_ray(&ScreenPoint::new(799, 300), &mut rng);
        let up = camera.sample_ray(&ScreenPoint::new(400, 0), &mut rng);
        let down = camera.sample_ray(&ScreenPoint::new(400, 599), &mut rng);

        assert!(center.direction.x.abs() < 1e-2);
        assert!(center.direction.y.abs() < 1e-2);
        assert!(center.direction.z < -0.99);
        assert!(left.direction.x < center.direction.x);
        assert!(right.direction.x > center.direction.x);
        assert!(up.direction.y > center.direction.y);
        assert!(down.direction.y < center.direction.y);
        assert!((center.direction.norm() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn vertical_field_of_view() {
        let camera = camera(0.0);
        let top = camera.center_ray(&ScreenPoint::new(399, 0));
        let bottom = camera.center_ray(&ScreenPoint::new(399, 599));
        let angle = top.direction.angle(&bottom.direction).to_degrees();
        // Pixel centers are half a pixel inside the image edges
        assert!((angle - 45.0).abs() < 0.2);
    }

    #[test]
    fn thin_lens_rays_meet_at_focus() {
        let camera = camera(0.2);
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..20 {
            let ray = camera.sample_ray(&ScreenPoint::new(400, 300), &mut rng);
            // Plane of focus goes through the target at z = 0
            let t = -ray.origin.z / ray.direction.z;
            let p = ray.point_at(t);
            assert!(p.x.abs() < 0.02);
            assert!(p.y.abs() < 0.02);
            assert!((ray.origin - WorldPoint::new(0.0, 0.0, 4.0)).norm() <= 0.2 + 1e-5);
        }
    }

    #[test]
    fn invalid_parameters() {
        let_assert!(
            Err(CameraError::TargetAtPosition) = Camera::builder()
                .position(WorldPoint::origin())
                .target(WorldPoint::origin())
                .resolution(ScreenSize::new(10, 10))
                .build()
        );
        let_assert!(
            Err(CameraError::DegenerateUp) = Camera::builder()
                .position(WorldPoint::new(0.0, 5.0, 0.0))
                .target(WorldPoint::origin())
                .resolution(ScreenSize::new(10, 10))
                .build()
        );
        let_assert!(
            Err(CameraError::EmptyResolution(0, 10)) = Camera::builder()
                .position(WorldPoint::new(0.0, 0.0, 4.0))
                .target(WorldPoint::origin())
                .resolution(ScreenSize::new(0, 10))
                .build()
        );
        let_assert!(
            Err(CameraError::InvalidFov(_)) = Camera::builder()
                .position(WorldPoint::new(0.0, 0.0, 4.0))
                .target(WorldPoint::origin())
                .resolution(ScreenSize::new(10, 10))
                .vertical_fov(180.0)
                .build()
        );
    }
}
