//! Recursive radiance estimator.
//!
//! Every hit combines three terms: shadow tested direct light from the scene's point light,
//! a mirror reflection and a diffuse indirect term estimated with a fixed number of
//! hemisphere samples around the shading normal. Recursion stops once the depth exceeds
//! `max_depth`; the missing higher order bounces are a known energy loss.

pub mod sampling;

use bon::bon;
use rand::Rng;

use crate::{
    geometry::{EPSILON, FloatType, Ray, WorldPoint, WorldVector},
    scene::{HitRecord, QueryMode, Scene, SceneError},
    util::{Rgb, modulate},
};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ShadingModel {
    /// Direct light, reflection and indirect light added together.
    #[default]
    Full,
    /// Albedo modulated direct and indirect light, no reflection.
    DiffuseOnly,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegratorSettings {
    /// Deepest recursion level that still shades a hit. Camera rays are depth 0.
    pub max_depth: u32,
    pub indirect_samples: u32,
    /// Offset of secondary ray origins along the shading normal
    pub light_bias: FloatType,
    pub shading: ShadingModel,
    pub query: QueryMode,
}

#[bon]
impl IntegratorSettings {
    #[builder]
    pub fn new(
        #[builder(default = 2)] max_depth: u32,
        #[builder(default = 4)] indirect_samples: u32,
        #[builder(default = 0.01)] light_bias: FloatType,
        #[builder(default)] shading: ShadingModel,
        #[builder(default)] query: QueryMode,
    ) -> Self {
        IntegratorSettings {
            max_depth,
            indirect_samples,
            light_bias,
            shading,
            query,
        }
    }
}

impl Default for IntegratorSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Result of shading a single hit.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SceneResult {
    pub hit: HitRecord,
    pub direct: Rgb,
    pub indirect: Rgb,
    pub reflect: Rgb,
    pub combined: Rgb,
}

pub struct Integrator<'a> {
    scene: &'a Scene,
    settings: &'a IntegratorSettings,
}

impl<'a> Integrator<'a> {
    pub fn new(scene: &'a Scene, settings: &'a IntegratorSettings) -> Integrator<'a> {
        Integrator { scene, settings }
    }

    /// Estimated radiance arriving along a camera ray, black if nothing is hit.
    pub fn radiance<R: Rng + ?Sized>(&self, ray: &Ray, rng: &mut R) -> Result<Rgb, SceneError> {
        Ok(self
            .cast_scene(ray, 0, rng)?
            .map_or_else(black, |result| result.combined))
    }

    /// Shades the closest hit along the ray.
    /// Returns None if nothing is hit or if `depth` is above the maximum depth.
    pub fn cast_scene<R: Rng + ?Sized>(
        &self,
        ray: &Ray,
        depth: u32,
        rng: &mut R,
    ) -> Result<Option<SceneResult>, SceneError> {
        if depth > self.settings.max_depth {
            return Ok(None);
        }

        let Some(hit) = self.scene.intersect(ray, self.settings.query)? else {
            return Ok(None);
        };

        let normal = self.shading_normal(&hit, ray);
        let origin = hit.position + normal * self.settings.light_bias;
        let albedo = self.scene.objects[hit.object].color;

        let light = self.light_intensity(&hit.position, &origin, &normal)?;
        let indirect = self.indirect(&origin, &normal, depth, rng)?;

        let result = match self.settings.shading {
            ShadingModel::Full => {
                let reflected = Ray::new(origin, sampling::reflect(&ray.direction, &normal));
                let reflect = self.secondary(&reflected, depth, rng)?;
                let direct = albedo * light;
                SceneResult {
                    hit,
                    direct,
                    indirect,
                    reflect,
                    combined: direct + indirect + reflect,
                }
            }
            ShadingModel::DiffuseOnly => {
                let direct = albedo * light;
                SceneResult {
                    hit,
                    direct,
                    indirect,
                    reflect: black(),
                    combined: direct + modulate(albedo, indirect),
                }
            }
        };

        Ok(Some(result))
    }

    /// Unit normal at the hit, facing against the incoming ray.
    /// Falls back to the geometric normal if the interpolated one vanishes.
    fn shading_normal(&self, hit: &HitRecord, ray: &Ray) -> WorldVector {
        let normal = hit.normal.try_normalize(EPSILON).unwrap_or_else(|| {
            self.scene.objects[hit.object]
                .triangle(hit.face)
                .normal()
                .normalize()
        });

        if normal.dot(&ray.direction) > 0.0 {
            -normal
        } else {
            normal
        }
    }

    /// Lambert factor of the point light at `position`, zero when shadowed.
    /// The shadow ray starts at the biased `origin` and ignores anything behind the light.
    fn light_intensity(
        &self,
        position: &WorldPoint,
        origin: &WorldPoint,
        normal: &WorldVector,
    ) -> Result<FloatType, SceneError> {
        let light = &self.scene.light.position;
        let n_dot_l = normal.dot(&(light - position).normalize());
        if n_dot_l <= 0.0 {
            return Ok(0.0);
        }

        let to_light = light - origin;
        let distance = to_light.norm();
        let shadow_ray = Ray::new(*origin, to_light / distance);
        let occluder = self
            .scene
            .intersect_within(&shadow_ray, self.settings.query, distance)?;

        Ok(if occluder.is_some() { 0.0 } else { n_dot_l })
    }

    /// Cosine weighted average of radiance arriving from the hemisphere around `normal`.
    /// Draws nothing from `rng` when sampling is disabled.
    fn indirect<R: Rng + ?Sized>(
        &self,
        origin: &WorldPoint,
        normal: &WorldVector,
        depth: u32,
        rng: &mut R,
    ) -> Result<Rgb, SceneError> {
        let sample_count = self.settings.indirect_samples;
        if sample_count == 0 {
            return Ok(black());
        }

        let (tangent, bitangent) = sampling::orthonormal_system(normal);
        let mut sum = black();
        for _ in 0..sample_count {
            let u1: FloatType = rng.random();
            let u2: FloatType = rng.random();
            let local = sampling::hemisphere(u1, u2);
            let direction = tangent * local.x + bitangent * local.y + normal * local.z;

            sum += self.secondary(&Ray::new(*origin, direction), depth, rng)? * u1;
        }

        Ok(sum * (1.0 / sample_count as FloatType))
    }

    /// Combined radiance of a ray cast one level deeper, black on miss.
    fn secondary<R: Rng + ?Sized>(
        &self,
        ray: &Ray,
        depth: u32,
        rng: &mut R,
    ) -> Result<Rgb, SceneError> {
        Ok(self
            .cast_scene(ray, depth + 1, rng)?
            .map_or_else(black, |result| result.combined))
    }
}

fn black() -> Rgb {
    Rgb::new(0.0, 0.0, 0.0)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scene::{Mesh, Object, ObjectIdx, OctreeSettings, PointLight};
    use assert2::{assert, check, let_assert};
    use rand::{RngCore, SeedableRng, rngs::SmallRng};

    /// Rng that counts how many values were drawn from it.
    struct CountingRng {
        inner: SmallRng,
        draws: usize,
    }

    impl CountingRng {
        fn new() -> Self {
            CountingRng {
                inner: SmallRng::seed_from_u64(7),
                draws: 0,
            }
        }
    }

    impl RngCore for CountingRng {
        fn next_u32(&mut self) -> u32 {
            self.draws += 1;
            self.inner.next_u32()
        }

        fn next_u64(&mut self) -> u64 {
            self.draws += 1;
            self.inner.next_u64()
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            self.draws += 1;
            self.inner.fill_bytes(dst)
        }
    }

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(1234)
    }

    fn white_object(mesh: Mesh) -> Object {
        Object::new(mesh, WorldVector::zeros(), Rgb::new(1.0, 1.0, 1.0))
    }

    /// Floor quad at y = 0 lit from straight above.
    fn floor_scene() -> Scene {
        let mut scene = Scene::new(PointLight {
            position: WorldPoint::new(0.0, 5.0, 0.0),
        });
        scene.add_object(Object::new(
            Mesh::quad(10.0),
            WorldVector::zeros(),
            Rgb::new(1.0, 0.5, 0.25),
        ));
        scene.build_octrees(OctreeSettings::default());
        scene
    }

    /// Floor with a small box hovering between the floor and the light.
    fn shadowed_scene() -> Scene {
        let mut scene = floor_scene();
        let mut blocker = Object::new(
            Mesh::cuboid(WorldVector::new(1.0, 0.2, 1.0)),
            WorldVector::new(0.0, 2.0, 0.0),
            Rgb::new(1.0, 1.0, 1.0),
        );
        blocker.build_octree(OctreeSettings::default());
        scene.add_object(blocker);
        scene
    }

    fn down_at(x: FloatType, z: FloatType) -> Ray {
        Ray::new(WorldPoint::new(x, 1.0, z), WorldVector::new(0.0, -1.0, 0.0))
    }

    fn direct_only() -> IntegratorSettings {
        IntegratorSettings::builder().indirect_samples(0).build()
    }

    #[test]
    fn default_settings() {
        let settings = IntegratorSettings::default();
        assert!(settings.max_depth == 2);
        assert!(settings.indirect_samples == 4);
        assert!(settings.light_bias == 0.01);
        assert!(settings.shading == ShadingModel::Full);
        assert!(settings.query == QueryMode::Octree);
    }

    #[test]
    fn depth_above_maximum_returns_nothing() {
        let scene = floor_scene();
        let settings = IntegratorSettings::default();
        let integrator = Integrator::new(&scene, &settings);

        let_assert!(Ok(None) = integrator.cast_scene(&down_at(0.0, 0.0), 3, &mut rng()));
        let_assert!(Ok(Some(_)) = integrator.cast_scene(&down_at(0.0, 0.0), 2, &mut rng()));
    }

    #[test]
    fn miss_returns_nothing() {
        let scene = floor_scene();
        let settings = IntegratorSettings::default();
        let integrator = Integrator::new(&scene, &settings);
        let ray = Ray::new(WorldPoint::new(0.0, 1.0, 0.0), WorldVector::new(0.0, 1.0, 0.0));

        let_assert!(Ok(None) = integrator.cast_scene(&ray, 0, &mut rng()));
        let_assert!(Ok(color) = integrator.radiance(&ray, &mut rng()));
        assert!(color == black());
    }

    #[test]
    fn zero_samples_draw_nothing() {
        let scene = shadowed_scene();
        let settings = direct_only();
        let integrator = Integrator::new(&scene, &settings);
        let mut rng = CountingRng::new();

        for x in [-2.0, 0.0, 0.3, 2.0] {
            let_assert!(Ok(Some(_)) = integrator.cast_scene(&down_at(x, 0.1), 0, &mut rng));
        }
        assert!(rng.draws == 0);
    }

    #[test]
    fn samples_draw_two_values_each() {
        let mut scene = Scene::new(PointLight::default());
        scene.add_object(white_object(Mesh::quad(10.0)));
        scene.build_octrees(OctreeSettings::default());

        // Nothing above the floor for indirect rays to hit
        let settings = IntegratorSettings::builder().indirect_samples(3).build();
        let integrator = Integrator::new(&scene, &settings);
        let mut rng = CountingRng::new();

        let_assert!(Ok(Some(_)) = integrator.cast_scene(&down_at(0.5, 0.5), 0, &mut rng));
        assert!(rng.draws == 6);
    }

    #[test]
    fn lit_floor_direct_term() {
        let scene = floor_scene();
        let settings = direct_only();
        let integrator = Integrator::new(&scene, &settings);

        let_assert!(Ok(Some(result)) = integrator.cast_scene(&down_at(0.1, -0.1), 0, &mut rng()));
        check!(result.hit.object == ObjectIdx::new(0));
        check!((result.direct.r - 1.0).abs() < 1e-3);
        check!((result.direct.g - 0.5).abs() < 1e-3);
        check!((result.direct.b - 0.25).abs() < 1e-3);
        check!(result.indirect == black());
        // The mirror ray goes straight up and escapes
        check!(result.reflect == black());
        check!(result.combined == result.direct);
    }

    #[test]
    fn lambert_falloff() {
        let scene = floor_scene();
        let settings = direct_only();
        let integrator = Integrator::new(&scene, &settings);

        let ray = down_at(5.0 - 1e-3, 0.0);
        let_assert!(Ok(Some(result)) = integrator.cast_scene(&ray, 0, &mut rng()));
        let expected = 5.0 / (5.0f32 * 5.0 + 5.0 * 5.0).sqrt();
        check!((result.direct.r - expected).abs() < 1e-3);
    }

    #[test]
    fn occluder_casts_shadow() {
        let scene = shadowed_scene();
        let settings = direct_only();
        let integrator = Integrator::new(&scene, &settings);

        // Camera ray from below the blocker
        let_assert!(Ok(Some(shadowed)) = integrator.cast_scene(&down_at(0.1, -0.2), 0, &mut rng()));
        check!(shadowed.hit.object == ObjectIdx::new(0));
        check!(shadowed.direct == black());

        let_assert!(Ok(Some(lit)) = integrator.cast_scene(&down_at(3.0, 0.1), 0, &mut rng()));
        check!(lit.direct.r > 0.0);
    }

    #[test]
    fn occluder_behind_light_casts_no_shadow() {
        let mut scene = floor_scene();
        let mut above = Object::new(
            Mesh::cuboid(WorldVector::new(1.0, 0.2, 1.0)),
            WorldVector::new(0.0, 8.0, 0.0),
            Rgb::new(1.0, 1.0, 1.0),
        );
        above.build_octree(OctreeSettings::default());
        scene.add_object(above);

        let settings = direct_only();
        let integrator = Integrator::new(&scene, &settings);
        let_assert!(Ok(Some(result)) = integrator.cast_scene(&down_at(0.1, -0.2), 0, &mut rng()));
        check!(result.direct.r > 0.99);
    }

    #[test]
    fn back_side_is_shaded_like_front() {
        let mut scene = Scene::new(PointLight {
            position: WorldPoint::new(0.0, -5.0, 0.0),
        });
        scene.add_object(white_object(Mesh::quad(10.0)));
        scene.build_octrees(OctreeSettings::default());

        let settings = direct_only();
        let integrator = Integrator::new(&scene, &settings);
        let ray = Ray::new(WorldPoint::new(0.1, -1.0, -0.2), WorldVector::new(0.0, 1.0, 0.0));
        let_assert!(Ok(Some(result)) = integrator.cast_scene(&ray, 0, &mut rng()));
        check!((result.direct.r - 1.0).abs() < 1e-2);
    }

    #[test]
    fn mirror_term_sees_other_object() {
        // Looking down at a 45 degree angle onto the floor, mirror ray hits a wall
        let mut scene = floor_scene();
        let mut wall = Object::new(
            Mesh::cuboid(WorldVector::new(0.2, 4.0, 4.0)),
            WorldVector::new(2.0, 0.0, 0.0),
            Rgb::new(1.0, 1.0, 1.0),
        );
        wall.build_octree(OctreeSettings::default());
        scene.add_object(wall);
        scene.light.position = WorldPoint::new(0.0, 1.5, 0.0);

        let settings = direct_only();
        let integrator = Integrator::new(&scene, &settings);
        let ray = Ray::new_normalized(
            WorldPoint::new(-1.0, 1.0, 0.1),
            WorldVector::new(1.0, -1.0, 0.0),
        );
        let_assert!(Ok(Some(result)) = integrator.cast_scene(&ray, 0, &mut rng()));
        check!(result.hit.object == ObjectIdx::new(0));
        check!(result.reflect.r > 0.0);
        check!(result.combined == result.direct + result.indirect + result.reflect);
    }

    #[test]
    fn diffuse_only_has_no_reflection() {
        let scene = shadowed_scene();
        let settings = IntegratorSettings::builder()
            .shading(ShadingModel::DiffuseOnly)
            .build();
        let integrator = Integrator::new(&scene, &settings);

        let_assert!(Ok(Some(result)) = integrator.cast_scene(&down_at(1.0, 0.1), 0, &mut rng()));
        check!(result.reflect == black());
        let albedo = Rgb::new(1.0, 0.5, 0.25);
        check!(result.combined == result.direct + modulate(albedo, result.indirect));
    }

    #[test]
    fn indirect_light_from_lit_ceiling() {
        // Light between the floor and a large ceiling, floor indirect rays mostly hit the ceiling
        let mut scene = floor_scene();
        scene.light.position = WorldPoint::new(0.0, 1.0, 0.0);
        let mut ceiling = Object::new(
            Mesh::quad(100.0),
            WorldVector::new(0.0, 2.0, 0.0),
            Rgb::new(1.0, 1.0, 1.0),
        );
        ceiling.build_octree(OctreeSettings::default());
        scene.add_object(ceiling);

        let settings = IntegratorSettings::builder().indirect_samples(8).build();
        let integrator = Integrator::new(&scene, &settings);

        let_assert!(Ok(Some(result)) = integrator.cast_scene(&down_at(0.5, -0.2), 0, &mut rng()));
        check!(result.hit.object == ObjectIdx::new(0));
        check!(result.indirect.r > 0.0);
        check!(result.indirect.b > 0.0);
    }

    #[test]
    fn octree_and_brute_force_agree() {
        let scene = shadowed_scene();
        let octree_settings = IntegratorSettings::default();
        let brute_settings = IntegratorSettings::builder().query(QueryMode::BruteForce).build();

        for x in [-1.0, 0.2, 0.4, 2.5] {
            let ray = down_at(x, 0.3);
            let a = Integrator::new(&scene, &octree_settings).cast_scene(&ray, 0, &mut rng());
            let b = Integrator::new(&scene, &brute_settings).cast_scene(&ray, 0, &mut rng());
            assert!(a == b);
        }
    }

    #[test]
    fn missing_octree_is_reported() {
        let mut scene = Scene::default();
        scene.add_object(white_object(Mesh::quad(1.0)));
        let settings = IntegratorSettings::default();
        let integrator = Integrator::new(&scene, &settings);

        let_assert!(
            Err(SceneError::OctreeNotBuilt { .. }) =
                integrator.cast_scene(&down_at(0.0, 0.0), 0, &mut rng())
        );
    }
}
