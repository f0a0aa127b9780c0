use crate::geometry::{
    BarycentricCoordinates, EPSILON, FloatType, Ray, TriangleHit, WorldPoint, WorldVector,
};

use super::{FaceIdx, ObjectIdx, Scene, SceneError};

/// Selects how scene queries find candidate triangles.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum QueryMode {
    /// Test every triangle of every object.
    BruteForce,
    /// Only test triangles in octree leaves touched by the ray.
    #[default]
    Octree,
}

/// Closest intersection of a ray with the scene.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HitRecord {
    pub t: FloatType,
    pub position: WorldPoint,
    /// Interpolated vertex normal, not normalized
    pub normal: WorldVector,
    pub uv: BarycentricCoordinates,
    pub object: ObjectIdx,
    pub face: FaceIdx,
}

/// Tracks the closest accepted hit.
/// Hits at equal distance are resolved toward the lowest (object, face) pair,
/// so that the result does not depend on the order in which triangles are tested.
struct ClosestHit {
    max_t: FloatType,
    best: Option<(ObjectIdx, FaceIdx, TriangleHit)>,
}

impl ClosestHit {
    fn new(max_t: FloatType) -> ClosestHit {
        ClosestHit { max_t, best: None }
    }

    fn add(&mut self, object: ObjectIdx, face: FaceIdx, hit: TriangleHit) {
        if hit.t <= EPSILON {
            return;
        }

        let accept = match &self.best {
            None => hit.t < self.max_t,
            Some((best_object, best_face, best)) => {
                hit.t < best.t || (hit.t == best.t && (object, face) < (*best_object, *best_face))
            }
        };

        if accept {
            self.best = Some((object, face, hit));
        }
    }

    fn into_record(self, scene: &Scene, ray: &Ray) -> Option<HitRecord> {
        let (object, face, hit) = self.best?;
        Some(HitRecord {
            t: hit.t,
            position: ray.point_at(hit.t),
            normal: scene.objects[object].mesh().interpolate_normal(face, &hit.uv),
            uv: hit.uv,
            object,
            face,
        })
    }
}

impl Scene {
    /// Closest hit along the ray with `t > EPSILON`.
    pub fn intersect(&self, ray: &Ray, mode: QueryMode) -> Result<Option<HitRecord>, SceneError> {
        self.intersect_within(ray, mode, FloatType::INFINITY)
    }

    /// Closest hit along the ray with `EPSILON < t < max_t`.
    pub fn intersect_within(
        &self,
        ray: &Ray,
        mode: QueryMode,
        max_t: FloatType,
    ) -> Result<Option<HitRecord>, SceneError> {
        match mode {
            QueryMode::BruteForce => Ok(self.intersect_brute_force(ray, max_t)),
            QueryMode::Octree => self.intersect_octree(ray, max_t),
        }
    }

    /// Reference query testing every triangle in the scene.
    pub fn intersect_brute_force(&self, ray: &Ray, max_t: FloatType) -> Option<HitRecord> {
        let mut closest = ClosestHit::new(max_t);

        for (object_index, object) in self.objects.iter_enumerated() {
            for (face, _) in object.mesh().faces() {
                if let Some(hit) = object.triangle(face).intersect(ray) {
                    closest.add(object_index, face, hit);
                }
            }
        }

        closest.into_record(self, ray)
    }

    /// Accelerated query, visiting only octree leaves the ray passes through.
    /// Leaves don't come in distance order, so all of them are examined.
    pub fn intersect_octree(
        &self,
        ray: &Ray,
        max_t: FloatType,
    ) -> Result<Option<HitRecord>, SceneError> {
        let mut closest = ClosestHit::new(max_t);

        for (object_index, object) in self.objects.iter_enumerated() {
            let Some(octree) = object.octree() else {
                if object.mesh().face_count() == 0 {
                    continue;
                }
                return Err(SceneError::OctreeNotBuilt {
                    object: object_index,
                });
            };

            for leaf in octree.leaves_along_ray(ray) {
                for triangle in leaf.triangles() {
                    if let Some(hit) = object.triangle(triangle.face).intersect(ray) {
                        closest.add(object_index, triangle.face, hit);
                    }
                }
            }
        }

        Ok(closest.into_record(self, ray))
    }
}
