pub mod mesh;
mod obj_loading;
pub mod octree;
mod primitives;
mod query;

use index_vec::IndexVec;
use thiserror::Error;

use crate::{
    geometry::{Triangle, WorldBox, WorldPoint, WorldVector},
    util::Rgb,
};

pub use mesh::{Face, Mesh, MeshError, MeshIndex};
pub use obj_loading::ObjOpenError;
pub use octree::{Octree, OctreeSettings};
pub use query::{HitRecord, QueryMode};

index_vec::define_index_type! {
    pub struct ObjectIdx = u32;
}

index_vec::define_index_type! {
    pub struct FaceIdx = u32;
}

/// Margin added around object bounds before building the octree root region.
const OCTREE_REGION_PADDING: f32 = 1e-3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("Object {object:?} has no octree, build octrees before running octree queries")]
    OctreeNotBuilt { object: ObjectIdx },
}

/// Mesh placed in the world at an offset, with a single diffuse color.
#[derive(Clone, Debug)]
pub struct Object {
    mesh: Mesh,
    position: WorldVector,
    pub color: Rgb,
    octree: Option<Octree>,
}

impl Object {
    pub fn new(mesh: Mesh, position: WorldVector, color: Rgb) -> Object {
        Object {
            mesh,
            position,
            color,
            octree: None,
        }
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn position(&self) -> &WorldVector {
        &self.position
    }

    /// Moves the object, dropping any octree built for the old position.
    pub fn set_position(&mut self, position: WorldVector) {
        self.position = position;
        self.octree = None;
    }

    pub fn octree(&self) -> Option<&Octree> {
        self.octree.as_ref()
    }

    /// World space triangle of a face.
    pub fn triangle(&self, face: FaceIdx) -> Triangle<WorldPoint> {
        self.mesh.triangle(face).translated(&self.position)
    }

    pub fn bounding_box(&self) -> Option<WorldBox> {
        self.mesh
            .bounding_box()
            .map(|b| b.map(|p| p + self.position))
    }

    /// Builds the octree over a padded cube containing all of the object's triangles.
    /// Objects without faces get no octree.
    pub fn build_octree(&mut self, settings: OctreeSettings) {
        let Some(bounds) = self.bounding_box() else {
            log::warn!("Not building octree for an empty object");
            self.octree = None;
            return;
        };

        let region = bounds.cubified().padded(OCTREE_REGION_PADDING);
        let triangles = self
            .mesh
            .faces()
            .map(|(face, _)| octree::TriangleBox::new(face, &self.triangle(face)))
            .collect::<Vec<_>>();

        let octree = Octree::build(region, settings, triangles);
        octree.log_statistics();
        self.octree = Some(octree);
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointLight {
    pub position: WorldPoint,
}

impl Default for PointLight {
    fn default() -> Self {
        PointLight {
            position: WorldPoint::new(5.0, 5.0, 5.0),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub objects: IndexVec<ObjectIdx, Object>,
    pub light: PointLight,
}

impl Scene {
    pub fn new(light: PointLight) -> Scene {
        Scene {
            objects: IndexVec::new(),
            light,
        }
    }

    pub fn add_object(&mut self, object: Object) -> ObjectIdx {
        self.objects.push(object)
    }

    pub fn build_octrees(&mut self, settings: OctreeSettings) {
        for (index, object) in self.objects.iter_mut_enumerated() {
            log::debug!("Building octree for object {index:?}");
            object.build_octree(settings);
        }
    }

    /// Checks that the scene can be queried in the given mode.
    pub fn validate(&self, mode: QueryMode) -> Result<(), SceneError> {
        if mode == QueryMode::Octree {
            for (object, o) in self.objects.iter_enumerated() {
                if o.octree.is_none() && o.mesh.face_count() > 0 {
                    return Err(SceneError::OctreeNotBuilt { object });
                }
            }
        }
        Ok(())
    }
}
