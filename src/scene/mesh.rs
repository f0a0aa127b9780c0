use index_vec::IndexVec;
use itertools::Itertools as _;
use thiserror::Error;

use crate::geometry::{BarycentricCoordinates, Triangle, WorldBox, WorldPoint, WorldVector};

use super::FaceIdx;

/// Triangle mesh in object space.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub(super) positions: Vec<WorldPoint>,
    pub(super) normals: Vec<WorldVector>,
    pub(super) faces: IndexVec<FaceIdx, Face>,
}

/// Indices of a single triangle into the mesh's position and normal arrays.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Face {
    pub positions: Triangle<usize>,
    pub normals: Triangle<usize>,
}

/// Vertex of a face in the flat loader format.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MeshIndex {
    pub position: usize,
    pub normal: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("Flat {what} array has length {len}, which is not a multiple of 3")]
    FlatArrayLength { what: &'static str, len: usize },

    #[error("Face {face} has {vertex_count} vertices, only triangles are supported")]
    NonTriangleFace { face: usize, vertex_count: u32 },

    #[error("Faces reference {expected} vertices, but {actual} indices were given")]
    IndexCountMismatch { expected: usize, actual: usize },

    #[error("Face {face} references {what} {index}, but there are only {count}")]
    IndexOutOfRange {
        face: usize,
        what: &'static str,
        index: usize,
        count: usize,
    },
}

impl Mesh {
    /// Creates a mesh, verifying that all face indices are in range.
    pub fn new(
        positions: Vec<WorldPoint>,
        normals: Vec<WorldVector>,
        faces: Vec<Face>,
    ) -> Result<Mesh, MeshError> {
        for (face_index, face) in faces.iter().enumerate() {
            check_indices(face_index, "position", &face.positions, positions.len())?;
            check_indices(face_index, "normal", &face.normals, normals.len())?;
        }

        Ok(Mesh {
            positions,
            normals,
            faces: faces.into(),
        })
    }

    /// Creates a mesh from flat arrays, as handed over by a model loader.
    /// `positions` and `normals` hold 3 floats per vertex, `face_vertex_counts`
    /// has one entry per face (must be 3), and `indices` has one entry per face vertex.
    pub fn from_flat(
        positions: &[f32],
        normals: &[f32],
        face_vertex_counts: &[u32],
        indices: &[MeshIndex],
    ) -> Result<Mesh, MeshError> {
        let positions = flat_to_triples(positions, "position")?
            .map(|[x, y, z]| WorldPoint::new(x, y, z))
            .collect();
        let normals = flat_to_triples(normals, "normal")?
            .map(|[x, y, z]| WorldVector::new(x, y, z))
            .collect();

        if let Some((face, &vertex_count)) = face_vertex_counts
            .iter()
            .find_position(|&&count| count != 3)
        {
            return Err(MeshError::NonTriangleFace { face, vertex_count });
        }

        let expected = face_vertex_counts.len() * 3;
        if indices.len() != expected {
            return Err(MeshError::IndexCountMismatch {
                expected,
                actual: indices.len(),
            });
        }

        let faces = indices
            .iter()
            .tuples()
            .map(|(a, b, c)| Face {
                positions: Triangle::new(a.position, b.position, c.position),
                normals: Triangle::new(a.normal, b.normal, c.normal),
            })
            .collect();

        Mesh::new(positions, normals, faces)
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn faces(&self) -> impl Iterator<Item = (FaceIdx, &Face)> {
        self.faces.iter_enumerated()
    }

    pub fn positions(&self) -> &[WorldPoint] {
        &self.positions
    }

    /// Object space triangle of the face.
    pub fn triangle(&self, face: FaceIdx) -> Triangle<WorldPoint> {
        self.faces[face].positions.map(|&i| self.positions[i])
    }

    /// Vertex normals of the face interpolated at the given barycentric coordinates.
    /// The result is not renormalized.
    pub fn interpolate_normal(&self, face: FaceIdx, uv: &BarycentricCoordinates) -> WorldVector {
        let normals = self.faces[face].normals.map(|&i| self.normals[i]);
        uv.interpolate_triangle(&normals)
    }

    /// Object space bounding box, None for a mesh without faces.
    pub fn bounding_box(&self) -> Option<WorldBox> {
        WorldBox::from_points(
            self.faces
                .iter()
                .flat_map(|face| face.positions.iter())
                .map(|&i| &self.positions[i]),
        )
    }
}

fn check_indices(
    face: usize,
    what: &'static str,
    indices: &Triangle<usize>,
    count: usize,
) -> Result<(), MeshError> {
    match indices.iter().find(|&&index| index >= count) {
        Some(&index) => Err(MeshError::IndexOutOfRange {
            face,
            what,
            index,
            count,
        }),
        None => Ok(()),
    }
}

fn flat_to_triples<'a>(
    values: &'a [f32],
    what: &'static str,
) -> Result<impl Iterator<Item = [f32; 3]> + 'a, MeshError> {
    if values.len() % 3 != 0 {
        return Err(MeshError::FlatArrayLength {
            what,
            len: values.len(),
        });
    }
    Ok(values.chunks_exact(3).map(|c| [c[0], c[1], c[2]]))
}
