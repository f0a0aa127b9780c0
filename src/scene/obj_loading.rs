use std::{fs, path::Path};

use indexmap::IndexMap;
use thiserror::Error;

use crate::geometry::{Triangle, WorldPoint, WorldVector};

use super::mesh::{Face, Mesh, MeshError};

#[derive(Debug, Error)]
pub enum ObjOpenError {
    #[error("Failed to read file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse file: {0}")]
    ParseError(#[from] wavefront_obj::ParseError),

    #[error("Invalid mesh: {0}")]
    MeshError(#[from] MeshError),

    #[error("File contains no triangles")]
    Empty,
}

impl Mesh {
    /// Loads all triangles of all objects in a Wavefront OBJ file into a single mesh.
    pub fn with_obj(p: impl AsRef<Path>) -> Result<Mesh, ObjOpenError> {
        let content = fs::read_to_string(p)?;
        Self::parse_obj(content)
    }

    pub fn parse_obj(content: String) -> Result<Mesh, ObjOpenError> {
        let parsed = wavefront_obj::obj::parse(content)?;
        let mesh = Self::load_obj(parsed)?;

        if mesh.face_count() == 0 {
            return Err(ObjOpenError::Empty);
        }

        log::info!("Loaded mesh with {} triangles", mesh.face_count());
        Ok(mesh)
    }

    fn load_obj(obj: wavefront_obj::obj::ObjSet) -> Result<Mesh, MeshError> {
        let mut faces = Vec::new();
        let mut positions = IndexMap::new();
        let mut normals = IndexMap::new();
        let mut face_normals = Vec::new();
        let mut skipped = 0usize;

        for (object_index, o) in obj.objects.iter().enumerate() {
            for geometry in &o.geometry {
                for shape in &geometry.shapes {
                    let &wavefront_obj::obj::Primitive::Triangle(a, b, c) = &shape.primitive else {
                        skipped += 1;
                        continue;
                    };

                    let mut position_index = |vtindex: (usize, Option<usize>, Option<usize>)| {
                        let entry = positions.entry((object_index, vtindex.0));
                        let index = entry.index();
                        entry.or_insert_with(|| {
                            let v = &o.vertices[vtindex.0];
                            WorldPoint::new(v.x as f32, v.y as f32, v.z as f32)
                        });
                        index
                    };
                    let face_positions =
                        Triangle::new(position_index(a), position_index(b), position_index(c));

                    let face_normals_indices = match (a.2, b.2, c.2) {
                        (Some(na), Some(nb), Some(nc)) => {
                            let mut normal_index = |i: usize| {
                                let entry = normals.entry((object_index, i));
                                let index = entry.index();
                                entry.or_insert_with(|| {
                                    let n = &o.normals[i];
                                    WorldVector::new(n.x as f32, n.y as f32, n.z as f32)
                                });
                                index
                            };
                            Triangle::new(normal_index(na), normal_index(nb), normal_index(nc))
                        }
                        _ => {
                            // Flat shaded face, resolved after all smooth normals are known
                            face_normals.push(faces.len());
                            Triangle::default()
                        }
                    };

                    faces.push(Face {
                        positions: face_positions,
                        normals: face_normals_indices,
                    });
                }
            }
        }

        if skipped > 0 {
            log::warn!("Skipped {skipped} non-triangle primitives");
        }

        let positions: Vec<WorldPoint> = positions.into_values().collect();
        let mut normals: Vec<WorldVector> = normals.into_values().collect();

        for face_index in face_normals {
            let face: &mut Face = &mut faces[face_index];
            let normal = face
                .positions
                .map(|&i| positions[i])
                .normal()
                .try_normalize(0.0)
                .unwrap_or_else(WorldVector::zeros);
            let index = normals.len();
            normals.push(normal);
            face.normals = Triangle::new(index, index, index);
        }

        Mesh::new(positions, normals, faces)
    }
}
