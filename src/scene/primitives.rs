//! Procedurally generated meshes, centered on the object space origin.

use std::f32::consts::PI;

use itertools::iproduct;

use crate::geometry::{FloatType, Triangle, WorldPoint, WorldVector};

use super::mesh::{Face, Mesh};

impl Mesh {
    /// Axis aligned box with flat shaded faces.
    pub fn cuboid(size: WorldVector) -> Mesh {
        let half = size / 2.0;
        let mut builder = MeshBuilder::default();

        for (axis, sign) in iproduct!(0..3, [1.0, -1.0]) {
            let mut normal = WorldVector::zeros();
            normal[axis] = sign;
            let mut u = WorldVector::zeros();
            u[(axis + 1) % 3] = half[(axis + 1) % 3];
            let mut v = WorldVector::zeros();
            v[(axis + 2) % 3] = half[(axis + 2) % 3];

            let center = WorldPoint::from(normal.component_mul(&half));
            builder.add_quad(
                [center - u - v, center + u - v, center + u + v, center - u + v],
                normal,
            );
        }

        builder.build()
    }

    /// Square in the XZ plane, facing +Y.
    pub fn quad(size: FloatType) -> Mesh {
        let h = size / 2.0;
        let mut builder = MeshBuilder::default();
        builder.add_quad(
            [
                WorldPoint::new(-h, 0.0, -h),
                WorldPoint::new(h, 0.0, -h),
                WorldPoint::new(h, 0.0, h),
                WorldPoint::new(-h, 0.0, h),
            ],
            WorldVector::y(),
        );
        builder.build()
    }

    /// Smooth shaded sphere made of `segments` slices around the Y axis and `rings` stacks.
    ///
    /// # Panics
    ///
    /// Panics if `segments < 3` or `rings < 2`.
    pub fn uv_sphere(radius: FloatType, segments: usize, rings: usize) -> Mesh {
        assert!(segments >= 3);
        assert!(rings >= 2);

        let mut builder = MeshBuilder::default();
        for (ring, segment) in iproduct!(0..=rings, 0..=segments) {
            let theta = PI * ring as FloatType / rings as FloatType;
            let phi = 2.0 * PI * segment as FloatType / segments as FloatType;
            let direction = WorldVector::new(
                theta.sin() * phi.cos(),
                theta.cos(),
                theta.sin() * phi.sin(),
            );
            builder.positions.push(WorldPoint::from(direction * radius));
            builder.normals.push(direction);
        }

        let index = |ring: usize, segment: usize| ring * (segments + 1) + segment;
        for (ring, segment) in iproduct!(0..rings, 0..segments) {
            let a = index(ring, segment);
            let b = index(ring + 1, segment);
            let c = index(ring + 1, segment + 1);
            let d = index(ring, segment + 1);

            // Triangles touching the poles would be degenerate
            if ring + 1 < rings {
                builder.add_smooth_triangle(Triangle::new(a, b, c));
            }
            if ring > 0 {
                builder.add_smooth_triangle(Triangle::new(a, c, d));
            }
        }

        builder.build()
    }
}

#[derive(Default)]
struct MeshBuilder {
    positions: Vec<WorldPoint>,
    normals: Vec<WorldVector>,
    faces: Vec<Face>,
}

impl MeshBuilder {
    fn add_quad(&mut self, corners: [WorldPoint; 4], normal: WorldVector) {
        let first = self.positions.len();
        self.positions.extend(corners);
        let normal_index = self.normals.len();
        self.normals.push(normal);

        let normals = Triangle::new(normal_index, normal_index, normal_index);
        self.faces.push(Face {
            positions: Triangle::new(first, first + 1, first + 2),
            normals,
        });
        self.faces.push(Face {
            positions: Triangle::new(first, first + 2, first + 3),
            normals,
        });
    }

    /// Triangle using the same indices for positions and normals.
    fn add_smooth_triangle(&mut self, indices: Triangle<usize>) {
        self.faces.push(Face {
            positions: indices,
            normals: indices,
        });
    }

    fn build(self) -> Mesh {
        Mesh {
            positions: self.positions,
            normals: self.normals,
            faces: self.faces.into(),
        }
    }
}
