use crate::geometry::{Ray, RayIntersectionExt as _};

use super::{NodeContent, NodeIdx, Octree, OctreeNode};

impl Octree {
    /// Lazily enumerates leaves whose region the ray touches, in depth first child order.
    /// Split nodes missed by the ray are skipped together with their whole subtree.
    pub fn leaves_along_ray(&self, ray: &Ray) -> LeavesAlongRay<'_> {
        LeavesAlongRay {
            octree: self,
            ray: *ray,
            stack: vec![NodeIdx::new(0)],
        }
    }
}

pub struct LeavesAlongRay<'a> {
    octree: &'a Octree,
    ray: Ray,
    stack: Vec<NodeIdx>,
}

impl<'a> Iterator for LeavesAlongRay<'a> {
    type Item = &'a OctreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(index) = self.stack.pop() {
            let node = &self.octree.nodes[index];
            if !node.region.intersects_ray(&self.ray) {
                continue;
            }

            match &node.content {
                // Reversed so that the first child is popped first
                NodeContent::Split(children) => self.stack.extend(children.iter().rev()),
                NodeContent::Leaf(_) => return Some(node),
            }
        }
        None
    }
}
