use index_vec::IndexVec;

use crate::geometry::WorldBox;

use super::{NodeContent, NodeIdx, Octree, OctreeNode, OctreeSettings, TriangleBox};

impl Octree {
    /// Empty octree covering `region`.
    pub fn new(region: WorldBox, settings: OctreeSettings) -> Octree {
        let mut nodes = IndexVec::new();
        nodes.push(OctreeNode::new_leaf(region, 0));
        Octree { settings, nodes }
    }

    pub fn build(
        region: WorldBox,
        settings: OctreeSettings,
        triangles: impl IntoIterator<Item = TriangleBox>,
    ) -> Octree {
        let mut octree = Octree::new(region, settings);
        let mut rejected = 0usize;
        for triangle in triangles {
            if !octree.insert(triangle) {
                rejected += 1;
            }
        }

        if rejected > 0 {
            log::warn!("{rejected} triangles are outside of the octree region");
        }

        octree
    }

    /// Adds a triangle to every leaf whose region touches its bounding box,
    /// splitting leaves that reach the threshold.
    /// Returns false if the triangle lies outside of the root region and was not stored.
    pub fn insert(&mut self, triangle: TriangleBox) -> bool {
        let root = NodeIdx::new(0);
        if !self.nodes[root].region.overlaps_inclusive(&triangle.bounds) {
            return false;
        }
        self.insert_recursive(root, triangle);
        true
    }

    fn insert_recursive(&mut self, index: NodeIdx, triangle: TriangleBox) {
        let node = &mut self.nodes[index];
        match &mut node.content {
            NodeContent::Split(children) => {
                let children = *children;
                for child in children {
                    if self.nodes[child].region.overlaps_inclusive(&triangle.bounds) {
                        self.insert_recursive(child, triangle);
                    }
                }
            }
            NodeContent::Leaf(triangles) => {
                triangles.push(triangle);
                if triangles.len() >= self.settings.split_threshold
                    && node.depth < self.settings.max_depth
                {
                    self.split(index);
                }
            }
        }
    }

    /// Turns a leaf into a split node and redistributes its triangles.
    /// Children that receive enough triangles split in turn.
    fn split(&mut self, index: NodeIdx) {
        let region = self.nodes[index].region;
        let depth = self.nodes[index].depth + 1;

        let children: [NodeIdx; 8] = std::array::from_fn(|i| {
            self.nodes
                .push(OctreeNode::new_leaf(region.octant(i), depth))
        });

        let old_content = std::mem::replace(
            &mut self.nodes[index].content,
            NodeContent::Split(children),
        );
        let NodeContent::Leaf(triangles) = old_content else {
            unreachable!("Only leaves get split");
        };

        log::debug!(
            "Splitting node {} at depth {} with {} triangles",
            index.index(),
            depth - 1,
            triangles.len()
        );

        for triangle in triangles {
            for child in children {
                if self.nodes[child].region.overlaps_inclusive(&triangle.bounds) {
                    self.insert_recursive(child, triangle);
                }
            }
        }
    }
}
