//! Octree over triangle bounding boxes of a single object.
//!
//! Nodes live in an arena and refer to their children by index. A node is either a leaf
//! holding triangle handles or split into 8 octants sharing its center. A leaf splits once
//! its triangle count reaches `split_threshold`, unless it is already at `max_depth`;
//! leaves at maximal depth grow without limit.
//!
//! Triangles whose bounding box straddles octant boundaries are duplicated into every
//! child whose closed region touches the bounding box. This guarantees that every point of
//! a triangle inside the root region lies in some leaf that references the triangle.

mod building;
mod printing;
mod ray_octree_intersection;

use index_vec::IndexVec;

use crate::geometry::{Triangle, WorldBox, WorldPoint};

use super::FaceIdx;

pub use printing::OctreeStatistics;
pub use ray_octree_intersection::LeavesAlongRay;

pub const DEFAULT_SPLIT_THRESHOLD: usize = 16;
pub const DEFAULT_MAX_DEPTH: u32 = 2;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OctreeSettings {
    /// Leaf size that triggers a split.
    pub split_threshold: usize,
    /// Nodes at this depth never split. Root has depth 0.
    pub max_depth: u32,
}

impl Default for OctreeSettings {
    fn default() -> Self {
        OctreeSettings {
            split_threshold: DEFAULT_SPLIT_THRESHOLD,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Reference to a mesh triangle, together with its precomputed world space bounding box.
/// The vertex data stays in the mesh that owns the octree.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TriangleBox {
    pub face: FaceIdx,
    pub bounds: WorldBox,
}

impl TriangleBox {
    pub fn new(face: FaceIdx, triangle: &Triangle<WorldPoint>) -> TriangleBox {
        TriangleBox {
            face,
            bounds: triangle.bounding_box(),
        }
    }
}

index_vec::define_index_type! {
    pub struct NodeIdx = u32;
}

#[derive(Clone, Debug)]
pub struct Octree {
    settings: OctreeSettings,
    /// Root is always the first node.
    nodes: IndexVec<NodeIdx, OctreeNode>,
}

#[derive(Clone, Debug)]
pub struct OctreeNode {
    region: WorldBox,
    depth: u32,
    content: NodeContent,
}

#[derive(Clone, Debug)]
enum NodeContent {
    Leaf(Vec<TriangleBox>),
    Split([NodeIdx; 8]),
}

impl Octree {
    pub fn root(&self) -> &OctreeNode {
        &self.nodes[NodeIdx::new(0)]
    }

    pub fn node(&self, index: NodeIdx) -> &OctreeNode {
        &self.nodes[index]
    }

    pub fn settings(&self) -> &OctreeSettings {
        &self.settings
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaves(&self) -> impl Iterator<Item = &OctreeNode> {
        self.nodes.iter().filter(|node| !node.is_split())
    }
}

impl OctreeNode {
    fn new_leaf(region: WorldBox, depth: u32) -> OctreeNode {
        OctreeNode {
            region,
            depth,
            content: NodeContent::Leaf(Vec::new()),
        }
    }

    pub fn region(&self) -> &WorldBox {
        &self.region
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn is_split(&self) -> bool {
        matches!(self.content, NodeContent::Split(_))
    }

    /// Triangles stored in the node, always empty for split nodes.
    pub fn triangles(&self) -> &[TriangleBox] {
        match &self.content {
            NodeContent::Leaf(triangles) => triangles,
            NodeContent::Split(_) => &[],
        }
    }

    pub fn children(&self) -> Option<&[NodeIdx; 8]> {
        match &self.content {
            NodeContent::Leaf(_) => None,
            NodeContent::Split(children) => Some(children),
        }
    }
}
