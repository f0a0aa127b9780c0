use std::collections::HashSet;

use crate::util::Stats;

use super::{NodeIdx, Octree};

#[derive(Clone, Debug)]
pub struct OctreeStatistics {
    pub node_count: usize,
    pub split_count: usize,
    pub leaf_depth: Stats,
    pub leaf_fill: Stats,
    /// Number of triangle references in all leaves, counting duplicates.
    pub stored_triangles: usize,
    pub distinct_triangles: usize,
}

impl OctreeStatistics {
    /// Number of extra references created by triangles straddling leaf boundaries.
    pub fn duplicates(&self) -> usize {
        self.stored_triangles - self.distinct_triangles
    }
}

impl Octree {
    pub fn statistics(&self) -> OctreeStatistics {
        let leaf_fill: Stats = self.leaves().map(|leaf| leaf.triangles().len()).collect();
        OctreeStatistics {
            node_count: self.nodes.len(),
            split_count: self.nodes.iter().filter(|node| node.is_split()).count(),
            leaf_depth: self.leaves().map(|leaf| leaf.depth() as usize).collect(),
            leaf_fill,
            stored_triangles: leaf_fill.sum,
            distinct_triangles: self
                .leaves()
                .flat_map(|leaf| leaf.triangles().iter().map(|t| t.face))
                .collect::<HashSet<_>>()
                .len(),
        }
    }

    pub fn log_statistics(&self) {
        let statistics = self.statistics();
        log::info!(
            "Octree: {} nodes, {} splits, {} triangles, {} duplicates",
            statistics.node_count,
            statistics.split_count,
            statistics.distinct_triangles,
            statistics.duplicates()
        );
        log::info!("Leaf depth: {}", statistics.leaf_depth);
        log::info!("Leaf fill: {}", statistics.leaf_fill);
    }

    pub fn print_tree(&self) {
        self.print_recursive(NodeIdx::new(0));
    }

    fn print_recursive(&self, index: NodeIdx) {
        let node = &self.nodes[index];
        let indent = "  ".repeat(node.depth as usize);
        match node.children() {
            Some(children) => {
                println!(
                    "{}- S{}: {:?}-{:?}",
                    indent,
                    index.index(),
                    node.region.min,
                    node.region.max
                );
                for child in children {
                    self.print_recursive(*child);
                }
            }
            None => {
                println!(
                    "{}- L{}: {:?}-{:?}, {} triangles",
                    indent,
                    index.index(),
                    node.region.min,
                    node.region.max,
                    node.triangles().len()
                );
                for triangle in node.triangles() {
                    println!("{}    {:?}", indent, triangle.face);
                }
            }
        }
    }
}
