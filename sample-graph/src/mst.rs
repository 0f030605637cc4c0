use crate::graph::SampleGraph;
use cytof_types::{CytofError, Result};
use log::debug;
use petgraph::algo::connected_components;
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;

/// An edge of a spanning tree, normalized so that `source < target`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MstEdge {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
}

impl MstEdge {
    pub fn new(a: usize, b: usize, weight: f64) -> MstEdge {
        MstEdge {
            source: a.min(b),
            target: a.max(b),
            weight,
        }
    }
}

/// Kruskal's minimum spanning tree.
///
/// Edges are considered in ascending `(weight, source, target)` order, so among equal
/// weights the lowest node-index pair wins and the tree is reproducible. Returned edges
/// are in acceptance order. Graphs with zero or one node give an empty tree.
pub fn minimum_spanning_tree(graph: &SampleGraph) -> Result<Vec<MstEdge>> {
    let n = graph.node_count();
    if n <= 1 {
        return Ok(Vec::new());
    }

    let components = connected_components(graph);
    if components != 1 {
        return Err(CytofError::DisconnectedGraph { nodes: n, components });
    }

    let mut edges: Vec<MstEdge> = graph
        .edge_references()
        .filter(|e| e.source() != e.target())
        .map(|e| MstEdge::new(e.source().index(), e.target().index(), *e.weight()))
        .collect();
    edges.sort_by(|x, y| {
        x.weight
            .total_cmp(&y.weight)
            .then(x.source.cmp(&y.source))
            .then(x.target.cmp(&y.target))
    });

    let mut forest = UnionFind::new(n);
    let mut tree = Vec::with_capacity(n - 1);
    for e in edges {
        if forest.union(e.source, e.target) {
            tree.push(e);
            if tree.len() == n - 1 {
                break;
            }
        }
    }

    if tree.len() != n - 1 {
        return Err(CytofError::DisconnectedGraph {
            nodes: n,
            components: n - tree.len(),
        });
    }
    debug!("spanning tree over {} nodes, total weight {}", n, total_weight(&tree));
    Ok(tree)
}

/// Sum of edge weights.
pub fn total_weight(edges: &[MstEdge]) -> f64 {
    edges.iter().map(|e| e.weight).sum()
}
