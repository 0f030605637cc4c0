use cytof_types::{CytofError, Result};
use ndarray::Array2;
use petgraph::graph::{NodeIndex, UnGraph};

/// Complete undirected graph over samples. Node `i` is the `i`-th input vector and edge
/// weights are sample distances.
pub type SampleGraph = UnGraph<(), f64>;

/// Build the complete graph over the rows of a square distance matrix. Edges are added in
/// `(i, j)` lexicographic order with `i < j`.
pub fn build_graph(distances: &Array2<f64>) -> Result<SampleGraph> {
    let (n, m) = distances.dim();
    if n != m {
        return Err(CytofError::dimension_mismatch("distance matrix columns", n, m));
    }

    let mut graph = SampleGraph::with_capacity(n, n * n.saturating_sub(1) / 2);
    let nodes: Vec<NodeIndex> = (0..n).map(|_| graph.add_node(())).collect();

    for i in 0..n {
        for j in i + 1..n {
            let w = distances[[i, j]];
            if !w.is_finite() {
                return Err(CytofError::invalid_parameter(format!(
                    "distance between nodes {i} and {j} is not finite ({w})"
                )));
            }
            graph.add_edge(nodes[i], nodes[j], w);
        }
    }
    Ok(graph)
}
