// Kernighan-Lin and island-model genetic bisection of undirected edge lists, scored by cut
// weight plus size imbalance.

mod bisection;
mod edgelist;
mod error;
mod fitness;
mod genetic;
mod partition_util;

pub use bisection::BisectionPartitioningConfig;
pub use edgelist::{convert_raw_file, EdgeList, NodeTable, MAX_VERTEX_COUNT};
pub use error::{Error, Result};
pub use fitness::Fitness;
pub use genetic::{GeneticOutcome, GeneticPartitioningConfig};
pub use partition_util::{InitialPartitioningMethod, Partition, Side};

use anyhow::Context;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// An undirected edge as it appears in the ordered edge list.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    pub src: u32,
    pub dst: u32,
    pub weight: u32,
}

impl Edge {
    pub fn new(src: u32, dst: u32) -> Self {
        Self::with_weight(src, dst, 1)
    }

    pub fn with_weight(src: u32, dst: u32, weight: u32) -> Self {
        Self { src, dst, weight }
    }
}

/// One end of an edge, stored in the adjacency of the other end.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GraphEdge {
    pub dst: u32,
    pub weight: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GraphVertex {
    pub edges: Vec<GraphEdge>,
}

/// Undirected weighted graph over the vertices `0..n`. Parallel edges are kept as separate
/// entries. The graph is never modified after construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Graph {
    vertices: Vec<GraphVertex>,
    edges: Vec<Edge>,
}

impl Graph {
    pub fn from_edges(vertex_count: usize, edges: Vec<Edge>) -> Result<Self> {
        let mut vertices = vec![GraphVertex::default(); vertex_count];

        for e in edges.iter() {
            for id in [e.src, e.dst] {
                if id as usize >= vertex_count {
                    return Err(Error::OutOfRange {
                        id: id as u64,
                        vertex_count,
                    });
                }
            }
            if e.src == e.dst {
                return Err(Error::Format(format!("self-loop on node {}", e.src)));
            }
            vertices[e.src as usize].edges.push(GraphEdge {
                dst: e.dst,
                weight: e.weight,
            });
            vertices[e.dst as usize].edges.push(GraphEdge {
                dst: e.src,
                weight: e.weight,
            });
        }

        Ok(Graph { vertices, edges })
    }

    pub fn from_edge_list(list: EdgeList) -> Result<Self> {
        Self::from_edges(list.vertex_count, list.edges)
    }

    pub fn deserialize_edgelist<R: BufRead>(reader: R) -> Result<Self> {
        Self::from_edge_list(EdgeList::parse_canonical(reader)?)
    }

    /// Loads a `.edgelist` file. Other extensions are refused.
    pub fn load_edgelist<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.extension().and_then(|ext| ext.to_str()) != Some("edgelist") {
            return Err(Error::Format(format!(
                "{}: supported graph file formats are: .edgelist",
                path.display()
            ))
            .into());
        }

        let reader = BufReader::new(
            File::open(path).with_context(|| format!("could not open {}", path.display()))?,
        );
        let graph = Self::deserialize_edgelist(reader)
            .with_context(|| format!("could not load {}", path.display()))?;

        log::info!(
            "number of nodes: {}, number of edges: {}",
            graph.vertex_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    /// Returns the canonical edge list of this graph. The text form carries no weights.
    pub fn to_edge_list(&self) -> EdgeList {
        EdgeList {
            vertex_count: self.vertices.len(),
            edges: self.edges.clone(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn neighbours(&self, vx: u32) -> &[GraphEdge] {
        &self.vertices[vx as usize].edges
    }

    /// Sum of the weights of all edges joining `va` and `vb`.
    pub fn weight_between(&self, va: u32, vb: u32) -> u64 {
        self.neighbours(va)
            .iter()
            .filter(|e| e.dst == vb)
            .map(|e| e.weight as u64)
            .sum()
    }

    /// Returns the sum of edge weights of neighbours on the given side.
    pub fn get_degree(&self, vx: u32, side: Side, assignment: &[Side]) -> u64 {
        let mut degree = 0;
        for e in self.neighbours(vx).iter() {
            if assignment[e.dst as usize] == side {
                degree += e.weight as u64;
            }
        }
        degree
    }

    pub fn calculate_edge_cut(&self, assignment: &[Side]) -> u64 {
        self.edges
            .iter()
            .filter(|e| assignment[e.src as usize] != assignment[e.dst as usize])
            .map(|e| e.weight as u64)
            .sum()
    }
}

pub(crate) fn divide_round_up(dividend: u32, divisor: u32) -> u32 {
    (dividend + divisor - 1) / divisor
}
