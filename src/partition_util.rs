use crate::{divide_round_up, Graph};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::VecDeque;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Side {
    P0,
    P1,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::P0 => Side::P1,
            Side::P1 => Side::P0,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Side::P0 => 0,
            Side::P1 => 1,
        }
    }
}

/// Two sets of node ids. Completeness and disjointness are checked when the partition is scored,
/// not on construction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Partition {
    p0: Vec<u32>,
    p1: Vec<u32>,
}

impl Partition {
    pub fn new(p0: Vec<u32>, p1: Vec<u32>) -> Self {
        Self { p0, p1 }
    }

    /// Collects the nodes of a per-node side assignment, in ascending id order.
    pub fn from_assignment(assignment: &[Side]) -> Self {
        let mut partition = Partition::default();
        for (vx, side) in assignment.iter().enumerate() {
            match side {
                Side::P0 => partition.p0.push(vx as u32),
                Side::P1 => partition.p1.push(vx as u32),
            }
        }
        partition
    }

    pub fn side(&self, side: Side) -> &[u32] {
        match side {
            Side::P0 => &self.p0,
            Side::P1 => &self.p1,
        }
    }

    pub fn sizes(&self) -> (usize, usize) {
        (self.p0.len(), self.p1.len())
    }

    pub fn into_sets(self) -> (Vec<u32>, Vec<u32>) {
        (self.p0, self.p1)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum InitialPartitioningMethod {
    /// Vertices are assigned by the parity of their index.
    Modulo,
    /// Vertices are shuffled and the first half goes to `P0`.
    Random,
    /// A breadth first flood fills `P0`, the remaining vertices go to `P1`.
    Bfs,
}

impl Graph {
    /// Splits the vertices into sides of size ⌈n/2⌉ (`P0`) and ⌊n/2⌋ (`P1`).
    pub fn partition_initial(
        &self,
        method: InitialPartitioningMethod,
        rng: &mut StdRng,
    ) -> Vec<Side> {
        let vertex_count = self.vertex_count();
        let target_size = divide_round_up(vertex_count as u32, 2) as usize;

        match method {
            InitialPartitioningMethod::Modulo => (0..vertex_count)
                .map(|i| if i % 2 == 0 { Side::P0 } else { Side::P1 })
                .collect(),
            InitialPartitioningMethod::Random => {
                let mut order: Vec<usize> = (0..vertex_count).collect();
                order.shuffle(rng);

                let mut assignment = vec![Side::P1; vertex_count];
                for &vx in order.iter().take(target_size) {
                    assignment[vx] = Side::P0;
                }
                assignment
            }
            InitialPartitioningMethod::Bfs => {
                let mut assignment: Vec<Option<Side>> = vec![None; vertex_count];
                let mut partition_size = 0;
                let mut queue = VecDeque::new();

                // Restart from the first unassigned vertex so disconnected parts get filled too.
                while partition_size < target_size {
                    let Some(start) = assignment.iter().position(Option::is_none) else {
                        break;
                    };
                    queue.clear();
                    queue.push_back(start as u32);

                    while let Some(vx) = queue.pop_front() {
                        if assignment[vx as usize].is_some() {
                            continue;
                        }
                        assignment[vx as usize] = Some(Side::P0);
                        partition_size += 1;
                        if partition_size >= target_size {
                            break;
                        }

                        for e in self.neighbours(vx).iter() {
                            if assignment[e.dst as usize].is_none() {
                                queue.push_back(e.dst);
                            }
                        }
                    }
                }

                assignment
                    .into_iter()
                    .map(|side| side.unwrap_or(Side::P1))
                    .collect()
            }
        }
    }
}
