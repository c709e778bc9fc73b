use crate::{Error, Graph, Partition, Result, Side};
use std::fmt;

/// Score of a bisection. Lower is better.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Fitness {
    /// Total weight of the edges whose endpoints lie on different sides.
    pub cut_weight: u64,
    /// Absolute difference of the side sizes, every node weighing 1.
    pub balance_penalty: u64,
}

impl Fitness {
    pub fn value(&self) -> u64 {
        self.cut_weight + self.balance_penalty
    }

    pub fn as_f64(&self) -> f64 {
        self.value() as f64
    }
}

impl fmt::Display for Fitness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl Graph {
    /// Scores `partition` as cut weight plus size imbalance.
    ///
    /// Every vertex has to be on exactly one side: a missing vertex is
    /// [`Error::PartitionIncomplete`], a repeated one [`Error::PartitionOverlap`] and an unknown
    /// id [`Error::OutOfRange`].
    pub fn evaluate_fitness(&self, partition: &Partition) -> Result<Fitness> {
        let vertex_count = self.vertex_count();
        let mut assignment: Vec<Option<Side>> = vec![None; vertex_count];

        for side in [Side::P0, Side::P1] {
            for &vx in partition.side(side) {
                let slot = assignment
                    .get_mut(vx as usize)
                    .ok_or(Error::OutOfRange {
                        id: vx as u64,
                        vertex_count,
                    })?;
                if slot.is_some() {
                    return Err(Error::PartitionOverlap(vx));
                }
                *slot = Some(side);
            }
        }

        let assignment = assignment
            .into_iter()
            .enumerate()
            .map(|(vx, side)| side.ok_or(Error::PartitionIncomplete(vx as u32)))
            .collect::<Result<Vec<Side>>>()?;

        let (p0, p1) = partition.sizes();
        Ok(Fitness {
            cut_weight: self.calculate_edge_cut(&assignment),
            balance_penalty: p0.abs_diff(p1) as u64,
        })
    }
}
