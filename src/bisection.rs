use crate::{Graph, InitialPartitioningMethod, Partition, Side};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

pub struct BisectionPartitioningConfig {
    /// The seed for the random number generator.
    pub rng_seed: u64,
    /// What initial partitioning method to use.
    pub initial_partitioning: InitialPartitioningMethod,
    /// The maximum amount of Kernighan-Lin passes. A single pass and running until convergence
    /// can end in different partitions, so there is no default.
    pub max_iterations: u32,
}

impl BisectionPartitioningConfig {
    pub fn new(max_iterations: u32) -> Self {
        Self {
            rng_seed: 1234,
            initial_partitioning: InitialPartitioningMethod::Modulo,
            max_iterations,
        }
    }
}

impl Graph {
    /// Splits the graph into two parts of size ⌈n/2⌉ and ⌊n/2⌋ while minimizing the edge cut cost.
    pub fn partition_bisection(&self, config: &BisectionPartitioningConfig) -> Partition {
        let mut rng = StdRng::seed_from_u64(config.rng_seed);
        let assignment = self.partition_initial(config.initial_partitioning, &mut rng);
        self.refine_bisection(assignment, config.max_iterations)
    }

    /// Runs Kernighan-Lin passes on the given assignment until a pass brings no improvement or
    /// `max_iterations` passes have been made. Side sizes never change.
    pub fn refine_bisection(&self, mut assignment: Vec<Side>, max_iterations: u32) -> Partition {
        debug_assert_eq!(assignment.len(), self.vertex_count());
        log::trace!("initial edge cut: {}", self.calculate_edge_cut(&assignment));

        for iteration in 0..max_iterations {
            let improvement = self.kernighan_lin_pass(&mut assignment);
            log::trace!(
                "iteration: {iteration}, improvement: {improvement}, edge cut: {}",
                self.calculate_edge_cut(&assignment)
            );
            if improvement == 0 {
                break;
            }
        }

        let partition = Partition::from_assignment(&assignment);
        log::debug!(
            "bisection sizes: {:?}, edge cut: {}",
            partition.sizes(),
            self.calculate_edge_cut(&assignment)
        );
        partition
    }

    /// Gain of moving `vx` to the other side: external minus internal edge weight.
    fn node_gain(&self, vx: u32, assignment: &[Side]) -> i64 {
        let own = assignment[vx as usize];
        self.get_degree(vx, own.other(), assignment) as i64
            - self.get_degree(vx, own, assignment) as i64
    }

    /// One Kernighan-Lin pass. Swaps are made tentatively until one side runs out of unlocked
    /// vertices, then only the prefix with the highest cumulative gain is committed. The empty
    /// prefix counts, so a pass never makes the cut worse. Returns the committed gain.
    fn kernighan_lin_pass(&self, assignment: &mut [Side]) -> i64 {
        let mut pass = PassState::new(self, assignment.to_vec());

        let mut swaps = Vec::new();
        let mut cumulative = 0;
        let mut best_gain = 0;
        let mut best_len = 0;

        while let Some((gain, va, vb)) = pass.best_swap(self) {
            pass.locked[va as usize] = true;
            pass.locked[vb as usize] = true;
            pass.move_vertex(self, va);
            pass.move_vertex(self, vb);

            swaps.push((va, vb));
            cumulative += gain;
            if cumulative > best_gain {
                best_gain = cumulative;
                best_len = swaps.len();
            }
        }

        for &(va, vb) in swaps[..best_len].iter() {
            assignment[va as usize] = Side::P1;
            assignment[vb as usize] = Side::P0;
        }
        best_gain
    }
}

type GainQueue = BinaryHeap<(i64, Reverse<u32>)>;

/// Tentative assignment, gains and locks of a single pass.
///
/// Each side keeps a max-heap of `(gain, vertex)` entries. Entries are never removed when a gain
/// changes; a fresh entry is pushed instead and stale ones are skipped when popped.
struct PassState {
    assignment: Vec<Side>,
    gains: Vec<i64>,
    locked: Vec<bool>,
    queues: [GainQueue; 2],
}

impl PassState {
    fn new(graph: &Graph, assignment: Vec<Side>) -> Self {
        let gains: Vec<i64> = (0..graph.vertex_count() as u32)
            .map(|vx| graph.node_gain(vx, &assignment))
            .collect();

        let mut entries = [Vec::new(), Vec::new()];
        for (vx, side) in assignment.iter().enumerate() {
            entries[side.index()].push((gains[vx], Reverse(vx as u32)));
        }
        let [left, right] = entries;

        Self {
            locked: vec![false; assignment.len()],
            assignment,
            gains,
            queues: [BinaryHeap::from(left), BinaryHeap::from(right)],
        }
    }

    fn push(&mut self, vx: u32) {
        let side = self.assignment[vx as usize];
        self.queues[side.index()].push((self.gains[vx as usize], Reverse(vx)));
    }

    /// Moves `vx` to the other side and updates the gains of `vx` and its neighbours.
    fn move_vertex(&mut self, graph: &Graph, vx: u32) {
        let old = self.assignment[vx as usize];
        for e in graph.neighbours(vx).iter() {
            let w = 2 * e.weight as i64;
            if self.assignment[e.dst as usize] == old {
                self.gains[e.dst as usize] += w;
            } else {
                self.gains[e.dst as usize] -= w;
            }
            if !self.locked[e.dst as usize] {
                self.push(e.dst);
            }
        }
        self.gains[vx as usize] = -self.gains[vx as usize];
        self.assignment[vx as usize] = old.other();
        if !self.locked[vx as usize] {
            self.push(vx);
        }
    }

    /// Pops the unlocked vertex of `side` with the highest gain, ties by ascending id.
    fn pop_candidate(&mut self, side: Side) -> Option<u32> {
        let queue = &mut self.queues[side.index()];
        while let Some(entry) = queue.pop() {
            let (gain, Reverse(vx)) = entry;
            let current = !self.locked[vx as usize]
                && self.assignment[vx as usize] == side
                && self.gains[vx as usize] == gain;
            if !current {
                continue;
            }
            // Equal entries sit next to each other at the top.
            while queue.peek() == Some(&entry) {
                queue.pop();
            }
            return Some(vx);
        }
        None
    }

    /// Picks the unlocked pair with the highest swap gain. Since the swap gain never exceeds
    /// `gain(a) + gain(b)`, candidates are taken off the queues in gain order only until that
    /// bound cannot beat the best pair found so far. Every candidate taken is pushed back.
    fn best_swap(&mut self, graph: &Graph) -> Option<(i64, u32, u32)> {
        let mut left = Vec::new();
        let mut right = Vec::new();
        let best = self.scan_pairs(graph, &mut left, &mut right);

        for vx in left.into_iter().chain(right) {
            self.push(vx);
        }
        best
    }

    fn scan_pairs(
        &mut self,
        graph: &Graph,
        left: &mut Vec<u32>,
        right: &mut Vec<u32>,
    ) -> Option<(i64, u32, u32)> {
        let first_right = self.pop_candidate(Side::P1)?;
        right.push(first_right);
        let top_right = self.gains[first_right as usize];

        let mut best: Option<(i64, u32, u32)> = None;
        while let Some(va) = self.pop_candidate(Side::P0) {
            left.push(va);
            let ga = self.gains[va as usize];
            if matches!(best, Some((g, _, _)) if ga + top_right <= g) {
                break;
            }

            let mut next = 0;
            loop {
                if next == right.len() {
                    match self.pop_candidate(Side::P1) {
                        Some(vb) => right.push(vb),
                        None => break,
                    }
                }
                let vb = right[next];
                next += 1;

                let bound = ga + self.gains[vb as usize];
                if matches!(best, Some((g, _, _)) if bound <= g) {
                    break;
                }
                let gain = bound - 2 * graph.weight_between(va, vb) as i64;
                if best.map_or(true, |(g, _, _)| gain > g) {
                    best = Some((gain, va, vb));
                }
            }
        }
        best
    }
}
