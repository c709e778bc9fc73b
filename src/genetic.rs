use crate::{Error, Fitness, Graph, Partition, Result, Side};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct GeneticPartitioningConfig {
    /// The seed for the random number generator.
    pub rng_seed: u64,
    /// Number of populations evolving side by side.
    pub islands: usize,
    /// Individuals per island. Children are bred in pairs, so this has to be even.
    pub population_size: usize,
    pub generations: usize,
    /// Chance that a pair of parents is crossed over instead of copied.
    pub crossover_probability: f64,
    /// Per-node chance of a child switching sides.
    pub mutation_probability: f64,
    /// Per-node chance that a crossover exchanges the parents' genes.
    pub uniform_crossover_bias: f64,
    pub tournament_size: usize,
    /// Generations between two migrations.
    pub migration_period: usize,
    /// Best individuals of each island copied over the worst of another at every migration.
    pub migrants: usize,
}

impl Default for GeneticPartitioningConfig {
    fn default() -> Self {
        Self {
            rng_seed: 1234,
            islands: 5,
            population_size: 100,
            generations: 100,
            crossover_probability: 0.7,
            mutation_probability: 0.001,
            uniform_crossover_bias: 0.5,
            tournament_size: 3,
            migration_period: 10,
            migrants: 5,
        }
    }
}

impl GeneticPartitioningConfig {
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(Error::InvalidConfig(reason));
        if self.islands == 0 {
            return invalid("at least one island is required".to_owned());
        }
        if self.population_size < 2 || self.population_size % 2 != 0 {
            return invalid(format!(
                "population size must be even and at least 2, got {}",
                self.population_size
            ));
        }
        if self.tournament_size == 0 {
            return invalid("tournament size must be at least 1".to_owned());
        }
        if self.migration_period == 0 {
            return invalid("migration period must be at least 1".to_owned());
        }
        if self.migrants > self.population_size / 2 {
            return invalid(format!(
                "at most half of a population ({}) can migrate, got {}",
                self.population_size / 2,
                self.migrants
            ));
        }
        for (name, p) in [
            ("crossover probability", self.crossover_probability),
            ("mutation probability", self.mutation_probability),
            ("uniform crossover bias", self.uniform_crossover_bias),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return invalid(format!("{name} must lie in [0, 1], got {p}"));
            }
        }
        Ok(())
    }
}

/// Result of [`Graph::partition_genetic`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneticOutcome {
    /// The fittest individual seen in any generation.
    pub partition: Partition,
    pub fitness: Fitness,
    /// Best fitness seen up to and including each generation.
    pub best_per_generation: Vec<Fitness>,
}

#[derive(Clone, Debug)]
struct Specimen {
    genes: Vec<Side>,
    fitness: Fitness,
}

impl Graph {
    /// Evolves random bisections on isolated islands that periodically exchange their best
    /// individuals. Sides are not forced to equal size; the balance term of the fitness pushes
    /// the population towards them.
    pub fn partition_genetic(&self, config: &GeneticPartitioningConfig) -> Result<GeneticOutcome> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.rng_seed);

        let mut archipelago = (0..config.islands)
            .map(|_| {
                (0..config.population_size)
                    .map(|_| self.random_specimen(&mut rng))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        let mut best = fittest(&archipelago).clone();
        let mut best_per_generation = Vec::with_capacity(config.generations);
        let mut migration_count = 1;

        for generation in 0..config.generations {
            if generation > 0 && generation % config.migration_period == 0 && config.islands > 1 {
                migrate(&mut archipelago, config.migrants, migration_count);
                migration_count = migration_count % (config.islands - 1) + 1;

                if log::log_enabled!(log::Level::Debug) {
                    let diversity: Vec<String> = archipelago
                        .iter()
                        .map(|island| format!("{:.2}", population_diversity(island)))
                        .collect();
                    log::debug!(
                        "generation: {generation}, diversity per island: {}",
                        diversity.join(", ")
                    );
                }
            }

            for island in archipelago.iter_mut() {
                *island = self.breed(island, config, &mut rng)?;
            }

            let candidate = fittest(&archipelago);
            if candidate.fitness.value() < best.fitness.value() {
                best = candidate.clone();
            }
            best_per_generation.push(best.fitness);
            log::trace!("generation: {generation}, best fitness: {}", best.fitness);
        }

        log::debug!(
            "genetic bisection fitness: {}, sizes: {:?}",
            best.fitness,
            Partition::from_assignment(&best.genes).sizes()
        );
        Ok(GeneticOutcome {
            partition: Partition::from_assignment(&best.genes),
            fitness: best.fitness,
            best_per_generation,
        })
    }

    fn score(&self, genes: Vec<Side>) -> Result<Specimen> {
        let fitness = self.evaluate_fitness(&Partition::from_assignment(&genes))?;
        Ok(Specimen { genes, fitness })
    }

    fn random_specimen(&self, rng: &mut impl Rng) -> Result<Specimen> {
        let genes = (0..self.vertex_count())
            .map(|_| if rng.gen() { Side::P1 } else { Side::P0 })
            .collect();
        self.score(genes)
    }

    /// Replaces a whole island by children of tournament-selected parents.
    fn breed(
        &self,
        population: &[Specimen],
        config: &GeneticPartitioningConfig,
        rng: &mut impl Rng,
    ) -> Result<Vec<Specimen>> {
        let mut children = Vec::with_capacity(population.len());
        while children.len() < population.len() {
            let first = tournament_selection(population, config.tournament_size, None, rng);
            let second =
                tournament_selection(population, config.tournament_size, Some(first), rng);

            let (mut a, mut b) = uniform_crossover(
                &population[first].genes,
                &population[second].genes,
                config.crossover_probability,
                config.uniform_crossover_bias,
                rng,
            );
            mutate(&mut a, config.mutation_probability, rng);
            mutate(&mut b, config.mutation_probability, rng);

            children.push(self.score(a)?);
            children.push(self.score(b)?);
        }
        Ok(children)
    }
}

/// First individual with the lowest fitness value across all islands.
fn fittest(archipelago: &[Vec<Specimen>]) -> &Specimen {
    let mut best = &archipelago[0][0];
    for specimen in archipelago.iter().flatten() {
        if specimen.fitness.value() < best.fitness.value() {
            best = specimen;
        }
    }
    best
}

/// Returns the index of the fittest of `tournament_size` random draws. `exclude` is never drawn.
fn tournament_selection(
    population: &[Specimen],
    tournament_size: usize,
    exclude: Option<usize>,
    rng: &mut impl Rng,
) -> usize {
    let pool = population.len() - exclude.is_some() as usize;
    let mut best_specimen: Option<usize> = None;

    for _ in 0..tournament_size {
        let mut current = rng.gen_range(0..pool);
        if matches!(exclude, Some(skip) if current >= skip) {
            current += 1;
        }
        if let Some(best) = best_specimen {
            if population[best].fitness.value() <= population[current].fitness.value() {
                continue;
            }
        }
        best_specimen = Some(current);
    }

    best_specimen.unwrap_or(0)
}

/// With probability `crossover_probability` every node is exchanged between the two children
/// with probability `bias`. Otherwise the children are copies of their parents.
fn uniform_crossover(
    first: &[Side],
    second: &[Side],
    crossover_probability: f64,
    bias: f64,
    rng: &mut impl Rng,
) -> (Vec<Side>, Vec<Side>) {
    let mut a = first.to_vec();
    let mut b = second.to_vec();
    if rng.gen_bool(crossover_probability) {
        for (x, y) in a.iter_mut().zip(b.iter_mut()) {
            if rng.gen_bool(bias) {
                std::mem::swap(x, y);
            }
        }
    }
    (a, b)
}

fn mutate(genes: &mut [Side], mutation_probability: f64, rng: &mut impl Rng) {
    for gene in genes.iter_mut() {
        if rng.gen_bool(mutation_probability) {
            *gene = gene.other();
        }
    }
}

/// Copies the `migrants` fittest individuals of island `i` over the worst individuals of island
/// `(i + migration_count) % islands`. Emigrants are chosen before any island is changed.
fn migrate(archipelago: &mut [Vec<Specimen>], migrants: usize, migration_count: usize) {
    let islands = archipelago.len();
    let ranked: Vec<Vec<usize>> = archipelago
        .iter()
        .map(|island| {
            let mut order: Vec<usize> = (0..island.len()).collect();
            order.sort_by_key(|&idv| island[idv].fitness.value());
            order
        })
        .collect();

    let emigrants: Vec<Vec<Specimen>> = archipelago
        .iter()
        .zip(ranked.iter())
        .map(|(island, order)| order[..migrants].iter().map(|&idv| island[idv].clone()).collect())
        .collect();

    for (sender, group) in emigrants.into_iter().enumerate() {
        let recipient = (sender + migration_count) % islands;
        let worst = ranked[recipient].iter().rev();
        for (specimen, &slot) in group.into_iter().zip(worst) {
            archipelago[recipient][slot] = specimen;
        }
    }
}

/// Mean fraction of nodes on which two distinct individuals disagree.
fn population_diversity(population: &[Specimen]) -> f64 {
    let n = population.first().map_or(0, |s| s.genes.len());
    if population.len() < 2 || n == 0 {
        return 0.0;
    }

    let mut total = 0.0;
    for (i, a) in population.iter().enumerate() {
        for b in population[i + 1..].iter() {
            let distance = a.genes.iter().zip(b.genes.iter()).filter(|(x, y)| x != y).count();
            total += distance as f64 / n as f64;
        }
    }
    let pairs = population.len() * (population.len() - 1) / 2;
    total / pairs as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Edge;

    fn graph(n: usize, edges: &[(u32, u32)]) -> Graph {
        Graph::from_edges(n, edges.iter().map(|&(a, b)| Edge::new(a, b)).collect()).unwrap()
    }

    /// Two triangles joined by the single edge 2-3.
    fn barbell() -> Graph {
        graph(6, &[(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5), (2, 3)])
    }

    fn small_config() -> GeneticPartitioningConfig {
        GeneticPartitioningConfig {
            islands: 3,
            population_size: 20,
            generations: 30,
            migration_period: 5,
            migrants: 2,
            mutation_probability: 0.02,
            ..GeneticPartitioningConfig::default()
        }
    }

    fn specimen(graph: &Graph, bits: &[u8]) -> Specimen {
        let genes = bits
            .iter()
            .map(|&bit| if bit == 0 { Side::P0 } else { Side::P1 })
            .collect();
        graph.score(genes).unwrap()
    }

    #[test]
    fn same_seed_same_outcome() {
        let mut rng = StdRng::seed_from_u64(5);
        let edges: Vec<(u32, u32)> = (0..60)
            .map(|_| (rng.gen_range(0..24), rng.gen_range(0..24)))
            .filter(|(a, b)| a != b)
            .collect();
        let graph = graph(24, &edges);
        let config = small_config();

        assert_eq!(
            graph.partition_genetic(&config).unwrap(),
            graph.partition_genetic(&config).unwrap()
        );
    }

    #[test]
    fn best_fitness_never_increases() {
        let graph = graph(16, &(0..16).map(|vx| (vx, (vx + 1) % 16)).collect::<Vec<_>>());
        let config = small_config();
        let outcome = graph.partition_genetic(&config).unwrap();

        assert_eq!(outcome.best_per_generation.len(), config.generations);
        for pair in outcome.best_per_generation.windows(2) {
            assert!(pair[1].value() <= pair[0].value(), "{} -> {}", pair[0], pair[1]);
        }
        assert_eq!(outcome.best_per_generation.last(), Some(&outcome.fitness));
        assert_eq!(graph.evaluate_fitness(&outcome.partition).unwrap(), outcome.fitness);
    }

    #[test]
    fn separates_the_barbell() {
        let outcome = barbell()
            .partition_genetic(&GeneticPartitioningConfig {
                generations: 20,
                ..GeneticPartitioningConfig::default()
            })
            .unwrap();
        assert_eq!(outcome.fitness.value(), 1);
        assert_eq!(outcome.partition.sizes(), (3, 3));
    }

    #[test]
    fn single_island_and_zero_generations() {
        let graph = barbell();
        let outcome = graph
            .partition_genetic(&GeneticPartitioningConfig {
                islands: 1,
                ..small_config()
            })
            .unwrap();
        assert_eq!(outcome.best_per_generation.len(), 30);

        let outcome = graph
            .partition_genetic(&GeneticPartitioningConfig {
                generations: 0,
                ..small_config()
            })
            .unwrap();
        assert!(outcome.best_per_generation.is_empty());
        assert_eq!(graph.evaluate_fitness(&outcome.partition).unwrap(), outcome.fitness);
    }

    #[test]
    fn rejects_invalid_configs() {
        let graph = barbell();
        for config in [
            GeneticPartitioningConfig { islands: 0, ..small_config() },
            GeneticPartitioningConfig { population_size: 0, ..small_config() },
            GeneticPartitioningConfig { population_size: 7, ..small_config() },
            GeneticPartitioningConfig { tournament_size: 0, ..small_config() },
            GeneticPartitioningConfig { migration_period: 0, ..small_config() },
            GeneticPartitioningConfig { migrants: 11, ..small_config() },
            GeneticPartitioningConfig { crossover_probability: 1.5, ..small_config() },
            GeneticPartitioningConfig { mutation_probability: -0.1, ..small_config() },
            GeneticPartitioningConfig { uniform_crossover_bias: f64::NAN, ..small_config() },
        ] {
            let err = graph.partition_genetic(&config).unwrap_err();
            assert!(matches!(err, Error::InvalidConfig(_)), "{err}");
        }
        assert!(GeneticPartitioningConfig::default().validate().is_ok());
    }

    #[test]
    fn crossover_and_mutation_extremes() {
        let mut rng = StdRng::seed_from_u64(0);
        let zeros = vec![Side::P0; 8];
        let ones = vec![Side::P1; 8];

        let (a, b) = uniform_crossover(&zeros, &ones, 0.0, 0.5, &mut rng);
        assert_eq!((a.as_slice(), b.as_slice()), (zeros.as_slice(), ones.as_slice()));

        let (a, b) = uniform_crossover(&zeros, &ones, 1.0, 1.0, &mut rng);
        assert_eq!((a.as_slice(), b.as_slice()), (ones.as_slice(), zeros.as_slice()));

        let (a, b) = uniform_crossover(&zeros, &ones, 1.0, 0.5, &mut rng);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_ne!(x, y);
        }

        let mut genes = zeros.clone();
        mutate(&mut genes, 1.0, &mut rng);
        assert_eq!(genes, ones);
        mutate(&mut genes, 0.0, &mut rng);
        assert_eq!(genes, ones);
    }

    #[test]
    fn tournament_prefers_fitter_and_skips_excluded() {
        let graph = barbell();
        let population = vec![
            specimen(&graph, &[0, 1, 0, 1, 0, 1]),
            specimen(&graph, &[0, 0, 0, 1, 1, 1]),
            specimen(&graph, &[0, 0, 0, 0, 0, 0]),
        ];
        let mut rng = StdRng::seed_from_u64(9);

        for _ in 0..50 {
            assert_eq!(tournament_selection(&population, 64, None, &mut rng), 1);
            assert_ne!(tournament_selection(&population, 64, Some(1), &mut rng), 1);
        }
    }

    #[test]
    fn migration_replaces_the_worst_of_the_next_island() {
        let graph = barbell();
        let good = specimen(&graph, &[0, 0, 0, 1, 1, 1]);
        let bad = specimen(&graph, &[0, 0, 0, 0, 0, 0]);
        let middling = specimen(&graph, &[0, 1, 0, 1, 0, 1]);

        let mut archipelago = vec![
            vec![good.clone(), middling.clone()],
            vec![middling.clone(), bad.clone()],
            vec![bad.clone(), bad.clone()],
        ];
        migrate(&mut archipelago, 1, 1);

        // 0 -> 1, 1 -> 2, 2 -> 0
        assert_eq!(archipelago[1][1].genes, good.genes);
        assert_eq!(archipelago[1][0].genes, middling.genes);
        assert_eq!(archipelago[2][1].genes, middling.genes);
        assert_eq!(archipelago[2][0].genes, bad.genes);
        assert_eq!(archipelago[0][0].genes, good.genes);
        assert_eq!(archipelago[0][1].genes, bad.genes);
    }

    #[test]
    fn diversity_ranges_from_clones_to_complements() {
        let graph = barbell();
        let a = specimen(&graph, &[0, 0, 0, 1, 1, 1]);
        let b = specimen(&graph, &[1, 1, 1, 0, 0, 0]);

        assert_eq!(population_diversity(&[a.clone(), a.clone()]), 0.0);
        assert_eq!(population_diversity(&[a.clone(), b.clone()]), 1.0);
        assert!((population_diversity(&[a.clone(), a, b]) - 2.0 / 3.0).abs() < 1e-9);
    }
}
