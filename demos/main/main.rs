use anyhow::{Context, Result};
use edgelist_bisect::{
    convert_raw_file, BisectionPartitioningConfig, GeneticPartitioningConfig, Graph,
    InitialPartitioningMethod,
};
use std::time;

fn main() -> Result<()> {
    env_logger::init();
    let input = std::env::args()
        .nth(1)
        .context("usage: main <edge pair file>")?;

    let out_dir = std::env::current_dir()?;
    let edgelist = convert_raw_file(&input, &out_dir)?;
    let graph = Graph::load_edgelist(&edgelist)?;

    let t1 = time::Instant::now();
    let partition = graph.partition_bisection(&BisectionPartitioningConfig {
        initial_partitioning: InitialPartitioningMethod::Bfs,
        ..BisectionPartitioningConfig::new(1)
    });
    println!("time: {}ms", t1.elapsed().as_millis());

    let fitness = graph.evaluate_fitness(&partition)?;
    let (p0, p1) = partition.sizes();
    println!("number of nodes in partition 0: {p0}");
    println!("                             1: {p1}");
    println!("total external cost: {}", fitness.cut_weight);
    println!("fitness = {fitness}");

    let t2 = time::Instant::now();
    let outcome = graph.partition_genetic(&GeneticPartitioningConfig::default())?;
    println!("genetic time: {}ms", t2.elapsed().as_millis());
    let (p0, p1) = outcome.partition.sizes();
    println!("number of nodes in partition 0: {p0}");
    println!("                             1: {p1}");
    println!("total external cost: {}", outcome.fitness.cut_weight);
    println!("fitness = {}", outcome.fitness);
    Ok(())
}
