// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Genetic/evolutionary search: a µ(+,)λ loop over representation vectors,
//! with a Pareto hall-of-fame tracked across generations. Fitness is a tuple
//! of objectives, each minimized (weighted −1 in the original's DEAP-style
//! fitness, which this crate drops in favor of a plain ordered `Vec<f64>`).

use crate::domain::kpn::KpnGraph;
use crate::domain::mapping::Mapping;
use crate::domain::platform::Platform;
use super::common::mutate_via_ball;
use crate::errors::SearchError;
use crate::generators::RandomMapper;
use crate::observability::messages::{engine::GenerationSummary, engine::SearchStarted, StructuredLog};
use crate::oracle::{SimulationManager, SimulationResult};
use crate::representation::Representation;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;

/// Which cost signals count toward fitness, and in what order. Resource
/// objectives name a processor kind (e.g. "cpu") whose used-core count is
/// minimized.
pub struct Objectives {
    pub exec_time: bool,
    pub static_energy: bool,
    pub dynamic_energy: bool,
    pub resource_kinds: Vec<String>,
}

impl Objectives {
    fn fitness(&self, result: &SimulationResult) -> Vec<f64> {
        let mut fitness = Vec::new();
        if self.exec_time {
            fitness.push(result.exec_time as f64);
        }
        if self.static_energy {
            fitness.push(result.static_energy);
        }
        if self.dynamic_energy {
            fitness.push(result.dynamic_energy);
        }
        for kind in &self.resource_kinds {
            fitness.push(*result.resources.get(kind).unwrap_or(&0) as f64);
        }
        fitness
    }
}

#[derive(Clone)]
struct Individual {
    vector: Vec<i64>,
    fitness: Vec<f64>,
}

fn dominates(a: &[f64], b: &[f64]) -> bool {
    let mut strictly_better = false;
    for (x, y) in a.iter().zip(b.iter()) {
        if x > y {
            return false;
        }
        if x < y {
            strictly_better = true;
        }
    }
    strictly_better
}

fn pareto_front(individuals: &[Individual]) -> Vec<Individual> {
    individuals
        .iter()
        .filter(|candidate| !individuals.iter().any(|other| dominates(&other.fitness, &candidate.fitness)))
        .cloned()
        .collect()
}

/// Merges a new generation's individuals into a running Pareto hall of fame.
fn merge_hall_of_fame(hall: &mut Vec<Individual>, generation: &[Individual]) {
    hall.extend(generation.iter().cloned());
    *hall = pareto_front(hall);
}

pub struct Config {
    pub mu: usize,
    pub generations: usize,
    pub cxpb: f64,
    pub mutpb: f64,
    pub tournsize: usize,
    pub crossover_rate: usize,
    pub mu_plus_lambda: bool,
    pub initial_radius: f64,
}

pub struct GeneticResult {
    pub hall_of_fame: Vec<(Mapping, SimulationResult)>,
    /// One row per generation: `(generation, best_fitness, hall_of_fame_size)`.
    pub logbook: Vec<(usize, f64, usize)>,
}

pub async fn search(
    platform: &Arc<Platform>,
    kpn: &Arc<KpnGraph>,
    representation: &dyn Representation,
    manager: &SimulationManager,
    objectives: &Objectives,
    config: &Config,
    rng: &mut StdRng,
) -> Result<GeneticResult, SearchError> {
    SearchStarted { strategy: "genetic", process_count: kpn.processes.len(), processor_count: platform.processors.len() }.log();

    let mapper = if objectives.resource_kinds.is_empty() { RandomMapper::new() } else { RandomMapper::resource_first() };
    let mut initial_vectors = Vec::with_capacity(config.mu);
    for _ in 0..config.mu {
        let mapping = mapper.generate(platform, kpn, rng)?;
        initial_vectors.push(representation.to_vector(&mapping)?);
    }
    let mut population = evaluate(manager, representation, objectives, initial_vectors).await?;

    let mut hall_of_fame = pareto_front(&population);
    let mut logbook = Vec::with_capacity(config.generations);

    for generation in 0..config.generations {
        let lambda = config.mu * 3;
        let mut offspring_vectors = Vec::with_capacity(lambda);
        while offspring_vectors.len() < lambda {
            let parent_a = tournament_select(&population, config.tournsize, rng);
            let parent_b = tournament_select(&population, config.tournsize, rng);
            let (mut child_a, mut child_b) = if rng.gen::<f64>() < config.cxpb {
                representation.crossover(&parent_a.vector, &parent_b.vector, config.crossover_rate, rng)
            } else {
                (parent_a.vector.clone(), parent_b.vector.clone())
            };

            if rng.gen::<f64>() < config.mutpb {
                child_a = mutate_via_ball(representation, &child_a, config.initial_radius, rng)?;
            }
            if rng.gen::<f64>() < config.mutpb {
                child_b = mutate_via_ball(representation, &child_b, config.initial_radius, rng)?;
            }

            offspring_vectors.push(child_a);
            if offspring_vectors.len() < lambda {
                offspring_vectors.push(child_b);
            }
        }

        let offspring = evaluate(manager, representation, objectives, offspring_vectors).await?;

        population = if config.mu_plus_lambda {
            select_best(population.into_iter().chain(offspring.clone()).collect(), config.mu)
        } else {
            select_best(offspring.clone(), config.mu)
        };

        merge_hall_of_fame(&mut hall_of_fame, &offspring);

        let best_fitness = population.iter().map(|i| i.fitness.first().copied().unwrap_or(0.0)).fold(f64::INFINITY, f64::min);
        GenerationSummary { generation, best_fitness, hall_of_fame_size: hall_of_fame.len() }.log();
        logbook.push((generation, best_fitness, hall_of_fame.len()));
    }

    let mut decoded = Vec::with_capacity(hall_of_fame.len());
    for individual in &hall_of_fame {
        let mapping = representation.from_vector(&individual.vector)?;
        let result = SimulationResult {
            exec_time: individual.fitness.first().copied().unwrap_or(0.0) as u64,
            static_energy: 0.0,
            dynamic_energy: 0.0,
            resources: mapping.to_resource_dict(),
        };
        decoded.push((mapping, result));
    }

    Ok(GeneticResult { hall_of_fame: decoded, logbook })
}

async fn evaluate(
    manager: &SimulationManager,
    representation: &dyn Representation,
    objectives: &Objectives,
    vectors: Vec<Vec<i64>>,
) -> Result<Vec<Individual>, SearchError> {
    let results = manager.simulate(representation, &vectors).await?;
    Ok(vectors
        .into_iter()
        .zip(results)
        .map(|(vector, result)| Individual { fitness: objectives.fitness(&result), vector })
        .collect())
}

fn tournament_select<'a>(population: &'a [Individual], tournsize: usize, rng: &mut StdRng) -> &'a Individual {
    population
        .choose_multiple(rng, tournsize.min(population.len()))
        .min_by(|a, b| a.fitness.partial_cmp(&b.fitness).unwrap_or(std::cmp::Ordering::Equal))
        .expect("population is non-empty")
}

fn select_best(individuals: Vec<Individual>, mu: usize) -> Vec<Individual> {
    let ranks: Vec<usize> = individuals
        .iter()
        .map(|a| individuals.iter().filter(|o| dominates(&o.fitness, &a.fitness)).count())
        .collect();
    let mut ranked: Vec<(usize, Individual)> = ranks.into_iter().zip(individuals).collect();
    ranked.sort_by(|(rank_a, a), (rank_b, b)| {
        rank_a.cmp(rank_b).then_with(|| a.fitness.partial_cmp(&b.fitness).unwrap_or(std::cmp::Ordering::Equal))
    });
    ranked.truncate(mu);
    ranked.into_iter().map(|(_, individual)| individual).collect()
}
