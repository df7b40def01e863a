// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Simulated annealing over the mapping representation: a geometrically
//! cooled Metropolis walk that accepts worsening moves with probability
//! `exp(-delta / (0.5 * T_i * c0))`, terminating once `R_max` consecutive
//! rejections have occurred at or below the final temperature.

use super::common::mutate_via_ball;
use crate::domain::kpn::KpnGraph;
use crate::domain::mapping::Mapping;
use crate::domain::platform::Platform;
use crate::errors::SearchError;
use crate::generators::RandomMapper;
use crate::observability::messages::{engine::SearchStarted, StructuredLog};
use crate::oracle::{SimulationManager, SimulationResult};
use crate::representation::Representation;
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Arc;

pub struct Config {
    pub t0: f64,
    pub tf: f64,
    /// Cooling factor `p`, strictly between 0 and 1.
    pub cooling_factor: f64,
    pub initial_radius: f64,
}

pub struct AnnealingResult {
    pub mapping: Mapping,
    pub result: SimulationResult,
    pub iterations: usize,
}

pub async fn search(
    platform: &Arc<Platform>,
    kpn: &Arc<KpnGraph>,
    representation: &dyn Representation,
    manager: &SimulationManager,
    config: &Config,
    rng: &mut StdRng,
) -> Result<AnnealingResult, SearchError> {
    SearchStarted { strategy: "simulated_annealing", process_count: kpn.processes.len(), processor_count: platform.processors.len() }
        .log();

    let r_max = (kpn.processes.len() * platform.processors.len().saturating_sub(1)).max(1);

    let mapper = RandomMapper::new();
    let mut current_mapping = mapper.generate(platform, kpn, rng)?;
    let mut current_vector = representation.to_vector(&current_mapping)?;
    let mut current_result = manager.simulate(representation, std::slice::from_ref(&current_vector)).await?.remove(0);
    let c0 = current_result.exec_time.max(1) as f64;

    let mut best_mapping = current_mapping.clone();
    let mut best_result = current_result.clone();

    let mut rejections = 0usize;
    let mut iteration = 0usize;

    while rejections < r_max {
        let temperature = config.t0 * config.cooling_factor.powi((iteration / r_max) as i32);

        let candidate_vector = mutate_via_ball(representation, &current_vector, config.initial_radius, rng)?;
        let candidate_result = manager.simulate(representation, std::slice::from_ref(&candidate_vector)).await?.remove(0);

        let delta = candidate_result.exec_time as f64 - current_result.exec_time as f64;
        let accept = if delta < 0.0 {
            true
        } else {
            let probability = (-delta / (0.5 * temperature * c0)).exp();
            rng.gen::<f64>() < probability
        };

        if accept {
            current_vector = candidate_vector;
            current_result = candidate_result;
            current_mapping = representation.from_vector(&current_vector)?;
            if current_result.exec_time < best_result.exec_time {
                best_result = current_result.clone();
                best_mapping = current_mapping.clone();
            }
            rejections = 0;
        } else if temperature <= config.tf {
            rejections += 1;
        } else {
            rejections = 0;
        }

        iteration += 1;
    }

    Ok(AnnealingResult { mapping: best_mapping, result: best_result, iterations: iteration })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::kpn::Process;
    use crate::domain::platform::{FrequencyDomain, PowerModel, Processor, Scheduler};
    use crate::domain::trace::{StaticTraceGenerator, TraceSegment};
    use crate::oracle::TraceGraphBackend;
    use crate::representation::SimpleVector;
    use crate::tracegraph::SlowestPolicy;
    use rand::SeedableRng;
    use std::collections::HashMap;

    #[tokio::test]
    async fn terminates_and_finds_the_faster_processor() {
        let fast = Processor {
            name: "fast".into(),
            kind: "cpu".into(),
            frequency_domain: FrequencyDomain { name: "fd_fast".into(), frequency_hz: 2e9 },
            power_model: Some(PowerModel { static_power_w: 0.1, dynamic_energy_per_cycle_j: 1e-9 }),
            context_load_cycles: 0,
            context_store_cycles: 0,
        };
        let slow = Processor {
            name: "slow".into(),
            kind: "cpu".into(),
            frequency_domain: FrequencyDomain { name: "fd_slow".into(), frequency_hz: 1e9 },
            power_model: Some(PowerModel { static_power_w: 0.1, dynamic_energy_per_cycle_j: 1e-9 }),
            context_load_cycles: 0,
            context_store_cycles: 0,
        };
        let platform = Arc::new(Platform {
            processors: vec![fast, slow],
            processor_groups: HashMap::from([(0, vec!["fast".to_string()]), (1, vec!["slow".to_string()])]),
            schedulers: vec![Scheduler { name: "s".into(), policy: "fifo".into(), processors: vec!["fast".into(), "slow".into()] }],
            primitives: vec![],
            primitive_groups: HashMap::new(),
        });
        let kpn = Arc::new(KpnGraph { name: "k".into(), processes: vec![Process { name: "a".into() }], channels: vec![] });

        let mut scripts = HashMap::new();
        scripts.insert("a".to_string(), vec![TraceSegment::Compute { cycles: 1_000_000_000 }]);
        let factory = Box::new(move || -> Box<dyn crate::domain::trace::TraceGenerator + Send> {
            Box::new(StaticTraceGenerator::new(scripts.clone()))
        });
        let backend = Arc::new(TraceGraphBackend::new(kpn.clone(), platform.clone(), factory, SlowestPolicy::MaxGroupId));
        let manager = SimulationManager::new(backend, false, 1, 8);
        let representation = SimpleVector::new(platform.clone(), kpn.clone(), false, 2.0);
        let mut rng = StdRng::seed_from_u64(11);

        let config = Config { t0: 5.0, tf: 0.1, cooling_factor: 0.8, initial_radius: 1.0 };
        let outcome = search(&platform, &kpn, &representation, &manager, &config, &mut rng).await.unwrap();
        assert_eq!(outcome.mapping.affinity("a"), Some("fast"));
        assert!(outcome.iterations > 0);
    }
}
