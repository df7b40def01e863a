// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Discrete coordinate-wise gradient descent over the representation
//! vector. Partial derivatives are estimated by finite differences on the
//! integer lattice, one-sided at the domain boundaries `0` and
//! `|processors|-1`.

use crate::domain::kpn::KpnGraph;
use crate::domain::mapping::Mapping;
use crate::domain::platform::Platform;
use crate::errors::SearchError;
use crate::generators::RandomMapper;
use crate::observability::messages::{engine::SearchStarted, StructuredLog};
use crate::oracle::{SimulationManager, SimulationResult};
use crate::representation::Representation;
use rand::rngs::StdRng;
use std::sync::Arc;

pub struct Config {
    pub iterations: usize,
    pub stepsize: f64,
}

pub struct GradientDescentResult {
    pub mapping: Mapping,
    pub result: SimulationResult,
    pub iterations_run: usize,
}

enum Neighbor {
    Forward(usize, Vec<i64>),
    Backward(usize, Vec<i64>),
}

pub async fn search(
    platform: &Arc<Platform>,
    kpn: &Arc<KpnGraph>,
    representation: &dyn Representation,
    manager: &SimulationManager,
    config: &Config,
    rng: &mut StdRng,
) -> Result<GradientDescentResult, SearchError> {
    SearchStarted { strategy: "gradient_descent", process_count: kpn.processes.len(), processor_count: platform.processors.len() }
        .log();

    let bounds = representation.slot_bounds();
    let mapper = RandomMapper::new();
    let mut vector = representation.to_vector(&mapper.generate(platform, kpn, rng)?)?;

    let base = manager.simulate(representation, std::slice::from_ref(&vector)).await?.remove(0);
    let mut best_so_far = base.exec_time.max(1) as f64;
    let mut best_vector = vector.clone();
    let mut best_result = base.clone();

    let mut iterations_run = 0;

    for _ in 0..config.iterations {
        let mut neighbors = Vec::new();
        for (i, &bound) in bounds.iter().enumerate() {
            if bound == 0 {
                continue;
            }
            if vector[i] > 0 {
                let mut backward = vector.clone();
                backward[i] -= 1;
                neighbors.push(Neighbor::Backward(i, backward));
            }
            if (vector[i] as usize) < bound {
                let mut forward = vector.clone();
                forward[i] += 1;
                neighbors.push(Neighbor::Forward(i, forward));
            }
        }

        if neighbors.is_empty() {
            break;
        }

        let mut batch = vec![vector.clone()];
        batch.extend(neighbors.iter().map(|n| match n {
            Neighbor::Forward(_, v) | Neighbor::Backward(_, v) => v.clone(),
        }));
        let results = manager.simulate(representation, &batch).await?;
        let f0 = results[0].exec_time as f64;

        let mut forward_cost = vec![None; bounds.len()];
        let mut backward_cost = vec![None; bounds.len()];
        for (neighbor, result) in neighbors.iter().zip(results.iter().skip(1)) {
            match neighbor {
                Neighbor::Forward(i, _) => forward_cost[*i] = Some(result.exec_time as f64),
                Neighbor::Backward(i, _) => backward_cost[*i] = Some(result.exec_time as f64),
            }
        }

        let mut gradient = vec![0.0; bounds.len()];
        for i in 0..bounds.len() {
            gradient[i] = match (forward_cost[i], backward_cost[i]) {
                (Some(fplus), Some(fminus)) => (fplus - fminus) / 2.0,
                (Some(fplus), None) => fplus - f0,
                (None, Some(fminus)) => f0 - fminus,
                (None, None) => 0.0,
            };
        }

        if gradient.iter().all(|g| *g == 0.0) {
            break;
        }

        let next_f: Vec<f64> = vector
            .iter()
            .zip(gradient.iter())
            .map(|(&v, &g)| v as f64 - (config.stepsize / best_so_far) * g)
            .collect();
        let next_vector = representation.approximate(&next_f);

        iterations_run += 1;
        if next_vector == vector {
            break;
        }
        vector = next_vector;

        let current = manager.simulate(representation, std::slice::from_ref(&vector)).await?.remove(0);
        if current.exec_time < best_result.exec_time {
            best_result = current.clone();
            best_vector = vector.clone();
        }
        best_so_far = best_so_far.min(current.exec_time.max(1) as f64);
    }

    let mapping = representation.from_vector(&best_vector)?;
    Ok(GradientDescentResult { mapping, result: best_result, iterations_run })
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
    async fn descends_to_the_faster_processor() {
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
        let mut rng = StdRng::seed_from_u64(3);

        let config = Config { iterations: 10, stepsize: 1.0 };
        let outcome = search(&platform, &kpn, &representation, &manager, &config, &mut rng).await.unwrap();
        assert_eq!(outcome.mapping.affinity("a"), Some("fast"));
    }
}
