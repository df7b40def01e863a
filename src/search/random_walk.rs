// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Random walk: the simplest search engine. Generates `N` independent random
//! mappings, evaluates all of them in one oracle batch, and returns the
//! cheapest. No adaptivity, no state carried between samples.

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

pub struct RandomWalkResult {
    pub mapping: Mapping,
    pub result: SimulationResult,
}

pub async fn search(
    platform: &Arc<Platform>,
    kpn: &Arc<KpnGraph>,
    representation: &dyn Representation,
    manager: &SimulationManager,
    samples: usize,
    rng: &mut StdRng,
) -> Result<RandomWalkResult, SearchError> {
    SearchStarted { strategy: "random_walk", process_count: kpn.processes.len(), processor_count: platform.processors.len() }.log();

    let mapper = RandomMapper::new();
    let mut vectors = Vec::with_capacity(samples);
    for _ in 0..samples {
        let mapping = mapper.generate(platform, kpn, rng)?;
        vectors.push(representation.to_vector(&mapping)?);
    }

    let results = manager.simulate(representation, &vectors).await?;

    let (best_index, best_result) = results
        .into_iter()
        .enumerate()
        .min_by_key(|(_, r)| r.exec_time)
        .expect("samples is non-zero");

    let mapping = representation.from_vector(&vectors[best_index])?;
    Ok(RandomWalkResult { mapping, result: best_result })
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
    async fn picks_the_faster_of_two_processors() {
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
        let mut rng = StdRng::seed_from_u64(7);

        let outcome = search(&platform, &kpn, &representation, &manager, 20, &mut rng).await.unwrap();
        assert_eq!(outcome.mapping.affinity("a"), Some("fast"));
    }
}
