// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The one concrete simulator backend this crate ships: one that reports a
//! mapping's cost from its trace graph's critical path, without needing an
//! external discrete-event simulator.

use super::{SimulationResult, SimulatorBackend};
use crate::domain::kpn::KpnGraph;
use crate::domain::mapping::Mapping;
use crate::domain::platform::Platform;
use crate::domain::trace::TraceGenerator;
use crate::errors::OracleError;
use crate::tracegraph::{self, SlowestPolicy};
use std::sync::Arc;

/// Builds a fresh [`TraceGenerator`] for each simulation. A factory rather
/// than a shared generator instance, since a generator is stateful and a
/// mapping may be simulated concurrently with itself under a different
/// candidate vector.
pub type TraceFactory = Box<dyn Fn() -> Box<dyn TraceGenerator + Send> + Send + Sync>;

pub struct TraceGraphBackend {
    kpn: Arc<KpnGraph>,
    platform: Arc<Platform>,
    trace_factory: TraceFactory,
    policy: SlowestPolicy,
}

impl TraceGraphBackend {
    pub fn new(kpn: Arc<KpnGraph>, platform: Arc<Platform>, trace_factory: TraceFactory, policy: SlowestPolicy) -> Self {
        Self { kpn, platform, trace_factory, policy }
    }

    fn energy(&self, mapping: &Mapping, exec_time_ps: u64) -> (f64, f64) {
        let exec_time_seconds = exec_time_ps as f64 / 1e12;
        let mut static_energy = 0.0;
        let mut dynamic_energy = 0.0;
        let mut seen = std::collections::HashSet::new();

        for process in &self.kpn.processes {
            let Some(processor_name) = mapping.affinity(&process.name) else { continue };
            if !seen.insert(processor_name.to_string()) {
                continue;
            }
            let Some(processor) = self.platform.processor(processor_name) else { continue };
            let Some(power_model) = &processor.power_model else { continue };
            static_energy += power_model.static_power_w * exec_time_seconds;
            let cycles = processor.frequency_domain.frequency_hz * exec_time_seconds;
            dynamic_energy += power_model.dynamic_energy_per_cycle_j * cycles;
        }

        (static_energy, dynamic_energy)
    }
}

impl SimulatorBackend for TraceGraphBackend {
    fn simulate_one(&self, mapping: &Mapping) -> Result<SimulationResult, OracleError> {
        mapping.validate()?;

        let process_groups = mapping.process_groups();
        let channel_groups = mapping.channel_groups();
        let mut generator = (self.trace_factory)();

        let mut graph = tracegraph::build(
            &self.kpn,
            generator.as_mut(),
            &process_groups,
            &channel_groups,
            &self.platform,
            self.policy,
        )?;
        let (_, exec_time, _) = graph.critical_path();
        let exec_time = exec_time.max(0) as u64;

        let (static_energy, dynamic_energy) = self.energy(mapping, exec_time);

        Ok(SimulationResult {
            exec_time,
            static_energy,
            dynamic_energy,
            resources: mapping.to_resource_dict(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::kpn::Process;
    use crate::domain::mapping::ProcessMappingInfo;
    use crate::domain::platform::{FrequencyDomain, PowerModel, Processor, Scheduler};
    use crate::domain::trace::StaticTraceGenerator;
    use crate::domain::trace::TraceSegment;
    use std::collections::HashMap;

    #[test]
    fn reports_exec_time_and_energy_for_a_single_process() {
        let processor = Processor {
            name: "p0".into(),
            kind: "cpu".into(),
            frequency_domain: FrequencyDomain { name: "fd0".into(), frequency_hz: 1e9 },
            power_model: Some(PowerModel { static_power_w: 0.1, dynamic_energy_per_cycle_j: 1e-9 }),
            context_load_cycles: 0,
            context_store_cycles: 0,
        };
        let platform = Arc::new(Platform {
            processors: vec![processor],
            processor_groups: HashMap::from([(0, vec!["p0".to_string()])]),
            schedulers: vec![Scheduler { name: "s".into(), policy: "fifo".into(), processors: vec!["p0".into()] }],
            primitives: vec![],
            primitive_groups: HashMap::new(),
        });
        let kpn = Arc::new(KpnGraph { name: "k".into(), processes: vec![Process { name: "a".into() }], channels: vec![] });

        let mut mapping = Mapping::new(platform.clone(), kpn.clone());
        mapping.set_process("a", ProcessMappingInfo { scheduler: "s".into(), processor: "p0".into(), priority: 0 });

        let mut scripts = HashMap::new();
        scripts.insert("a".to_string(), vec![TraceSegment::Compute { cycles: 1_000_000_000 }]);
        let factory: TraceFactory = Box::new(move || Box::new(StaticTraceGenerator::new(scripts.clone())));

        let backend = TraceGraphBackend::new(kpn, platform, factory, SlowestPolicy::MaxGroupId);
        let result = backend.simulate_one(&mapping).unwrap();

        assert_eq!(result.exec_time, 1_000_000_000_000);
        assert!(result.static_energy > 0.0);
        assert!(result.dynamic_energy > 0.0);
        assert_eq!(result.resources.get("cpu"), Some(&1));
    }
}
