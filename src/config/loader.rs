// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Loads a [`ScenarioFile`] from disk and builds the in-memory domain model
//! (`Platform`, `KpnGraph`) plus a trace specification the CLI turns into a
//! `TraceGenerator`.

use super::scenario::{ScenarioFile, SegmentConfig, TraceConfig};
use super::validation;
use crate::domain::kpn::{Channel, KpnGraph, Process};
use crate::domain::platform::{FrequencyDomain, Platform, PowerModel, Primitive, Processor, Scheduler};
use crate::domain::trace::TraceSegment;
use crate::errors::ConfigError;
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

/// Either an explicit per-process segment script, or the parameters needed
/// to build a [`crate::domain::trace::RandomTraceGenerator`].
pub enum TraceSpec {
    Static(HashMap<String, Vec<TraceSegment>>),
    Random { expected_firings: u64, min_cycles: u64, max_cycles: u64, seed: Option<u64> },
}

pub struct LoadedScenario {
    pub platform: Arc<Platform>,
    pub kpn: Arc<KpnGraph>,
    pub trace: TraceSpec,
}

pub fn load_scenario(path: &str) -> Result<LoadedScenario, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ScenarioIo { path: path.to_string(), source })?;
    let scenario: ScenarioFile =
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::ScenarioParse { path: path.to_string(), source })?;
    validation::validate(&scenario)?;
    Ok(build(scenario))
}

fn build(scenario: ScenarioFile) -> LoadedScenario {
    let processors = scenario
        .platform
        .processors
        .iter()
        .map(|p| Processor {
            name: p.id.clone(),
            kind: p.kind.clone(),
            frequency_domain: FrequencyDomain { name: format!("{}_fd", p.id), frequency_hz: p.frequency_hz },
            power_model: p.static_power_w.zip(p.dynamic_energy_per_cycle_j).map(|(s, d)| PowerModel {
                static_power_w: s,
                dynamic_energy_per_cycle_j: d,
            }),
            context_load_cycles: p.context_load_cycles,
            context_store_cycles: p.context_store_cycles,
        })
        .collect();

    let schedulers = scenario
        .platform
        .schedulers
        .iter()
        .map(|s| Scheduler { name: s.id.clone(), policy: s.policy.clone(), processors: s.processors.clone() })
        .collect();

    let primitives = scenario
        .platform
        .primitives
        .iter()
        .map(|p| Primitive {
            name: p.id.clone(),
            group_id: p.group_id,
            suitable: p.suitable.iter().map(|t| (t.source.clone(), t.sinks.clone())).collect(),
            read_cost: p.read_cost,
            write_cost: p.write_cost,
        })
        .collect();

    let platform = Arc::new(Platform {
        processors,
        processor_groups: scenario.platform.processor_groups,
        schedulers,
        primitives,
        primitive_groups: scenario.platform.primitive_groups,
    });

    let processes = scenario.kpn.processes.iter().map(|id| Process { name: id.clone() }).collect();
    let channels = scenario
        .kpn
        .channels
        .iter()
        .map(|c| Channel { name: c.id.clone(), token_size: c.token_size, source: c.source.clone(), sinks: c.sinks.clone() })
        .collect();
    let kpn = Arc::new(KpnGraph { name: "scenario".to_string(), processes, channels });

    let trace = match scenario.trace {
        TraceConfig::Static { segments } => {
            let scripts = segments
                .into_iter()
                .map(|(process, segs)| (process, segs.into_iter().map(segment_from_config).collect()))
                .collect();
            TraceSpec::Static(scripts)
        }
        TraceConfig::Random { expected_firings, min_cycles, max_cycles, seed } => {
            TraceSpec::Random { expected_firings, min_cycles, max_cycles, seed }
        }
    };

    LoadedScenario { platform, kpn, trace }
}

fn segment_from_config(config: SegmentConfig) -> TraceSegment {
    match config {
        SegmentConfig::Compute { cycles } => TraceSegment::Compute { cycles },
        SegmentConfig::Read { channel, n_tokens } => TraceSegment::Read { channel, n_tokens },
        SegmentConfig::Write { channel, n_tokens } => TraceSegment::Write { channel, n_tokens },
        SegmentConfig::Terminate => TraceSegment::Terminate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_a_minimal_yaml_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.yaml");
        fs::write(
            &path,
            r#"
platform:
  processors:
    - id: p0
      type: cpu
      frequency_hz: 1000000000.0
  schedulers:
    - id: s
      processors: [p0]
kpn:
  processes: [a]
  channels: []
trace:
  kind: static
  segments:
    a:
      - op: compute
        cycles: 1000
      - op: terminate
"#,
        )
        .unwrap();

        let loaded = load_scenario(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded.platform.processors.len(), 1);
        assert_eq!(loaded.kpn.processes.len(), 1);
        assert!(matches!(loaded.trace, TraceSpec::Static(_)));
    }

    #[test]
    fn rejects_a_scenario_with_a_dangling_reference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.yaml");
        fs::write(
            &path,
            r#"
platform:
  processors:
    - id: p0
      type: cpu
      frequency_hz: 1000000000.0
  schedulers:
    - id: s
      processors: [p0]
kpn:
  processes: [a]
  channels:
    - id: c
      source: a
      sinks: [ghost]
trace:
  kind: static
  segments: {}
"#,
        )
        .unwrap();

        assert!(matches!(load_scenario(path.to_str().unwrap()), Err(ConfigError::ChannelUnknownSink { .. })));
    }
}
