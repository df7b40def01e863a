// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Scenario validation: duplicate ids and dangling references are all
//! caught here, before any engine construction, so the CLI can report a
//! single `ConfigError` and exit non-zero rather than panicking deep inside
//! the domain model.

use super::scenario::ScenarioFile;
use crate::errors::ConfigError;
use std::collections::HashSet;

pub fn validate(scenario: &ScenarioFile) -> Result<(), ConfigError> {
    let mut processor_ids = HashSet::new();
    for processor in &scenario.platform.processors {
        if !processor_ids.insert(processor.id.as_str()) {
            return Err(ConfigError::DuplicateProcessorId(processor.id.clone()));
        }
    }

    let mut scheduler_ids = HashSet::new();
    for scheduler in &scenario.platform.schedulers {
        if !scheduler_ids.insert(scheduler.id.as_str()) {
            return Err(ConfigError::DuplicateSchedulerId(scheduler.id.clone()));
        }
        for processor in &scheduler.processors {
            if !processor_ids.contains(processor.as_str()) {
                return Err(ConfigError::SchedulerUnknownProcessor {
                    scheduler: scheduler.id.clone(),
                    processor: processor.clone(),
                });
            }
        }
    }

    let mut primitive_ids = HashSet::new();
    for primitive in &scenario.platform.primitives {
        if !primitive_ids.insert(primitive.id.as_str()) {
            return Err(ConfigError::DuplicatePrimitiveId(primitive.id.clone()));
        }
        for tuple in &primitive.suitable {
            if !processor_ids.contains(tuple.source.as_str()) {
                return Err(ConfigError::PrimitiveUnknownProcessor {
                    primitive: primitive.id.clone(),
                    processor: tuple.source.clone(),
                });
            }
            for sink in &tuple.sinks {
                if !processor_ids.contains(sink.as_str()) {
                    return Err(ConfigError::PrimitiveUnknownProcessor {
                        primitive: primitive.id.clone(),
                        processor: sink.clone(),
                    });
                }
            }
        }
    }

    let mut process_ids = HashSet::new();
    for process in &scenario.kpn.processes {
        if !process_ids.insert(process.as_str()) {
            return Err(ConfigError::DuplicateProcessId(process.clone()));
        }
    }

    let mut channel_ids = HashSet::new();
    for channel in &scenario.kpn.channels {
        if !channel_ids.insert(channel.id.as_str()) {
            return Err(ConfigError::DuplicateChannelId(channel.id.clone()));
        }
        if !process_ids.contains(channel.source.as_str()) {
            return Err(ConfigError::ChannelUnknownSource {
                channel: channel.id.clone(),
                process: channel.source.clone(),
            });
        }
        if channel.sinks.is_empty() {
            return Err(ConfigError::ChannelNoSinks { channel: channel.id.clone() });
        }
        for sink in &channel.sinks {
            if !process_ids.contains(sink.as_str()) {
                return Err(ConfigError::ChannelUnknownSink {
                    channel: channel.id.clone(),
                    process: sink.clone(),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::scenario::*;
    use std::collections::HashMap;

    fn minimal_scenario() -> ScenarioFile {
        ScenarioFile {
            platform: PlatformConfig {
                processors: vec![ProcessorConfig {
                    id: "p0".into(),
                    kind: "cpu".into(),
                    frequency_hz: 1e9,
                    static_power_w: None,
                    dynamic_energy_per_cycle_j: None,
                    context_load_cycles: 0,
                    context_store_cycles: 0,
                }],
                processor_groups: HashMap::new(),
                schedulers: vec![SchedulerConfig { id: "s".into(), policy: "fifo".into(), processors: vec!["p0".into()] }],
                primitives: vec![],
                primitive_groups: HashMap::new(),
            },
            kpn: KpnConfig { processes: vec!["a".into()], channels: vec![] },
            trace: TraceConfig::Static { segments: HashMap::new() },
        }
    }

    #[test]
    fn accepts_a_minimal_valid_scenario() {
        assert!(validate(&minimal_scenario()).is_ok());
    }

    #[test]
    fn rejects_a_channel_referencing_an_unknown_process() {
        let mut scenario = minimal_scenario();
        scenario.kpn.channels.push(ChannelConfig {
            id: "c".into(),
            token_size: 1,
            source: "a".into(),
            sinks: vec!["ghost".into()],
        });
        assert!(matches!(validate(&scenario), Err(ConfigError::ChannelUnknownSink { .. })));
    }

    #[test]
    fn rejects_a_scheduler_referencing_an_unknown_processor() {
        let mut scenario = minimal_scenario();
        scenario.platform.schedulers[0].processors.push("ghost".into());
        assert!(matches!(validate(&scenario), Err(ConfigError::SchedulerUnknownProcessor { .. })));
    }
}
