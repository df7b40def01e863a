// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The mapping: a partial or total function from processes to
//! (scheduler, processor, priority) and from channels to (primitive,
//! capacity).

use crate::domain::kpn::KpnGraph;
use crate::domain::platform::Platform;
use crate::errors::MappingError;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessMappingInfo {
    pub scheduler: String,
    pub processor: String,
    pub priority: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMappingInfo {
    pub primitive: String,
    pub capacity: u32,
}

/// A (possibly partial) assignment of a KPN graph onto a platform.
///
/// Mappings hold only string keys into the platform and KPN arenas they were
/// built against, rather than owning references into them, so a `Mapping`
/// can be cloned, cached, and sent across worker tasks cheaply.
#[derive(Debug, Clone)]
pub struct Mapping {
    pub platform: Arc<Platform>,
    pub kpn: Arc<KpnGraph>,
    processes: HashMap<String, ProcessMappingInfo>,
    channels: HashMap<String, ChannelMappingInfo>,
}

impl Mapping {
    pub fn new(platform: Arc<Platform>, kpn: Arc<KpnGraph>) -> Self {
        Self {
            platform,
            kpn,
            processes: HashMap::new(),
            channels: HashMap::new(),
        }
    }

    pub fn set_process(&mut self, process: &str, info: ProcessMappingInfo) {
        self.processes.insert(process.to_string(), info);
    }

    pub fn set_channel(&mut self, channel: &str, info: ChannelMappingInfo) {
        self.channels.insert(channel.to_string(), info);
    }

    pub fn process_info(&self, process: &str) -> Option<&ProcessMappingInfo> {
        self.processes.get(process)
    }

    pub fn channel_info(&self, channel: &str) -> Option<&ChannelMappingInfo> {
        self.channels.get(channel)
    }

    pub fn affinity(&self, process: &str) -> Option<&str> {
        self.processes.get(process).map(|i| i.processor.as_str())
    }

    pub fn primitive(&self, channel: &str) -> Option<&str> {
        self.channels.get(channel).map(|i| i.primitive.as_str())
    }

    pub fn unmapped_processes(&self) -> Vec<&str> {
        self.kpn
            .processes
            .iter()
            .map(|p| p.name.as_str())
            .filter(|name| !self.processes.contains_key(*name))
            .collect()
    }

    pub fn unmapped_channels(&self) -> Vec<&str> {
        self.kpn
            .channels
            .iter()
            .map(|c| c.name.as_str())
            .filter(|name| !self.channels.contains_key(*name))
            .collect()
    }

    /// Checks that every mapped process's processor belongs to its
    /// scheduler's processor set, and every mapped channel's primitive is
    /// suitable for the processor tuple induced by the process mapping.
    pub fn validate(&self) -> Result<(), MappingError> {
        for process in &self.kpn.processes {
            let Some(info) = self.processes.get(&process.name) else {
                continue;
            };
            let scheduler = self.platform.scheduler(&info.scheduler).ok_or_else(|| {
                MappingError::ProcessorNotInScheduler {
                    process: process.name.clone(),
                    processor: info.processor.clone(),
                    scheduler: info.scheduler.clone(),
                }
            })?;
            if !scheduler.processors.iter().any(|p| p == &info.processor) {
                return Err(MappingError::ProcessorNotInScheduler {
                    process: process.name.clone(),
                    processor: info.processor.clone(),
                    scheduler: info.scheduler.clone(),
                });
            }
        }

        for channel in &self.kpn.channels {
            let Some(info) = self.channels.get(&channel.name) else {
                continue;
            };
            let Some(source_proc) = self.affinity(&channel.source) else {
                continue;
            };
            let sink_procs: Vec<String> = channel
                .sinks
                .iter()
                .filter_map(|s| self.affinity(s).map(|p| p.to_string()))
                .collect();
            if sink_procs.len() != channel.sinks.len() {
                continue;
            }
            let primitive = self.platform.primitive(&info.primitive).ok_or_else(|| {
                MappingError::NoSuitablePrimitive {
                    channel: channel.name.clone(),
                    source_process: source_proc.to_string(),
                    sinks: sink_procs.join(","),
                }
            })?;
            if !primitive.is_suitable(source_proc, &sink_procs) {
                return Err(MappingError::NoSuitablePrimitive {
                    channel: channel.name.clone(),
                    source_process: source_proc.to_string(),
                    sinks: sink_procs.join(","),
                });
            }
        }

        Ok(())
    }

    /// Converts the mapping into the simple vector representation: one
    /// processor index per process (in canonical process-name order),
    /// optionally followed by one primitive index per channel.
    pub fn to_list(&self, include_channels: bool) -> Result<Vec<usize>, MappingError> {
        let processor_index: HashMap<&str, usize> = self
            .platform
            .processors_sorted()
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.as_str(), i))
            .collect();

        let mut result = Vec::new();
        for process in self.kpn.processes_sorted() {
            let info = self
                .processes
                .get(&process.name)
                .ok_or_else(|| MappingError::UnmappedProcess(process.name.clone()))?;
            let idx = processor_index
                .get(info.processor.as_str())
                .copied()
                .ok_or_else(|| MappingError::UnmappedProcess(process.name.clone()))?;
            result.push(idx);
        }

        if include_channels {
            let primitive_index: HashMap<&str, usize> = self
                .platform
                .primitives_sorted()
                .iter()
                .enumerate()
                .map(|(i, p)| (p.name.as_str(), i))
                .collect();
            for channel in self.kpn.channels_sorted() {
                let info = self
                    .channels
                    .get(&channel.name)
                    .ok_or_else(|| MappingError::UnmappedChannel(channel.name.clone()))?;
                let idx = primitive_index
                    .get(info.primitive.as_str())
                    .copied()
                    .ok_or_else(|| MappingError::UnmappedChannel(channel.name.clone()))?;
                result.push(idx);
            }
        }

        Ok(result)
    }

    /// Decomposes the process mapping into {process name -> processor group
    /// ids} for the trace-graph builder, using every processor group that
    /// contains the process's assigned processor.
    pub fn process_groups(&self) -> HashMap<String, Vec<u32>> {
        self.processes
            .iter()
            .map(|(name, info)| (name.clone(), self.platform.groups_of_processor(&info.processor)))
            .collect()
    }

    /// Decomposes the channel mapping into {channel name -> primitive group
    /// ids}, symmetrically to [`Mapping::process_groups`].
    pub fn channel_groups(&self) -> HashMap<String, Vec<u32>> {
        self.channels
            .iter()
            .map(|(name, info)| (name.clone(), self.platform.groups_of_primitive(&info.primitive)))
            .collect()
    }

    pub fn to_resource_dict(&self) -> HashMap<String, usize> {
        let mut dict = HashMap::new();
        for processor in &self.platform.processors {
            dict.entry(processor.kind.clone()).or_insert(0);
        }
        let mut counted = std::collections::HashSet::new();
        for process in &self.kpn.processes {
            let Some(proc_name) = self.affinity(&process.name) else {
                continue;
            };
            if !counted.insert(proc_name.to_string()) {
                continue;
            }
            if let Some(processor) = self.platform.processor(proc_name) {
                *dict.entry(processor.kind.clone()).or_insert(0) += 1;
            }
        }
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::kpn::{Channel, Process};
    use crate::domain::platform::{FrequencyDomain, Primitive, Processor, Scheduler};
    use std::collections::HashMap as Map;

    fn tiny_platform() -> Arc<Platform> {
        let p0 = Processor {
            name: "p0".into(),
            kind: "cpu".into(),
            frequency_domain: FrequencyDomain {
                name: "fd0".into(),
                frequency_hz: 1e9,
            },
            power_model: None,
            context_load_cycles: 0,
            context_store_cycles: 0,
        };
        let p1 = Processor {
            name: "p1".into(),
            kind: "cpu".into(),
            frequency_domain: FrequencyDomain {
                name: "fd1".into(),
                frequency_hz: 2e9,
            },
            power_model: None,
            context_load_cycles: 0,
            context_store_cycles: 0,
        };
        let sched = Scheduler {
            name: "s".into(),
            policy: "fifo".into(),
            processors: vec!["p0".into(), "p1".into()],
        };
        let prim = Primitive {
            name: "prim".into(),
            group_id: 0,
            suitable: vec![("p0".into(), vec!["p1".into()])],
            read_cost: 10,
            write_cost: 10,
        };
        let mut pg = Map::new();
        pg.insert(0, vec!["p0".to_string()]);
        pg.insert(1, vec!["p1".to_string()]);
        let mut prg = Map::new();
        prg.insert(0, vec!["prim".to_string()]);
        Arc::new(Platform {
            processors: vec![p0, p1],
            processor_groups: pg,
            schedulers: vec![sched],
            primitives: vec![prim],
            primitive_groups: prg,
        })
    }

    fn tiny_kpn() -> Arc<KpnGraph> {
        Arc::new(KpnGraph {
            name: "kpn".into(),
            processes: vec![Process { name: "a".into() }, Process { name: "b".into() }],
            channels: vec![Channel {
                name: "c".into(),
                token_size: 4,
                source: "a".into(),
                sinks: vec!["b".into()],
            }],
        })
    }

    #[test]
    fn validate_accepts_suitable_mapping() {
        let platform = tiny_platform();
        let kpn = tiny_kpn();
        let mut m = Mapping::new(platform, kpn);
        m.set_process(
            "a",
            ProcessMappingInfo {
                scheduler: "s".into(),
                processor: "p0".into(),
                priority: 0,
            },
        );
        m.set_process(
            "b",
            ProcessMappingInfo {
                scheduler: "s".into(),
                processor: "p1".into(),
                priority: 0,
            },
        );
        m.set_channel(
            "c",
            ChannelMappingInfo {
                primitive: "prim".into(),
                capacity: 4,
            },
        );
        assert!(m.validate().is_ok());
    }

    #[test]
    fn validate_rejects_unsuitable_primitive() {
        let platform = tiny_platform();
        let kpn = tiny_kpn();
        let mut m = Mapping::new(platform, kpn);
        m.set_process(
            "a",
            ProcessMappingInfo {
                scheduler: "s".into(),
                processor: "p1".into(),
                priority: 0,
            },
        );
        m.set_process(
            "b",
            ProcessMappingInfo {
                scheduler: "s".into(),
                processor: "p0".into(),
                priority: 0,
            },
        );
        m.set_channel(
            "c",
            ChannelMappingInfo {
                primitive: "prim".into(),
                capacity: 4,
            },
        );
        assert!(m.validate().is_err());
    }

    #[test]
    fn to_list_orders_by_process_name() {
        let platform = tiny_platform();
        let kpn = tiny_kpn();
        let mut m = Mapping::new(platform, kpn);
        m.set_process(
            "a",
            ProcessMappingInfo {
                scheduler: "s".into(),
                processor: "p1".into(),
                priority: 0,
            },
        );
        m.set_process(
            "b",
            ProcessMappingInfo {
                scheduler: "s".into(),
                processor: "p0".into(),
                priority: 0,
            },
        );
        let list = m.to_list(false).unwrap();
        assert_eq!(list, vec![1, 0]);
    }
}
