// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The platform model: processors, schedulers, and communication primitives.
//!
//! A `Platform` is an immutable description of the hardware a KPN
//! application can be mapped onto. It is built once (typically from a
//! [`crate::config::scenario::Scenario`]) and shared read-only across an
//! entire search run.

use std::collections::HashMap;

/// A frequency domain shared by one or more processors.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyDomain {
    pub name: String,
    /// Frequency in Hz. Lower frequency means slower ticks-per-cycle.
    pub frequency_hz: f64,
}

/// A simple linear power model: static power draw plus a per-cycle dynamic
/// cost, used to derive `static_energy`/`dynamic_energy` in the trace-graph
/// simulator backend.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerModel {
    pub static_power_w: f64,
    pub dynamic_energy_per_cycle_j: f64,
}

/// A single processing element.
#[derive(Debug, Clone, PartialEq)]
pub struct Processor {
    pub name: String,
    pub kind: String,
    pub frequency_domain: FrequencyDomain,
    pub power_model: Option<PowerModel>,
    pub context_load_cycles: u64,
    pub context_store_cycles: u64,
}

impl Processor {
    /// Ticks (picoseconds) needed to execute `cycles` cycles on this processor.
    pub fn ticks(&self, cycles: u64) -> u64 {
        if self.frequency_domain.frequency_hz <= 0.0 {
            return 0;
        }
        let seconds = cycles as f64 / self.frequency_domain.frequency_hz;
        (seconds * 1e12).round() as u64
    }
}

/// A scheduler owns a subset of processors and a scheduling policy name.
#[derive(Debug, Clone, PartialEq)]
pub struct Scheduler {
    pub name: String,
    pub policy: String,
    pub processors: Vec<String>,
}

/// A concrete communication path between one source processor and a set of
/// sink processors.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub name: String,
    pub group_id: u32,
    /// `(source processor name, sink processor names)` tuples this primitive
    /// can serve.
    pub suitable: Vec<(String, Vec<String>)>,
    pub read_cost: u64,
    pub write_cost: u64,
}

impl Primitive {
    pub fn is_suitable(&self, source: &str, sinks: &[String]) -> bool {
        self.suitable.iter().any(|(s, ss)| {
            s == source && ss.len() == sinks.len() && ss.iter().all(|x| sinks.contains(x))
        })
    }
}

/// The full platform: processors, processor groups, schedulers, primitives,
/// and primitive groups.
#[derive(Debug, Clone)]
pub struct Platform {
    pub processors: Vec<Processor>,
    /// processor group id -> processor names in that group, ordered.
    pub processor_groups: HashMap<u32, Vec<String>>,
    pub schedulers: Vec<Scheduler>,
    pub primitives: Vec<Primitive>,
    /// primitive group id -> primitive names in that group, ordered.
    pub primitive_groups: HashMap<u32, Vec<String>>,
}

impl Platform {
    pub fn processor(&self, name: &str) -> Option<&Processor> {
        self.processors.iter().find(|p| p.name == name)
    }

    pub fn scheduler(&self, name: &str) -> Option<&Scheduler> {
        self.schedulers.iter().find(|s| s.name == name)
    }

    pub fn primitive(&self, name: &str) -> Option<&Primitive> {
        self.primitives.iter().find(|p| p.name == name)
    }

    /// Processors sorted by name, used whenever a canonical ordering is
    /// needed to build a representation vector.
    pub fn processors_sorted(&self) -> Vec<&Processor> {
        let mut v: Vec<&Processor> = self.processors.iter().collect();
        v.sort_by(|a, b| a.name.cmp(&b.name));
        v
    }

    pub fn primitives_sorted(&self) -> Vec<&Primitive> {
        let mut v: Vec<&Primitive> = self.primitives.iter().collect();
        v.sort_by(|a, b| a.name.cmp(&b.name));
        v
    }

    /// Schedulers whose processor set contains `processor_name`.
    pub fn schedulers_containing(&self, processor_name: &str) -> Vec<&Scheduler> {
        self.schedulers
            .iter()
            .filter(|s| s.processors.iter().any(|p| p == processor_name))
            .collect()
    }

    /// Primitives suitable for the given (source, sinks) processor tuple.
    pub fn suitable_primitives(&self, source: &str, sinks: &[String]) -> Vec<&Primitive> {
        self.primitives
            .iter()
            .filter(|p| p.is_suitable(source, sinks))
            .collect()
    }

    /// The processor with the lowest frequency among the given processor
    /// group ids (the "slowest" processor), tie-broken by lowest frequency
    /// among the first processor of each group as in the original tool.
    pub fn slowest_processor_in_groups(&self, group_ids: &[u32]) -> Option<&Processor> {
        let mut slowest: Option<&Processor> = None;
        for gid in group_ids {
            let Some(names) = self.processor_groups.get(gid) else {
                continue;
            };
            let Some(first_name) = names.first() else {
                continue;
            };
            let Some(candidate) = self.processor(first_name) else {
                continue;
            };
            slowest = match slowest {
                None => Some(candidate),
                Some(cur) => {
                    if candidate.frequency_domain.frequency_hz < cur.frequency_domain.frequency_hz {
                        Some(candidate)
                    } else {
                        Some(cur)
                    }
                }
            };
        }
        slowest
    }

    /// All processor-group ids whose group contains `processor_name`.
    pub fn groups_of_processor(&self, processor_name: &str) -> Vec<u32> {
        self.processor_groups
            .iter()
            .filter(|(_, names)| names.iter().any(|n| n == processor_name))
            .map(|(id, _)| *id)
            .collect()
    }

    /// All primitive-group ids whose group contains `primitive_name`.
    pub fn groups_of_primitive(&self, primitive_name: &str) -> Vec<u32> {
        self.primitive_groups
            .iter()
            .filter(|(_, names)| names.iter().any(|n| n == primitive_name))
            .map(|(id, _)| *id)
            .collect()
    }

    /// The group with the highest numeric id among the given primitive
    /// group ids, returning its first primitive. This mirrors the source
    /// tool's "use the id as a cost proxy" policy (see design notes).
    pub fn slowest_primitive_in_groups_by_id(&self, group_ids: &[u32]) -> Option<&Primitive> {
        let max_id = group_ids.iter().max().copied()?;
        let names = self.primitive_groups.get(&max_id)?;
        let first_name = names.first()?;
        self.primitive(first_name)
    }

    /// The group whose first primitive has the highest read/write cost,
    /// an alternative, cost-aware policy (see `SlowestPolicy::CostAware`).
    pub fn slowest_primitive_in_groups_by_cost(
        &self,
        group_ids: &[u32],
        read_access: bool,
    ) -> Option<&Primitive> {
        group_ids
            .iter()
            .filter_map(|gid| self.primitive_groups.get(gid))
            .filter_map(|names| names.first())
            .filter_map(|name| self.primitive(name))
            .max_by_key(|p| if read_access { p.read_cost } else { p.write_cost })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proc(name: &str, hz: f64) -> Processor {
        Processor {
            name: name.to_string(),
            kind: "generic".to_string(),
            frequency_domain: FrequencyDomain {
                name: format!("fd_{name}"),
                frequency_hz: hz,
            },
            power_model: None,
            context_load_cycles: 0,
            context_store_cycles: 0,
        }
    }

    #[test]
    fn ticks_scale_inversely_with_frequency() {
        let fast = proc("fast", 2_000_000_000.0);
        let slow = proc("slow", 1_000_000_000.0);
        assert!(slow.ticks(1000) > fast.ticks(1000));
    }

    #[test]
    fn slowest_processor_picks_lowest_frequency() {
        let mut groups = HashMap::new();
        groups.insert(0, vec!["fast".to_string()]);
        groups.insert(1, vec!["slow".to_string()]);
        let platform = Platform {
            processors: vec![proc("fast", 2_000_000_000.0), proc("slow", 1_000_000_000.0)],
            processor_groups: groups,
            schedulers: vec![],
            primitives: vec![],
            primitive_groups: HashMap::new(),
        };
        let slowest = platform.slowest_processor_in_groups(&[0, 1]).unwrap();
        assert_eq!(slowest.name, "slow");
    }
}
