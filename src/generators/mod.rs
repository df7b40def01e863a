// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Mapping generators: produce a feasible starting mapping without any
//! search, either wholly at random or by completing a partial assignment.

use crate::domain::kpn::KpnGraph;
use crate::domain::mapping::{ChannelMappingInfo, Mapping, ProcessMappingInfo};
use crate::domain::platform::Platform;
use crate::errors::MappingError;
use crate::observability::messages::{engine::ConstraintViolation, StructuredLog};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;

/// A stage that fills in part of a [`Mapping`], leaving entities it does not
/// own untouched. `PartialMapper` threads a mapping through a sequence of
/// these before handing whatever remains unmapped to [`RandomMapper`].
pub trait MappingStage {
    fn apply(&self, mapping: &mut Mapping, rng: &mut StdRng) -> Result<(), MappingError>;
}

/// Assigns every still-unmapped process to a uniformly chosen processor of a
/// uniformly chosen compatible scheduler, and every still-unmapped channel to
/// a uniformly chosen primitive suitable for its induced processor tuple.
///
/// Channel assignment runs after all processes are mapped (by this stage or
/// an earlier one), since a channel's suitable-primitive set depends on its
/// source and sinks' processors.
///
/// When built via [`RandomMapper::resource_first`], process assignment is
/// biased toward processor kinds the mapping already uses, so a run that
/// cares about the resource-kind objective tends to spread fewer distinct
/// kinds across the KPN rather than spraying uniformly across the platform.
pub struct RandomMapper {
    resource_first: bool,
}

impl RandomMapper {
    pub fn new() -> Self {
        Self { resource_first: false }
    }

    pub fn resource_first() -> Self {
        Self { resource_first: true }
    }

    /// Builds a full mapping from scratch.
    pub fn generate(&self, platform: &Arc<Platform>, kpn: &Arc<KpnGraph>, rng: &mut StdRng) -> Result<Mapping, MappingError> {
        let mut mapping = Mapping::new(platform.clone(), kpn.clone());
        self.apply(&mut mapping, rng)?;
        Ok(mapping)
    }

    /// Candidate `(scheduler, processor)` pairs, biased toward processor
    /// kinds already used by `mapping` when `resource_first` is set and at
    /// least one kind is in use; falls back to the unbiased candidate set
    /// whenever the bias would leave nothing to choose from.
    fn candidate_assignments(&self, platform: &Platform, mapping: &Mapping) -> Vec<(String, String)> {
        let all: Vec<(String, String)> = platform
            .schedulers
            .iter()
            .flat_map(|scheduler| scheduler.processors.iter().map(move |processor| (scheduler.name.clone(), processor.clone())))
            .collect();

        if !self.resource_first {
            return all;
        }

        let used = mapping.to_resource_dict();
        let preferred: Vec<(String, String)> = all
            .iter()
            .filter(|(_, processor_name)| platform.processor(processor_name).map(|p| used.get(&p.kind).copied().unwrap_or(0) > 0).unwrap_or(false))
            .cloned()
            .collect();

        if preferred.is_empty() {
            all
        } else {
            preferred
        }
    }

    fn map_processes(&self, mapping: &mut Mapping, rng: &mut StdRng) -> Result<(), MappingError> {
        let platform = mapping.platform.clone();
        let kpn = mapping.kpn.clone();
        for process in kpn.processes_sorted() {
            if mapping.process_info(&process.name).is_some() {
                continue;
            }
            let candidates = self.candidate_assignments(&platform, mapping);
            let (scheduler_name, processor_name) = candidates
                .choose(rng)
                .ok_or_else(|| MappingError::NoCompatibleScheduler(process.name.clone()))?
                .clone();
            mapping.set_process(
                &process.name,
                ProcessMappingInfo {
                    scheduler: scheduler_name,
                    processor: processor_name,
                    priority: rng.gen_range(0..1000),
                },
            );
        }
        Ok(())
    }

    fn map_channels(&self, mapping: &mut Mapping, rng: &mut StdRng) -> Result<(), MappingError> {
        let platform = mapping.platform.clone();
        let kpn = mapping.kpn.clone();
        for channel in kpn.channels_sorted() {
            if mapping.channel_info(&channel.name).is_some() {
                continue;
            }
            let source = mapping
                .affinity(&channel.source)
                .ok_or_else(|| MappingError::UnmappedProcess(channel.source.clone()))?
                .to_string();
            let sinks: Vec<String> = channel
                .sinks
                .iter()
                .map(|s| {
                    mapping
                        .affinity(s)
                        .map(|p| p.to_string())
                        .ok_or_else(|| MappingError::UnmappedProcess(s.clone()))
                })
                .collect::<Result<_, _>>()?;

            let candidates = platform.suitable_primitives(&source, &sinks);
            let chosen = match candidates.choose(rng) {
                Some(chosen) => chosen,
                None => {
                    let error = MappingError::NoSuitablePrimitive { channel: channel.name.clone(), source_process: source, sinks: sinks.join(",") };
                    ConstraintViolation { context: "mapping generation", error: &error }.log();
                    return Err(error);
                }
            };
            mapping.set_channel(
                &channel.name,
                ChannelMappingInfo { primitive: chosen.name.clone(), capacity: 1 },
            );
        }
        Ok(())
    }
}

impl Default for RandomMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl MappingStage for RandomMapper {
    fn apply(&self, mapping: &mut Mapping, rng: &mut StdRng) -> Result<(), MappingError> {
        self.map_processes(mapping, rng)?;
        self.map_channels(mapping, rng)?;
        Ok(())
    }
}

/// Runs a sequence of partial stages, then completes whatever is left with a
/// [`RandomMapper`] — the `Proc ∘ Com ∘ Random` composition.
pub struct PartialMapper {
    stages: Vec<Box<dyn MappingStage + Send + Sync>>,
}

impl PartialMapper {
    pub fn new(stages: Vec<Box<dyn MappingStage + Send + Sync>>) -> Self {
        Self { stages }
    }

    pub fn generate(&self, platform: &Arc<Platform>, kpn: &Arc<KpnGraph>, rng: &mut StdRng) -> Result<Mapping, MappingError> {
        let mut mapping = Mapping::new(platform.clone(), kpn.clone());
        for stage in &self.stages {
            stage.apply(&mut mapping, rng)?;
        }
        RandomMapper::new().apply(&mut mapping, rng)?;
        Ok(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::kpn::{Channel, Process};
    use crate::domain::platform::{FrequencyDomain, Primitive, Processor, Scheduler};
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn platform_with_two_processors() -> Arc<Platform> {
        let proc = |name: &str| Processor {
            name: name.to_string(),
            kind: "cpu".into(),
            frequency_domain: FrequencyDomain { name: format!("fd_{name}"), frequency_hz: 1e9 },
            power_model: None,
            context_load_cycles: 0,
            context_store_cycles: 0,
        };
        Arc::new(Platform {
            processors: vec![proc("p0"), proc("p1")],
            processor_groups: HashMap::from([(0, vec!["p0".to_string()]), (1, vec!["p1".to_string()])]),
            schedulers: vec![Scheduler { name: "s".into(), policy: "fifo".into(), processors: vec!["p0".into(), "p1".into()] }],
            primitives: vec![Primitive {
                name: "prim".into(),
                group_id: 0,
                suitable: vec![
                    ("p0".into(), vec!["p1".into()]),
                    ("p1".into(), vec!["p0".into()]),
                ],
                read_cost: 1,
                write_cost: 1,
            }],
            primitive_groups: HashMap::from([(0, vec!["prim".to_string()])]),
        })
    }

    fn kpn_with_channel() -> Arc<KpnGraph> {
        Arc::new(KpnGraph {
            name: "k".into(),
            processes: vec![Process { name: "a".into() }, Process { name: "b".into() }],
            channels: vec![Channel { name: "c".into(), token_size: 1, source: "a".into(), sinks: vec!["b".into()] }],
        })
    }

    #[test]
    fn random_mapper_produces_a_valid_mapping() {
        let platform = platform_with_two_processors();
        let kpn = kpn_with_channel();
        let mut rng = StdRng::seed_from_u64(42);
        let mapping = RandomMapper::new().generate(&platform, &kpn, &mut rng).unwrap();
        assert!(mapping.validate().is_ok());
        assert!(mapping.unmapped_processes().is_empty());
        assert!(mapping.unmapped_channels().is_empty());
    }

    fn platform_with_two_kinds() -> Arc<Platform> {
        let proc = |name: &str, kind: &str| Processor {
            name: name.to_string(),
            kind: kind.to_string(),
            frequency_domain: FrequencyDomain { name: format!("fd_{name}"), frequency_hz: 1e9 },
            power_model: None,
            context_load_cycles: 0,
            context_store_cycles: 0,
        };
        Arc::new(Platform {
            processors: vec![proc("p0", "fast"), proc("p1", "fast"), proc("p2", "slow"), proc("p3", "slow")],
            processor_groups: HashMap::from([(0, vec!["p0".into(), "p1".into()]), (1, vec!["p2".into(), "p3".into()])]),
            schedulers: vec![Scheduler {
                name: "s".into(),
                policy: "fifo".into(),
                processors: vec!["p0".into(), "p1".into(), "p2".into(), "p3".into()],
            }],
            primitives: vec![],
            primitive_groups: HashMap::new(),
        })
    }

    fn kpn_without_channels(n: usize) -> Arc<KpnGraph> {
        Arc::new(KpnGraph {
            name: "k".into(),
            processes: (0..n).map(|i| Process { name: format!("p{i}") }).collect(),
            channels: vec![],
        })
    }

    #[test]
    fn resource_first_converges_on_a_single_processor_kind() {
        let platform = platform_with_two_kinds();
        let kpn = kpn_without_channels(6);
        let mut rng = StdRng::seed_from_u64(7);
        let mapping = RandomMapper::resource_first().generate(&platform, &kpn, &mut rng).unwrap();
        assert!(mapping.validate().is_ok());
        let used_kinds = mapping.to_resource_dict().into_iter().filter(|(_, count)| *count > 0).count();
        assert_eq!(used_kinds, 1);
    }

    #[test]
    fn random_mapper_fails_when_no_primitive_is_suitable() {
        let mut platform = (*platform_with_two_processors()).clone();
        platform.primitives.clear();
        platform.primitive_groups.clear();
        let platform = Arc::new(platform);
        let kpn = kpn_with_channel();
        let mut rng = StdRng::seed_from_u64(1);
        let result = RandomMapper::new().generate(&platform, &kpn, &mut rng);
        assert!(matches!(result, Err(MappingError::NoSuitablePrimitive { .. })));
    }

    #[test]
    fn partial_mapper_completes_a_preset_process() {
        struct PinProcessA;
        impl MappingStage for PinProcessA {
            fn apply(&self, mapping: &mut Mapping, _rng: &mut StdRng) -> Result<(), MappingError> {
                mapping.set_process("a", ProcessMappingInfo { scheduler: "s".into(), processor: "p0".into(), priority: 0 });
                Ok(())
            }
        }

        let platform = platform_with_two_processors();
        let kpn = kpn_with_channel();
        let mapper = PartialMapper::new(vec![Box::new(PinProcessA)]);
        let mut rng = StdRng::seed_from_u64(3);
        let mapping = mapper.generate(&platform, &kpn, &mut rng).unwrap();
        assert_eq!(mapping.affinity("a"), Some("p0"));
        assert!(mapping.validate().is_ok());
    }
}
