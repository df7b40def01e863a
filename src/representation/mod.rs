// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Geometric representations of the mapping space.
//!
//! A representation turns a discrete [`Mapping`] into an integer vector
//! endowed with a distance, ball sampling, crossover, and a nearest-neighbor
//! projection back into the feasible set. Search engines work entirely in
//! vector space and only decode back to a `Mapping` when they need to
//! simulate or report a result.

use crate::domain::kpn::KpnGraph;
use crate::domain::mapping::{ChannelMappingInfo, Mapping, ProcessMappingInfo};
use crate::domain::platform::Platform;
use crate::errors::MappingError;
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Arc;

/// A reversible, distance-equipped encoding of the mapping space.
pub trait Representation {
    fn to_vector(&self, mapping: &Mapping) -> Result<Vec<i64>, MappingError>;
    fn from_vector(&self, vector: &[i64]) -> Result<Mapping, MappingError>;

    /// Distance between two vectors under this representation's metric.
    fn distance(&self, a: &[i64], b: &[i64]) -> f64;

    /// Up to `count` distinct lattice points within `radius` of `center`.
    /// Fewer than `count` points may be returned if the ball is small
    /// relative to the feasible set.
    fn uniform_from_ball(&self, center: &[i64], radius: f64, count: usize, rng: &mut StdRng) -> Vec<Vec<i64>>;

    /// Exchanges a `k`-locus slice between `a` and `b`, returning the two
    /// recombined vectors. `k` must not exceed the vector length.
    fn crossover(&self, a: &[i64], b: &[i64], k: usize, rng: &mut StdRng) -> (Vec<i64>, Vec<i64>);

    /// Projects a real-valued vector onto the nearest feasible lattice point.
    fn approximate(&self, x: &[f64]) -> Vec<i64>;

    /// A unique representative of `v`'s equivalence class under known
    /// platform symmetries. The default implementation treats every point
    /// as its own class, since general symmetry detection is out of scope.
    fn canonical(&self, v: &[i64]) -> Vec<i64> {
        v.to_vec()
    }

    fn slot_bounds(&self) -> Vec<usize>;
}

/// One slot per process (processor index) optionally followed by one slot
/// per channel (primitive index), in the canonical process/channel name
/// order used throughout the domain model.
pub struct SimpleVector {
    platform: Arc<Platform>,
    kpn: Arc<KpnGraph>,
    include_channels: bool,
    /// The exponent of the L^p distance; 2.0 gives Euclidean distance, 1.0
    /// gives Manhattan distance.
    pub p: f64,
}

impl SimpleVector {
    pub fn new(platform: Arc<Platform>, kpn: Arc<KpnGraph>, include_channels: bool, p: f64) -> Self {
        Self { platform, kpn, include_channels, p }
    }

    fn process_slots(&self) -> usize {
        self.kpn.processes.len()
    }
}

impl Representation for SimpleVector {
    fn to_vector(&self, mapping: &Mapping) -> Result<Vec<i64>, MappingError> {
        mapping
            .to_list(self.include_channels)
            .map(|list| list.into_iter().map(|i| i as i64).collect())
    }

    fn from_vector(&self, vector: &[i64]) -> Result<Mapping, MappingError> {
        let bounds = self.slot_bounds();
        if vector.len() != bounds.len() {
            return Err(MappingError::WrongVectorLength { expected: bounds.len(), actual: vector.len() });
        }
        for (i, (&value, &max)) in vector.iter().zip(bounds.iter()).enumerate() {
            if value < 0 || value as usize > max {
                return Err(MappingError::SlotOutOfRange { index: i, value, max });
            }
        }

        let mut mapping = Mapping::new(self.platform.clone(), self.kpn.clone());
        let processors = self.platform.processors_sorted();
        let processes = self.kpn.processes_sorted();

        for (i, process) in processes.iter().enumerate() {
            let processor = processors[vector[i] as usize];
            let scheduler = self
                .platform
                .schedulers_containing(&processor.name)
                .into_iter()
                .next()
                .ok_or_else(|| MappingError::NoCompatibleScheduler(processor.name.clone()))?;
            mapping.set_process(
                &process.name,
                ProcessMappingInfo {
                    scheduler: scheduler.name.clone(),
                    processor: processor.name.clone(),
                    priority: 0,
                },
            );
        }

        if self.include_channels {
            let primitives = self.platform.primitives_sorted();
            let channels = self.kpn.channels_sorted();
            let offset = processes.len();
            for (i, channel) in channels.iter().enumerate() {
                let primitive = primitives[vector[offset + i] as usize];
                mapping.set_channel(
                    &channel.name,
                    ChannelMappingInfo { primitive: primitive.name.clone(), capacity: 1 },
                );
            }
        }

        Ok(mapping)
    }

    fn distance(&self, a: &[i64], b: &[i64]) -> f64 {
        lp_distance(a, b, self.p)
    }

    fn uniform_from_ball(&self, center: &[i64], radius: f64, count: usize, rng: &mut StdRng) -> Vec<Vec<i64>> {
        sample_ball(center, radius, count, &self.slot_bounds(), self.p, rng)
    }

    fn crossover(&self, a: &[i64], b: &[i64], k: usize, rng: &mut StdRng) -> (Vec<i64>, Vec<i64>) {
        slice_crossover(a, b, k, rng)
    }

    fn approximate(&self, x: &[f64]) -> Vec<i64> {
        project(x, &self.slot_bounds())
    }

    fn slot_bounds(&self) -> Vec<usize> {
        let mut bounds = vec![self.platform.processors.len().saturating_sub(1); self.process_slots()];
        if self.include_channels {
            bounds.resize(
                self.process_slots() + self.kpn.channels.len(),
                self.platform.primitives.len().saturating_sub(1),
            );
        }
        bounds
    }
}

/// A variant that measures distance between process slots using platform
/// topology rather than raw processor-index difference: two processors in
/// the same scheduler are considered close, processors in different
/// schedulers are considered far. This is a grounded simplification of a
/// full metric embedding — see the representation design note in
/// DESIGN.md — layered on top of `SimpleVector`'s vector encoding and ball
/// sampling.
pub struct MetricSpace {
    base: SimpleVector,
    /// `distance_matrix[i][j]` = topological distance between the
    /// processors at sorted index `i` and `j`.
    distance_matrix: Vec<Vec<f64>>,
}

impl MetricSpace {
    pub fn new(platform: Arc<Platform>, kpn: Arc<KpnGraph>, include_channels: bool, p: f64) -> Self {
        let processors = platform.processors_sorted();
        let n = processors.len();
        let mut distance_matrix = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let same_scheduler = platform
                    .schedulers
                    .iter()
                    .any(|s| s.processors.iter().any(|p| p == &processors[i].name) && s.processors.iter().any(|p| p == &processors[j].name));
                distance_matrix[i][j] = if same_scheduler { 1.0 } else { 2.0 };
            }
        }
        let base = SimpleVector::new(platform, kpn, include_channels, p);
        Self { base, distance_matrix }
    }

    fn process_slot_distance(&self, i: i64, j: i64) -> f64 {
        self.distance_matrix[i as usize][j as usize]
    }
}

impl Representation for MetricSpace {
    fn to_vector(&self, mapping: &Mapping) -> Result<Vec<i64>, MappingError> {
        self.base.to_vector(mapping)
    }

    fn from_vector(&self, vector: &[i64]) -> Result<Mapping, MappingError> {
        self.base.from_vector(vector)
    }

    fn distance(&self, a: &[i64], b: &[i64]) -> f64 {
        let process_slots = self.base.process_slots();
        let mut sum = 0.0;
        for i in 0..a.len().min(b.len()) {
            let d = if i < process_slots {
                self.process_slot_distance(a[i], b[i])
            } else {
                (a[i] - b[i]).unsigned_abs() as f64
            };
            sum += d.powf(self.base.p);
        }
        sum.powf(1.0 / self.base.p)
    }

    fn uniform_from_ball(&self, center: &[i64], radius: f64, count: usize, rng: &mut StdRng) -> Vec<Vec<i64>> {
        // Topological closeness only refines distance, not the candidate
        // lattice itself, so sampling still walks the same integer lattice
        // as SimpleVector and filters by the topology-aware distance.
        let bounds = self.base.slot_bounds();
        let mut found = Vec::new();
        let mut attempts = 0;
        while found.len() < count && attempts < count * 50 + 100 {
            attempts += 1;
            let candidate: Vec<i64> = center
                .iter()
                .zip(bounds.iter())
                .map(|(&c, &max)| {
                    let jitter = rng.gen_range(-(radius.ceil() as i64)..=radius.ceil() as i64);
                    (c + jitter).clamp(0, max as i64)
                })
                .collect();
            if self.distance(center, &candidate) <= radius && !found.contains(&candidate) {
                found.push(candidate);
            }
        }
        found
    }

    fn crossover(&self, a: &[i64], b: &[i64], k: usize, rng: &mut StdRng) -> (Vec<i64>, Vec<i64>) {
        self.base.crossover(a, b, k, rng)
    }

    fn approximate(&self, x: &[f64]) -> Vec<i64> {
        self.base.approximate(x)
    }

    fn slot_bounds(&self) -> Vec<usize> {
        self.base.slot_bounds()
    }
}

fn lp_distance(a: &[i64], b: &[i64], p: f64) -> f64 {
    let sum: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| ((x - y).unsigned_abs() as f64).powf(p))
        .sum();
    sum.powf(1.0 / p)
}

fn sample_ball(center: &[i64], radius: f64, count: usize, bounds: &[usize], p: f64, rng: &mut StdRng) -> Vec<Vec<i64>> {
    let mut found = Vec::new();
    let mut attempts = 0;
    while found.len() < count && attempts < count * 50 + 100 {
        attempts += 1;
        let candidate: Vec<i64> = center
            .iter()
            .zip(bounds.iter())
            .map(|(&c, &max)| {
                let jitter = rng.gen_range(-(radius.ceil() as i64)..=radius.ceil() as i64);
                (c + jitter).clamp(0, max as i64)
            })
            .collect();
        if lp_distance(center, &candidate, p) <= radius && !found.contains(&candidate) {
            found.push(candidate);
        }
    }
    found
}

fn slice_crossover(a: &[i64], b: &[i64], k: usize, rng: &mut StdRng) -> (Vec<i64>, Vec<i64>) {
    let len = a.len().min(b.len());
    if k == 0 || k >= len {
        return (a.to_vec(), b.to_vec());
    }
    let start = rng.gen_range(0..=(len - k));
    let mut out_a = a.to_vec();
    let mut out_b = b.to_vec();
    for i in start..start + k {
        out_a[i] = b[i];
        out_b[i] = a[i];
    }
    (out_a, out_b)
}

fn project(x: &[f64], bounds: &[usize]) -> Vec<i64> {
    x.iter()
        .zip(bounds.iter())
        .map(|(&v, &max)| v.round().clamp(0.0, max as f64) as i64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::kpn::Process;
    use crate::domain::platform::{FrequencyDomain, Processor, Scheduler};
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
            processor_groups: HashMap::new(),
            schedulers: vec![Scheduler { name: "s".into(), policy: "fifo".into(), processors: vec!["p0".into(), "p1".into()] }],
            primitives: vec![],
            primitive_groups: HashMap::new(),
        })
    }

    fn kpn_with_two_processes() -> Arc<KpnGraph> {
        Arc::new(KpnGraph {
            name: "k".into(),
            processes: vec![Process { name: "a".into() }, Process { name: "b".into() }],
            channels: vec![],
        })
    }

    #[test]
    fn round_trips_through_vector() {
        let rep = SimpleVector::new(platform_with_two_processors(), kpn_with_two_processes(), false, 2.0);
        let mapping = rep.from_vector(&[0, 1]).unwrap();
        let vector = rep.to_vector(&mapping).unwrap();
        assert_eq!(vector, vec![0, 1]);
    }

    #[test]
    fn rejects_out_of_range_vector() {
        let rep = SimpleVector::new(platform_with_two_processors(), kpn_with_two_processes(), false, 2.0);
        assert!(rep.from_vector(&[0, 5]).is_err());
    }

    #[test]
    fn ball_samples_stay_within_radius() {
        let rep = SimpleVector::new(platform_with_two_processors(), kpn_with_two_processes(), false, 2.0);
        let mut rng = StdRng::seed_from_u64(7);
        let samples = rep.uniform_from_ball(&[0, 0], 1.0, 5, &mut rng);
        for sample in &samples {
            assert!(rep.distance(&[0, 0], sample) <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn crossover_swaps_a_contiguous_slice() {
        let rep = SimpleVector::new(platform_with_two_processors(), kpn_with_two_processes(), false, 2.0);
        let mut rng = StdRng::seed_from_u64(1);
        let (a2, b2) = rep.crossover(&[0, 0], &[1, 1], 1, &mut rng);
        assert_ne!(a2, vec![0, 0]);
        assert_eq!(a2.len(), 2);
        assert_eq!(b2.len(), 2);
    }

    #[test]
    fn metric_space_treats_same_scheduler_as_close() {
        let rep = MetricSpace::new(platform_with_two_processors(), kpn_with_two_processes(), false, 1.0);
        let d = rep.distance(&[0, 0], &[1, 0]);
        assert_eq!(d, 1.0);
    }
}
