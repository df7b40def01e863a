// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The cost oracle: a memoized, optionally parallel simulator front-end.
//!
//! Search engines never call a simulator directly — they go through a
//! [`SimulationManager`], which deduplicates repeated requests for the same
//! mapping, fans work out across worker tasks, and tracks hit/miss
//! statistics. The actual cost computation is delegated to a
//! [`SimulatorBackend`]; [`TraceGraphBackend`] is the one this crate ships.

mod backend;
mod cache;

pub use backend::TraceGraphBackend;
pub use cache::MappingCache;

use crate::domain::mapping::Mapping;
use crate::errors::OracleError;
use crate::observability::messages::{
    oracle::{CacheHit, SimulationBatchStarted, SimulationFailed},
    StructuredLog,
};
use crate::representation::Representation;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

/// The outcome of simulating one mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    /// Execution time in picoseconds, as reported by the trace-graph's
    /// critical path (or an external simulator's equivalent).
    pub exec_time: u64,
    pub static_energy: f64,
    pub dynamic_energy: f64,
    /// Count of cores of each processor kind used by the mapping.
    pub resources: HashMap<String, usize>,
}

/// The cost computation a [`SimulationManager`] delegates to. Implementors
/// must be safe to share across worker tasks; the manager wraps them in an
/// `Arc` and calls `simulate_one` from however many tasks `jobs` allows.
pub trait SimulatorBackend: Send + Sync {
    fn simulate_one(&self, mapping: &Mapping) -> Result<SimulationResult, OracleError>;
}

/// Running totals the manager keeps as it serves `simulate` calls.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub total: u64,
    pub cached: u64,
    pub simulated: u64,
    pub best_exec_time: Option<u64>,
}

impl Statistics {
    fn record_cache_hit(&mut self) {
        self.total += 1;
        self.cached += 1;
    }

    fn record_simulation(&mut self, result: &SimulationResult) {
        self.total += 1;
        self.simulated += 1;
        self.best_exec_time = Some(self.best_exec_time.map_or(result.exec_time, |b| b.min(result.exec_time)));
    }
}

/// Memoized, optionally parallel front-end over a [`SimulatorBackend`].
///
/// A mapping is identified by its canonical vector form (`Mapping::to_list`
/// with channels included), so two different representation vectors that
/// decode to the same mapping share one cache entry and, under concurrent
/// load, one in-flight simulation.
pub struct SimulationManager {
    backend: Arc<dyn SimulatorBackend>,
    cache: Arc<Mutex<MappingCache>>,
    stats: Arc<Mutex<Statistics>>,
    parallel: bool,
    jobs: usize,
    chunk_size: usize,
}

impl SimulationManager {
    pub fn new(backend: Arc<dyn SimulatorBackend>, parallel: bool, jobs: usize, chunk_size: usize) -> Self {
        Self {
            backend,
            cache: Arc::new(Mutex::new(MappingCache::new())),
            stats: Arc::new(Mutex::new(Statistics::default())),
            parallel,
            jobs: jobs.max(1),
            chunk_size: chunk_size.max(1),
        }
    }

    pub async fn statistics(&self) -> Statistics {
        self.stats.lock().await.clone()
    }

    pub async fn load_cache(&self, path: &str) -> Result<(), OracleError> {
        let loaded = MappingCache::from_csv(path)?;
        *self.cache.lock().await = loaded;
        Ok(())
    }

    pub async fn dump_cache(&self, path: &str) -> Result<(), OracleError> {
        self.cache.lock().await.to_csv(path)
    }

    /// Evaluates every vector, decoding it under `representation` first.
    /// Results are returned in input order regardless of how cache hits and
    /// simulations interleave. Duplicate vectors within one batch (common in
    /// GA offspring, which mutates from a shared parent pool) are collapsed
    /// to a single simulation per distinct mapping key.
    pub async fn simulate(
        &self,
        representation: &dyn Representation,
        vectors: &[Vec<i64>],
    ) -> Result<Vec<SimulationResult>, OracleError> {
        let mut keys = Vec::with_capacity(vectors.len());
        for vector in vectors {
            let mapping = representation.from_vector(vector)?;
            let key = mapping.to_list(true)?.into_iter().map(|i| i as i64).collect::<Vec<_>>();
            keys.push((key, mapping));
        }

        let mut results: Vec<Option<SimulationResult>> = vec![None; keys.len()];
        let mut pending_indices: HashMap<Vec<i64>, Vec<usize>> = HashMap::new();
        let mut pending_order: Vec<Vec<i64>> = Vec::new();
        let mut pending_mappings: HashMap<Vec<i64>, Mapping> = HashMap::new();

        for (i, (key, mapping)) in keys.iter().enumerate() {
            if let Some(cached) = self.cache.lock().await.get(key) {
                CacheHit { key }.log();
                self.stats.lock().await.record_cache_hit();
                results[i] = Some(cached);
            } else {
                if !pending_indices.contains_key(key) {
                    pending_order.push(key.clone());
                    pending_mappings.insert(key.clone(), mapping.clone());
                }
                pending_indices.entry(key.clone()).or_default().push(i);
            }
        }

        if pending_indices.is_empty() {
            return Ok(results.into_iter().map(Option::unwrap).collect());
        }

        SimulationBatchStarted { pending: pending_order.len(), parallel: self.parallel, jobs: self.jobs }.log();

        let distinct: Vec<(Vec<i64>, Mapping)> =
            pending_order.into_iter().map(|key| { let mapping = pending_mappings.remove(&key).expect("mapping recorded alongside key"); (key, mapping) }).collect();

        if self.parallel {
            self.simulate_parallel(&distinct, &pending_indices, &mut results).await?;
        } else {
            for (key, mapping) in &distinct {
                let result = self.simulate_and_cache(key, mapping).await?;
                for &i in &pending_indices[key] {
                    results[i] = Some(result.clone());
                }
            }
        }

        Ok(results.into_iter().map(Option::unwrap).collect())
    }

    async fn simulate_parallel(
        &self,
        distinct: &[(Vec<i64>, Mapping)],
        pending_indices: &HashMap<Vec<i64>, Vec<usize>>,
        results: &mut [Option<SimulationResult>],
    ) -> Result<(), OracleError> {
        let order: Vec<usize> = (0..distinct.len()).collect();
        for batch in order.chunks(self.chunk_size) {
            let mut batch_queue: Vec<usize> = batch.to_vec();
            let mut joins: JoinSet<(Vec<i64>, Result<SimulationResult, OracleError>)> = JoinSet::new();
            let mut in_flight = 0usize;

            while !batch_queue.is_empty() || in_flight > 0 {
                while in_flight < self.jobs && !batch_queue.is_empty() {
                    let d = batch_queue.remove(0);
                    let backend = self.backend.clone();
                    let key = distinct[d].0.clone();
                    let mapping = distinct[d].1.clone();
                    let key_for_task = key.clone();
                    joins.spawn(async move {
                        let result = tokio::task::spawn_blocking(move || backend.simulate_one(&mapping))
                            .await
                            .unwrap_or_else(|e| Err(OracleError::SimulationFailed { key: key_for_task, reason: e.to_string() }));
                        (key, result)
                    });
                    in_flight += 1;
                }

                let Some(joined) = joins.join_next().await else { break };
                in_flight -= 1;
                let (key, result) = joined.map_err(|e| OracleError::SimulationFailed { key: vec![], reason: e.to_string() })?;
                let result = result.map_err(|e| {
                    SimulationFailed { key: &key, reason: &e.to_string() }.log();
                    e
                })?;
                self.stats.lock().await.record_simulation(&result);
                self.cache.lock().await.insert(key.clone(), result.clone());
                for &i in &pending_indices[&key] {
                    results[i] = Some(result.clone());
                }
            }
        }
        Ok(())
    }

    async fn simulate_and_cache(&self, key: &[i64], mapping: &Mapping) -> Result<SimulationResult, OracleError> {
        let result = self.backend.simulate_one(mapping).map_err(|e| {
            SimulationFailed { key, reason: &e.to_string() }.log();
            e
        })?;
        self.stats.lock().await.record_simulation(&result);
        self.cache.lock().await.insert(key.to_vec(), result.clone());
        Ok(result)
    }
}
