// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Cache and simulation-dispatch events from the cost oracle.

use super::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

pub struct CacheHit<'a> {
    pub key: &'a [i64],
}

impl Display for CacheHit<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "cache hit for mapping {:?}", self.key)
    }
}

impl StructuredLog for CacheHit<'_> {
    fn log(&self) {
        tracing::debug!(key = ?self.key, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("cache_hit", span_name = name, key = ?self.key)
    }
}

pub struct SimulationBatchStarted {
    pub pending: usize,
    pub parallel: bool,
    pub jobs: usize,
}

impl Display for SimulationBatchStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "dispatching {} simulation(s), parallel={} jobs={}",
            self.pending, self.parallel, self.jobs
        )
    }
}

impl StructuredLog for SimulationBatchStarted {
    fn log(&self) {
        tracing::info!(pending = self.pending, parallel = self.parallel, jobs = self.jobs, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("simulation_batch", span_name = name, pending = self.pending, jobs = self.jobs)
    }
}

pub struct SimulationFailed<'a> {
    pub key: &'a [i64],
    pub reason: &'a str,
}

impl Display for SimulationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "simulation failed for mapping {:?}: {}", self.key, self.reason)
    }
}

impl StructuredLog for SimulationFailed<'_> {
    fn log(&self) {
        tracing::error!(key = ?self.key, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("simulation_failed", span_name = name, key = ?self.key, reason = self.reason)
    }
}
