// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Search-engine lifecycle and per-generation progress events.

use super::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

pub struct SearchStarted<'a> {
    pub strategy: &'a str,
    pub process_count: usize,
    pub processor_count: usize,
}

impl Display for SearchStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "starting {} search over {} processes onto {} processors",
            self.strategy, self.process_count, self.processor_count
        )
    }
}

impl StructuredLog for SearchStarted<'_> {
    fn log(&self) {
        tracing::info!(
            strategy = self.strategy,
            process_count = self.process_count,
            processor_count = self.processor_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("search", span_name = name, strategy = self.strategy)
    }
}

pub struct SearchCompleted<'a> {
    pub strategy: &'a str,
    pub best_exec_time: u64,
    pub evaluations: u64,
    pub duration: Duration,
}

impl Display for SearchCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} search completed: best exec_time={}ps over {} evaluation(s) in {:?}",
            self.strategy, self.best_exec_time, self.evaluations, self.duration
        )
    }
}

impl StructuredLog for SearchCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            strategy = self.strategy,
            best_exec_time = self.best_exec_time,
            evaluations = self.evaluations,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("search_completed", span_name = name, strategy = self.strategy)
    }
}

pub struct GenerationSummary {
    pub generation: usize,
    pub best_fitness: f64,
    pub hall_of_fame_size: usize,
}

impl Display for GenerationSummary {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "generation {}: best_fitness={:.3} hall_of_fame={}",
            self.generation, self.best_fitness, self.hall_of_fame_size
        )
    }
}

impl StructuredLog for GenerationSummary {
    fn log(&self) {
        tracing::info!(
            generation = self.generation,
            best_fitness = self.best_fitness,
            hall_of_fame_size = self.hall_of_fame_size,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("generation", span_name = name, generation = self.generation)
    }
}

pub struct DesignCenteringFallback {
    pub threshold: f64,
    pub empirical_p: f64,
}

impl Display for DesignCenteringFallback {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "design centering found no center meeting hitting-probability threshold {} (last candidate empirical_p={:.3}); returning last candidate",
            self.threshold, self.empirical_p
        )
    }
}

impl StructuredLog for DesignCenteringFallback {
    fn log(&self) {
        tracing::warn!(threshold = self.threshold, empirical_p = self.empirical_p, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("design_centering_fallback", span_name = name)
    }
}

pub struct ConstraintViolation<'a> {
    pub context: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ConstraintViolation<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "constraint violation in {}: {}", self.context, self.error)
    }
}

impl StructuredLog for ConstraintViolation<'_> {
    fn log(&self) {
        tracing::warn!(context = self.context, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("constraint_violation", span_name = name, context = self.context)
    }
}
