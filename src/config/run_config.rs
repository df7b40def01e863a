// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The resolved run configuration the CLI hands to the engine: everything
//! needed to load a scenario, build a representation and search engine, and
//! persist the resulting artifacts.

use crate::errors::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mapper {
    RandomWalk,
    Genetic,
    SimulatedAnnealing,
    GradientDescent,
    DesignCentering,
}

impl Mapper {
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name {
            "random_walk" => Ok(Mapper::RandomWalk),
            "genetic" => Ok(Mapper::Genetic),
            "sa" => Ok(Mapper::SimulatedAnnealing),
            "gd" => Ok(Mapper::GradientDescent),
            "dc" => Ok(Mapper::DesignCentering),
            other => Err(ConfigError::UnknownMapper(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepresentationKind {
    SimpleVector,
    MetricSpace,
}

impl RepresentationKind {
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name {
            "simple_vector" => Ok(RepresentationKind::SimpleVector),
            "metric_space" => Ok(RepresentationKind::MetricSpace),
            other => Err(ConfigError::UnknownRepresentation(other.to_string())),
        }
    }
}

/// Resolved configuration for one run: every flag described in the CLI
/// surface, engine-specific parameters included.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub platform_path: String,
    pub mapper: Mapper,
    pub representation: RepresentationKind,
    pub include_channels: bool,
    pub outdir: String,
    pub random_seed: u64,
    pub parallel: bool,
    pub jobs: usize,
    pub chunk_size: usize,
    pub dump_cache: bool,
    pub load_cache: Option<String>,
    pub record_statistics: bool,

    pub random_walk_samples: usize,

    pub ga_mu: usize,
    pub ga_generations: usize,
    pub ga_cxpb: f64,
    pub ga_mutpb: f64,
    pub ga_tournsize: usize,
    pub ga_crossover_rate: usize,
    pub ga_mu_plus_lambda: bool,
    pub ga_initial_radius: f64,

    pub sa_t0: f64,
    pub sa_tf: f64,
    pub sa_cooling_factor: f64,

    pub gd_iterations: usize,
    pub gd_stepsize: f64,

    pub dc_max_samples: usize,
    pub dc_adapt_samples: usize,
    pub dc_p_threshold: f64,
    pub dc_initial_radius: f64,
    pub dc_threshold_exec_time: u64,
    pub dc_p_target_points: Vec<f64>,
    pub dc_step_width_points: Vec<f64>,

    pub obj_exec_time: bool,
    pub obj_static_energy: bool,
    pub obj_dynamic_energy: bool,
    pub obj_resource_kinds: Vec<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            platform_path: String::new(),
            mapper: Mapper::RandomWalk,
            representation: RepresentationKind::SimpleVector,
            include_channels: true,
            outdir: ".".to_string(),
            random_seed: 0,
            parallel: false,
            jobs: 1,
            chunk_size: 16,
            dump_cache: false,
            load_cache: None,
            record_statistics: true,

            random_walk_samples: 100,

            ga_mu: 20,
            ga_generations: 10,
            ga_cxpb: 0.5,
            ga_mutpb: 0.3,
            ga_tournsize: 3,
            ga_crossover_rate: 1,
            ga_mu_plus_lambda: true,
            ga_initial_radius: 1.0,

            sa_t0: 10.0,
            sa_tf: 0.1,
            sa_cooling_factor: 0.9,

            gd_iterations: 50,
            gd_stepsize: 1.0,

            dc_max_samples: 50,
            dc_adapt_samples: 10,
            dc_p_threshold: 0.5,
            dc_initial_radius: 2.0,
            dc_threshold_exec_time: u64::MAX,
            dc_p_target_points: vec![0.9, 0.7, 0.5, 0.3],
            dc_step_width_points: vec![0.5, 0.3, 0.2, 0.1],

            obj_exec_time: true,
            obj_static_energy: false,
            obj_dynamic_energy: false,
            obj_resource_kinds: Vec::new(),
        }
    }
}

impl RunConfig {
    pub fn validate(&self, num_processes: usize) -> Result<(), ConfigError> {
        if self.ga_crossover_rate > num_processes {
            return Err(ConfigError::CrossoverRateTooLarge { rate: self.ga_crossover_rate, num_processes });
        }
        if !(0.0..1.0).contains(&self.sa_cooling_factor) {
            return Err(ConfigError::InvalidCoolingFactor(self.sa_cooling_factor));
        }
        if !self.obj_exec_time && !self.obj_static_energy && !self.obj_dynamic_energy && self.obj_resource_kinds.is_empty() {
            return Err(ConfigError::NoObjectivesEnabled);
        }
        Ok(())
    }
}
