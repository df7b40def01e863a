// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors surfaced while loading and validating a scenario, or while
//! resolving the run configuration, before any search begins.

use thiserror::Error;

/// Errors that abort a run before search starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unrecognized representation '{0}'; available: simple_vector, metric_space")]
    UnknownRepresentation(String),

    #[error("crossover_rate ({rate}) cannot exceed the number of processes ({num_processes})")]
    CrossoverRateTooLarge { rate: usize, num_processes: usize },

    #[error("no optimization objectives are enabled")]
    NoObjectivesEnabled,

    #[error("failed to parse scenario file {path}: {source}")]
    ScenarioParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to read scenario file {path}: {source}")]
    ScenarioIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("duplicate processor id '{0}' in platform")]
    DuplicateProcessorId(String),

    #[error("duplicate scheduler id '{0}' in platform")]
    DuplicateSchedulerId(String),

    #[error("duplicate primitive id '{0}' in platform")]
    DuplicatePrimitiveId(String),

    #[error("duplicate process id '{0}' in kpn graph")]
    DuplicateProcessId(String),

    #[error("duplicate channel id '{0}' in kpn graph")]
    DuplicateChannelId(String),

    #[error("scheduler '{scheduler}' references unknown processor '{processor}'")]
    SchedulerUnknownProcessor { scheduler: String, processor: String },

    #[error("channel '{channel}' references unknown source process '{process}'")]
    ChannelUnknownSource { channel: String, process: String },

    #[error("channel '{channel}' references unknown sink process '{process}'")]
    ChannelUnknownSink { channel: String, process: String },

    #[error("channel '{channel}' has no sink processes")]
    ChannelNoSinks { channel: String },

    #[error("primitive '{primitive}' references unknown processor '{processor}'")]
    PrimitiveUnknownProcessor { primitive: String, processor: String },

    #[error("mapper '{0}' is not a recognized search engine")]
    UnknownMapper(String),

    #[error("invalid temperature proportionality constant {0}: must lie strictly between 0 and 1")]
    InvalidCoolingFactor(f64),
}
