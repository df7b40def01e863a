// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised while constructing or validating a single mapping.

use thiserror::Error;

/// Constraint-violation errors; fatal for the one mapping being built, not
/// for the overall search.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("no communication primitive is suitable for channel '{channel}' (source {source_process}, sinks [{sinks}])")]
    NoSuitablePrimitive {
        channel: String,
        source_process: String,
        sinks: String,
    },

    #[error("processor '{processor}' does not belong to scheduler '{scheduler}' for process '{process}'")]
    ProcessorNotInScheduler {
        process: String,
        processor: String,
        scheduler: String,
    },

    #[error("process '{0}' has no compatible scheduler on this platform")]
    NoCompatibleScheduler(String),

    #[error("representation vector has wrong length: expected {expected}, got {actual}")]
    WrongVectorLength { expected: usize, actual: usize },

    #[error("vector slot {index} value {value} is out of range [0, {max}]")]
    SlotOutOfRange { index: usize, value: i64, max: usize },

    #[error("process '{0}' is unmapped")]
    UnmappedProcess(String),

    #[error("channel '{0}' is unmapped")]
    UnmappedChannel(String),

    #[error("no valid processor group available for process '{0}'")]
    NoValidProcessorGroup(String),

    #[error("no valid primitive group available for channel '{0}'")]
    NoValidPrimitiveGroup(String),

    #[error("critical path has not been determined yet; call critical_path() first")]
    CriticalPathNotDetermined,
}
