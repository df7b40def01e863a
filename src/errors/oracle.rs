// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors originating from the simulator backend.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("simulator backend failed for mapping key {key:?}: {reason}")]
    SimulationFailed { key: Vec<i64>, reason: String },

    #[error(transparent)]
    Mapping(#[from] crate::errors::MappingError),

    #[error("failed to write mapping cache to {path}: {source}")]
    CacheWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read mapping cache from {path}: {source}")]
    CacheRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed mapping cache row: {0}")]
    MalformedCacheRow(String),
}
