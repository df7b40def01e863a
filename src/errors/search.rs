// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors local to a single search engine's loop.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("could not find a distinct neighbor within radius growth bound (radius grew past {limit} starting from {initial})")]
    MutationExhausted { initial: f64, limit: f64 },

    #[error("design centering found no center meeting the hitting-probability threshold {threshold}; returning last candidate")]
    NoFeasibleCenter { threshold: f64 },

    #[error(transparent)]
    Mapping(#[from] crate::errors::MappingError),

    #[error(transparent)]
    Oracle(#[from] crate::errors::OracleError),
}
