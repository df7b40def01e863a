// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error taxonomy for the design-space-exploration engine.
//!
//! Errors are split by the concern that raises them, mirroring how the rest of
//! the crate is organized: configuration problems are caught before a search
//! starts, constraint violations are caught while building or applying a
//! mapping, search-exhaustion errors are local to one search engine's loop,
//! and oracle errors originate from the (possibly external) simulator.

mod config;
mod mapping;
mod oracle;
mod search;

pub use config::ConfigError;
pub use mapping::MappingError;
pub use oracle::OracleError;
pub use search::SearchError;

/// Top-level error composing every concern, used at the CLI boundary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Mapping(#[from] MappingError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Oracle(#[from] OracleError),
}
