// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for structured logging, organized by subsystem:
//! * `oracle` — cache hits/misses, simulation dispatch
//! * `engine` — search-engine lifecycle and generation summaries
//! * `validation` — scenario validation warnings and errors

pub mod engine;
pub mod oracle;
pub mod validation;

use tracing::Span;

/// Implemented by every diagnostic message: `Display` renders the
/// human-readable line, `log`/`span` expose the same data as structured
/// fields for querying and tracing.
pub trait StructuredLog {
    fn log(&self);
    fn span(&self, name: &str) -> Span;
}
