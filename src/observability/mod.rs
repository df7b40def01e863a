// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structured logging for the exploration engine.
//!
//! Diagnostic events are modeled as small message structs implementing
//! `Display`, rather than ad hoc `format!` strings scattered through the
//! engine. See `messages` for the catalog.

pub mod messages;
