// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Scenario loading and run configuration: the ambient layer between a YAML
//! file on disk and the in-memory domain model the engine operates on.

pub mod loader;
pub mod run_config;
pub mod scenario;
pub mod validation;

pub use loader::{load_scenario, LoadedScenario, TraceSpec};
pub use run_config::{Mapper, RepresentationKind, RunConfig};
