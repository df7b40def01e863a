// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Search engines: strategies for exploring the mapping space via the
//! oracle. Each submodule owns its own `Config` and result type; callers
//! pick one by name through [`crate::config::RunConfig`].

mod common;

pub mod design_centering;
pub mod genetic;
pub mod gradient_descent;
pub mod random_walk;
pub mod simulated_annealing;
