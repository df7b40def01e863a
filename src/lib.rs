// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;         // scenario loading + run configuration
pub mod domain;         // platform, KPN graph, mapping, trace model
pub mod errors;         // error handling
pub mod generators;     // mapping generators
pub mod observability;  // structured logging
pub mod oracle;         // memoized simulation front-end
pub mod representation; // geometric encodings of the mapping space
pub mod search;         // search engines
pub mod tracegraph;     // per-mapping trace-graph construction and critical path
