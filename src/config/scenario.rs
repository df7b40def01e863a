// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The on-disk scenario schema: a platform, a KPN graph, and a trace
//! configuration, deserialized from a single YAML document via `serde_yaml`.
//!
//! This is deliberately small next to the industrial platform/KPN XML
//! formats it stands in for — just enough structure to drive the engine
//! end-to-end from the CLI and from tests without a stub assembled in Rust
//! source.

use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
pub struct ScenarioFile {
    pub platform: PlatformConfig,
    pub kpn: KpnConfig,
    pub trace: TraceConfig,
}

#[derive(Debug, Deserialize)]
pub struct PlatformConfig {
    pub processors: Vec<ProcessorConfig>,
    #[serde(default)]
    pub processor_groups: HashMap<u32, Vec<String>>,
    pub schedulers: Vec<SchedulerConfig>,
    #[serde(default)]
    pub primitives: Vec<PrimitiveConfig>,
    #[serde(default)]
    pub primitive_groups: HashMap<u32, Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ProcessorConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub frequency_hz: f64,
    pub static_power_w: Option<f64>,
    pub dynamic_energy_per_cycle_j: Option<f64>,
    #[serde(default)]
    pub context_load_cycles: u64,
    #[serde(default)]
    pub context_store_cycles: u64,
}

#[derive(Debug, Deserialize)]
pub struct SchedulerConfig {
    pub id: String,
    #[serde(default = "default_policy")]
    pub policy: String,
    pub processors: Vec<String>,
}

fn default_policy() -> String {
    "fifo".to_string()
}

#[derive(Debug, Deserialize)]
pub struct PrimitiveConfig {
    pub id: String,
    pub group_id: u32,
    pub suitable: Vec<SuitableConfig>,
    pub read_cost: u64,
    pub write_cost: u64,
}

#[derive(Debug, Deserialize)]
pub struct SuitableConfig {
    pub source: String,
    pub sinks: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct KpnConfig {
    pub processes: Vec<String>,
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ChannelConfig {
    pub id: String,
    #[serde(default = "default_token_size")]
    pub token_size: u64,
    pub source: String,
    pub sinks: Vec<String>,
}

fn default_token_size() -> u64 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceConfig {
    Static {
        segments: HashMap<String, Vec<SegmentConfig>>,
    },
    Random {
        expected_firings: u64,
        min_cycles: u64,
        max_cycles: u64,
        seed: Option<u64>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SegmentConfig {
    Compute { cycles: u64 },
    Read { channel: String, n_tokens: u64 },
    Write { channel: String, n_tokens: u64 },
    Terminate,
}
