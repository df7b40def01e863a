// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The in-memory domain model: platform, KPN graph, trace, and mapping.

pub mod kpn;
pub mod mapping;
pub mod platform;
pub mod trace;

pub use kpn::{Channel, KpnGraph, Process};
pub use mapping::{ChannelMappingInfo, Mapping, ProcessMappingInfo};
pub use platform::{FrequencyDomain, Platform, PowerModel, Primitive, Processor, Scheduler};
pub use trace::{EmptyTraceGenerator, RandomTraceGenerator, StaticTraceGenerator, TraceGenerator, TraceSegment};
