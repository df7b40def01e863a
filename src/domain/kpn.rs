// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The Kahn Process Network graph: processes and FIFO channels.

/// A single KPN process. Processes carry no behavior here — the behavior
/// comes from the trace generator; the graph only records identity and
/// connectivity.
#[derive(Debug, Clone, PartialEq)]
pub struct Process {
    pub name: String,
}

/// A FIFO channel from one source process to one or more sink processes.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub name: String,
    pub token_size: u64,
    pub source: String,
    pub sinks: Vec<String>,
}

/// The KPN graph: a set of processes and a set of channels connecting them.
#[derive(Debug, Clone)]
pub struct KpnGraph {
    pub name: String,
    pub processes: Vec<Process>,
    pub channels: Vec<Channel>,
}

impl KpnGraph {
    pub fn process(&self, name: &str) -> Option<&Process> {
        self.processes.iter().find(|p| p.name == name)
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name == name)
    }

    /// Processes sorted by name, the canonical order used by representations.
    pub fn processes_sorted(&self) -> Vec<&Process> {
        let mut v: Vec<&Process> = self.processes.iter().collect();
        v.sort_by(|a, b| a.name.cmp(&b.name));
        v
    }

    pub fn channels_sorted(&self) -> Vec<&Channel> {
        let mut v: Vec<&Channel> = self.channels.iter().collect();
        v.sort_by(|a, b| a.name.cmp(&b.name));
        v
    }

    /// Channels whose source is `process_name`.
    pub fn outgoing(&self, process_name: &str) -> Vec<&Channel> {
        self.channels
            .iter()
            .filter(|c| c.source == process_name)
            .collect()
    }

    /// Channels for which `process_name` is a sink.
    pub fn incoming(&self, process_name: &str) -> Vec<&Channel> {
        self.channels
            .iter()
            .filter(|c| c.sinks.iter().any(|s| s == process_name))
            .collect()
    }
}
