// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The trace graph: a weighted DAG whose longest path is the execution time
//! of a mapping.
//!
//! Each KPN process is unrolled into a chain of per-segment nodes as its
//! trace generator is drained; channel accesses add cross-process edges
//! between those chains. Once built, the longest path through the graph
//! (start node to end node) gives the execution time of the mapping that
//! produced the trace; [`TraceGraph::change_element_mapping`] lets a search
//! engine re-weight the path for a single remapped process or channel
//! without rebuilding the whole trace.

use crate::domain::kpn::KpnGraph;
use crate::domain::platform::{Platform, Processor};
use crate::domain::trace::{TraceGenerator, TraceSegment};
use crate::errors::MappingError;
use std::collections::{HashMap, HashSet};

const START: &str = "V_s";
const END: &str = "V_e";

/// The relationship an edge in a trace graph represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeType {
    /// Two segments of the same process, executed back to back.
    SequentialOrder,
    /// A process segment waiting on a value it is about to read.
    ReadAfterCompute,
    /// A write segment blocking until the channel has room to accept it.
    BlockRead,
    /// A write segment's producer unblocking once the prior value on the
    /// same channel has been consumed.
    UnblockRead,
    /// Reserved for buffer-capacity backpressure; unused until channel
    /// capacities are modeled.
    BlockWrite,
    /// An edge to or from the graph's synthetic start/end node.
    RootOrLeaf,
}

/// How to pick the dominant hardware resource among several candidate
/// groups a process or channel has been mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlowestPolicy {
    /// Use the group with the numerically highest group id, regardless of
    /// its actual cost. This is the default: it matches how group ids are
    /// assigned in practice (slower resources tend to be registered later)
    /// without requiring a cost model to be comparable across groups.
    #[default]
    MaxGroupId,
    /// Use the group whose read/write cost is actually highest. Opt into
    /// this when group ids do not correlate with cost.
    CostAware,
}

#[derive(Debug, Clone)]
struct EdgeData {
    edge_type: EdgeType,
    weight: i64,
    cycles: Option<u64>,
}

/// A built trace graph. Nodes are addressed by string id: `V_s`/`V_e` for
/// the synthetic start/end nodes, `"{process}_{n}"` for a process's n-th
/// segment, and `"r_{channel}_{n}"` for the n-th access marker on a channel.
#[derive(Debug, Clone, Default)]
pub struct TraceGraph {
    successors: HashMap<String, Vec<String>>,
    edges: HashMap<(String, String), EdgeData>,
    kpn_element: HashMap<String, Option<String>>,
    critical_path_nodes: Option<Vec<String>>,
}

impl TraceGraph {
    fn new() -> Self {
        let mut graph = Self::default();
        graph.add_node(START);
        graph.add_node(END);
        graph
    }

    fn add_node(&mut self, name: &str) {
        self.successors.entry(name.to_string()).or_default();
        self.kpn_element.entry(name.to_string()).or_insert(None);
    }

    fn set_kpn_element(&mut self, node: &str, element: &str) {
        self.add_node(node);
        self.kpn_element.insert(node.to_string(), Some(element.to_string()));
    }

    fn add_edge(&mut self, from: &str, to: &str, edge_type: EdgeType, weight: i64, cycles: Option<u64>) {
        self.add_node(from);
        self.add_node(to);
        let succs = self.successors.get_mut(from).unwrap();
        if !succs.iter().any(|s| s == to) {
            succs.push(to.to_string());
        }
        self.edges.insert(
            (from.to_string(), to.to_string()),
            EdgeData { edge_type, weight, cycles },
        );
    }

    pub fn node_count(&self) -> usize {
        self.successors.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn kpn_element_of(&self, node: &str) -> Option<&str> {
        self.kpn_element.get(node).and_then(|o| o.as_deref())
    }

    pub fn edge_type(&self, from: &str, to: &str) -> Option<EdgeType> {
        self.edges.get(&(from.to_string(), to.to_string())).map(|e| e.edge_type)
    }

    pub fn edge_weight(&self, from: &str, to: &str) -> Option<i64> {
        self.edges.get(&(from.to_string(), to.to_string())).map(|e| e.weight)
    }

    /// Kahn's-algorithm topological sort over the forward adjacency lists,
    /// breaking ties by node name so the result is reproducible. Returns
    /// `None` if the graph contains a cycle, which never happens for a
    /// graph produced by [`build`] but is checked anyway since
    /// [`Self::critical_path`] depends on acyclicity.
    fn topological_sort(&self) -> Option<Vec<String>> {
        let mut in_degree: HashMap<String, usize> =
            self.successors.keys().map(|k| (k.clone(), 0)).collect();
        for succs in self.successors.values() {
            for succ in succs {
                *in_degree.entry(succ.clone()).or_insert(0) += 1;
            }
        }

        let mut queue: Vec<String> = in_degree
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(node, _)| node.clone())
            .collect();
        queue.sort();

        let mut result = Vec::with_capacity(in_degree.len());
        let mut cursor = 0;
        while cursor < queue.len() {
            let node = queue[cursor].clone();
            cursor += 1;
            result.push(node.clone());

            let mut ready = Vec::new();
            if let Some(succs) = self.successors.get(&node) {
                for succ in succs {
                    let count = in_degree.get_mut(succ).unwrap();
                    *count -= 1;
                    if *count == 0 {
                        ready.push(succ.clone());
                    }
                }
            }
            ready.sort();
            queue.extend(ready);
        }

        if result.len() == in_degree.len() {
            Some(result)
        } else {
            None
        }
    }

    /// Determines the longest path from `V_s` to `V_e` by relaxing edges in
    /// topological order, then walks predecessor pointers back to recover
    /// it. Returns the distinct KPN elements (processes and channels) on
    /// the path in first-visited order, the path's total weight, and the
    /// raw node id sequence. The node sequence is cached for a later
    /// [`Self::change_element_mapping`] call.
    pub fn critical_path(&mut self) -> (Vec<String>, i64, Vec<String>) {
        let order = self
            .topological_sort()
            .expect("trace graphs are acyclic by construction");

        let mut dist: HashMap<String, i64> = HashMap::new();
        let mut pred: HashMap<String, String> = HashMap::new();
        dist.insert(START.to_string(), 0);

        for node in &order {
            let Some(&d) = dist.get(node) else { continue };
            let Some(succs) = self.successors.get(node) else { continue };
            for succ in succs {
                let weight = self.edges[&(node.clone(), succ.clone())].weight;
                let candidate = d + weight;
                if candidate > *dist.get(succ).unwrap_or(&i64::MIN) {
                    dist.insert(succ.clone(), candidate);
                    pred.insert(succ.clone(), node.clone());
                }
            }
        }

        let length = *dist.get(END).unwrap_or(&0);

        let mut path = Vec::new();
        let mut cursor = END.to_string();
        path.push(cursor.clone());
        while cursor != START {
            cursor = pred.get(&cursor).cloned().unwrap_or_else(|| START.to_string());
            path.push(cursor.clone());
        }
        path.reverse();

        let mut elements = Vec::new();
        for node in &path {
            if node == START || node == END {
                continue;
            }
            if let Some(element) = self.kpn_element_of(node) {
                if !elements.iter().any(|e: &String| e == element) {
                    elements.push(element.to_string());
                }
            }
        }

        self.critical_path_nodes = Some(path.clone());
        (elements, length, path)
    }

    /// Recomputes the weight of every edge on the cached critical path that
    /// is affected by remapping `element_name` to `new_groups`, returning
    /// the path's new total length. With `definitive` set, the recomputed
    /// weights are written back into the graph; otherwise this is a
    /// side-effect-free "what if" query, used by search engines to score a
    /// candidate move before committing to it.
    ///
    /// Remapping a process only ever touches `SequentialOrder` edges
    /// (process compute time); remapping a channel only ever touches
    /// `ReadAfterCompute`/`BlockRead`/`UnblockRead` edges (channel access
    /// time) — which applies is determined purely by which edges on the
    /// path carry `element_name` as their relevant endpoint's KPN element,
    /// so the same method serves both cases.
    pub fn change_element_mapping(
        &mut self,
        element_name: &str,
        new_groups: &[u32],
        platform: &Platform,
        policy: SlowestPolicy,
        definitive: bool,
    ) -> Result<i64, MappingError> {
        let path = self
            .critical_path_nodes
            .clone()
            .ok_or(MappingError::CriticalPathNotDetermined)?;

        let mut total = 0i64;
        let mut last_node: Option<String> = None;

        for node in &path {
            if node == START {
                last_node = Some(node.clone());
                continue;
            }
            let prev = last_node.expect("non-start node always has a predecessor");
            let key = (prev.clone(), node.clone());
            let edge = &self.edges[&key];
            let edge_type = edge.edge_type;
            let mut new_weight = edge.weight;

            match edge_type {
                EdgeType::SequentialOrder if self.kpn_element_of(&prev) == Some(element_name) => {
                    if let Some(cycles) = edge.cycles {
                        let processor = slowest_processor(platform, new_groups, element_name)?;
                        new_weight = processor.ticks(cycles) as i64;
                    }
                }
                EdgeType::ReadAfterCompute if self.kpn_element_of(node) == Some(element_name) => {
                    new_weight = slowest_access(platform, new_groups, policy, false)? as i64;
                }
                EdgeType::BlockRead if self.kpn_element_of(node) == Some(element_name) => {
                    new_weight = slowest_access(platform, new_groups, policy, false)? as i64;
                }
                EdgeType::UnblockRead if self.kpn_element_of(&prev) == Some(element_name) => {
                    new_weight = slowest_access(platform, new_groups, policy, true)? as i64;
                }
                EdgeType::BlockWrite | EdgeType::RootOrLeaf => {}
                _ => {}
            }

            if definitive {
                self.edges.get_mut(&key).unwrap().weight = new_weight;
            }

            total += new_weight;
            last_node = Some(node.clone());
        }

        Ok(total)
    }
}

fn slowest_processor<'a>(
    platform: &'a Platform,
    groups: &[u32],
    element_name: &str,
) -> Result<&'a Processor, MappingError> {
    platform
        .slowest_processor_in_groups(groups)
        .ok_or_else(|| MappingError::NoValidProcessorGroup(element_name.to_string()))
}

fn slowest_access(
    platform: &Platform,
    groups: &[u32],
    policy: SlowestPolicy,
    read_access: bool,
) -> Result<u64, MappingError> {
    let primitive = match policy {
        SlowestPolicy::MaxGroupId => platform.slowest_primitive_in_groups_by_id(groups),
        SlowestPolicy::CostAware => platform.slowest_primitive_in_groups_by_cost(groups, read_access),
    }
    .ok_or_else(|| MappingError::NoValidPrimitiveGroup(format!("{groups:?}")))?;
    Ok(if read_access { primitive.read_cost } else { primitive.write_cost })
}

struct ProcessState {
    index: usize,
    last_segment: Option<TraceSegment>,
}

/// Builds the full trace graph for one mapping by draining `trace_generator`
/// for every process in `kpn` until each one terminates, round-robin, and
/// threading in cross-process edges for every channel access along the way.
///
/// `process_groups`/`channel_groups` give, for every process/channel, the
/// hardware group ids its current (possibly partial, multi-candidate)
/// mapping resolves to; [`SlowestPolicy`] picks which candidate in a group
/// dominates when more than one is given.
pub fn build(
    kpn: &KpnGraph,
    trace_generator: &mut dyn TraceGenerator,
    process_groups: &HashMap<String, Vec<u32>>,
    channel_groups: &HashMap<String, Vec<u32>>,
    platform: &Platform,
    policy: SlowestPolicy,
) -> Result<TraceGraph, MappingError> {
    let mut graph = TraceGraph::new();

    // channel name -> [next read-marker index, next write-marker index]
    let mut channel_counters: HashMap<String, [usize; 2]> = kpn
        .channels
        .iter()
        .map(|c| (c.name.clone(), [0usize, 0usize]))
        .collect();

    let mut process_state: HashMap<String, ProcessState> = kpn
        .processes
        .iter()
        .map(|p| (p.name.clone(), ProcessState { index: 0, last_segment: None }))
        .collect();

    let mut not_terminated: HashSet<String> = kpn.processes.iter().map(|p| p.name.clone()).collect();

    while !not_terminated.is_empty() {
        let names: Vec<String> = not_terminated.iter().cloned().collect();
        for process_name in names {
            let groups = process_groups
                .get(&process_name)
                .ok_or_else(|| MappingError::NoValidProcessorGroup(process_name.clone()))?;
            let processor = slowest_processor(platform, groups, &process_name)?;

            let Some(current_segment) = trace_generator.next_segment(&process_name, &processor.kind) else {
                continue;
            };

            let state = process_state.get_mut(&process_name).unwrap();
            let last_segment_index = state.index;
            let last_segment = state.last_segment.replace(current_segment.clone());

            if current_segment.is_terminate() {
                not_terminated.remove(&process_name);
                continue;
            }

            if last_segment_index == 0 {
                let node = format!("{process_name}_1");
                graph.add_edge(START, &node, EdgeType::RootOrLeaf, 0, None);
                graph.set_kpn_element(&node, &process_name);
            } else {
                let mut edge_weight = 0i64;
                let mut cycles = None;
                if let Some(ref segment) = last_segment {
                    if let Some(c) = segment.processing_cycles() {
                        edge_weight = processor.ticks(c) as i64;
                        cycles = Some(c);
                    }
                }
                let from = format!("{process_name}_{last_segment_index}");
                let to = format!("{process_name}_{}", last_segment_index + 1);
                graph.add_edge(&from, &to, EdgeType::SequentialOrder, edge_weight, cycles);
                graph.set_kpn_element(&from, &process_name);
                graph.set_kpn_element(&to, &process_name);
            }

            state.index += 1;
            let current_node = format!("{process_name}_{}", last_segment_index + 1);

            if let Some(ref segment) = last_segment {
                if let Some(channel_name) = segment.write_to_channel() {
                    let channel_group = channel_groups
                        .get(channel_name)
                        .ok_or_else(|| MappingError::NoValidPrimitiveGroup(channel_name.to_string()))?;
                    let read_time = slowest_access(platform, channel_group, policy, true)?;
                    let write_idx = channel_counters[channel_name][1].saturating_sub(1);
                    let from = format!("r_{channel_name}_{write_idx}");
                    graph.add_edge(&from, &current_node, EdgeType::UnblockRead, read_time as i64, None);
                    graph.set_kpn_element(&from, channel_name);
                    graph.set_kpn_element(&current_node, &process_name);
                }
            }

            if let Some(channel_name) = current_segment.write_to_channel() {
                let channel_group = channel_groups
                    .get(channel_name)
                    .ok_or_else(|| MappingError::NoValidPrimitiveGroup(channel_name.to_string()))?;
                let write_time = slowest_access(platform, channel_group, policy, false)?;
                let idx = channel_counters.get_mut(channel_name).unwrap()[1];
                let to = format!("r_{channel_name}_{idx}");
                graph.add_edge(&current_node, &to, EdgeType::BlockRead, write_time as i64, None);
                graph.set_kpn_element(&current_node, &process_name);
                graph.set_kpn_element(&to, channel_name);
                channel_counters.get_mut(channel_name).unwrap()[1] += 1;
            }

            if let Some(channel_name) = current_segment.read_from_channel() {
                let channel_group = channel_groups
                    .get(channel_name)
                    .ok_or_else(|| MappingError::NoValidPrimitiveGroup(channel_name.to_string()))?;
                let write_time = slowest_access(platform, channel_group, policy, false)?;
                let idx = channel_counters.get_mut(channel_name).unwrap()[0];
                let to = format!("r_{channel_name}_{idx}");
                graph.add_edge(&current_node, &to, EdgeType::ReadAfterCompute, write_time as i64, None);
                graph.set_kpn_element(&current_node, &process_name);
                graph.set_kpn_element(&to, channel_name);
                channel_counters.get_mut(channel_name).unwrap()[0] += 1;
            }
        }
    }

    let sinks: Vec<String> = graph
        .successors
        .iter()
        .filter(|(name, succs)| succs.is_empty() && name.as_str() != END)
        .map(|(name, _)| name.clone())
        .collect();
    for node in sinks {
        graph.add_edge(&node, END, EdgeType::RootOrLeaf, 0, None);
    }

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::kpn::{Channel, Process};
    use crate::domain::platform::{FrequencyDomain, Primitive, Scheduler};
    use crate::domain::trace::StaticTraceGenerator;

    fn processor(name: &str, hz: f64) -> Processor {
        Processor {
            name: name.to_string(),
            kind: "cpu".to_string(),
            frequency_domain: FrequencyDomain { name: format!("fd_{name}"), frequency_hz: hz },
            power_model: None,
            context_load_cycles: 0,
            context_store_cycles: 0,
        }
    }

    #[test]
    fn single_process_critical_path_sums_compute_ticks() {
        let platform = Platform {
            processors: vec![processor("p0", 1e9)],
            processor_groups: HashMap::from([(0, vec!["p0".to_string()])]),
            schedulers: vec![Scheduler {
                name: "s".into(),
                policy: "fifo".into(),
                processors: vec!["p0".into()],
            }],
            primitives: vec![],
            primitive_groups: HashMap::new(),
        };
        let kpn = KpnGraph {
            name: "k".into(),
            processes: vec![Process { name: "a".into() }],
            channels: vec![],
        };
        let mut scripts = HashMap::new();
        scripts.insert(
            "a".to_string(),
            vec![
                TraceSegment::Compute { cycles: 1_000_000_000 },
                TraceSegment::Compute { cycles: 2_000_000_000 },
                TraceSegment::Compute { cycles: 3_000_000_000 },
            ],
        );
        let mut gen = StaticTraceGenerator::new(scripts);
        let process_groups = HashMap::from([("a".to_string(), vec![0u32])]);
        let channel_groups = HashMap::new();

        let mut graph = build(&kpn, &mut gen, &process_groups, &channel_groups, &platform, SlowestPolicy::MaxGroupId)
            .unwrap();
        let (elements, length, path) = graph.critical_path();

        assert_eq!(elements, vec!["a".to_string()]);
        assert_eq!(path.first().unwrap(), START);
        assert_eq!(path.last().unwrap(), END);
        // 1e9 + 2e9 + 3e9 cycles at 1GHz = 6 seconds = 6e12 ps
        assert_eq!(length, 6_000_000_000_000);
    }

    #[test]
    fn remapping_a_slower_channel_increases_critical_path() {
        let platform = Platform {
            processors: vec![processor("p0", 1e9), processor("p1", 1e9)],
            processor_groups: HashMap::from([
                (0, vec!["p0".to_string()]),
                (1, vec!["p1".to_string()]),
            ]),
            schedulers: vec![Scheduler {
                name: "s".into(),
                policy: "fifo".into(),
                processors: vec!["p0".into(), "p1".into()],
            }],
            primitives: vec![
                Primitive {
                    name: "fast_link".into(),
                    group_id: 0,
                    suitable: vec![("p0".into(), vec!["p1".into()])],
                    read_cost: 10,
                    write_cost: 10,
                },
                Primitive {
                    name: "slow_link".into(),
                    group_id: 1,
                    suitable: vec![("p0".into(), vec!["p1".into()])],
                    read_cost: 500,
                    write_cost: 500,
                },
            ],
            primitive_groups: HashMap::from([
                (0, vec!["fast_link".to_string()]),
                (1, vec!["slow_link".to_string()]),
            ]),
        };
        let kpn = KpnGraph {
            name: "k".into(),
            processes: vec![Process { name: "src".into() }, Process { name: "dst".into() }],
            channels: vec![Channel {
                name: "c".into(),
                token_size: 4,
                source: "src".into(),
                sinks: vec!["dst".into()],
            }],
        };
        let mut scripts = HashMap::new();
        scripts.insert(
            "src".to_string(),
            vec![TraceSegment::Write { channel: "c".into(), n_tokens: 1 }],
        );
        scripts.insert(
            "dst".to_string(),
            vec![TraceSegment::Read { channel: "c".into(), n_tokens: 1 }],
        );
        let process_groups = HashMap::from([
            ("src".to_string(), vec![0u32]),
            ("dst".to_string(), vec![1u32]),
        ]);
        let channel_groups = HashMap::from([("c".to_string(), vec![0u32])]);

        let mut gen = StaticTraceGenerator::new(scripts);
        let mut graph = build(&kpn, &mut gen, &process_groups, &channel_groups, &platform, SlowestPolicy::MaxGroupId)
            .unwrap();
        let (_, fast_length, _) = graph.critical_path();

        let slow_length = graph
            .change_element_mapping("c", &[1], &platform, SlowestPolicy::MaxGroupId, true)
            .unwrap();

        assert!(slow_length > fast_length);
    }
}
