// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The mapping-to-result cache, dumpable to a flat CSV file.
//!
//! The format is intentionally hand-rolled rather than pulled in via a CSV
//! crate: one header line plus one row per entry, with no quoting, escaping,
//! or embedded-comma fields to worry about (keys are digit/semicolon
//! strings, resources are kind:count pairs). A full CSV reader/writer would
//! be solving a problem this format doesn't have.

use super::SimulationResult;
use crate::errors::OracleError;
use std::collections::HashMap;
use std::fs;

const HEADER: &str = "key,exec_time,static_energy,dynamic_energy,resources";

/// In-memory cache keyed by a mapping's canonical vector form.
#[derive(Debug, Clone, Default)]
pub struct MappingCache {
    entries: HashMap<Vec<i64>, SimulationResult>,
}

impl MappingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &[i64]) -> Option<SimulationResult> {
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: Vec<i64>, result: SimulationResult) {
        self.entries.insert(key, result);
    }

    pub fn to_csv(&self, path: &str) -> Result<(), OracleError> {
        let mut lines = vec![HEADER.to_string()];
        for (key, result) in &self.entries {
            let key_field = key.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(";");
            let resources_field = result
                .resources
                .iter()
                .map(|(kind, count)| format!("{kind}:{count}"))
                .collect::<Vec<_>>()
                .join("|");
            lines.push(format!(
                "{},{},{},{},{}",
                key_field, result.exec_time, result.static_energy, result.dynamic_energy, resources_field
            ));
        }
        fs::write(path, lines.join("\n") + "\n")
            .map_err(|source| OracleError::CacheWrite { path: path.to_string(), source })
    }

    pub fn from_csv(path: &str) -> Result<Self, OracleError> {
        let contents = fs::read_to_string(path).map_err(|source| OracleError::CacheRead { path: path.to_string(), source })?;
        let mut cache = Self::new();
        for line in contents.lines().skip(1) {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.splitn(5, ',').collect();
            if fields.len() != 5 {
                return Err(OracleError::MalformedCacheRow(line.to_string()));
            }
            let key: Vec<i64> = if fields[0].is_empty() {
                Vec::new()
            } else {
                fields[0]
                    .split(';')
                    .map(|v| v.parse().map_err(|_| OracleError::MalformedCacheRow(line.to_string())))
                    .collect::<Result<_, _>>()?
            };
            let exec_time: u64 = fields[1].parse().map_err(|_| OracleError::MalformedCacheRow(line.to_string()))?;
            let static_energy: f64 = fields[2].parse().map_err(|_| OracleError::MalformedCacheRow(line.to_string()))?;
            let dynamic_energy: f64 = fields[3].parse().map_err(|_| OracleError::MalformedCacheRow(line.to_string()))?;
            let mut resources = HashMap::new();
            if !fields[4].is_empty() {
                for pair in fields[4].split('|') {
                    let (kind, count) = pair.split_once(':').ok_or_else(|| OracleError::MalformedCacheRow(line.to_string()))?;
                    let count: usize = count.parse().map_err(|_| OracleError::MalformedCacheRow(line.to_string()))?;
                    resources.insert(kind.to_string(), count);
                }
            }
            cache.insert(key, SimulationResult { exec_time, static_energy, dynamic_energy, resources });
        }
        Ok(cache)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.csv");
        let path = path.to_str().unwrap();

        let mut cache = MappingCache::new();
        let mut resources = HashMap::new();
        resources.insert("cpu".to_string(), 2);
        cache.insert(
            vec![0, 1, 2],
            SimulationResult { exec_time: 1000, static_energy: 1.5, dynamic_energy: 2.5, resources },
        );
        cache.to_csv(path).unwrap();

        let loaded = MappingCache::from_csv(path).unwrap();
        assert_eq!(loaded.len(), 1);
        let got = loaded.get(&[0, 1, 2]).unwrap();
        assert_eq!(got.exec_time, 1000);
        assert_eq!(got.resources.get("cpu"), Some(&2));
    }

    #[test]
    fn missing_file_is_a_cache_read_error() {
        let result = MappingCache::from_csv("/nonexistent/path/cache.csv");
        assert!(matches!(result, Err(OracleError::CacheRead { .. })));
    }
}
