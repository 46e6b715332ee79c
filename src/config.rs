//! Solver configuration

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How the full-chain stage picks one planet per resource group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Greedy, one system at a time.
    #[default]
    Iterative,
    /// Every combination of per-group candidates.
    Exhaustive,
    /// Organics by planet, then inorganics by biome.
    Biome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Maximum number of outposts considered a usable answer. Reporting only.
    pub location_cap: usize,
    /// Largest set of partner planets tried when reconstructing a chain.
    pub max_partner_combination: usize,
    /// Rounds of organic cover plus redundancy elimination before giving up.
    pub max_organic_rounds: usize,
    pub helium_resource: String,
    pub water_resource: String,
    pub strategy: Strategy,
    /// Exhaustive-search workers; 0 uses the available parallelism.
    pub threads: usize,
    /// Stop the exhaustive search once a plan this small is found.
    pub target_count: Option<usize>,
    /// Stop the exhaustive search after this many combinations.
    pub max_combinations: Option<u64>,
    /// Evaluations between progress snapshots.
    pub progress_interval: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            location_cap: 24,
            max_partner_combination: 4,
            max_organic_rounds: 32,
            helium_resource: "Helium-3".to_string(),
            water_resource: "Water".to_string(),
            strategy: Strategy::Iterative,
            threads: 0,
            target_count: None,
            max_combinations: None,
            progress_interval: 1000,
        }
    }
}

impl SolverConfig {
    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn worker_count(&self) -> usize {
        if self.threads > 0 {
            self.threads
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: SolverConfig =
            serde_json::from_str(r#"{"location_cap": 18, "strategy": "exhaustive"}"#).unwrap();
        assert_eq!(config.location_cap, 18);
        assert_eq!(config.strategy, Strategy::Exhaustive);
        assert_eq!(config.max_partner_combination, 4);
        assert_eq!(config.helium_resource, "Helium-3");
    }

    #[test]
    fn biome_strategy_parses() {
        let config: SolverConfig = serde_json::from_str(r#"{"strategy": "biome"}"#).unwrap();
        assert_eq!(config.strategy, Strategy::Biome);
    }

    #[test]
    fn explicit_thread_count_wins() {
        let config = SolverConfig {
            threads: 3,
            ..Default::default()
        };
        assert_eq!(config.worker_count(), 3);
    }
}
