//! Configuration management.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::clock::ProcessId;
use crate::error::{CutlineError, Result};
use crate::lattice::ProcessPair;
use crate::predicate::PredicateId;
use crate::telemetry::LoggingConfig;

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Monitor configuration
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Number of monitored processes
    #[serde(default = "default_process_count")]
    pub process_count: usize,

    /// Predicates to check and the process pair each reads.
    /// When absent, every predicate whose default pair exists is checked.
    #[serde(default)]
    pub predicates: Option<Vec<PredicateBinding>>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            process_count: default_process_count(),
            predicates: None,
        }
    }
}

/// A predicate and the two processes whose local states it reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateBinding {
    pub predicate: PredicateId,
    pub process_i: usize,
    pub process_j: usize,
}

impl PredicateBinding {
    pub fn new(predicate: PredicateId, process_i: usize, process_j: usize) -> Self {
        Self {
            predicate,
            process_i,
            process_j,
        }
    }

    /// Binding using the predicate's default process pair.
    pub fn default_for(predicate: PredicateId) -> Self {
        let pair = predicate.default_pair();
        Self::new(predicate, pair.i().index(), pair.j().index())
    }

    pub fn pair(&self) -> ProcessPair {
        ProcessPair::new(ProcessId(self.process_i), ProcessId(self.process_j))
    }
}

impl MonitorConfig {
    pub fn with_processes(process_count: usize) -> Self {
        Self {
            process_count,
            predicates: None,
        }
    }

    /// Replace the predicate bindings.
    pub fn with_bindings(mut self, bindings: Vec<PredicateBinding>) -> Self {
        self.predicates = Some(bindings);
        self
    }

    /// The bindings to evaluate, in configuration order. Defaults to
    /// predicates 0-2 on processes 0 and 1, plus predicate 3 on processes
    /// 0 and 2 when at least three processes exist.
    pub fn bindings(&self) -> Vec<PredicateBinding> {
        match &self.predicates {
            Some(bindings) => bindings.clone(),
            None => PredicateId::ALL
                .into_iter()
                .filter(|id| id.default_pair().fits(self.process_count))
                .map(PredicateBinding::default_for)
                .collect(),
        }
    }

    /// Reject settings no run could satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.process_count == 0 {
            return Err(CutlineError::invalid_configuration(
                "monitor.process_count must be at least 1",
            ));
        }

        let mut seen = HashSet::new();
        for binding in self.bindings() {
            if binding.process_i == binding.process_j
                || binding.process_i >= self.process_count
                || binding.process_j >= self.process_count
            {
                return Err(CutlineError::invalid_process_pair(
                    binding.process_i,
                    binding.process_j,
                    self.process_count,
                ));
            }
            if !seen.insert(binding.predicate) {
                return Err(CutlineError::duplicate_predicate_binding(binding.predicate));
            }
        }

        Ok(())
    }
}

// Default value functions
fn default_process_count() -> usize { 3 }

impl Config {
    /// Load configuration from the environment (`CUTLINE__MONITOR__PROCESS_COUNT=...`).
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("CUTLINE").separator("__"))
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        cfg.monitor.validate()?;
        Ok(cfg)
    }

    /// Load from a specific file path, with environment overrides on top.
    pub fn from_file(path: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("CUTLINE").separator("__"))
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        cfg.monitor.validate()?;
        Ok(cfg)
    }
}
