//! Solver configuration.
//!
//! Load search parameters from TOML to control the objective, the
//! iterated-greedy destruction size and temperature, and the stopping
//! budget without code changes. Every field has a default, so an empty
//! document is a valid configuration.
//!
//! # Example
//!
//! ```
//! use flowshop_mo::config::{Objective, SolverConfig};
//!
//! let config = SolverConfig::from_toml_str(r#"
//!     objective = "flowtime"
//!     destruction_size = 4
//!     iteration_limit = 200
//!     time_limit_secs = 2.5
//! "#).unwrap();
//!
//! assert_eq!(config.objective, Objective::Flowtime);
//! assert_eq!(config.destruction_size, 4);
//! assert_eq!(config.iteration_limit, Some(200));
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Instance;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Primary objective driving construction and search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Minimize the maximum completion time.
    #[default]
    Makespan,
    /// Minimize the sum of completion times.
    Flowtime,
}

impl Objective {
    /// The other objective, tracked as secondary during search.
    pub fn secondary(self) -> Self {
        match self {
            Objective::Makespan => Objective::Flowtime,
            Objective::Flowtime => Objective::Makespan,
        }
    }
}

/// Top-level solver configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SolverConfig {
    /// Primary objective.
    pub objective: Objective,
    /// Jobs removed per iterated-greedy perturbation.
    pub destruction_size: usize,
    /// Temperature factor: `T = alpha · p̄ / 10` unless `temperature` is set.
    pub alpha: f64,
    /// Explicit acceptance temperature.
    pub temperature: Option<f64>,
    /// Iterated-greedy iteration limit. Derived from the instance when unset.
    pub iteration_limit: Option<u64>,
    /// Multiplier for the derived iteration limit.
    pub iteration_factor: f64,
    /// Overall time limit in seconds. Derived from the instance when unset.
    pub time_limit_secs: Option<f64>,
    /// Run the non-permutation local search after iterated greedy.
    pub non_permutation: bool,
    /// Random seed.
    pub seed: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            objective: Objective::Makespan,
            destruction_size: 8,
            alpha: 0.234375,
            temperature: None,
            iteration_limit: None,
            iteration_factor: 1.0,
            time_limit_secs: None,
            non_permutation: false,
            seed: 1,
        }
    }
}

impl SolverConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Sets the primary objective.
    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    /// Sets the destruction size.
    pub fn with_destruction_size(mut self, d: usize) -> Self {
        self.destruction_size = d;
        self
    }

    /// Sets an explicit acceptance temperature.
    pub fn with_temperature(mut self, t: f64) -> Self {
        self.temperature = Some(t);
        self
    }

    /// Sets the iteration limit.
    pub fn with_iteration_limit(mut self, limit: u64) -> Self {
        self.iteration_limit = Some(limit);
        self
    }

    /// Sets the time limit in seconds.
    pub fn with_time_limit_secs(mut self, secs: f64) -> Self {
        self.time_limit_secs = Some(secs);
        self
    }

    /// Enables or disables the non-permutation phase.
    pub fn with_non_permutation(mut self, enabled: bool) -> Self {
        self.non_permutation = enabled;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checks parameter ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.destruction_size == 0 {
            return Err(ConfigError::Invalid(
                "destruction_size must be positive".into(),
            ));
        }
        if !(self.alpha > 0.0 && self.alpha.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "alpha must be positive, got {}",
                self.alpha
            )));
        }
        if let Some(t) = self.temperature {
            if !(t > 0.0 && t.is_finite()) {
                return Err(ConfigError::Invalid(format!(
                    "temperature must be positive, got {t}"
                )));
            }
        }
        if !(self.iteration_factor > 0.0 && self.iteration_factor.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "iteration_factor must be positive, got {}",
                self.iteration_factor
            )));
        }
        if let Some(secs) = self.time_limit_secs {
            if !(secs >= 0.0 && secs.is_finite()) {
                return Err(ConfigError::Invalid(format!(
                    "time_limit_secs must be non-negative, got {secs}"
                )));
            }
        }
        Ok(())
    }

    /// Time limit for the whole run: configured, or 5 ms per operation.
    pub fn time_limit(&self, instance: &Instance) -> Duration {
        match self.time_limit_secs {
            Some(secs) => Duration::from_secs_f64(secs),
            None => Duration::from_millis(5 * instance.num_operations() as u64),
        }
    }

    /// Iteration limit: configured, or `max(1, factor · 150000 / n)`.
    pub fn iteration_limit(&self, instance: &Instance) -> u64 {
        self.iteration_limit.unwrap_or_else(|| {
            (self.iteration_factor * 150_000.0 / instance.jobs() as f64).max(1.0) as u64
        })
    }

    /// Destruction size clamped to `[1, (8n + 9) / 10]`.
    pub fn destruction_size(&self, instance: &Instance) -> usize {
        self.destruction_size
            .min((8 * instance.jobs() + 9) / 10)
            .max(1)
    }

    /// Acceptance temperature: configured, or `alpha · p̄ / 10` where `p̄`
    /// is the mean processing time over all `n·m` operations.
    pub fn temperature(&self, instance: &Instance) -> f64 {
        self.temperature.unwrap_or_else(|| {
            let pavg = instance.total_time() as f64 / instance.num_operations() as f64;
            self.alpha * pavg / 10.0
        })
    }
}

/// Stopping budget for iterated greedy. The first exhausted limit wins.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SearchBudget {
    /// Maximum number of perturbation iterations.
    pub iteration_limit: Option<u64>,
    /// Maximum elapsed time, measured on the search clock.
    pub time_limit: Option<Duration>,
}

impl SearchBudget {
    /// Budget limited by iterations only.
    pub fn iterations(limit: u64) -> Self {
        Self {
            iteration_limit: Some(limit),
            time_limit: None,
        }
    }

    /// Budget limited by time only.
    pub fn time(limit: Duration) -> Self {
        Self {
            iteration_limit: None,
            time_limit: Some(limit),
        }
    }

    /// Whether the search must stop after `steps` iterations at `elapsed`.
    pub fn exhausted(&self, steps: u64, elapsed: Duration) -> bool {
        self.iteration_limit.is_some_and(|l| steps >= l)
            || self.time_limit.is_some_and(|t| elapsed >= t)
    }

    /// Whether at least one limit is set.
    pub fn is_bounded(&self) -> bool {
        self.iteration_limit.is_some() || self.time_limit.is_some()
    }
}

/// Resolved options for one iterated-greedy run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IgOptions {
    /// Jobs removed per perturbation.
    pub destruction_size: usize,
    /// Fixed acceptance temperature.
    pub temperature: f64,
    /// Stopping budget.
    pub budget: SearchBudget,
}

impl IgOptions {
    /// Creates options with the given destruction size, temperature and budget.
    pub fn new(destruction_size: usize, temperature: f64, budget: SearchBudget) -> Self {
        Self {
            destruction_size,
            temperature,
            budget,
        }
    }

    /// Checks that the run can terminate and that `T` is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.budget.is_bounded() {
            return Err(ConfigError::Invalid(
                "iterated greedy needs an iteration or time limit".into(),
            ));
        }
        if !(self.temperature > 0.0 && self.temperature.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "temperature must be positive, got {}",
                self.temperature
            )));
        }
        if self.destruction_size == 0 {
            return Err(ConfigError::Invalid(
                "destruction_size must be positive".into(),
            ));
        }
        Ok(())
    }
}
