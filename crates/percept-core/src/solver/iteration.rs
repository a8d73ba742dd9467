use std::{fmt, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::solver::{agent::DpAgent, environment::Environment, error::SolverError, policy::Policy};

const DEFAULT_SOLVER_CONFIG_YAML: &str = include_str!("../../config/solver.default.yaml");

/// Configuration for the policy iteration driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Discount factor applied to successor values.
    pub gamma: f64,
    /// Hard cap on learn rounds; bounds worst-case training latency.
    pub max_rounds: usize,
    /// Largest mean squared policy change a settled round may show.
    pub max_error: f64,
    /// Largest state-value change a settled round may show.
    pub value_tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            gamma: 0.9,
            max_rounds: 1000,
            max_error: 0.01,
            value_tolerance: 1e-9,
        }
    }
}

impl SolverConfig {
    /// Parse a solver config from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SolverConfigError> {
        let config: SolverConfig = serde_yaml::from_str(yaml).map_err(SolverConfigError::Yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a solver config from a YAML file path.
    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, SolverConfigError> {
        let yaml = fs::read_to_string(path).map_err(SolverConfigError::Io)?;
        Self::from_yaml_str(&yaml)
    }

    /// Return the default YAML config included with this crate.
    pub fn default_yaml() -> &'static str {
        DEFAULT_SOLVER_CONFIG_YAML
    }

    /// Parse the default YAML config included with this crate.
    pub fn from_default_yaml() -> Result<Self, SolverConfigError> {
        Self::from_yaml_str(Self::default_yaml())
    }

    pub fn validate(&self) -> Result<(), SolverConfigError> {
        if !self.gamma.is_finite() || !(0.0..=1.0).contains(&self.gamma) {
            return Err(SolverConfigError::Invalid(
                "gamma must be finite and within [0, 1]".to_string(),
            ));
        }
        if self.max_rounds == 0 {
            return Err(SolverConfigError::Invalid(
                "max_rounds must be greater than 0".to_string(),
            ));
        }
        if !self.max_error.is_finite() || self.max_error < 0.0 {
            return Err(SolverConfigError::Invalid(
                "max_error must be finite and >= 0".to_string(),
            ));
        }
        if !self.value_tolerance.is_finite() || self.value_tolerance < 0.0 {
            return Err(SolverConfigError::Invalid(
                "value_tolerance must be finite and >= 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Error type for loading and validating `SolverConfig`.
#[derive(Debug)]
pub enum SolverConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    Invalid(String),
}

impl fmt::Display for SolverConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverConfigError::Io(err) => write!(f, "failed to read config file: {err}"),
            SolverConfigError::Yaml(err) => write!(f, "failed to parse config YAML: {err}"),
            SolverConfigError::Invalid(err) => write!(f, "invalid solver config: {err}"),
        }
    }
}

impl std::error::Error for SolverConfigError {}

/// Per-round metrics emitted by the driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundMetrics {
    /// 1-based round number.
    pub round: usize,
    /// Mean squared change of the policy table during this round.
    pub policy_error: f64,
    /// Largest absolute change of a state value during this round.
    pub value_change: f64,
}

/// Aggregate metrics for a complete solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveMetrics {
    pub rounds: usize,
    pub final_error: f64,
    pub final_value_change: f64,
    /// False when the round cap stopped the loop before the error threshold.
    pub converged: bool,
}

/// Output of a solve: the policy and the value function it was greedy for.
#[derive(Debug, Clone)]
pub struct Solution {
    pub policy: Policy,
    pub values: Vec<f64>,
    pub metrics: SolveMetrics,
}

/// Run policy iteration until the policy and its values settle or
/// `max_rounds` is reached.
///
/// A round is settled when its policy error is below `max_error` and no
/// state value moved by more than `value_tolerance`. Evaluation is a single
/// sweep per round, so on a tree of depth `d` the values need `d + 1` rounds
/// to reach the root; a quiet policy alone does not mean the root has seen them.
pub fn solve<E: Environment>(env: &E, config: &SolverConfig) -> Result<Solution, SolverError> {
    solve_with_hook(env, config, |_| {})
}

/// Run policy iteration and invoke a callback after each completed round.
///
/// The loop never fails for lack of convergence: it stops at the round cap
/// and reports `converged == false`.
pub fn solve_with_hook<E, FHook>(
    env: &E,
    config: &SolverConfig,
    mut on_round: FHook,
) -> Result<Solution, SolverError>
where
    E: Environment,
    FHook: FnMut(&RoundMetrics),
{
    let mut agent = DpAgent::new(env, config.gamma)?;
    let mut previous = agent.policy().clone();
    let mut metrics = SolveMetrics {
        rounds: 0,
        final_error: f64::INFINITY,
        final_value_change: f64::INFINITY,
        converged: false,
    };

    while metrics.rounds < config.max_rounds {
        agent.learn()?;
        metrics.rounds += 1;
        metrics.final_error = previous.mean_squared_error(agent.policy());
        metrics.final_value_change = agent.value_change();

        on_round(&RoundMetrics {
            round: metrics.rounds,
            policy_error: metrics.final_error,
            value_change: metrics.final_value_change,
        });

        if metrics.final_error < config.max_error
            && metrics.final_value_change <= config.value_tolerance
        {
            metrics.converged = true;
            break;
        }
        previous.clone_from(agent.policy());
    }

    let (policy, values) = agent.into_parts();
    Ok(Solution {
        policy,
        values,
        metrics,
    })
}
