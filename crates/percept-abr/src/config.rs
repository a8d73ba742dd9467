use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use percept_core::SolverConfig;

use crate::AbrError;

const DEFAULT_RULE_CONFIG_YAML: &str = include_str!("../config/rule.default.yaml");

/// Buffer levels (seconds) that shape the smoothness reward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferThresholds {
    /// Below this the player is close to stalling.
    pub r_min: f64,
    /// Rich buffer: above this the smoothness term turns into a penalty.
    pub r_max: f64,
    /// Above this the scheduler idles between downloads.
    pub r_target: f64,
    /// Stable buffer level, carried for the host; the reward does not read it.
    pub r_stable: f64,
}

impl Default for BufferThresholds {
    fn default() -> Self {
        BufferThresholds {
            r_min: 4.0,
            r_max: 20.0,
            r_target: 12.0,
            r_stable: 12.0,
        }
    }
}

/// Relative weight of each reward term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermWeights {
    pub smoothness: f64,
    pub switching: f64,
    pub quality: f64,
}

impl TermWeights {
    pub const EQUAL: TermWeights = TermWeights {
        smoothness: 1.0,
        switching: 1.0,
        quality: 1.0,
    };

    fn is_valid(&self) -> bool {
        [self.smoothness, self.switching, self.quality]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0)
    }
}

/// Weights picked by the buffer level of the state a decision is taken in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeWeights {
    /// Buffer above `r_max`.
    pub rich: TermWeights,
    /// Buffer below `r_min`.
    pub starving: TermWeights,
    /// Buffer between `r_min` and `r_target`.
    pub building: TermWeights,
    /// Buffer between `r_target` and `r_max`.
    pub steady: TermWeights,
}

impl Default for RegimeWeights {
    fn default() -> Self {
        RegimeWeights {
            rich: TermWeights {
                smoothness: 0.4,
                switching: 0.2,
                quality: 0.4,
            },
            starving: TermWeights {
                smoothness: 0.9,
                switching: 0.05,
                quality: 0.05,
            },
            building: TermWeights {
                smoothness: 0.6,
                switching: 0.3,
                quality: 0.1,
            },
            steady: TermWeights {
                smoothness: 0.2,
                switching: 0.5,
                quality: 0.3,
            },
        }
    }
}

/// How the three reward terms are blended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RewardWeighting {
    /// Plain sum of the three terms.
    #[default]
    Uniform,
    /// Weighted sum, weights chosen by the current buffer regime.
    BufferRegime(RegimeWeights),
}

impl RewardWeighting {
    /// Resolve the weights for a decision taken at `buffer` seconds.
    pub fn weights_for(&self, buffer: f64, thresholds: &BufferThresholds) -> TermWeights {
        match self {
            RewardWeighting::Uniform => TermWeights::EQUAL,
            RewardWeighting::BufferRegime(regimes) => {
                if buffer > thresholds.r_max {
                    regimes.rich
                } else if buffer < thresholds.r_min {
                    regimes.starving
                } else if buffer < thresholds.r_target {
                    regimes.building
                } else {
                    regimes.steady
                }
            }
        }
    }
}

/// Configuration of the MDP rule: window geometry, reward shaping and solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Number of segments decided jointly per training cycle.
    pub lookahead: usize,
    pub buffer: BufferThresholds,
    /// Seconds the scheduler idles when the buffer is above `r_target`.
    pub sleep_interval: f64,
    /// Headroom factor applied to the bandwidth when rescaling saliency.
    pub bandwidth_safety: f64,
    /// Upper bound on the state tree size of one window.
    pub max_states: usize,
    pub weighting: RewardWeighting,
    pub solver: SolverConfig,
}

impl Default for RuleConfig {
    fn default() -> Self {
        RuleConfig {
            lookahead: 3,
            buffer: BufferThresholds::default(),
            sleep_interval: 0.5,
            bandwidth_safety: 1.3,
            max_states: 200_000,
            weighting: RewardWeighting::default(),
            solver: SolverConfig::default(),
        }
    }
}

impl RuleConfig {
    /// Parse a rule config from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, AbrError> {
        let config: RuleConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a rule config from a YAML file path.
    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, AbrError> {
        let yaml = fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Return the default YAML config included with this crate.
    pub fn default_yaml() -> &'static str {
        DEFAULT_RULE_CONFIG_YAML
    }

    /// Parse the default YAML config included with this crate.
    pub fn from_default_yaml() -> Result<Self, AbrError> {
        Self::from_yaml_str(Self::default_yaml())
    }

    pub fn validate(&self) -> Result<(), AbrError> {
        let invalid = |msg: &str| Err(AbrError::InvalidConfig(msg.to_string()));

        if self.lookahead == 0 {
            return invalid("lookahead must be greater than 0");
        }
        let b = &self.buffer;
        if ![b.r_min, b.r_max, b.r_target, b.r_stable]
            .iter()
            .all(|v| v.is_finite())
        {
            return invalid("buffer thresholds must be finite");
        }
        if b.r_min >= b.r_max {
            return invalid("r_min must be below r_max");
        }
        if !self.sleep_interval.is_finite() || self.sleep_interval < 0.0 {
            return invalid("sleep_interval must be finite and >= 0");
        }
        if !self.bandwidth_safety.is_finite() || self.bandwidth_safety <= 0.0 {
            return invalid("bandwidth_safety must be finite and > 0");
        }
        if self.max_states == 0 {
            return invalid("max_states must be greater than 0");
        }
        if let RewardWeighting::BufferRegime(r) = &self.weighting {
            if ![r.rich, r.starving, r.building, r.steady]
                .iter()
                .all(TermWeights::is_valid)
            {
                return invalid("reward weights must be finite and >= 0");
            }
        }
        self.solver.validate()?;
        Ok(())
    }
}
