//! Agent configuration: the named numeric thresholds the policies consult.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which decision policy drives the agent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Ordered condition→action rules, no lookahead.
    #[default]
    Rules,
    /// Bounded-depth minimax over simulatable actions.
    Search,
}

/// All tunable thresholds, with documented defaults. Loaded from YAML or
/// constructed via `Default`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Policy variant to run.
    pub policy: PolicyKind,
    /// Search depth in plies. Small on purpose: branching factor and clone
    /// cost are both significant.
    pub search_depth: u8,
    /// Desired ratio of maintained troop value to war-chest treasury.
    pub troop_ratio_target: f64,
    /// Below this ratio the agent recruits if it can.
    pub troop_ratio_min: f64,
    /// Above this ratio armies get disbanded before anything else is bought.
    pub troop_ratio_max: f64,
    /// Attack only when own committed troop value exceeds the defender's by
    /// this factor.
    pub attack_odds_threshold: f64,
    /// Keep hiring retainers until this many are on the payroll.
    pub retainer_target: u8,
    /// Never recruit fewer men than this in one action.
    pub min_recruit_batch: u32,
    /// Season time budget granted to each character at season start.
    pub season_budget: u32,
    /// Flat fee charged when hiring a retainer.
    pub hire_fee: i64,
    /// Never accept a ransom demand above this amount.
    pub ransom_ceiling: i64,
    /// Characters younger than this cannot be betrothed.
    pub marriageable_age: u8,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::Rules,
            search_depth: 2,
            troop_ratio_target: 1.5,
            troop_ratio_min: 0.8,
            troop_ratio_max: 3.0,
            attack_odds_threshold: 1.25,
            retainer_target: 2,
            min_recruit_batch: 10,
            season_budget: 30,
            hire_fee: 50,
            ransom_ceiling: 500,
            marriageable_age: 16,
        }
    }
}

impl AgentConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: AgentConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &str) -> Result<Self, ConfigError> {
        Self::from_yaml_str(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.troop_ratio_min > self.troop_ratio_target
            || self.troop_ratio_target > self.troop_ratio_max
        {
            return Err(ConfigError::Invalid(
                "troop ratio thresholds must satisfy min <= target <= max".into(),
            ));
        }
        if self.search_depth == 0 {
            return Err(ConfigError::Invalid("search depth must be at least 1".into()));
        }
        if self.attack_odds_threshold <= 0.0 {
            return Err(ConfigError::Invalid(
                "attack odds threshold must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        AgentConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_yaml_overrides_defaults() {
        let config = AgentConfig::from_yaml_str("policy: search\nsearch_depth: 1\n").unwrap();
        assert_eq!(config.policy, PolicyKind::Search);
        assert_eq!(config.search_depth, 1);
        // Untouched fields keep their defaults.
        assert_eq!(config.retainer_target, AgentConfig::default().retainer_target);
    }

    #[test]
    fn inverted_ratios_rejected() {
        let err = AgentConfig::from_yaml_str("troop_ratio_min: 5.0\n");
        assert!(err.is_err());
    }

    #[test]
    fn zero_depth_rejected() {
        let err = AgentConfig::from_yaml_str("search_depth: 0\n");
        assert!(err.is_err());
    }
}
