//! Rules configuration

use crate::game::VerbosityLevel;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunable rules and engine settings for one match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub starting_life: i32,
    pub max_hand_size: usize,
    pub lands_per_turn: u8,
    /// How long a generated legal-action list stays valid
    pub cache_ttl_ms: u64,
    pub verbosity: VerbosityLevel,
    /// Creatures that entered this turn cannot attack or use tap abilities
    pub enforce_summoning_sickness: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            starting_life: 20,
            max_hand_size: 7,
            lands_per_turn: 1,
            cache_ttl_ms: 1000,
            verbosity: VerbosityLevel::Normal,
            enforce_summoning_sickness: true,
        }
    }
}

impl RulesConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_starting_life(mut self, life: i32) -> Self {
        self.starting_life = life;
        self
    }

    pub fn with_max_hand_size(mut self, size: usize) -> Self {
        self.max_hand_size = size;
        self
    }

    pub fn with_lands_per_turn(mut self, lands: u8) -> Self {
        self.lands_per_turn = lands;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_ms = ttl.as_millis() as u64;
        self
    }

    pub fn with_verbosity(mut self, verbosity: VerbosityLevel) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_summoning_sickness(mut self, enforce: bool) -> Self {
        self.enforce_summoning_sickness = enforce;
        self
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    /// Load from a JSON file; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RulesConfig::default();
        assert_eq!(config.starting_life, 20);
        assert_eq!(config.max_hand_size, 7);
        assert_eq!(config.lands_per_turn, 1);
        assert_eq!(config.cache_ttl(), Duration::from_secs(1));
        assert!(config.enforce_summoning_sickness);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RulesConfig =
            serde_json::from_str(r#"{"starting_life": 30, "verbosity": "Verbose"}"#).unwrap();
        assert_eq!(config.starting_life, 30);
        assert_eq!(config.verbosity, VerbosityLevel::Verbose);
        assert_eq!(config.max_hand_size, 7);
    }

    #[test]
    fn test_builder() {
        let config = RulesConfig::new()
            .with_lands_per_turn(2)
            .with_cache_ttl(Duration::from_millis(250))
            .with_summoning_sickness(false);
        assert_eq!(config.lands_per_turn, 2);
        assert_eq!(config.cache_ttl_ms, 250);
        assert!(!config.enforce_summoning_sickness);
    }
}
