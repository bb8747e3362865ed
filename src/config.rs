//! Engine configuration: pacing, safety-net timers and default rules.
//!
//! Configs are written in RON, the same format the game's data files use.
//! Every field has a default, so a config file only lists what it overrides:
//!
//! ```ron
//! (
//!     action_pacing_ms: 500,
//!     max_turns: 60,
//! )
//! ```

use crate::errors::ConfigValidationError;
use schema::SwitchTiePolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Rules for voluntary switching, mirrored into the action queue at battle start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchRules {
    pub enabled: bool,
    pub max_per_turn: usize,
    pub tie_policy: SwitchTiePolicy,
    /// Switches resolve before every other action except running.
    pub switches_first: bool,
}

impl Default for SwitchRules {
    fn default() -> Self {
        Self {
            enabled: true,
            max_per_turn: 1,
            tie_policy: SwitchTiePolicy::Player1First,
            switches_first: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Delay between battle start and the first action selection.
    pub intro_delay_ms: u64,
    /// Delay between two sequentially resolved actions of a turn.
    pub action_pacing_ms: u64,
    /// Range of the trainer AI's artificial thinking delay.
    pub trainer_thinking_min_ms: u64,
    pub trainer_thinking_max_ms: u64,
    /// How long an AI side may go without acting before a fallback action fires.
    pub ai_decision_timeout_ms: u64,
    /// Turn ceiling. Battles still running past it are force-ended.
    pub max_turns: u32,
    /// Lifetime ceiling for a single battle instance.
    pub crash_timeout_secs: u64,
    /// Roster size limit per side.
    pub max_team_size: usize,
    pub switch_rules: SwitchRules,
    /// Probability of a critical capture that skips the regular roll.
    pub critical_capture_chance: f64,
    /// Fixed seed for reproducible battles. `None` seeds from entropy.
    pub rng_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            intro_delay_ms: 2_000,
            action_pacing_ms: 800,
            trainer_thinking_min_ms: 600,
            trainer_thinking_max_ms: 1_800,
            ai_decision_timeout_ms: 5_000,
            max_turns: 100,
            crash_timeout_secs: 30 * 60,
            max_team_size: 6,
            switch_rules: SwitchRules::default(),
            critical_capture_chance: 0.02,
            rng_seed: None,
        }
    }
}

impl EngineConfig {
    /// A config with every pacing delay removed, for simulations and tests.
    /// Safety-net timers keep their defaults.
    pub fn immediate() -> Self {
        Self {
            intro_delay_ms: 0,
            action_pacing_ms: 0,
            trainer_thinking_min_ms: 0,
            trainer_thinking_max_ms: 0,
            ..Self::default()
        }
    }

    pub fn from_ron_str(text: &str) -> Result<Self, ConfigValidationError> {
        let config: EngineConfig =
            ron::from_str(text).map_err(|err| ConfigValidationError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigValidationError> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| ConfigValidationError::Parse(format!("{}: {err}", path.display())))?;
        Self::from_ron_str(&text)
    }

    fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.trainer_thinking_min_ms > self.trainer_thinking_max_ms {
            return Err(ConfigValidationError::Parse(
                "trainer_thinking_min_ms exceeds trainer_thinking_max_ms".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.critical_capture_chance) {
            return Err(ConfigValidationError::Parse(
                "critical_capture_chance must be within 0.0..=1.0".to_string(),
            ));
        }
        if self.max_team_size == 0 {
            return Err(ConfigValidationError::Parse("max_team_size must be positive".to_string()));
        }
        Ok(())
    }

    pub fn intro_delay(&self) -> Duration {
        Duration::from_millis(self.intro_delay_ms)
    }

    pub fn action_pacing(&self) -> Duration {
        Duration::from_millis(self.action_pacing_ms)
    }

    pub fn ai_decision_timeout(&self) -> Duration {
        Duration::from_millis(self.ai_decision_timeout_ms)
    }

    pub fn crash_timeout(&self) -> Duration {
        Duration::from_secs(self.crash_timeout_secs)
    }

    pub fn trainer_thinking_range(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.trainer_thinking_min_ms),
            Duration::from_millis(self.trainer_thinking_max_ms),
        )
    }
}
