use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BattleType {
    Wild,
    Trainer,
    Pvp,
}

impl BattleType {
    pub fn allows_capture(self) -> bool {
        matches!(self, BattleType::Wild)
    }

    pub fn allows_running(self) -> bool {
        matches!(self, BattleType::Wild)
    }
}

/// One of the two sides of a battle. Player 1 is always the side that
/// initiated the battle (the human in wild and trainer battles).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlayerRole {
    Player1,
    Player2,
}

impl PlayerRole {
    pub const BOTH: [PlayerRole; 2] = [PlayerRole::Player1, PlayerRole::Player2];

    pub fn opponent(self) -> Self {
        match self {
            PlayerRole::Player1 => PlayerRole::Player2,
            PlayerRole::Player2 => PlayerRole::Player1,
        }
    }

    pub fn index(self) -> usize {
        match self {
            PlayerRole::Player1 => 0,
            PlayerRole::Player2 => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(PlayerRole::Player1),
            1 => Some(PlayerRole::Player2),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ActionType {
    Attack,
    Item,
    Switch,
    Capture,
    Run,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EndReason {
    TeamDefeat,
    PokemonCaptured,
    Fled,
    MaxTurnsReached,
    BattleTimeout,
    EngineError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SwitchReason {
    Voluntary,
    Fainted,
}

/// How two switch actions submitted in the same turn are ordered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SwitchTiePolicy {
    #[default]
    Player1First,
    FasterFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BallModifier {
    Multiplier(f32),
    Guaranteed,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BallType {
    #[default]
    Pokeball,
    Greatball,
    Ultraball,
    Masterball,
}

impl BallType {
    pub fn modifier(self) -> BallModifier {
        match self {
            BallType::Pokeball => BallModifier::Multiplier(1.0),
            BallType::Greatball => BallModifier::Multiplier(1.5),
            BallType::Ultraball => BallModifier::Multiplier(2.0),
            BallType::Masterball => BallModifier::Guaranteed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_roles() {
        assert_eq!(PlayerRole::Player1.opponent(), PlayerRole::Player2);
        assert_eq!(PlayerRole::from_index(1), Some(PlayerRole::Player2));
        assert_eq!(PlayerRole::from_index(2), None);
        assert_eq!(PlayerRole::Player2.to_string(), "player2");
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(BattleType::from_str("wild").unwrap(), BattleType::Wild);
        assert!(BattleType::from_str("tournament").is_err());
        assert_eq!(EndReason::PokemonCaptured.to_string(), "pokemon_captured");
        assert_eq!(BallType::from_str("MasterBall").unwrap(), BallType::Masterball);
    }

    #[test]
    fn test_ball_modifiers() {
        assert_eq!(BallType::Masterball.modifier(), BallModifier::Guaranteed);
        assert_eq!(BallType::Greatball.modifier(), BallModifier::Multiplier(1.5));
        assert!(BattleType::Wild.allows_capture());
        assert!(!BattleType::Trainer.allows_capture());
    }
}
