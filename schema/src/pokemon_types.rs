use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PokemonType {
    Normal,
    Fire,
    Water,
    Electric,
    Grass,
    Ice,
    Fighting,
    Poison,
    Ground,
    Flying,
    Psychic,
    Bug,
    Rock,
    Ghost,
    Dragon,
    Dark,
    Steel,
    Fairy,
}

impl PokemonType {
    /// Multiplier for an attack of this type hitting a single defending type.
    /// 2.0 = super effective, 0.5 = not very effective, 0.0 = immune.
    pub fn effectiveness_against(self, defending: PokemonType) -> f32 {
        use PokemonType::*;

        match (self, defending) {
            (Normal, Ghost) => 0.0,
            (Normal, Rock | Steel) => 0.5,

            (Fire, Fire | Water | Rock | Dragon) => 0.5,
            (Fire, Grass | Ice | Bug | Steel) => 2.0,

            (Water, Water | Grass | Dragon) => 0.5,
            (Water, Fire | Ground | Rock) => 2.0,

            (Electric, Ground) => 0.0,
            (Electric, Electric | Grass | Dragon) => 0.5,
            (Electric, Water | Flying) => 2.0,

            (Grass, Fire | Grass | Poison | Flying | Bug | Dragon | Steel) => 0.5,
            (Grass, Water | Ground | Rock) => 2.0,

            (Ice, Fire | Water | Ice | Steel) => 0.5,
            (Ice, Grass | Ground | Flying | Dragon) => 2.0,

            (Fighting, Ghost) => 0.0,
            (Fighting, Poison | Flying | Psychic | Bug | Fairy) => 0.5,
            (Fighting, Normal | Ice | Rock | Dark | Steel) => 2.0,

            (Poison, Steel) => 0.0,
            (Poison, Poison | Ground | Rock | Ghost) => 0.5,
            (Poison, Grass | Fairy) => 2.0,

            (Ground, Flying) => 0.0,
            (Ground, Grass | Bug) => 0.5,
            (Ground, Fire | Electric | Poison | Rock | Steel) => 2.0,

            (Flying, Electric | Rock | Steel) => 0.5,
            (Flying, Grass | Fighting | Bug) => 2.0,

            (Psychic, Dark) => 0.0,
            (Psychic, Psychic | Steel) => 0.5,
            (Psychic, Fighting | Poison) => 2.0,

            (Bug, Fire | Fighting | Poison | Flying | Ghost | Steel | Fairy) => 0.5,
            (Bug, Grass | Psychic | Dark) => 2.0,

            (Rock, Fighting | Ground | Steel) => 0.5,
            (Rock, Fire | Ice | Flying | Bug) => 2.0,

            (Ghost, Normal) => 0.0,
            (Ghost, Dark) => 0.5,
            (Ghost, Psychic | Ghost) => 2.0,

            (Dragon, Fairy) => 0.0,
            (Dragon, Steel) => 0.5,
            (Dragon, Dragon) => 2.0,

            (Dark, Fighting | Dark | Fairy) => 0.5,
            (Dark, Psychic | Ghost) => 2.0,

            (Steel, Fire | Water | Electric | Steel) => 0.5,
            (Steel, Ice | Rock | Fairy) => 2.0,

            (Fairy, Fire | Poison | Steel) => 0.5,
            (Fairy, Fighting | Dragon | Dark) => 2.0,

            _ => 1.0,
        }
    }

    /// Combined multiplier against every type of a (possibly dual-typed) defender.
    pub fn effectiveness_against_all(self, defending: &[PokemonType]) -> f32 {
        defending
            .iter()
            .map(|defending_type| self.effectiveness_against(*defending_type))
            .product()
    }
}

/// Persistent status afflictions. `None` is an explicit variant because the
/// clients send and expect `"none"` rather than a missing field.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StatusType {
    #[default]
    None,
    Burn,
    Freeze,
    Paralysis,
    Poison,
    Sleep,
}

impl StatusType {
    pub fn is_afflicted(self) -> bool {
        self != StatusType::None
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_dual_type_multipliers_combine() {
        // Ground vs Fire/Flying: 2.0 * 0.0
        assert_eq!(
            PokemonType::Ground
                .effectiveness_against_all(&[PokemonType::Fire, PokemonType::Flying]),
            0.0
        );
        // Rock vs Fire/Flying: 2.0 * 2.0
        assert_eq!(
            PokemonType::Rock.effectiveness_against_all(&[PokemonType::Fire, PokemonType::Flying]),
            4.0
        );
        assert_eq!(PokemonType::Normal.effectiveness_against_all(&[]), 1.0);
    }

    #[test]
    fn test_every_type_has_a_neutral_matchup() {
        for attacking in PokemonType::iter() {
            assert!(
                PokemonType::iter()
                    .any(|defending| attacking.effectiveness_against(defending) == 1.0),
                "{attacking} has no neutral matchup"
            );
        }
    }

    #[test]
    fn test_string_forms() {
        assert_eq!(PokemonType::from_str("Electric").unwrap(), PokemonType::Electric);
        assert_eq!(StatusType::Paralysis.to_string(), "paralysis");
        assert_eq!(StatusType::default(), StatusType::None);
        assert!(!StatusType::None.is_afflicted());
        assert_eq!(Gender::from_str("female").unwrap(), Gender::Female);
    }
}
