use crate::battle::engine::{BattleConfig, SideConfig, TrainerBattleConfig};
use crate::battle::state::BattleGameState;
use crate::collaborators::{ExperienceService, ProgressionEvent, TeamManager};
use crate::config::SwitchRules;
use crate::player::PlayerSlot;
use crate::pokemon::{CombatStats, MoveSlot, Pokemon};
use crate::trainer::{AiProfile, RewardRules, TrainerData};
use async_trait::async_trait;
use schema::{BattleType, PokemonType};
use std::sync::Mutex;

pub const P1: &str = "ash";
pub const P2: &str = "wild";
pub const TRAINER_ID: &str = "youngster-joey";

/// A builder for test Pokemon. Every stat defaults to 20.
///
/// # Example
/// ```ignore
/// let pokemon = TestPokemonBuilder::new("p-1", "Pikachu", 10, 30)
///     .with_types(vec![PokemonType::Electric])
///     .with_moves(&["tackle", "thunder_shock"])
///     .with_speed(50)
///     .build();
/// ```
pub struct TestPokemonBuilder {
    pokemon: Pokemon,
}

impl TestPokemonBuilder {
    pub fn new(id: &str, name: &str, level: u8, max_hp: u16) -> Self {
        let stats = CombatStats {
            attack: 20,
            defense: 20,
            special_attack: 20,
            special_defense: 20,
            speed: 20,
        };
        Self {
            pokemon: Pokemon::new(id, name, level, max_hp, stats),
        }
    }

    pub fn with_types(mut self, types: Vec<PokemonType>) -> Self {
        self.pokemon.types = types;
        self
    }

    pub fn with_moves(mut self, moves: &[&str]) -> Self {
        self.pokemon.moves = moves.iter().map(|id| MoveSlot::new(id)).collect();
        self
    }

    pub fn with_speed(mut self, speed: u16) -> Self {
        self.pokemon.stats.speed = speed;
        self
    }

    /// Sets the current HP. If not set, HP will be max.
    pub fn with_hp(mut self, hp: u16) -> Self {
        self.pokemon.set_hp(hp);
        self
    }

    pub fn build(self) -> Pokemon {
        self.pokemon
    }
}

pub fn pikachu() -> Pokemon {
    TestPokemonBuilder::new("pikachu-1", "Pikachu", 10, 30)
        .with_types(vec![PokemonType::Electric])
        .with_moves(&["tackle", "quick_attack", "thunder_shock", "growl"])
        .with_speed(50)
        .build()
}

pub fn bulbasaur() -> Pokemon {
    TestPokemonBuilder::new("bulbasaur-1", "Bulbasaur", 10, 32)
        .with_types(vec![PokemonType::Grass, PokemonType::Poison])
        .with_moves(&["tackle", "vine_whip", "growl"])
        .with_speed(25)
        .build()
}

/// The wild opponent. Knows exactly one offensive move.
pub fn pidgey() -> Pokemon {
    TestPokemonBuilder::new("pidgey-w", "Pidgey", 8, 24)
        .with_types(vec![PokemonType::Normal, PokemonType::Flying])
        .with_moves(&["tackle", "growl"])
        .with_speed(30)
        .build()
}

pub fn trainer_roster() -> Vec<Pokemon> {
    vec![
        TestPokemonBuilder::new("joey-1", "Poochyena", 9, 28)
            .with_types(vec![PokemonType::Dark])
            .with_moves(&["tackle", "bite", "leer"])
            .with_speed(35)
            .build(),
        TestPokemonBuilder::new("joey-2", "Rattata", 9, 26)
            .with_types(vec![PokemonType::Normal])
            .with_moves(&["tackle", "quick_attack", "tail_whip"])
            .with_speed(45)
            .build(),
        TestPokemonBuilder::new("joey-3", "Spearow", 8, 25)
            .with_types(vec![PokemonType::Normal, PokemonType::Flying])
            .with_moves(&["wing_attack", "growl"])
            .with_speed(40)
            .build(),
    ]
}

pub fn trainer_data() -> TrainerData {
    TrainerData {
        trainer_id: TRAINER_ID.to_string(),
        name: "Joey".to_string(),
        class: "Youngster".to_string(),
        level: 9,
        roster: trainer_roster(),
        ai_profile: AiProfile::default(),
        reward_rules: RewardRules::default(),
    }
}

/// A profile that never switches and always takes the best scored move.
pub fn decisive_trainer() -> TrainerData {
    TrainerData {
        ai_profile: AiProfile {
            aggression: 1.0,
            switch_threshold: 0.0,
            uses_type_advantage: true,
        },
        ..trainer_data()
    }
}

/// Ash's Pikachu against a lone wild Pidgey.
pub fn wild_state() -> BattleGameState {
    let mut wild = pidgey();
    wild.is_wild = true;
    BattleGameState::new(
        "test-wild".to_string(),
        BattleType::Wild,
        PlayerSlot::new(P1, "Ash", vec![pikachu()], false),
        PlayerSlot::new(P2, "Wild Pidgey", vec![wild], true),
        SwitchRules::default(),
    )
}

/// Ash (Pikachu, Bulbasaur) against Youngster Joey's three-member roster.
pub fn trainer_state() -> BattleGameState {
    let trainer = trainer_data();
    BattleGameState::new(
        "test-trainer".to_string(),
        BattleType::Trainer,
        PlayerSlot::new(P1, "Ash", vec![pikachu(), bulbasaur()], false),
        PlayerSlot::new(TRAINER_ID, &trainer.display_name(), trainer.roster, true),
        SwitchRules::default(),
    )
}

pub fn wild_config() -> BattleConfig {
    BattleConfig {
        battle_id: Some("wild-battle".to_string()),
        battle_type: "wild".to_string(),
        player1: SideConfig::new(P1, "Ash", vec![pikachu()]),
        player2: SideConfig::new(P2, "Wild Pidgey", vec![pidgey()]),
        switch_rules: None,
    }
}

pub fn trainer_config(trainer: TrainerData) -> TrainerBattleConfig {
    TrainerBattleConfig {
        battle_id: Some("trainer-battle".to_string()),
        player: SideConfig::new(P1, "Ash", vec![pikachu(), bulbasaur()]),
        trainer,
        switch_rules: None,
    }
}

/// Experience service that accepts every award and reports a level-up.
pub struct FixedExperience {
    new_level: u8,
    pub awarded: Mutex<Vec<(String, u32)>>,
}

impl FixedExperience {
    pub fn leveling_to(new_level: u8) -> Self {
        Self {
            new_level,
            awarded: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ExperienceService for FixedExperience {
    async fn award_experience(
        &self,
        _owner_id: &str,
        pokemon_id: &str,
        amount: u32,
    ) -> anyhow::Result<Vec<ProgressionEvent>> {
        self.awarded.lock().unwrap().push((pokemon_id.to_string(), amount));
        Ok(vec![ProgressionEvent::LevelUp {
            pokemon_id: pokemon_id.to_string(),
            new_level: self.new_level,
        }])
    }
}

/// Team manager that keeps whatever it is handed.
#[derive(Default)]
pub struct RecordingTeamManager {
    pub received: Mutex<Vec<(String, Pokemon)>>,
}

#[async_trait]
impl TeamManager for RecordingTeamManager {
    async fn add_captured(&self, player_id: &str, pokemon: Pokemon) -> anyhow::Result<()> {
        self.received.lock().unwrap().push((player_id.to_string(), pokemon));
        Ok(())
    }
}
