use crate::battle::phase::{BattlePhase, TrainerPhase};
use crate::config::SwitchRules;
use crate::player::PlayerSlot;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use schema::{BallType, BattleType, EndReason, PlayerRole, StatusType};
use serde::{Deserialize, Serialize};

/// Battle-log entries. These are what the broadcast layer turns into text.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BattleEvent {
    // Turn Management
    TurnStarted {
        turn_number: u32,
    },

    // Pokemon Actions
    PokemonSwitched {
        role: PlayerRole,
        old_pokemon: String,
        new_pokemon: String,
        forced: bool,
    },
    MoveUsed {
        role: PlayerRole,
        pokemon: String,
        move_name: String,
    },
    Struggled {
        role: PlayerRole,
        pokemon: String,
    },
    DamageDealt {
        target: String,
        damage: u16,
        remaining_hp: u16,
    },
    RecoilTaken {
        pokemon: String,
        damage: u16,
    },
    ItemUsed {
        role: PlayerRole,
        item: String,
    },
    PokemonHealed {
        target: String,
        amount: u16,
        new_hp: u16,
    },
    StatusCured {
        target: String,
        status: StatusType,
    },
    PokemonFainted {
        role: PlayerRole,
        pokemon: String,
    },

    // Capture
    BallThrown {
        ball: BallType,
    },
    CaptureSucceeded {
        pokemon: String,
        critical: bool,
    },
    CaptureFailed {
        pokemon: String,
    },

    // Battle End
    Fled {
        role: PlayerRole,
    },
    PlayerDefeated {
        role: PlayerRole,
    },
    BattleEnded {
        winner: PlayerRole,
        reason: EndReason,
    },
}

impl BattleEvent {
    /// Formats the event into a human-readable string using battle context.
    /// Returns None for silent events that should not produce user-visible text.
    pub fn format(&self, state: &BattleGameState) -> Option<String> {
        match self {
            BattleEvent::TurnStarted { turn_number } => {
                Some(format!("=== Turn {} ===", turn_number))
            }

            BattleEvent::PokemonSwitched { role, old_pokemon, new_pokemon, forced } => {
                let player_name = &state.player(*role).name;
                if *forced {
                    Some(format!("{} sent out {}!", player_name, new_pokemon))
                } else {
                    Some(format!(
                        "{} recalled {} and sent out {}!",
                        player_name, old_pokemon, new_pokemon
                    ))
                }
            }
            BattleEvent::MoveUsed { role, pokemon, move_name } => {
                let player_name = &state.player(*role).name;
                Some(format!("{}'s {} used {}!", player_name, pokemon, move_name))
            }
            BattleEvent::Struggled { pokemon, .. } => {
                Some(format!("{} has no moves left and used Struggle!", pokemon))
            }
            BattleEvent::DamageDealt { target, damage, .. } => {
                Some(format!("{} took {} damage!", target, damage))
            }
            BattleEvent::RecoilTaken { pokemon, .. } => {
                Some(format!("{} is damaged by recoil!", pokemon))
            }
            BattleEvent::ItemUsed { role, item } => {
                Some(format!("{} used a {}!", state.player(*role).name, item))
            }
            BattleEvent::PokemonHealed { target, amount, .. } => {
                Some(format!("{} recovered {} HP!", target, amount))
            }
            BattleEvent::StatusCured { target, status } => {
                Some(format!("{} was cured of its {}!", target, status))
            }
            BattleEvent::PokemonFainted { pokemon, .. } => Some(format!("{} fainted!", pokemon)),

            BattleEvent::BallThrown { ball } => {
                Some(format!("{} threw a {}!", state.player(PlayerRole::Player1).name, ball))
            }
            BattleEvent::CaptureSucceeded { pokemon, critical } => {
                if *critical {
                    Some(format!("A critical capture! Gotcha! {} was caught!", pokemon))
                } else {
                    Some(format!("Gotcha! {} was caught!", pokemon))
                }
            }
            BattleEvent::CaptureFailed { pokemon } => {
                Some(format!("Oh no! {} broke free!", pokemon))
            }

            BattleEvent::Fled { role } => {
                Some(format!("{} got away safely!", state.player(*role).name))
            }
            BattleEvent::PlayerDefeated { role } => Some(format!(
                "{} is out of usable Pokémon!",
                state.player(*role).name
            )),
            // The end is announced through the engine event.
            BattleEvent::BattleEnded { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
enum RngSource {
    Seeded(StdRng),
    Scripted { outcomes: Vec<f64>, index: usize },
}

/// The per-battle random source. Entropy-seeded in production, fixed-seed for
/// reproducible simulations, scripted in tests.
#[derive(Debug, Clone)]
pub struct BattleRng {
    source: RngSource,
}

impl BattleRng {
    pub fn from_entropy() -> Self {
        Self {
            source: RngSource::Seeded(StdRng::from_os_rng()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            source: RngSource::Seeded(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }

    /// Replays `outcomes` (each in `0.0..1.0`) in order, wrapping around.
    pub fn new_for_test(outcomes: Vec<f64>) -> Self {
        Self {
            source: RngSource::Scripted { outcomes, index: 0 },
        }
    }

    /// A uniform draw in `0.0..1.0`.
    pub fn next_f64(&mut self, reason: &str) -> f64 {
        let outcome = match &mut self.source {
            RngSource::Seeded(rng) => rng.random::<f64>(),
            RngSource::Scripted { outcomes, index } => {
                if outcomes.is_empty() {
                    0.0
                } else {
                    let value = outcomes[*index % outcomes.len()];
                    *index += 1;
                    value
                }
            }
        };
        log::trace!("[RNG] consumed {outcome:.4} for: {reason}");
        outcome
    }

    pub fn chance(&mut self, reason: &str, probability: f64) -> bool {
        self.next_f64(reason) < probability
    }

    /// A uniform index into a collection of `len` elements. `len` must be positive.
    pub fn pick_index(&mut self, reason: &str, len: usize) -> usize {
        let index = (self.next_f64(reason) * len as f64) as usize;
        index.min(len.saturating_sub(1))
    }

    /// A uniform value in `low..=high`.
    pub fn range_u64(&mut self, reason: &str, low: u64, high: u64) -> u64 {
        if high <= low {
            return low;
        }
        let span = high - low + 1;
        low + ((self.next_f64(reason) * span as f64) as u64).min(span - 1)
    }
}

/// The complete state of one battle. Exactly one exists per running battle and
/// it is owned by that battle's engine.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BattleGameState {
    pub battle_id: String,
    pub battle_type: BattleType,
    pub phase: BattlePhase,
    pub turn_number: u32,
    /// The side whose action is being resolved, if any.
    pub current_turn: Option<PlayerRole>,
    pub players: [PlayerSlot; 2],
    pub is_ended: bool,
    pub winner: Option<PlayerRole>,
    pub end_reason: Option<EndReason>,
    pub is_multi_pokemon_battle: bool,
    pub switch_rules: SwitchRules,
    pub trainer_phase: Option<TrainerPhase>,
}

impl BattleGameState {
    pub fn new(
        battle_id: String,
        battle_type: BattleType,
        player1: PlayerSlot,
        player2: PlayerSlot,
        switch_rules: SwitchRules,
    ) -> Self {
        let is_multi_pokemon_battle =
            player1.has_multiple_pokemon() || player2.has_multiple_pokemon();
        let trainer_phase = (battle_type == BattleType::Trainer).then_some(TrainerPhase::Intro);
        Self {
            battle_id,
            battle_type,
            phase: BattlePhase::Intro,
            turn_number: 1,
            current_turn: None,
            players: [player1, player2],
            is_ended: false,
            winner: None,
            end_reason: None,
            is_multi_pokemon_battle,
            switch_rules,
            trainer_phase,
        }
    }

    pub fn player(&self, role: PlayerRole) -> &PlayerSlot {
        &self.players[role.index()]
    }

    pub fn player_mut(&mut self, role: PlayerRole) -> &mut PlayerSlot {
        &mut self.players[role.index()]
    }

    pub fn role_of(&self, session_id: &str) -> Option<PlayerRole> {
        PlayerRole::BOTH
            .into_iter()
            .find(|role| self.player(*role).session_id == session_id)
    }

    /// Switching needs somewhere to switch to.
    pub fn switching_permitted(&self) -> bool {
        self.switch_rules.enabled && self.is_multi_pokemon_battle
    }

    /// Non-terminal phase changes. Keeps the trainer phase in step.
    pub(crate) fn set_phase(&mut self, phase: BattlePhase) {
        self.phase = phase;
        if self.trainer_phase.is_some() {
            self.trainer_phase = Some(TrainerPhase::from_machine(phase, self.winner));
        }
    }

    /// The only way into `Ended`: phase, flag, winner and reason move together.
    pub(crate) fn end(&mut self, winner: PlayerRole, reason: EndReason) {
        self.winner = Some(winner);
        self.end_reason = Some(reason);
        self.is_ended = true;
        self.current_turn = None;
        self.set_phase(BattlePhase::Ended);
    }

    /// Checks the ended/phase/winner triple agrees.
    pub fn outcome_is_consistent(&self) -> bool {
        let ended = self.phase == BattlePhase::Ended;
        self.is_ended == ended && self.winner.is_some() == ended
    }
}
