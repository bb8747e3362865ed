//! A module for defining AI behaviors for battle opponents.

use crate::battle::action::BattleAction;
use crate::battle::state::{BattleGameState, BattleRng};
use crate::battle::switch::SwitchManager;
use crate::config::EngineConfig;
use crate::pokemon::Pokemon;
use crate::trainer::AiProfile;
use async_trait::async_trait;
use ordered_float::OrderedFloat;
use schema::{MoveCategory, MoveData, PlayerRole, STRUGGLE_ID};
use std::sync::Arc;
use std::time::Duration;

/// The wild-Pokemon AI. Never thinks, never switches, always attacks.
#[derive(Debug, Default)]
pub struct AiPlayer;

impl AiPlayer {
    pub fn new() -> Self {
        Self
    }

    /// A uniformly random offensive move with PP left. Falls back to any move
    /// with PP, then to struggle.
    pub fn choose_action(
        &self,
        state: &BattleGameState,
        role: PlayerRole,
        rng: &mut BattleRng,
    ) -> BattleAction {
        let player = state.player(role);
        let move_id = player
            .active_pokemon()
            .and_then(|pokemon| Self::pick_move(pokemon, rng))
            .unwrap_or_else(|| STRUGGLE_ID.to_string());
        BattleAction::attack(&player.session_id, &move_id)
    }

    fn pick_move(pokemon: &Pokemon, rng: &mut BattleRng) -> Option<String> {
        let usable: Vec<&str> = pokemon
            .moves
            .iter()
            .filter(|slot| slot.pp > 0)
            .map(|slot| slot.move_id.as_str())
            .collect();
        let offensive: Vec<&str> = usable
            .iter()
            .copied()
            .filter(|id| MoveData::lookup(id).is_some_and(MoveData::is_offensive))
            .collect();

        let pool = if offensive.is_empty() { usable } else { offensive };
        if pool.is_empty() {
            return None;
        }
        Some(pool[rng.pick_index("ai move choice", pool.len())].to_string())
    }
}

/// Decides a trainer's action for one turn.
#[async_trait]
pub trait TrainerStrategy: Send + Sync {
    async fn decide(
        &self,
        state: &BattleGameState,
        role: PlayerRole,
        profile: &AiProfile,
        rng: &mut BattleRng,
    ) -> anyhow::Result<BattleAction>;
}

/// The default trainer strategy: score every usable move, switch out of a
/// losing position, and take the best option most of the time.
#[derive(Debug, Default)]
pub struct ProfileStrategy;

impl ProfileStrategy {
    pub fn new() -> Self {
        Self
    }

    /// Power × type effectiveness × STAB. Immune matchups score -1, status
    /// moves score 0.
    pub fn score_move(
        data: &MoveData,
        attacker: &Pokemon,
        defender: &Pokemon,
        profile: &AiProfile,
    ) -> f64 {
        if data.category == MoveCategory::Status || data.power == 0 {
            return 0.0;
        }
        let effectiveness = if profile.uses_type_advantage {
            data.move_type.effectiveness_against_all(&defender.types) as f64
        } else {
            1.0
        };
        // If the opponent is immune, this is a terrible move.
        if effectiveness < 0.1 {
            return -1.0;
        }
        let stab = if attacker.types.contains(&data.move_type) { 1.5 } else { 1.0 };
        data.power as f64 * effectiveness * stab
    }

    fn best_move(
        attacker: &Pokemon,
        defender: &Pokemon,
        profile: &AiProfile,
    ) -> Option<(&'static MoveData, f64)> {
        attacker
            .moves
            .iter()
            .filter(|slot| slot.pp > 0)
            .filter_map(|slot| slot.data())
            .map(|data| (data, Self::score_move(data, attacker, defender, profile)))
            .max_by_key(|(_, score)| OrderedFloat(*score))
    }

    /// The healthiest bench member, if switching is open to this side.
    fn switch_target(state: &BattleGameState, role: PlayerRole) -> Option<usize> {
        let analysis = SwitchManager::new().analyze_switch_options(state, role);
        if !analysis.can_switch {
            return None;
        }
        let team = &state.player(role).team;
        analysis
            .available_indices
            .into_iter()
            .max_by_key(|&index| OrderedFloat(team[index].hp_fraction()))
    }
}

#[async_trait]
impl TrainerStrategy for ProfileStrategy {
    async fn decide(
        &self,
        state: &BattleGameState,
        role: PlayerRole,
        profile: &AiProfile,
        rng: &mut BattleRng,
    ) -> anyhow::Result<BattleAction> {
        let player = state.player(role);
        let attacker = player
            .active_pokemon()
            .ok_or_else(|| anyhow::anyhow!("{role} has no active pokemon"))?;
        let defender = state
            .player(role.opponent())
            .active_pokemon()
            .ok_or_else(|| anyhow::anyhow!("{} has no active pokemon", role.opponent()))?;

        let best = Self::best_move(attacker, defender, profile);
        let cornered = !matches!(best, Some((_, score)) if score >= 0.0);
        if attacker.hp_fraction() < profile.switch_threshold || cornered {
            if let Some(index) = Self::switch_target(state, role) {
                log::debug!("{} recalls {} for slot {index}", player.name, attacker.name);
                return Ok(BattleAction::switch(&player.session_id, index));
            }
        }

        match best {
            Some((data, _)) if rng.chance("trainer ai aggression", profile.aggression) => {
                Ok(BattleAction::attack(&player.session_id, data.id))
            }
            _ => Ok(AiPlayer::new().choose_action(state, role, rng)),
        }
    }
}

/// Trainer AI: a thinking delay, then the strategy's decision, with the wild
/// AI as the fallback when the strategy fails or runs out of time.
pub struct TrainerAi {
    profile: AiProfile,
    strategy: Arc<dyn TrainerStrategy>,
    thinking: (Duration, Duration),
    decision_timeout: Duration,
}

impl std::fmt::Debug for TrainerAi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainerAi")
            .field("profile", &self.profile)
            .field("thinking", &self.thinking)
            .field("decision_timeout", &self.decision_timeout)
            .finish()
    }
}

impl TrainerAi {
    pub fn new(
        profile: AiProfile,
        strategy: Arc<dyn TrainerStrategy>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            profile,
            strategy,
            thinking: config.trainer_thinking_range(),
            decision_timeout: config.ai_decision_timeout(),
        }
    }

    pub fn thinking_delay(&self, rng: &mut BattleRng) -> Duration {
        let (min, max) = self.thinking;
        let millis = rng.range_u64(
            "trainer thinking delay",
            min.as_millis() as u64,
            max.as_millis() as u64,
        );
        Duration::from_millis(millis)
    }

    pub async fn decide(
        &self,
        state: &BattleGameState,
        role: PlayerRole,
        rng: &mut BattleRng,
    ) -> BattleAction {
        let decision = tokio::time::timeout(
            self.decision_timeout,
            self.strategy.decide(state, role, &self.profile, rng),
        )
        .await;
        match decision {
            Ok(Ok(action)) => action,
            Ok(Err(err)) => {
                log::warn!("trainer strategy failed, falling back to random attack: {err:#}");
                AiPlayer::new().choose_action(state, role, rng)
            }
            Err(_) => {
                log::warn!("trainer strategy timed out after {:?}", self.decision_timeout);
                AiPlayer::new().choose_action(state, role, rng)
            }
        }
    }
}
