//! Post-battle bookkeeping: persistence, experience and trainer rewards.

use crate::battle::events::EngineEvent;
use crate::battle::rewards::{defeat_experience, TrainerRewardManager};
use crate::battle::state::{BattleGameState, BattleRng};
use crate::collaborators::{ExperienceService, OwnedPokemonRecord, PokemonStore, ProgressionEvent};
use crate::errors::BestEffort;
use crate::player::PlayerSlot;
use crate::pokemon::Pokemon;
use crate::trainer::TrainerData;
use schema::{BattleType, EndReason, PlayerRole};
use std::sync::Arc;

/// Runs once per battle, right after it enters the terminal phase. Every
/// step is best-effort: failures are logged and the rest still runs.
#[derive(Default)]
pub struct BattleEndManager {
    store: Option<Arc<dyn PokemonStore>>,
    experience: Option<Arc<dyn ExperienceService>>,
    rewards: TrainerRewardManager,
}

impl std::fmt::Debug for BattleEndManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BattleEndManager")
            .field("store", &self.store.is_some())
            .field("experience", &self.experience.is_some())
            .finish()
    }
}

/// Finds the stored record for the battle snapshot at `position`: by combat
/// id, then by id, then by owner's roster position and level.
fn match_record<'a>(
    records: &'a [OwnedPokemonRecord],
    pokemon: &Pokemon,
    position: usize,
) -> Option<&'a OwnedPokemonRecord> {
    records
        .iter()
        .find(|record| {
            !pokemon.combat_id.is_empty()
                && record.combat_id.as_deref() == Some(pokemon.combat_id.as_str())
        })
        .or_else(|| records.iter().find(|record| record.id == pokemon.id))
        .or_else(|| {
            records
                .iter()
                .find(|record| record.roster_position == position && record.level == pokemon.level)
        })
}

impl BattleEndManager {
    pub fn new(
        store: Option<Arc<dyn PokemonStore>>,
        experience: Option<Arc<dyn ExperienceService>>,
    ) -> Self {
        Self {
            store,
            experience,
            rewards: TrainerRewardManager::new(),
        }
    }

    /// Everything that happens after the battle is decided. Returns the
    /// events to publish after `battleEnd`.
    pub async fn handle(
        &self,
        state: &BattleGameState,
        trainer: Option<&TrainerData>,
        rng: &mut BattleRng,
    ) -> Vec<EngineEvent> {
        for role in PlayerRole::BOTH {
            let player = state.player(role);
            if !player.is_ai {
                self.persist_team(player).await;
            }
        }

        let mut events = Vec::new();
        if state.winner != Some(PlayerRole::Player1) {
            return events;
        }
        match (state.battle_type, state.end_reason, trainer) {
            (BattleType::Wild, Some(EndReason::TeamDefeat), _) => {
                events.extend(self.award_wild_experience(state).await);
            }
            (BattleType::Trainer, _, Some(trainer)) => {
                let rewards = self.rewards.calculate(trainer, rng);
                log::info!(
                    "battle {}: {} earned {} money and {} experience from {}",
                    state.battle_id,
                    state.player(PlayerRole::Player1).name,
                    rewards.money,
                    rewards.experience,
                    trainer.display_name()
                );
                events.push(EngineEvent::RewardsEarned {
                    role: PlayerRole::Player1,
                    rewards,
                });
            }
            _ => {}
        }
        events
    }

    async fn persist_team(&self, player: &PlayerSlot) {
        let Some(store) = &self.store else {
            return;
        };
        let owner_id = player.owner_id();
        let Some(records) = store
            .find_owned_pokemon(owner_id)
            .await
            .best_effort("loading owned pokemon")
        else {
            return;
        };

        for (position, pokemon) in player.team.iter().enumerate() {
            if pokemon.is_wild {
                continue;
            }
            let Some(record) = match_record(&records, pokemon, position) else {
                log::debug!("no stored record for {} ({owner_id}), skipping", pokemon.name);
                continue;
            };
            let updated = OwnedPokemonRecord {
                current_hp: pokemon.current_hp,
                status: pokemon.status,
                combat_id: None,
                ..record.clone()
            };
            store
                .save_pokemon(updated)
                .await
                .best_effort("saving pokemon after battle");
        }
    }

    async fn award_wild_experience(&self, state: &BattleGameState) -> Vec<EngineEvent> {
        let Some(service) = &self.experience else {
            return Vec::new();
        };
        let (Some(winner), Some(defeated)) = (
            state.player(PlayerRole::Player1).active_pokemon(),
            state.player(PlayerRole::Player2).active_pokemon(),
        ) else {
            return Vec::new();
        };

        let amount = defeat_experience(defeated);
        let owner_id = state.player(PlayerRole::Player1).owner_id();
        let Some(progression) = service
            .award_experience(owner_id, &winner.id, amount)
            .await
            .best_effort("awarding experience")
        else {
            return Vec::new();
        };

        let mut events = vec![EngineEvent::ExperienceGained {
            pokemon_id: winner.id.clone(),
            amount,
        }];
        events.extend(progression.into_iter().map(|event| match event {
            ProgressionEvent::LevelUp { pokemon_id, new_level } => {
                EngineEvent::LevelUp { pokemon_id, new_level }
            }
            ProgressionEvent::Evolution { pokemon_id, into_species } => {
                EngineEvent::EvolutionTriggered { pokemon_id, into_species }
            }
            ProgressionEvent::NewMoves { pokemon_id, moves } => {
                EngineEvent::NewMovesAvailable { pokemon_id, moves }
            }
        }));
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::tests::common::{
        trainer_data, trainer_state, wild_state, FixedExperience, P1,
    };
    use crate::collaborators::InMemoryPokemonStore;
    use pretty_assertions::assert_eq;
    use schema::StatusType;

    fn record(id: &str, position: usize, level: u8) -> OwnedPokemonRecord {
        OwnedPokemonRecord {
            id: id.to_string(),
            owner_id: P1.to_string(),
            combat_id: None,
            roster_position: position,
            level,
            current_hp: 1,
            status: StatusType::None,
        }
    }

    #[test]
    fn test_record_matching_order() {
        let mut pokemon = wild_state().players[0].team[0].clone();
        pokemon.combat_id = "combat-7".to_string();

        let mut by_combat = record("other", 3, 99);
        by_combat.combat_id = Some("combat-7".to_string());
        let by_id = record(&pokemon.id, 4, 99);
        let by_slot = record("slot", 0, pokemon.level);

        let records = vec![by_slot.clone(), by_id.clone(), by_combat.clone()];
        assert_eq!(match_record(&records, &pokemon, 0), Some(&by_combat));
        let records = vec![by_slot.clone(), by_id.clone()];
        assert_eq!(match_record(&records, &pokemon, 0), Some(&by_id));
        let records = vec![by_slot.clone()];
        assert_eq!(match_record(&records, &pokemon, 0), Some(&by_slot));
        assert_eq!(match_record(&records, &pokemon, 1), None);
    }

    #[tokio::test]
    async fn test_persists_human_side_only() {
        let mut state = wild_state();
        let store = Arc::new(InMemoryPokemonStore::new());
        let own_id = state.players[0].team[0].id.clone();
        store.insert(record(&own_id, 0, 10)).await;

        state.player_mut(PlayerRole::Player1).team[0].set_hp(17);
        state.player_mut(PlayerRole::Player1).team[0].status = StatusType::Burn;
        state.end(PlayerRole::Player2, EndReason::TeamDefeat);

        let manager = BattleEndManager::new(Some(store.clone()), None);
        let events = manager.handle(&state, None, &mut BattleRng::new_for_test(vec![0.0])).await;
        assert!(events.is_empty());

        let saved = store.get(P1, &own_id).await.unwrap();
        assert_eq!(saved.current_hp, 17);
        assert_eq!(saved.status, StatusType::Burn);
    }

    #[tokio::test]
    async fn test_wild_victory_awards_experience() {
        let mut state = wild_state();
        state.player_mut(PlayerRole::Player2).team[0].set_hp(0);
        state.end(PlayerRole::Player1, EndReason::TeamDefeat);
        let expected = defeat_experience(&state.players[1].team[0]);

        let manager = BattleEndManager::new(None, Some(Arc::new(FixedExperience::leveling_to(11))));
        let events = manager.handle(&state, None, &mut BattleRng::new_for_test(vec![0.0])).await;
        let pokemon_id = state.players[0].team[0].id.clone();
        assert_eq!(
            events,
            vec![
                EngineEvent::ExperienceGained { pokemon_id: pokemon_id.clone(), amount: expected },
                EngineEvent::LevelUp { pokemon_id, new_level: 11 },
            ]
        );
    }

    #[tokio::test]
    async fn test_trainer_victory_earns_rewards() {
        let mut state = trainer_state();
        state.end(PlayerRole::Player1, EndReason::TeamDefeat);
        let trainer = trainer_data();

        let events = BattleEndManager::default()
            .handle(&state, Some(&trainer), &mut BattleRng::new_for_test(vec![0.0]))
            .await;
        assert!(matches!(
            events.as_slice(),
            [EngineEvent::RewardsEarned { role: PlayerRole::Player1, .. }]
        ));
    }

    #[tokio::test]
    async fn test_loss_earns_nothing() {
        let mut state = trainer_state();
        state.end(PlayerRole::Player2, EndReason::TeamDefeat);
        let events = BattleEndManager::default()
            .handle(&state, Some(&trainer_data()), &mut BattleRng::new_for_test(vec![0.0]))
            .await;
        assert!(events.is_empty());
    }
}
