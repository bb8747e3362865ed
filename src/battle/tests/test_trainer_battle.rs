#[cfg(test)]
mod tests {
    use crate::battle::action::BattleAction;
    use crate::battle::engine::BattleEngine;
    use crate::battle::events::{EngineEvent, EventKind};
    use crate::battle::phase::{BattlePhase, TrainerPhase};
    use crate::battle::tests::common::{
        decisive_trainer, trainer_config, trainer_data, P1, TRAINER_ID,
    };
    use crate::collaborators::{Collaborators, NpcTelemetry, TrainerMilestone};
    use crate::config::EngineConfig;
    use crate::errors::{ActionRejected, BattleEngineError};
    use crate::trainer::{AiProfile, TrainerData};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use schema::{ActionType, EndReason, PlayerRole};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn seeded() -> EngineConfig {
        EngineConfig {
            rng_seed: Some(11),
            ..EngineConfig::immediate()
        }
    }

    #[derive(Default)]
    struct RecordingTelemetry {
        milestones: Mutex<Vec<TrainerMilestone>>,
    }

    #[async_trait]
    impl NpcTelemetry for RecordingTelemetry {
        async fn track(&self, _player_id: &str, milestone: TrainerMilestone) -> anyhow::Result<()> {
            self.milestones.lock().unwrap().push(milestone);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_trainer_acts_as_soon_as_selection_opens() {
        let mut engine = BattleEngine::new(seeded());
        let result = engine.start_trainer_battle(trainer_config(decisive_trainer())).await;

        assert!(result.success, "{:?}", result.error);
        let state = result.game_state.as_ref().unwrap();
        assert_eq!(state.phase, BattlePhase::ActionSelection);
        assert_eq!(state.trainer_phase, Some(TrainerPhase::ActionSelection));
        assert_eq!(state.player(PlayerRole::Player2).name, "Youngster Joey");
        assert!(result.events.iter().any(|event| matches!(
            event,
            EngineEvent::ActionQueued { role: PlayerRole::Player2, .. }
        )));
    }

    #[tokio::test]
    async fn test_forced_switch_after_faint_keeps_battle_running() {
        // Arrange: the trainer's lead hangs on with 1 HP.
        let mut trainer = decisive_trainer();
        trainer.roster[0].set_hp(1);
        let mut engine = BattleEngine::new(seeded());
        engine.start_trainer_battle(trainer_config(trainer)).await;

        // Act
        let result = engine.submit_action(BattleAction::attack(P1, "tackle"), None).await;

        // Assert
        assert!(result.success);
        assert_eq!(result.events_of(EventKind::BattleEnd).count(), 0);
        assert!(result.events.contains(&EngineEvent::PokemonFainted {
            role: PlayerRole::Player2,
            pokemon: "Poochyena".to_string(),
        }));
        assert!(result.events.contains(&EngineEvent::PokemonSwitched {
            role: PlayerRole::Player2,
            from_index: 0,
            to_index: 1,
            pokemon: "Rattata".to_string(),
            forced: true,
        }));
        // Poochyena's queued bite was dropped with it.
        let processed: Vec<&EngineEvent> = result.events_of(EventKind::ActionProcessed).collect();
        assert_eq!(processed.len(), 1);

        let state = result.game_state.unwrap();
        assert_eq!(state.phase, BattlePhase::ActionSelection);
        assert_eq!(state.turn_number, 2);
        assert_eq!(state.player(PlayerRole::Player2).active_index, 1);
        assert_eq!(state.player(PlayerRole::Player1).active_pokemon().unwrap().current_hp, 30);
    }

    #[tokio::test]
    async fn test_trainer_defeat_earns_rewards_and_reports_milestones() {
        // Arrange
        let mut trainer = decisive_trainer();
        for pokemon in &mut trainer.roster {
            pokemon.set_hp(1);
        }
        let telemetry = Arc::new(RecordingTelemetry::default());
        let collaborators = Collaborators {
            telemetry: Some(telemetry.clone()),
            ..Collaborators::default()
        };
        let mut engine = BattleEngine::new(seeded()).with_collaborators(collaborators);
        engine.start_trainer_battle(trainer_config(trainer)).await;

        // Act
        let mut events = Vec::new();
        for _ in 0..3 {
            let result = engine.submit_action(BattleAction::attack(P1, "tackle"), None).await;
            assert!(result.success, "{:?}", result.error);
            events.extend(result.events);
        }

        // Assert
        let end_at = events
            .iter()
            .position(|event| {
                *event
                    == EngineEvent::BattleEnd {
                        winner: PlayerRole::Player1,
                        reason: EndReason::TeamDefeat,
                    }
            })
            .unwrap();
        assert!(matches!(
            events[end_at + 1],
            EngineEvent::RewardsEarned { role: PlayerRole::Player1, .. }
        ));
        let state = engine.current_state().unwrap();
        assert_eq!(state.trainer_phase, Some(TrainerPhase::Victory));

        let milestones = telemetry.milestones.lock().unwrap();
        assert_eq!(
            milestones.first(),
            Some(&TrainerMilestone::BattleStarted { trainer_id: TRAINER_ID.to_string() })
        );
        let defeated = milestones
            .iter()
            .filter(|m| matches!(m, TrainerMilestone::PokemonDefeated { .. }))
            .count();
        assert_eq!(defeated, 3);
        assert_eq!(
            milestones.last(),
            Some(&TrainerMilestone::BattleFinished {
                trainer_id: TRAINER_ID.to_string(),
                trainer_won: false,
            })
        );
    }

    #[tokio::test]
    async fn test_voluntary_switch_resolves_before_attacks() {
        let mut engine = BattleEngine::new(seeded());
        engine.start_trainer_battle(trainer_config(decisive_trainer())).await;

        let result = engine.submit_action(BattleAction::switch(P1, 1), None).await;

        assert!(result.success, "{:?}", result.error);
        let switch_at = result
            .events
            .iter()
            .position(|event| {
                matches!(
                    event,
                    EngineEvent::PokemonSwitched {
                        role: PlayerRole::Player1,
                        ..
                    }
                )
            })
            .unwrap();
        assert_eq!(
            result.events[switch_at],
            EngineEvent::PokemonSwitched {
                role: PlayerRole::Player1,
                from_index: 0,
                to_index: 1,
                pokemon: "Bulbasaur".to_string(),
                forced: false,
            }
        );
        let state = result.game_state.unwrap();
        let bulbasaur = state.player(PlayerRole::Player1).active_pokemon().unwrap();
        assert_eq!(bulbasaur.name, "Bulbasaur");
        assert!(bulbasaur.current_hp < bulbasaur.max_hp);
    }

    #[tokio::test]
    async fn test_trainer_battles_need_their_own_entry_point() {
        let mut engine = BattleEngine::new(seeded());
        let mut config = crate::battle::tests::common::wild_config();
        config.battle_type = "trainer".to_string();

        let result = engine.start_battle(config).await;
        assert!(!result.success);
        assert!(matches!(result.error, Some(BattleEngineError::Config(_))));

        let mut trainer = trainer_data();
        trainer.roster.clear();
        let result = engine.start_trainer_battle(trainer_config(trainer)).await;
        assert!(matches!(result.error, Some(BattleEngineError::Config(_))));
        assert!(engine.current_state().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_thinking_delay_then_decision() {
        let config = EngineConfig {
            trainer_thinking_min_ms: 600,
            trainer_thinking_max_ms: 1_800,
            ..seeded()
        };
        let mut engine = BattleEngine::new(config);
        let start = engine.start_trainer_battle(trainer_config(decisive_trainer())).await;
        assert_eq!(start.events_of(EventKind::ActionQueued).count(), 0);

        tokio::time::advance(Duration::from_millis(1_800)).await;
        let fired = engine.fire_due_timers().await;

        assert!(fired.events.iter().any(|event| matches!(
            event,
            EngineEvent::ActionQueued { role: PlayerRole::Player2, .. }
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_submits_fallback_for_silent_trainer() {
        // Arrange: the trainer would think longer than the watchdog allows.
        let config = EngineConfig {
            trainer_thinking_min_ms: 60_000,
            trainer_thinking_max_ms: 60_000,
            ai_decision_timeout_ms: 5_000,
            ..seeded()
        };
        let mut engine = BattleEngine::new(config);
        engine.start_trainer_battle(trainer_config(decisive_trainer())).await;

        let queued = engine.submit_action(BattleAction::attack(P1, "tackle"), None).await;
        assert!(queued.success);
        let before = engine.current_state().cloned();
        let duplicate = engine.submit_action(BattleAction::attack(P1, "growl"), None).await;
        assert_eq!(
            duplicate.error,
            Some(BattleEngineError::ActionRejected(ActionRejected::Duplicate(PlayerRole::Player1)))
        );
        assert_eq!(engine.current_state().cloned(), before);

        // Act
        tokio::time::advance(Duration::from_secs(5)).await;
        let fired = engine.fire_due_timers().await;

        // Assert: the fallback action completed the turn.
        assert!(fired.events.iter().any(|event| matches!(
            event,
            EngineEvent::ActionQueued { role: PlayerRole::Player2, .. }
        )));
        assert_eq!(fired.events_of(EventKind::ResolutionComplete).count(), 1);
        assert_eq!(engine.current_state().unwrap().turn_number, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trainer_attacks_when_its_switch_is_refused() {
        // Arrange: a nearly fainted lead makes the trainer want to switch.
        let mut trainer = TrainerData {
            ai_profile: AiProfile {
                aggression: 1.0,
                switch_threshold: 0.5,
                uses_type_advantage: true,
            },
            ..trainer_data()
        };
        trainer.roster[0].set_hp(1);
        let config = EngineConfig {
            trainer_thinking_min_ms: 1_000,
            trainer_thinking_max_ms: 1_000,
            ..seeded()
        };
        let mut engine = BattleEngine::new(config);
        engine.start_trainer_battle(trainer_config(trainer)).await;

        // Ash's switch uses up the only switch this turn.
        let switched = engine.submit_action(BattleAction::switch(P1, 1), None).await;
        assert!(switched.success, "{:?}", switched.error);

        // Act
        tokio::time::advance(Duration::from_millis(1_000)).await;
        let fired = engine.fire_due_timers().await;

        // Assert: the trainer attacked instead of waiting for the watchdog.
        assert!(fired.events.iter().any(|event| matches!(
            event,
            EngineEvent::ActionQueued {
                role: PlayerRole::Player2,
                action_type: ActionType::Attack,
                ..
            }
        )));
        assert_eq!(fired.events_of(EventKind::ResolutionComplete).count(), 1);
        let state = engine.current_state().unwrap();
        assert_eq!(state.turn_number, 2);
        assert_eq!(state.player(PlayerRole::Player2).active_index, 0);
    }
}
