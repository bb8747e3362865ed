#[cfg(test)]
mod tests {
    use crate::battle::action::BattleAction;
    use crate::battle::catch::CaptureError;
    use crate::battle::engine::BattleEngine;
    use crate::battle::events::{EngineEvent, EventKind};
    use crate::battle::phase::BattlePhase;
    use crate::battle::tests::common::{
        decisive_trainer, trainer_config, wild_config, FixedExperience, RecordingTeamManager, P1,
    };
    use crate::collaborators::{Collaborators, TeamManager};
    use crate::config::EngineConfig;
    use crate::errors::{ActionRejected, BattleEngineError};
    use pretty_assertions::assert_eq;
    use schema::{BallType, BattleType, EndReason, PlayerRole};
    use std::sync::Arc;

    fn seeded() -> EngineConfig {
        EngineConfig {
            rng_seed: Some(3),
            critical_capture_chance: 0.0,
            ..EngineConfig::immediate()
        }
    }

    #[tokio::test]
    async fn test_masterball_capture_ends_battle() {
        // Arrange
        let collaborators = Collaborators {
            experience: Some(Arc::new(FixedExperience::leveling_to(11))),
            ..Collaborators::default()
        };
        let mut engine = BattleEngine::new(seeded()).with_collaborators(collaborators);
        engine.start_battle(wild_config()).await;
        let team_manager = Arc::new(RecordingTeamManager::default());
        let handoff: Arc<dyn TeamManager> = team_manager.clone();

        // Act
        let result = engine
            .submit_action(BattleAction::capture(P1, BallType::Masterball), Some(handoff))
            .await;

        // Assert
        assert!(result.success);
        let ends: Vec<&EngineEvent> = result.events_of(EventKind::BattleEnd).collect();
        assert_eq!(
            ends,
            vec![&EngineEvent::BattleEnd {
                winner: PlayerRole::Player1,
                reason: EndReason::PokemonCaptured
            }]
        );
        // Captures are not defeats: no experience.
        assert_eq!(result.events_of(EventKind::ExperienceGained).count(), 0);
        // The wild Pokemon never got to attack.
        assert_eq!(result.events_of(EventKind::ActionProcessed).count(), 1);

        let state = result.game_state.unwrap();
        assert_eq!(state.phase, BattlePhase::Ended);
        assert_eq!(state.end_reason, Some(EndReason::PokemonCaptured));

        let received = team_manager.received.lock().unwrap();
        assert_eq!(received.len(), 1);
        let (player_id, caught) = &received[0];
        assert_eq!(player_id, P1);
        assert_eq!(caught.name, "Pidgey");
        assert!(!caught.is_wild);
    }

    #[tokio::test]
    async fn test_failed_capture_returns_to_resolution() {
        // Arrange: a capture rate of zero can only be beaten by a critical.
        let mut config = wild_config();
        config.player2.team.as_mut().unwrap()[0].capture_rate = 0;
        let mut engine = BattleEngine::new(seeded());
        engine.start_battle(config).await;

        // Act
        let result = engine
            .submit_action(BattleAction::capture(P1, BallType::Ultraball), None)
            .await;

        // Assert
        let phases: Vec<(BattlePhase, BattlePhase)> = result
            .events
            .iter()
            .filter_map(|event| match event {
                EngineEvent::PhaseChanged { from, to, .. } => Some((*from, *to)),
                _ => None,
            })
            .collect();
        assert_eq!(
            phases,
            vec![
                (BattlePhase::ActionSelection, BattlePhase::ActionResolution),
                (BattlePhase::ActionResolution, BattlePhase::Capture),
                (BattlePhase::Capture, BattlePhase::ActionResolution),
                (BattlePhase::ActionResolution, BattlePhase::ActionSelection),
            ]
        );
        assert_eq!(result.events_of(EventKind::ActionProcessed).count(), 2);
        let state = result.game_state.unwrap();
        assert!(!state.is_ended);
        assert_eq!(state.turn_number, 2);
    }

    #[tokio::test]
    async fn test_capture_rejected_in_trainer_battle() {
        let mut engine = BattleEngine::new(seeded());
        engine.start_trainer_battle(trainer_config(decisive_trainer())).await;
        let before = engine.current_state().cloned();

        let result = engine
            .submit_action(BattleAction::capture(P1, BallType::Pokeball), None)
            .await;

        assert_eq!(
            result.error,
            Some(BattleEngineError::ActionRejected(ActionRejected::Capture(
                CaptureError::InvalidBattleType {
                    battle_type: BattleType::Trainer
                }
            )))
        );
        assert_eq!(engine.current_state().cloned(), before);
    }
}
