use crate::battle::state::BattleGameState;
use schema::{BattleType, PlayerRole};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// Capture attempts not allowed in this battle type
    #[error("{battle_type} battles do not allow captures")]
    InvalidBattleType { battle_type: BattleType },
    /// Only the human side throws balls
    #[error("{0} cannot throw balls")]
    NotCapturingSide(PlayerRole),
    /// No active Pokemon on the opponent's side to capture
    #[error("there is no pokemon to capture")]
    NoTargetPokemon,
    /// Target Pokemon is already fainted
    #[error("{pokemon} has fainted")]
    TargetFainted { pokemon: String },
}

/// Check if capture attempts are allowed based on battle type
pub fn is_capture_allowed(battle_type: BattleType) -> bool {
    battle_type.allows_capture()
}

/// Validate that `role` may throw a ball right now.
pub fn can_attempt_capture(state: &BattleGameState, role: PlayerRole) -> Result<(), CaptureError> {
    if !is_capture_allowed(state.battle_type) {
        return Err(CaptureError::InvalidBattleType {
            battle_type: state.battle_type,
        });
    }
    if role != PlayerRole::Player1 {
        return Err(CaptureError::NotCapturingSide(role));
    }

    match state.player(role.opponent()).active_pokemon() {
        Some(target) if target.is_fainted() => Err(CaptureError::TargetFainted {
            pokemon: target.name.clone(),
        }),
        Some(_) => Ok(()),
        None => Err(CaptureError::NoTargetPokemon),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::tests::common::{trainer_state, wild_state};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_capture_allowed_in_wild_battle() {
        let state = wild_state();
        assert_eq!(can_attempt_capture(&state, PlayerRole::Player1), Ok(()));
        assert_eq!(
            can_attempt_capture(&state, PlayerRole::Player2),
            Err(CaptureError::NotCapturingSide(PlayerRole::Player2))
        );
    }

    #[test]
    fn test_capture_rejected_in_trainer_battle() {
        let state = trainer_state();
        assert_eq!(
            can_attempt_capture(&state, PlayerRole::Player1),
            Err(CaptureError::InvalidBattleType {
                battle_type: BattleType::Trainer
            })
        );
    }

    #[test]
    fn test_capture_rejected_for_fainted_target() {
        let mut state = wild_state();
        state.player_mut(PlayerRole::Player2).active_pokemon_mut().unwrap().set_hp(0);
        assert!(matches!(
            can_attempt_capture(&state, PlayerRole::Player1),
            Err(CaptureError::TargetFainted { .. })
        ));
    }
}
