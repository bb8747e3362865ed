use crate::battle::catch::CaptureError;
use crate::battle::phase::BattlePhase;
use schema::{ActionType, PlayerRole};
use thiserror::Error;

/// Main error type for the battle engine's critical path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BattleEngineError {
    #[error("invalid battle config: {0}")]
    Config(#[from] ConfigValidationError),
    #[error("action rejected: {0}")]
    ActionRejected(#[from] ActionRejected),
    #[error("phase transition failed: {0}")]
    Transition(#[from] TransitionFailure),
    #[error("action processing failed: {0}")]
    Processing(#[from] ProcessingFailure),
    #[error("battle stalled: {0}")]
    Stall(#[from] StallTimeout),
    #[error("no battle is running on this engine")]
    NotStarted,
    #[error("a battle is already running on this engine")]
    AlreadyStarted,
    #[error("the battle session has shut down")]
    SessionClosed,
}

/// A start config that cannot produce a battle. The battle never starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("unknown battle type `{0}`")]
    InvalidBattleType(String),
    #[error("{0} has neither an active pokemon nor a roster")]
    MissingPokemon(PlayerRole),
    #[error("{0} brought a roster with no battle-ready pokemon")]
    NoBattleReadyPokemon(PlayerRole),
    #[error("{role} roster has {size} members, the limit is {max}")]
    RosterTooLarge { role: PlayerRole, size: usize, max: usize },
    #[error("{0} has an empty session id")]
    MissingSessionId(PlayerRole),
    #[error("both sides share the session id `{0}`")]
    DuplicateSessionId(String),
    #[error("trainer `{0}` has an empty roster")]
    EmptyTrainerRoster(String),
    #[error("trainer battles must be started with start_trainer_battle")]
    TrainerConfigRequired,
    #[error("could not parse engine config: {0}")]
    Parse(String),
}

/// An inbound action the engine refused. The battle continues unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionRejected {
    #[error("player `{0}` is not part of this battle")]
    UnknownPlayer(String),
    #[error("{action_type} actions are not accepted during {phase}")]
    WrongPhase { action_type: ActionType, phase: BattlePhase },
    #[error("{0} already submitted an action this turn")]
    Duplicate(PlayerRole),
    #[error("{0} actions are not allowed in this battle")]
    NotAllowed(ActionType),
    #[error("switching is disabled for this battle")]
    SwitchingDisabled,
    #[error("{0} has no other battle-ready pokemon to switch to")]
    NoSwitchTarget(PlayerRole),
    #[error("roster slot {0} cannot be switched in")]
    InvalidSwitchTarget(usize),
    #[error("switch limit of {0} per turn reached")]
    SwitchLimitReached(usize),
    #[error("active pokemon does not know `{0}`")]
    UnknownMove(String),
    #[error("unknown item `{0}`")]
    UnknownItem(String),
    #[error("capture not possible: {0}")]
    Capture(#[from] CaptureError),
}

/// The phase machine refused a transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionFailure {
    #[error("illegal transition {from} -> {to}")]
    Illegal { from: BattlePhase, to: BattlePhase },
    #[error("transition {from} -> {to} failed again after a forced retry")]
    Escalated { from: BattlePhase, to: BattlePhase },
}

/// A single action's processing failed; only that action is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessingFailure {
    #[error("{0} has no active pokemon")]
    NoActivePokemon(PlayerRole),
    #[error("move `{0}` is not in the move catalogue")]
    UnknownMove(String),
    #[error("item `{0}` is not in the item table")]
    UnknownItem(String),
    #[error("{0} actions cannot be processed by the action processor")]
    Unsupported(ActionType),
}

/// A safety net fired because the battle stopped making progress.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StallTimeout {
    #[error("turn ceiling of {0} reached")]
    MaxTurns(u32),
    #[error("battle exceeded its lifetime of {0} seconds")]
    CrashTimeout(u64),
}

/// Type alias for Results using BattleEngineError
pub type BattleResult<T> = Result<T, BattleEngineError>;

/// Extension for best-effort operations on collaborator results. A failure
/// is logged and degrades to `None`; it never reaches the battle's own
/// error domain.
pub trait BestEffort<T> {
    fn best_effort(self, operation: &str) -> Option<T>;
}

impl<T> BestEffort<T> for anyhow::Result<T> {
    fn best_effort(self, operation: &str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("{operation} failed, continuing without it: {err:#}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_error_messages_read_naturally() {
        let err: BattleEngineError = ActionRejected::Duplicate(PlayerRole::Player1).into();
        assert_eq!(
            err.to_string(),
            "action rejected: player1 already submitted an action this turn"
        );

        let err: BattleEngineError = ConfigValidationError::InvalidBattleType("raid".into()).into();
        assert_eq!(err.to_string(), "invalid battle config: unknown battle type `raid`");
    }

    #[test]
    fn test_best_effort_degrades_errors() {
        let ok: anyhow::Result<u8> = Ok(3);
        assert_eq!(ok.best_effort("lookup"), Some(3));

        let failed: anyhow::Result<u8> = Err(anyhow!("store offline"));
        assert_eq!(failed.best_effort("lookup"), None);
    }
}
