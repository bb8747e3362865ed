//! The battle phase machine and the action-legality gate.

use crate::battle::state::BattleGameState;
use crate::errors::{ActionRejected, TransitionFailure};
use schema::{ActionType, EndReason, PlayerRole};
use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BattlePhase {
    Intro,
    ActionSelection,
    ActionResolution,
    Capture,
    Ended,
}

impl BattlePhase {
    pub fn is_terminal(self) -> bool {
        self == BattlePhase::Ended
    }
}

/// Semantic phases shown for trainer battles. Each one maps onto a phase of
/// the regular machine, so trainer battles never need their own transitions.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TrainerPhase {
    Intro,
    ActionSelection,
    Resolution,
    ForcedSwitch,
    Victory,
    Defeat,
}

impl TrainerPhase {
    pub fn machine_phase(self) -> BattlePhase {
        match self {
            TrainerPhase::Intro => BattlePhase::Intro,
            TrainerPhase::ActionSelection => BattlePhase::ActionSelection,
            TrainerPhase::Resolution | TrainerPhase::ForcedSwitch => BattlePhase::ActionResolution,
            TrainerPhase::Victory | TrainerPhase::Defeat => BattlePhase::Ended,
        }
    }

    /// The semantic phase for a machine phase. `winner` only matters for `Ended`:
    /// the human side is always player 1.
    pub fn from_machine(phase: BattlePhase, winner: Option<PlayerRole>) -> Self {
        match phase {
            BattlePhase::Intro => TrainerPhase::Intro,
            BattlePhase::ActionSelection => TrainerPhase::ActionSelection,
            BattlePhase::ActionResolution | BattlePhase::Capture => TrainerPhase::Resolution,
            BattlePhase::Ended => match winner {
                Some(PlayerRole::Player1) => TrainerPhase::Victory,
                _ => TrainerPhase::Defeat,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    pub from: BattlePhase,
    pub to: BattlePhase,
    pub forced: bool,
}

/// Legal moves of the phase machine. `Ended` is reachable from every
/// non-terminal phase and has no way out.
pub fn is_legal_transition(from: BattlePhase, to: BattlePhase) -> bool {
    use BattlePhase::*;
    match (from, to) {
        (Ended, _) => false,
        (_, Ended) => true,
        (Intro, ActionSelection) => true,
        (ActionSelection, ActionResolution) => true,
        (ActionResolution, ActionSelection) | (ActionResolution, Capture) => true,
        (Capture, ActionResolution) | (Capture, ActionSelection) => true,
        _ => false,
    }
}

#[derive(Debug, Default)]
pub struct PhaseManager {
    // Failed transitions since the last legal one.
    failed_attempts: u32,
}

impl PhaseManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Actions are only accepted while both sides are choosing.
    pub fn validate_action(
        &self,
        phase: BattlePhase,
        action_type: ActionType,
    ) -> Result<(), ActionRejected> {
        if phase == BattlePhase::ActionSelection {
            Ok(())
        } else {
            Err(ActionRejected::WrongPhase { action_type, phase })
        }
    }

    /// Move to `to` if the transition table allows it. `Ended` is entered
    /// through [`PhaseManager::end_battle`], which also records the outcome.
    pub fn set_phase(
        &mut self,
        state: &mut BattleGameState,
        to: BattlePhase,
    ) -> Result<PhaseChange, TransitionFailure> {
        let from = state.phase;
        if to == BattlePhase::Ended || !is_legal_transition(from, to) {
            return Err(TransitionFailure::Illegal { from, to });
        }
        self.failed_attempts = 0;
        state.set_phase(to);
        log::debug!("battle {}: phase {from} -> {to}", state.battle_id);
        Ok(PhaseChange { from, to, forced: false })
    }

    /// Move to `to` without consulting the table. Recovery only.
    pub fn force_transition(
        &mut self,
        state: &mut BattleGameState,
        to: BattlePhase,
    ) -> PhaseChange {
        let from = state.phase;
        log::warn!("battle {}: forcing phase {from} -> {to}", state.battle_id);
        state.set_phase(to);
        PhaseChange { from, to, forced: true }
    }

    /// `set_phase` with the retry policy: the first failure is retried as a
    /// forced transition, a second failure before any legal transition
    /// succeeds is returned as `Escalated` and must end the battle.
    pub fn transition(
        &mut self,
        state: &mut BattleGameState,
        to: BattlePhase,
    ) -> Result<PhaseChange, TransitionFailure> {
        match self.set_phase(state, to) {
            Ok(change) => Ok(change),
            Err(TransitionFailure::Illegal { from, to })
                if !from.is_terminal() && !to.is_terminal() =>
            {
                self.failed_attempts += 1;
                if self.failed_attempts > 1 {
                    log::error!(
                        "battle {}: transition {from} -> {to} failed {} times, escalating",
                        state.battle_id,
                        self.failed_attempts
                    );
                    return Err(TransitionFailure::Escalated { from, to });
                }
                Ok(self.force_transition(state, to))
            }
            Err(err) => Err(err),
        }
    }

    /// Enter the terminal phase, recording the winner and reason together.
    pub fn end_battle(
        &mut self,
        state: &mut BattleGameState,
        winner: PlayerRole,
        reason: EndReason,
    ) -> Result<PhaseChange, TransitionFailure> {
        let from = state.phase;
        if !is_legal_transition(from, BattlePhase::Ended) {
            return Err(TransitionFailure::Illegal { from, to: BattlePhase::Ended });
        }
        self.failed_attempts = 0;
        state.end(winner, reason);
        log::debug!("battle {}: phase {from} -> ended ({reason})", state.battle_id);
        Ok(PhaseChange { from, to: BattlePhase::Ended, forced: false })
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }
}
