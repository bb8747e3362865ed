use crate::battle::catch::{can_attempt_capture, capture_probability, CaptureError};
use crate::battle::state::{BattleEvent, BattleGameState, BattleRng};
use crate::pokemon::Pokemon;
use schema::{BallModifier, BallType, PlayerRole};

#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOutcome {
    pub success: bool,
    pub critical: bool,
    pub probability: f64,
    /// Snapshot of the target at the moment the ball was thrown.
    pub pokemon: Pokemon,
    pub messages: Vec<BattleEvent>,
}

/// Resolves thrown balls. Phase handling and the hand-off of a caught
/// Pokemon are done by the engine around [`CaptureManager::attempt_capture`].
#[derive(Debug)]
pub struct CaptureManager {
    critical_chance: f64,
}

impl CaptureManager {
    pub fn new(critical_chance: f64) -> Self {
        Self { critical_chance }
    }

    pub fn attempt_capture(
        &self,
        state: &BattleGameState,
        role: PlayerRole,
        ball: BallType,
        rng: &mut BattleRng,
    ) -> Result<CaptureOutcome, CaptureError> {
        can_attempt_capture(state, role)?;
        let target = state
            .player(role.opponent())
            .active_pokemon()
            .ok_or(CaptureError::NoTargetPokemon)?
            .clone();

        let probability = capture_probability(&target, ball);
        let (success, critical) = match ball.modifier() {
            BallModifier::Guaranteed => (true, false),
            BallModifier::Multiplier(_) => {
                if rng.chance("critical capture", self.critical_chance) {
                    (true, true)
                } else {
                    (rng.chance("capture roll", probability), false)
                }
            }
        };
        log::debug!(
            "{role} threw a {ball} at {}: p={probability:.3}, success={success}, critical={critical}",
            target.name
        );

        let mut messages = vec![BattleEvent::BallThrown { ball }];
        messages.push(if success {
            BattleEvent::CaptureSucceeded {
                pokemon: target.name.clone(),
                critical,
            }
        } else {
            BattleEvent::CaptureFailed {
                pokemon: target.name.clone(),
            }
        });

        Ok(CaptureOutcome {
            success,
            critical,
            probability,
            pokemon: target,
            messages,
        })
    }
}
