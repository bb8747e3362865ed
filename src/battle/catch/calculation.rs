use crate::pokemon::Pokemon;
use schema::{BallModifier, BallType, StatusType};

/// Highest possible capture rate; a rate of 255 always succeeds.
pub const MAX_CAPTURE_RATE: f64 = 255.0;

/// Calculate the capture rate using the Gen 1 formula
/// Formula:
/// rate = min(255, (capture_rate * status_multiplier * ball_multiplier * hp_multiplier) / 3)
pub fn calculate_capture_rate(target: &Pokemon, ball_multiplier: f64) -> f64 {
    let base_rate = target.capture_rate as f64;
    let status_multiplier = status_multiplier(target.status);

    // HP-based multiplier: (max_hp * 3 - current_hp * 2) / (max_hp * 3)
    let max_hp = target.max_hp.max(1) as f64;
    let current_hp = target.current_hp.min(target.max_hp) as f64;
    let hp_multiplier = (max_hp * 3.0 - current_hp * 2.0) / (max_hp * 3.0);

    let rate = (base_rate * status_multiplier * ball_multiplier * hp_multiplier) / 3.0;
    rate.min(MAX_CAPTURE_RATE)
}

/// Calculate status condition multiplier for capture rate
pub fn status_multiplier(status: StatusType) -> f64 {
    match status {
        StatusType::Sleep | StatusType::Freeze => 2.0,
        StatusType::Paralysis | StatusType::Burn | StatusType::Poison => 1.5,
        StatusType::None => 1.0,
    }
}

/// Probability in `0.0..=1.0` that `ball` captures `target` on a regular roll.
pub fn capture_probability(target: &Pokemon, ball: BallType) -> f64 {
    match ball.modifier() {
        BallModifier::Guaranteed => 1.0,
        BallModifier::Multiplier(multiplier) => {
            calculate_capture_rate(target, multiplier as f64) / MAX_CAPTURE_RATE
        }
    }
}
