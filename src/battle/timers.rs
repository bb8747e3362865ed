//! Deadlines for the engine's delayed transitions and safety nets.
//!
//! The engine never spawns timer tasks. It records deadlines here, and whoever
//! drives it (usually the session actor) sleeps until [`SafetyTimers::next_deadline`]
//! and then calls back into the engine.

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// End of the intro; moves the battle into its first action selection.
    Intro,
    /// End of the trainer AI's thinking delay.
    AiDecision,
    /// The AI side still has not acted; submit a fallback action.
    AiWatchdog,
    /// Lifetime ceiling of the battle instance.
    Crash,
}

#[derive(Debug, Default, Clone)]
pub struct SafetyTimers {
    intro_at: Option<Instant>,
    ai_decision_at: Option<Instant>,
    ai_watchdog_at: Option<Instant>,
    crash_at: Option<Instant>,
}

impl SafetyTimers {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, kind: TimerKind) -> &mut Option<Instant> {
        match kind {
            TimerKind::Intro => &mut self.intro_at,
            TimerKind::AiDecision => &mut self.ai_decision_at,
            TimerKind::AiWatchdog => &mut self.ai_watchdog_at,
            TimerKind::Crash => &mut self.crash_at,
        }
    }

    pub fn schedule(&mut self, kind: TimerKind, at: Instant) {
        log::trace!("timer {kind:?} armed");
        *self.slot(kind) = Some(at);
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        *self.slot(kind) = None;
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        match kind {
            TimerKind::Intro => self.intro_at.is_some(),
            TimerKind::AiDecision => self.ai_decision_at.is_some(),
            TimerKind::AiWatchdog => self.ai_watchdog_at.is_some(),
            TimerKind::Crash => self.crash_at.is_some(),
        }
    }

    /// Disarm and return every timer due at `now`, crash timeout first.
    pub fn take_due(&mut self, now: Instant) -> Vec<TimerKind> {
        [TimerKind::Crash, TimerKind::Intro, TimerKind::AiDecision, TimerKind::AiWatchdog]
            .into_iter()
            .filter(|kind| {
                let slot = self.slot(*kind);
                match *slot {
                    Some(at) if at <= now => {
                        *slot = None;
                        true
                    }
                    _ => false,
                }
            })
            .collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        [self.intro_at, self.ai_decision_at, self.ai_watchdog_at, self.crash_at]
            .into_iter()
            .flatten()
            .min()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
