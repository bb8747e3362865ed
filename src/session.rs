//! Runs a [`BattleEngine`] on its own task.
//!
//! The engine is single-threaded and timer-driven. A session owns it, feeds it
//! commands from a channel and wakes it when its next deadline passes, so
//! callers never need to poll `fire_due_timers` themselves.

use crate::battle::action::BattleAction;
use crate::battle::engine::{BattleConfig, BattleEngine, EngineResult, TrainerBattleConfig};
use crate::battle::events::EngineEvent;
use crate::battle::state::BattleGameState;
use crate::collaborators::TeamManager;
use crate::errors::{BattleEngineError, BattleResult};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

const COMMAND_BUFFER: usize = 32;

enum Command {
    Start(BattleConfig, oneshot::Sender<EngineResult>),
    StartTrainer(TrainerBattleConfig, oneshot::Sender<EngineResult>),
    Submit(BattleAction, Option<Arc<dyn TeamManager>>, oneshot::Sender<EngineResult>),
    State(oneshot::Sender<Option<BattleGameState>>),
    Subscribe(oneshot::Sender<broadcast::Receiver<EngineEvent>>),
    Shutdown,
}

/// Cheap, cloneable access to a running session.
#[derive(Clone)]
pub struct BattleHandle {
    commands: mpsc::Sender<Command>,
}

pub struct BattleSession;

impl BattleSession {
    /// Moves `engine` onto a new task. The join handle returns the engine,
    /// reset, once every handle is dropped or [`BattleHandle::shutdown`] is
    /// called.
    pub fn spawn(engine: BattleEngine) -> (BattleHandle, JoinHandle<BattleEngine>) {
        let (commands, rx) = mpsc::channel(COMMAND_BUFFER);
        let task = tokio::spawn(run(engine, rx));
        (BattleHandle { commands }, task)
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn run(mut engine: BattleEngine, mut rx: mpsc::Receiver<Command>) -> BattleEngine {
    loop {
        tokio::select! {
            biased;
            _ = wait_for(engine.next_deadline()) => {
                engine.fire_due_timers().await;
                if engine.crashed() {
                    log::warn!("battle session closing after a crash timeout");
                    break;
                }
            },
            command = rx.recv() => {
                let Some(command) = command else {
                    break;
                };
                match command {
                    Command::Start(config, reply) => {
                        let _ = reply.send(engine.start_battle(config).await);
                    }
                    Command::StartTrainer(config, reply) => {
                        let _ = reply.send(engine.start_trainer_battle(config).await);
                    }
                    Command::Submit(action, team_manager, reply) => {
                        let _ = reply.send(engine.submit_action(action, team_manager).await);
                    }
                    Command::State(reply) => {
                        let _ = reply.send(engine.current_state().cloned());
                    }
                    Command::Subscribe(reply) => {
                        let _ = reply.send(engine.subscribe());
                    }
                    Command::Shutdown => break,
                }
            },
        }
    }
    log::debug!("battle session stopped");
    engine.reset();
    engine
}

impl BattleHandle {
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> BattleResult<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| BattleEngineError::SessionClosed)?;
        response.await.map_err(|_| BattleEngineError::SessionClosed)
    }

    pub async fn start_battle(&self, config: BattleConfig) -> BattleResult<EngineResult> {
        self.request(|reply| Command::Start(config, reply)).await
    }

    pub async fn start_trainer_battle(
        &self,
        config: TrainerBattleConfig,
    ) -> BattleResult<EngineResult> {
        self.request(|reply| Command::StartTrainer(config, reply)).await
    }

    pub async fn submit_action(
        &self,
        action: BattleAction,
        team_manager: Option<Arc<dyn TeamManager>>,
    ) -> BattleResult<EngineResult> {
        self.request(|reply| Command::Submit(action, team_manager, reply)).await
    }

    pub async fn state(&self) -> BattleResult<Option<BattleGameState>> {
        self.request(Command::State).await
    }

    pub async fn subscribe(&self) -> BattleResult<broadcast::Receiver<EngineEvent>> {
        self.request(Command::Subscribe).await
    }

    pub async fn shutdown(&self) -> BattleResult<()> {
        self.commands
            .send(Command::Shutdown)
            .await
            .map_err(|_| BattleEngineError::SessionClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::events::EventKind;
    use crate::battle::phase::BattlePhase;
    use crate::battle::tests::common::{decisive_trainer, trainer_config, wild_config, P1};
    use crate::config::EngineConfig;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_session_drives_timers_on_its_own() {
        // Arrange: intro and trainer thinking both need the clock.
        let config = EngineConfig {
            intro_delay_ms: 2_000,
            trainer_thinking_min_ms: 1_000,
            trainer_thinking_max_ms: 1_000,
            rng_seed: Some(1),
            ..EngineConfig::immediate()
        };
        let (handle, task) = BattleSession::spawn(BattleEngine::new(config));
        let mut events = handle.subscribe().await.unwrap();

        let started = handle
            .start_trainer_battle(trainer_config(decisive_trainer()))
            .await
            .unwrap();
        assert!(started.success);
        assert_eq!(started.game_state.unwrap().phase, BattlePhase::Intro);

        // Act
        tokio::time::sleep(Duration::from_millis(3_500)).await;

        // Assert
        let state = handle.state().await.unwrap().unwrap();
        assert_eq!(state.phase, BattlePhase::ActionSelection);
        let mut kinds = Vec::new();
        while let Ok(event) = events.try_recv() {
            kinds.push(event.kind());
        }
        assert!(kinds.contains(&EventKind::ActionQueued));

        let result = handle.submit_action(BattleAction::attack(P1, "tackle"), None).await.unwrap();
        assert_eq!(result.events_of(EventKind::ResolutionComplete).count(), 1);

        handle.shutdown().await.unwrap();
        let engine = task.await.unwrap();
        assert!(engine.is_idle());
        assert!(matches!(handle.state().await, Err(BattleEngineError::SessionClosed)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_crash_timeout_closes_the_session() {
        let config = EngineConfig {
            crash_timeout_secs: 60,
            ..EngineConfig::immediate()
        };
        let (handle, task) = BattleSession::spawn(BattleEngine::new(config));
        let started = handle.start_battle(wild_config()).await.unwrap();
        assert!(started.success);

        // Nobody acts for the player, and the handle stays alive.
        let engine = tokio::time::timeout(Duration::from_secs(120), task)
            .await
            .expect("session should stop on its own")
            .unwrap();

        assert!(engine.is_idle());
        assert!(matches!(handle.state().await, Err(BattleEngineError::SessionClosed)));
    }
}
