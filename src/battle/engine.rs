//! The battle orchestrator.
//!
//! A [`BattleEngine`] runs at most one battle at a time. It owns the battle
//! state and one instance of every battle module, and it is the only thing
//! that mutates them. Every public entry point returns an [`EngineResult`]
//! carrying the events the call produced.

use crate::battle::action::{ActionPayload, BattleAction};
use crate::battle::action_queue::ActionQueue;
use crate::battle::ai::{AiPlayer, ProfileStrategy, TrainerAi, TrainerStrategy};
use crate::battle::catch::{can_attempt_capture, CaptureManager};
use crate::battle::end::BattleEndManager;
use crate::battle::events::{EngineEvent, EventDispatcher, EventHandler, EventKind};
use crate::battle::ko::KOManager;
use crate::battle::phase::{BattlePhase, PhaseManager, TrainerPhase};
use crate::battle::processor::ActionProcessor;
use crate::battle::speed::SpeedCalculator;
use crate::battle::state::{BattleEvent, BattleGameState, BattleRng};
use crate::battle::switch::{ForcedSwitchOutcome, SwitchManager, SwitchRecord};
use crate::battle::timers::{SafetyTimers, TimerKind};
use crate::collaborators::{Collaborators, TeamManager, TrainerMilestone};
use crate::config::{EngineConfig, SwitchRules};
use crate::errors::{
    ActionRejected, BattleEngineError, BattleResult, BestEffort, ConfigValidationError,
    StallTimeout,
};
use crate::player::{PlayerSlot, TeamConfig};
use crate::pokemon::Pokemon;
use crate::trainer::TrainerData;
use schema::{BallType, BattleType, EndReason, ItemData, MoveData, PlayerRole, STRUGGLE_ID};
use serde::{Deserialize, Serialize, Serializer};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::Instant;

/// One side of a start config.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SideConfig {
    pub session_id: String,
    pub name: String,
    /// The Pokemon to lead with. Optional when a team is given.
    #[serde(default)]
    pub pokemon: Option<Pokemon>,
    #[serde(default)]
    pub team: Option<Vec<Pokemon>>,
    #[serde(default)]
    pub is_ai: bool,
    #[serde(default)]
    pub team_config: TeamConfig,
}

impl SideConfig {
    pub fn new(session_id: &str, name: &str, team: Vec<Pokemon>) -> Self {
        Self {
            session_id: session_id.to_string(),
            name: name.to_string(),
            pokemon: None,
            team: Some(team),
            is_ai: false,
            team_config: TeamConfig::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BattleConfig {
    #[serde(default)]
    pub battle_id: Option<String>,
    /// `wild`, `trainer` or `pvp`. Trainer battles go through
    /// [`BattleEngine::start_trainer_battle`].
    pub battle_type: String,
    pub player1: SideConfig,
    pub player2: SideConfig,
    #[serde(default)]
    pub switch_rules: Option<SwitchRules>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrainerBattleConfig {
    #[serde(default)]
    pub battle_id: Option<String>,
    pub player: SideConfig,
    pub trainer: TrainerData,
    #[serde(default)]
    pub switch_rules: Option<SwitchRules>,
}

fn error_message<S: Serializer>(
    error: &Option<BattleEngineError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(error) => serializer.serialize_some(&error.to_string()),
        None => serializer.serialize_none(),
    }
}

/// The uniform answer of every engine entry point.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EngineResult {
    pub success: bool,
    pub game_state: Option<BattleGameState>,
    pub events: Vec<EngineEvent>,
    #[serde(serialize_with = "error_message")]
    pub error: Option<BattleEngineError>,
}

impl EngineResult {
    pub fn events_of(&self, kind: EventKind) -> impl Iterator<Item = &EngineEvent> {
        self.events.iter().filter(move |event| event.kind() == kind)
    }
}

fn build_side(
    role: PlayerRole,
    side: SideConfig,
    max_team_size: usize,
    wild: bool,
) -> Result<PlayerSlot, ConfigValidationError> {
    if side.session_id.trim().is_empty() {
        return Err(ConfigValidationError::MissingSessionId(role));
    }

    let (mut team, lead_id) = match (side.team, side.pokemon) {
        (Some(mut team), Some(lead)) if !team.is_empty() => {
            let lead_id = lead.id.clone();
            if !team.iter().any(|member| member.id == lead_id) {
                team.insert(0, lead);
            }
            (team, Some(lead_id))
        }
        (Some(team), None) if !team.is_empty() => (team, None),
        (_, Some(lead)) => (vec![lead], None),
        _ => return Err(ConfigValidationError::MissingPokemon(role)),
    };
    if team.len() > max_team_size {
        return Err(ConfigValidationError::RosterTooLarge {
            role,
            size: team.len(),
            max: max_team_size,
        });
    }

    for pokemon in &mut team {
        pokemon.combat_id = uuid::Uuid::new_v4().to_string();
        pokemon.is_wild |= wild;
        pokemon.set_hp(pokemon.current_hp);
    }

    let requested = lead_id
        .and_then(|id| team.iter().position(|member| member.id == id))
        .filter(|&index| team[index].is_battle_ready());
    let active_index = requested
        .or_else(|| team.iter().position(Pokemon::is_battle_ready))
        .ok_or(ConfigValidationError::NoBattleReadyPokemon(role))?;

    let mut slot = PlayerSlot::new(&side.session_id, &side.name, team, side.is_ai || wild);
    slot.active_index = active_index;
    slot.team_config = side.team_config;
    Ok(slot)
}

/// Everything that exists only while a battle is running.
struct ActiveBattle {
    state: BattleGameState,
    trainer: Option<TrainerData>,
    config: EngineConfig,
    collaborators: Collaborators,
    phases: PhaseManager,
    queue: ActionQueue,
    speed: SpeedCalculator,
    processor: ActionProcessor,
    ko: KOManager,
    switches: SwitchManager,
    capture: CaptureManager,
    ai: AiPlayer,
    trainer_ai: Option<TrainerAi>,
    end_manager: BattleEndManager,
    rng: BattleRng,
    timers: SafetyTimers,
    team_manager: Option<Arc<dyn TeamManager>>,
    // Sides whose active Pokemon was replaced during this turn's resolution.
    replaced: [bool; 2],
    end_handled: bool,
    crashed: bool,
}

impl ActiveBattle {
    fn new(
        state: BattleGameState,
        trainer: Option<TrainerData>,
        config: &EngineConfig,
        collaborators: &Collaborators,
        strategy: &Arc<dyn TrainerStrategy>,
    ) -> Self {
        let rules = state.switch_rules;
        let mut queue = ActionQueue::new(rules);
        queue.configure_switch_behavior(
            state.switching_permitted(),
            rules.max_per_turn,
            rules.tie_policy,
        );
        let trainer_ai = trainer
            .as_ref()
            .map(|trainer| TrainerAi::new(trainer.ai_profile.clone(), strategy.clone(), config));

        Self {
            state,
            trainer,
            config: config.clone(),
            collaborators: collaborators.clone(),
            phases: PhaseManager::new(),
            queue,
            speed: SpeedCalculator::new(),
            processor: ActionProcessor::new(collaborators.pp.clone()),
            ko: KOManager::new(),
            switches: SwitchManager::new(),
            capture: CaptureManager::new(config.critical_capture_chance),
            ai: AiPlayer::new(),
            trainer_ai,
            end_manager: BattleEndManager::new(
                collaborators.store.clone(),
                collaborators.experience.clone(),
            ),
            rng: BattleRng::from_seed(config.rng_seed),
            timers: SafetyTimers::new(),
            team_manager: None,
            replaced: [false; 2],
            end_handled: false,
            crashed: false,
        }
    }

    fn emit_log(events: &mut EventDispatcher, messages: Vec<BattleEvent>) {
        for message in messages {
            events.emit(EngineEvent::BattleEvent(message));
        }
    }

    fn emit_switch(events: &mut EventDispatcher, record: SwitchRecord) {
        events.emit(EngineEvent::PokemonSwitched {
            role: record.role,
            from_index: record.from_index,
            to_index: record.to_index,
            pokemon: record.pokemon,
            forced: record.forced,
        });
        Self::emit_log(events, vec![record.message]);
    }

    async fn track(&self, milestone: TrainerMilestone) {
        if let Some(telemetry) = &self.collaborators.telemetry {
            let player_id = &self.state.player(PlayerRole::Player1).session_id;
            telemetry
                .track(player_id, milestone)
                .await
                .best_effort("npc telemetry");
        }
    }

    /// Start-of-battle notifications for the encounter log and NPC telemetry.
    async fn announce(&self) {
        match (&self.trainer, self.state.battle_type) {
            (Some(trainer), _) => {
                self.track(TrainerMilestone::BattleStarted {
                    trainer_id: trainer.trainer_id.clone(),
                })
                .await;
            }
            (None, BattleType::Wild) => {
                let (Some(encounters), Some(wild)) = (
                    &self.collaborators.encounters,
                    self.state.player(PlayerRole::Player2).active_pokemon(),
                ) else {
                    return;
                };
                let player_id = &self.state.player(PlayerRole::Player1).session_id;
                encounters
                    .record_encounter(player_id, wild)
                    .await
                    .best_effort("recording encounter");
            }
            _ => {}
        }
    }

    /// Phase change with the retry policy. Returns false when the battle had
    /// to be ended instead.
    async fn move_to(&mut self, events: &mut EventDispatcher, to: BattlePhase) -> bool {
        match self.phases.transition(&mut self.state, to) {
            Ok(change) => {
                events.emit(EngineEvent::PhaseChanged {
                    from: change.from,
                    to: change.to,
                    forced: change.forced,
                });
                true
            }
            Err(failure) => {
                log::error!("battle {}: {failure}, ending the battle", self.state.battle_id);
                self.finish(events, PlayerRole::Player1, EndReason::EngineError).await;
                false
            }
        }
    }

    /// The single way a battle ends. Runs the end-of-battle work exactly once.
    async fn finish(
        &mut self,
        events: &mut EventDispatcher,
        winner: PlayerRole,
        reason: EndReason,
    ) {
        if self.end_handled {
            return;
        }
        let change = match self.phases.end_battle(&mut self.state, winner, reason) {
            Ok(change) => change,
            Err(failure) => {
                log::warn!("battle {}: cannot end: {failure}", self.state.battle_id);
                return;
            }
        };
        self.end_handled = true;
        self.timers.clear();
        self.queue.clear();

        log::info!(
            "battle {} ended after {} turns: {winner} wins ({reason})",
            self.state.battle_id,
            self.state.turn_number
        );
        events.emit(EngineEvent::PhaseChanged {
            from: change.from,
            to: change.to,
            forced: change.forced,
        });
        Self::emit_log(events, vec![BattleEvent::BattleEnded { winner, reason }]);
        events.emit(EngineEvent::BattleEnd { winner, reason });

        let follow_up = self
            .end_manager
            .handle(&self.state, self.trainer.as_ref(), &mut self.rng)
            .await;
        for event in follow_up {
            events.emit(event);
        }

        if let Some(trainer_id) = self.trainer.as_ref().map(|trainer| trainer.trainer_id.clone()) {
            self.track(TrainerMilestone::BattleFinished {
                trainer_id,
                trainer_won: winner == PlayerRole::Player2,
            })
            .await;
        }
    }

    async fn begin_selection(&mut self, events: &mut EventDispatcher) {
        if self.move_to(events, BattlePhase::ActionSelection).await {
            self.enter_action_selection(events).await;
        }
    }

    /// Lets every AI side act, now or after its thinking delay.
    async fn enter_action_selection(&mut self, events: &mut EventDispatcher) {
        let now = Instant::now();
        for role in PlayerRole::BOTH {
            if !self.state.player(role).is_ai || self.queue.has_action(role) {
                continue;
            }
            let thinking = match &self.trainer_ai {
                Some(trainer_ai) if role == PlayerRole::Player2 => {
                    Some(trainer_ai.thinking_delay(&mut self.rng))
                }
                _ => None,
            };
            match thinking {
                Some(delay) => {
                    self.timers
                        .schedule(TimerKind::AiWatchdog, now + self.config.ai_decision_timeout());
                    if delay.is_zero() {
                        self.trainer_decide(events, role).await;
                    } else {
                        self.timers.schedule(TimerKind::AiDecision, now + delay);
                    }
                }
                None => {
                    let action = self.ai.choose_action(&self.state, role, &mut self.rng);
                    self.queue_ai_action(events, role, action);
                }
            }
        }
    }

    async fn trainer_decide(&mut self, events: &mut EventDispatcher, role: PlayerRole) {
        let Some(trainer_ai) = &self.trainer_ai else {
            return;
        };
        let action = trainer_ai.decide(&self.state, role, &mut self.rng).await;
        self.queue_ai_action(events, role, action);
    }

    fn queue_ai_action(
        &mut self,
        events: &mut EventDispatcher,
        role: PlayerRole,
        action: BattleAction,
    ) {
        let action = match self.validate_action(role, &action) {
            Ok(()) => action,
            Err(rejected) => {
                log::debug!(
                    "battle {}: AI action rejected ({rejected}), attacking instead",
                    self.state.battle_id
                );
                self.ai.choose_action(&self.state, role, &mut self.rng)
            }
        };
        match self.enqueue_ai_action(events, role, action) {
            Ok(()) | Err(ActionRejected::Duplicate(_)) => {}
            Err(rejected) => {
                // The queue can refuse a valid choice, such as a second switch this turn.
                log::debug!(
                    "battle {}: AI action not queued ({rejected}), attacking instead",
                    self.state.battle_id
                );
                let fallback = self.ai.choose_action(&self.state, role, &mut self.rng);
                if let Err(rejected) = self.enqueue_ai_action(events, role, fallback) {
                    log::warn!(
                        "battle {}: AI fallback not queued: {rejected}",
                        self.state.battle_id
                    );
                }
            }
        }
    }

    fn enqueue_ai_action(
        &mut self,
        events: &mut EventDispatcher,
        role: PlayerRole,
        mut action: BattleAction,
    ) -> Result<(), ActionRejected> {
        action.stamp();
        let action_id = action.action_id.clone();
        let action_type = action.action_type();
        self.queue.add_action(role, action)?;
        self.timers.cancel(TimerKind::AiDecision);
        self.timers.cancel(TimerKind::AiWatchdog);
        events.emit(EngineEvent::ActionQueued {
            role,
            action_id,
            action_type,
        });
        Ok(())
    }

    /// Checks that doesn't depend on the phase.
    fn validate_action(
        &self,
        role: PlayerRole,
        action: &BattleAction,
    ) -> Result<(), ActionRejected> {
        match &action.payload {
            ActionPayload::Attack { move_id } => {
                let Some(pokemon) = self.state.player(role).active_pokemon() else {
                    return Err(ActionRejected::UnknownMove(move_id.clone()));
                };
                let is_struggle =
                    MoveData::lookup(move_id).is_some_and(|data| data.id == STRUGGLE_ID);
                if is_struggle || pokemon.all_moves_exhausted() || pokemon.knows_move(move_id) {
                    Ok(())
                } else {
                    Err(ActionRejected::UnknownMove(move_id.clone()))
                }
            }
            ActionPayload::Item { item_id } => ItemData::lookup(item_id)
                .map(|_| ())
                .ok_or_else(|| ActionRejected::UnknownItem(item_id.clone())),
            ActionPayload::Switch(data) => self
                .switches
                .validate_switch(&self.state, role, data)
                .map(|_| ()),
            ActionPayload::Capture { .. } => Ok(can_attempt_capture(&self.state, role)?),
            ActionPayload::Run => {
                if self.state.battle_type.allows_running() && role == PlayerRole::Player1 {
                    Ok(())
                } else {
                    Err(ActionRejected::NotAllowed(action.action_type()))
                }
            }
        }
    }

    async fn submit(
        &mut self,
        events: &mut EventDispatcher,
        mut action: BattleAction,
        team_manager: Option<Arc<dyn TeamManager>>,
    ) -> Result<(), ActionRejected> {
        let role = self
            .state
            .role_of(&action.player_id)
            .ok_or_else(|| ActionRejected::UnknownPlayer(action.player_id.clone()))?;
        self.phases.validate_action(self.state.phase, action.action_type())?;
        self.validate_action(role, &action)?;

        action.stamp();
        let action_id = action.action_id.clone();
        let action_type = action.action_type();
        self.queue.add_action(role, action)?;
        if team_manager.is_some() {
            self.team_manager = team_manager;
        }
        log::debug!("battle {}: {role} queued {action_type} ({action_id})", self.state.battle_id);
        events.emit(EngineEvent::ActionQueued {
            role,
            action_id,
            action_type,
        });

        self.drive(events).await;
        Ok(())
    }

    /// Resolve turns for as long as every side has an action queued.
    async fn drive(&mut self, events: &mut EventDispatcher) {
        while !self.state.is_ended
            && self.state.phase == BattlePhase::ActionSelection
            && self.queue.are_all_actions_ready()
        {
            self.resolve_turn(events).await;
        }
    }

    async fn resolve_turn(&mut self, events: &mut EventDispatcher) {
        if !self.move_to(events, BattlePhase::ActionResolution).await {
            return;
        }
        let turn_number = self.state.turn_number;
        let ordered = self.queue.take_ordered(&self.state, &self.speed);
        events.emit(EngineEvent::ResolutionStart {
            turn_number,
            order: ordered.iter().map(|(role, _)| *role).collect(),
        });
        Self::emit_log(events, vec![BattleEvent::TurnStarted { turn_number }]);
        self.replaced = [false; 2];

        let pacing = self.config.action_pacing();
        for (index, (role, action)) in ordered.into_iter().enumerate() {
            if self.state.is_ended {
                break;
            }
            if self.replaced[role.index()] {
                log::debug!(
                    "battle {}: {role}'s action dropped, its pokemon was replaced",
                    self.state.battle_id
                );
                continue;
            }
            if index > 0 && !pacing.is_zero() {
                tokio::time::sleep(pacing).await;
            }
            self.state.current_turn = Some(role);
            self.resolve_action(events, role, &action).await;
        }
        if self.state.is_ended {
            return;
        }

        self.state.current_turn = None;
        events.emit(EngineEvent::ResolutionComplete { turn_number });
        if turn_number >= self.config.max_turns {
            log::warn!(
                "battle {}: {}",
                self.state.battle_id,
                StallTimeout::MaxTurns(self.config.max_turns)
            );
            self.finish(events, PlayerRole::Player1, EndReason::MaxTurnsReached).await;
            return;
        }
        if self.move_to(events, BattlePhase::ActionSelection).await {
            self.state.turn_number += 1;
            self.enter_action_selection(events).await;
        }
    }

    async fn resolve_action(
        &mut self,
        events: &mut EventDispatcher,
        role: PlayerRole,
        action: &BattleAction,
    ) {
        let action_type = action.action_type();
        match &action.payload {
            ActionPayload::Switch(data) => {
                let switched = self
                    .switches
                    .validate_switch(&self.state, role, data)
                    .and_then(|to_index| {
                        self.switches
                            .execute_switch(&mut self.state, role, to_index, false)
                    });
                let success = match switched {
                    Ok(record) => {
                        Self::emit_switch(events, record);
                        true
                    }
                    Err(rejected) => {
                        log::warn!(
                            "battle {}: {role}'s switch skipped: {rejected}",
                            self.state.battle_id
                        );
                        false
                    }
                };
                events.emit(EngineEvent::ActionProcessed {
                    role,
                    action_type,
                    success,
                    move_used: None,
                    damage: 0,
                });
            }
            ActionPayload::Capture { ball_type } => {
                self.resolve_capture(events, role, *ball_type).await
            }
            _ => match self.processor.process_action(&mut self.state, role, action).await {
                Ok(processed) => {
                    log::trace!("battle {}: {processed:?}", self.state.battle_id);
                    Self::emit_log(events, processed.messages);
                    events.emit(EngineEvent::ActionProcessed {
                        role,
                        action_type,
                        success: true,
                        move_used: processed.move_used,
                        damage: processed.damage,
                    });
                    if processed.fled {
                        self.finish(events, role.opponent(), EndReason::Fled).await;
                        return;
                    }
                    self.check_knockouts(events, role).await;
                }
                Err(failure) => {
                    log::warn!(
                        "battle {}: {role}'s {action_type} skipped: {failure}",
                        self.state.battle_id
                    );
                    events.emit(EngineEvent::ActionProcessed {
                        role,
                        action_type,
                        success: false,
                        move_used: None,
                        damage: 0,
                    });
                }
            },
        }
    }

    async fn resolve_capture(
        &mut self,
        events: &mut EventDispatcher,
        role: PlayerRole,
        ball: BallType,
    ) {
        if !self.move_to(events, BattlePhase::Capture).await {
            return;
        }
        match self.capture.attempt_capture(&self.state, role, ball, &mut self.rng) {
            Ok(outcome) => {
                Self::emit_log(events, outcome.messages);
                events.emit(EngineEvent::ActionProcessed {
                    role,
                    action_type: schema::ActionType::Capture,
                    success: outcome.success,
                    move_used: None,
                    damage: 0,
                });
                if outcome.success {
                    if let Some(team_manager) = &self.team_manager {
                        let mut caught = outcome.pokemon;
                        caught.is_wild = false;
                        caught.combat_id.clear();
                        let player_id = &self.state.player(role).session_id;
                        team_manager
                            .add_captured(player_id, caught)
                            .await
                            .best_effort("handing over captured pokemon");
                    }
                    self.finish(events, PlayerRole::Player1, EndReason::PokemonCaptured).await;
                    return;
                }
            }
            Err(err) => {
                log::warn!("battle {}: capture attempt skipped: {err}", self.state.battle_id);
                events.emit(EngineEvent::ActionProcessed {
                    role,
                    action_type: schema::ActionType::Capture,
                    success: false,
                    move_used: None,
                    damage: 0,
                });
            }
        }
        self.move_to(events, BattlePhase::ActionResolution).await;
    }

    /// Faint handling after an action: announce, then end the battle or send
    /// in replacements.
    async fn check_knockouts(&mut self, events: &mut EventDispatcher, actor: PlayerRole) {
        let fainted = self.ko.fainted_roles(&self.state, actor);
        for role in &fainted {
            let Some(pokemon) = self.state.player(*role).active_pokemon() else {
                continue;
            };
            let (name, pokemon_id) = (pokemon.name.clone(), pokemon.id.clone());
            log::debug!("battle {}: {role}'s {name} fainted", self.state.battle_id);
            events.emit(EngineEvent::PokemonFainted {
                role: *role,
                pokemon: name.clone(),
            });
            Self::emit_log(
                events,
                vec![BattleEvent::PokemonFainted {
                    role: *role,
                    pokemon: name,
                }],
            );

            if let (Some(trainer_id), PlayerRole::Player2) =
                (self.trainer.as_ref().map(|trainer| trainer.trainer_id.clone()), role)
            {
                self.track(TrainerMilestone::PokemonDefeated { trainer_id, pokemon_id }).await;
            }
        }

        if let Some((winner, reason)) = self.ko.check_battle_end(&self.state, actor) {
            Self::emit_log(events, vec![BattleEvent::PlayerDefeated { role: winner.opponent() }]);
            self.finish(events, winner, reason).await;
            return;
        }

        for role in fainted {
            if self.state.trainer_phase.is_some() {
                self.state.trainer_phase = Some(TrainerPhase::ForcedSwitch);
            }
            match self.switches.forced_switch(&mut self.state, role) {
                ForcedSwitchOutcome::Switched(record) => {
                    self.replaced[role.index()] = true;
                    Self::emit_switch(events, record);
                }
                ForcedSwitchOutcome::TeamDefeated => {
                    self.finish(events, role.opponent(), EndReason::TeamDefeat).await;
                    return;
                }
            }
            if self.state.trainer_phase.is_some() {
                self.state.trainer_phase = Some(TrainerPhase::Resolution);
            }
        }
    }

    async fn on_timer(&mut self, events: &mut EventDispatcher, kind: TimerKind) {
        if self.state.is_ended {
            return;
        }
        match kind {
            TimerKind::Crash => {
                log::warn!(
                    "battle {}: {}, forcing the end",
                    self.state.battle_id,
                    StallTimeout::CrashTimeout(self.config.crash_timeout_secs)
                );
                self.crashed = true;
                self.finish(events, PlayerRole::Player1, EndReason::BattleTimeout).await;
            }
            TimerKind::Intro => {
                if self.state.phase == BattlePhase::Intro {
                    self.begin_selection(events).await;
                }
            }
            TimerKind::AiDecision => {
                if self.state.phase == BattlePhase::ActionSelection
                    && !self.queue.has_action(PlayerRole::Player2)
                {
                    self.trainer_decide(events, PlayerRole::Player2).await;
                }
            }
            TimerKind::AiWatchdog => {
                if self.state.phase != BattlePhase::ActionSelection {
                    return;
                }
                for role in PlayerRole::BOTH {
                    if self.state.player(role).is_ai && !self.queue.has_action(role) {
                        log::warn!(
                            "battle {}: {role} has not acted in time, using a fallback",
                            self.state.battle_id
                        );
                        let action = self.ai.choose_action(&self.state, role, &mut self.rng);
                        self.queue_ai_action(events, role, action);
                    }
                }
            }
        }
    }
}

pub struct BattleEngine {
    config: EngineConfig,
    collaborators: Collaborators,
    strategy: Arc<dyn TrainerStrategy>,
    events: EventDispatcher,
    battle: Option<ActiveBattle>,
}

impl std::fmt::Debug for BattleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BattleEngine")
            .field("battle", &self.battle.as_ref().map(|battle| &battle.state.battle_id))
            .field("events", &self.events)
            .field("collaborators", &self.collaborators)
            .finish()
    }
}

impl BattleEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            collaborators: Collaborators::default(),
            strategy: Arc::new(ProfileStrategy::new()),
            events: EventDispatcher::new(),
            battle: None,
        }
    }

    pub fn with_collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = collaborators;
        self
    }

    pub fn with_strategy(mut self, strategy: Arc<dyn TrainerStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn result(&mut self, outcome: BattleResult<()>) -> EngineResult {
        if let Err(err) = &outcome {
            log::debug!("engine call failed: {err}");
        }
        EngineResult {
            success: outcome.is_ok(),
            game_state: self.battle.as_ref().map(|battle| battle.state.clone()),
            events: self.events.drain(),
            error: outcome.err(),
        }
    }

    pub async fn start_battle(&mut self, config: BattleConfig) -> EngineResult {
        let outcome = self.try_start_battle(config).await;
        self.result(outcome)
    }

    async fn try_start_battle(&mut self, config: BattleConfig) -> BattleResult<()> {
        if self.battle.is_some() {
            return Err(BattleEngineError::AlreadyStarted);
        }
        let battle_type = BattleType::from_str(&config.battle_type)
            .map_err(|_| ConfigValidationError::InvalidBattleType(config.battle_type.clone()))?;
        if battle_type == BattleType::Trainer {
            return Err(ConfigValidationError::TrainerConfigRequired.into());
        }

        let wild = battle_type == BattleType::Wild;
        let max = self.config.max_team_size;
        let player1 = build_side(PlayerRole::Player1, config.player1, max, false)?;
        let player2 = build_side(PlayerRole::Player2, config.player2, max, wild)?;
        let rules = config.switch_rules.unwrap_or(self.config.switch_rules);
        self.launch(config.battle_id, battle_type, player1, player2, rules, None)
            .await
    }

    pub async fn start_trainer_battle(&mut self, config: TrainerBattleConfig) -> EngineResult {
        let outcome = self.try_start_trainer_battle(config).await;
        self.result(outcome)
    }

    async fn try_start_trainer_battle(&mut self, config: TrainerBattleConfig) -> BattleResult<()> {
        if self.battle.is_some() {
            return Err(BattleEngineError::AlreadyStarted);
        }
        let trainer = config.trainer;
        if trainer.roster.is_empty() {
            return Err(
                ConfigValidationError::EmptyTrainerRoster(trainer.trainer_id.clone()).into(),
            );
        }

        let max = self.config.max_team_size;
        let player1 = build_side(PlayerRole::Player1, config.player, max, false)?;
        let trainer_side = SideConfig {
            is_ai: true,
            ..SideConfig::new(&trainer.trainer_id, &trainer.display_name(), trainer.roster.clone())
        };
        let player2 = build_side(PlayerRole::Player2, trainer_side, max, false)?;
        let rules = config.switch_rules.unwrap_or(self.config.switch_rules);
        self.launch(config.battle_id, BattleType::Trainer, player1, player2, rules, Some(trainer))
            .await
    }

    async fn launch(
        &mut self,
        battle_id: Option<String>,
        battle_type: BattleType,
        player1: PlayerSlot,
        player2: PlayerSlot,
        rules: SwitchRules,
        trainer: Option<TrainerData>,
    ) -> BattleResult<()> {
        if player1.session_id == player2.session_id {
            return Err(ConfigValidationError::DuplicateSessionId(player1.session_id).into());
        }
        let battle_id = battle_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let state = BattleGameState::new(battle_id, battle_type, player1, player2, rules);
        let mut battle = ActiveBattle::new(
            state,
            trainer,
            &self.config,
            &self.collaborators,
            &self.strategy,
        );

        log::info!(
            "battle {} started: {} battle, {} vs {}",
            battle.state.battle_id,
            battle_type,
            battle.state.player(PlayerRole::Player1).name,
            battle.state.player(PlayerRole::Player2).name
        );
        self.events.emit(EngineEvent::BattleStart {
            battle_id: battle.state.battle_id.clone(),
            battle_type,
            player1: battle.state.player(PlayerRole::Player1).session_id.clone(),
            player2: battle.state.player(PlayerRole::Player2).session_id.clone(),
        });

        let now = Instant::now();
        battle
            .timers
            .schedule(TimerKind::Crash, now + self.config.crash_timeout());
        battle.announce().await;

        let intro = self.config.intro_delay();
        if intro.is_zero() {
            battle.begin_selection(&mut self.events).await;
            battle.drive(&mut self.events).await;
        } else {
            battle.timers.schedule(TimerKind::Intro, now + intro);
        }
        self.battle = Some(battle);
        Ok(())
    }

    pub async fn submit_action(
        &mut self,
        action: BattleAction,
        team_manager: Option<Arc<dyn TeamManager>>,
    ) -> EngineResult {
        let outcome = match self.battle.as_mut() {
            Some(battle) => battle
                .submit(&mut self.events, action, team_manager)
                .await
                .map_err(BattleEngineError::from),
            None => Err(BattleEngineError::NotStarted),
        };
        self.result(outcome)
    }

    pub fn current_state(&self) -> Option<&BattleGameState> {
        self.battle.as_ref().map(|battle| &battle.state)
    }

    pub fn current_phase(&self) -> Option<BattlePhase> {
        self.current_state().map(|state| state.phase)
    }

    pub fn on(&mut self, kind: EventKind, handler: EventHandler) {
        self.events.on(kind, handler);
    }

    /// Publish an event through the engine's listeners and broadcast channel.
    pub fn emit(&mut self, event: EngineEvent) {
        self.events.emit(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// The earliest armed timer, if any. Whoever drives the engine calls
    /// [`BattleEngine::fire_due_timers`] once it has passed.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.battle.as_ref().and_then(|battle| battle.timers.next_deadline())
    }

    pub async fn fire_due_timers(&mut self) -> EngineResult {
        if let Some(battle) = self.battle.as_mut() {
            for kind in battle.timers.take_due(Instant::now()) {
                battle.on_timer(&mut self.events, kind).await;
            }
            battle.drive(&mut self.events).await;
        }
        self.result(Ok(()))
    }

    /// True once the crash timeout has force-ended the battle. The owner is
    /// expected to [`reset`](BattleEngine::reset) the engine.
    pub fn crashed(&self) -> bool {
        self.battle.as_ref().is_some_and(|battle| battle.crashed)
    }

    /// Disarms every timer and drops queued actions. The state stays
    /// readable until [`BattleEngine::reset`].
    pub fn cleanup(&mut self) {
        if let Some(battle) = self.battle.as_mut() {
            battle.timers.clear();
            battle.queue.clear();
        }
    }

    /// Full release before reuse: timers, listeners, modules and state.
    pub fn reset(&mut self) {
        self.cleanup();
        if let Some(battle) = self.battle.take() {
            log::info!("battle {}: engine reset", battle.state.battle_id);
        }
        self.events.reset();
    }

    /// True when no battle or listener is held.
    pub fn is_idle(&self) -> bool {
        self.battle.is_none() && self.events.listener_count() == 0
    }
}
