//! Outbound engine events and their dispatch.
//!
//! Consumers either register typed listeners with [`EventDispatcher::on`] or
//! subscribe to the broadcast channel, which is how the spectator layer
//! receives everything it renders.

use crate::battle::phase::BattlePhase;
use crate::battle::rewards::TrainerRewards;
use crate::battle::state::BattleEvent;
use schema::{ActionType, BattleType, EndReason, PlayerRole};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumDiscriminants};
use tokio::sync::broadcast;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, EnumDiscriminants)]
#[serde(tag = "event", content = "data", rename_all = "camelCase", rename_all_fields = "camelCase")]
#[strum_discriminants(name(EventKind), derive(Hash, Display, Serialize, Deserialize))]
#[strum_discriminants(strum(serialize_all = "camelCase"), serde(rename_all = "camelCase"))]
pub enum EngineEvent {
    BattleStart {
        battle_id: String,
        battle_type: BattleType,
        player1: String,
        player2: String,
    },
    PhaseChanged {
        from: BattlePhase,
        to: BattlePhase,
        forced: bool,
    },
    ActionQueued {
        role: PlayerRole,
        action_id: String,
        action_type: ActionType,
    },
    ResolutionStart {
        turn_number: u32,
        order: Vec<PlayerRole>,
    },
    ActionProcessed {
        role: PlayerRole,
        action_type: ActionType,
        success: bool,
        move_used: Option<String>,
        damage: u16,
    },
    ResolutionComplete {
        turn_number: u32,
    },
    PokemonSwitched {
        role: PlayerRole,
        from_index: usize,
        to_index: usize,
        pokemon: String,
        forced: bool,
    },
    PokemonFainted {
        role: PlayerRole,
        pokemon: String,
    },
    BattleEnd {
        winner: PlayerRole,
        reason: EndReason,
    },
    RewardsEarned {
        role: PlayerRole,
        rewards: TrainerRewards,
    },
    ExperienceGained {
        pokemon_id: String,
        amount: u32,
    },
    LevelUp {
        pokemon_id: String,
        new_level: u8,
    },
    EvolutionTriggered {
        pokemon_id: String,
        into_species: String,
    },
    NewMovesAvailable {
        pokemon_id: String,
        moves: Vec<String>,
    },
    /// Battle-log passthrough for the broadcast layer.
    BattleEvent(BattleEvent),
}

impl EngineEvent {
    pub fn kind(&self) -> EventKind {
        EventKind::from(self)
    }
}

pub type EventHandler = Box<dyn Fn(&EngineEvent) + Send + Sync>;

const BROADCAST_CAPACITY: usize = 256;

pub struct EventDispatcher {
    listeners: HashMap<EventKind, Vec<EventHandler>>,
    sender: broadcast::Sender<EngineEvent>,
    // Everything emitted since the last drain; returned in the call's result.
    pending: Vec<EngineEvent>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            listeners: HashMap::new(),
            sender,
            pending: Vec::new(),
        }
    }

    pub fn on(&mut self, kind: EventKind, handler: EventHandler) {
        self.listeners.entry(kind).or_default().push(handler);
    }

    pub fn emit(&mut self, event: EngineEvent) {
        log::trace!("emit {}", event.kind());
        if let Some(handlers) = self.listeners.get(&event.kind()) {
            for handler in handlers {
                handler(&event);
            }
        }
        // No subscribers is normal for headless battles.
        let _ = self.sender.send(event.clone());
        self.pending.push(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    pub fn drain(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    /// Drops every listener and pending event. Broadcast receivers created
    /// before the reset are disconnected.
    pub fn reset(&mut self) {
        self.listeners.clear();
        self.pending.clear();
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        self.sender = sender;
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listener_count())
            .field("subscribers", &self.sender.receiver_count())
            .field("pending", &self.pending.len())
            .finish()
    }
}
