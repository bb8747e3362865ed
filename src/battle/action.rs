use schema::{ActionType, BallType, SwitchReason};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SwitchData {
    /// Slot being recalled. Defaults to the active slot.
    #[serde(default)]
    pub from_index: Option<usize>,
    pub to_index: usize,
    #[serde(default)]
    pub is_forced: bool,
    #[serde(default = "default_switch_reason")]
    pub reason: SwitchReason,
}

fn default_switch_reason() -> SwitchReason {
    SwitchReason::Voluntary
}

/// The per-type payload, carried on the wire as `{"type": ..., "data": {...}}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ActionPayload {
    Attack { move_id: String },
    Item { item_id: String },
    Switch(SwitchData),
    Capture {
        #[serde(default)]
        ball_type: BallType,
    },
    Run,
}

/// One inbound decision of one side for one turn.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BattleAction {
    #[serde(default)]
    pub action_id: String,
    pub player_id: String,
    #[serde(flatten)]
    pub payload: ActionPayload,
    #[serde(default)]
    pub timestamp: u64,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as u64)
}

impl BattleAction {
    pub fn new(player_id: &str, payload: ActionPayload) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            player_id: player_id.to_string(),
            payload,
            timestamp: now_millis(),
        }
    }

    pub fn attack(player_id: &str, move_id: &str) -> Self {
        Self::new(player_id, ActionPayload::Attack { move_id: move_id.to_string() })
    }

    pub fn item(player_id: &str, item_id: &str) -> Self {
        Self::new(player_id, ActionPayload::Item { item_id: item_id.to_string() })
    }

    pub fn switch(player_id: &str, to_index: usize) -> Self {
        Self::new(
            player_id,
            ActionPayload::Switch(SwitchData {
                from_index: None,
                to_index,
                is_forced: false,
                reason: SwitchReason::Voluntary,
            }),
        )
    }

    pub fn capture(player_id: &str, ball_type: BallType) -> Self {
        Self::new(player_id, ActionPayload::Capture { ball_type })
    }

    pub fn run(player_id: &str) -> Self {
        Self::new(player_id, ActionPayload::Run)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn action_type(&self) -> ActionType {
        match self.payload {
            ActionPayload::Attack { .. } => ActionType::Attack,
            ActionPayload::Item { .. } => ActionType::Item,
            ActionPayload::Switch(_) => ActionType::Switch,
            ActionPayload::Capture { .. } => ActionType::Capture,
            ActionPayload::Run => ActionType::Run,
        }
    }

    /// Fill in the id and timestamp when a client left them out.
    pub(crate) fn stamp(&mut self) {
        if self.action_id.is_empty() {
            self.action_id = uuid::Uuid::new_v4().to_string();
        }
        if self.timestamp == 0 {
            self.timestamp = now_millis();
        }
    }
}
