//! Services the engine consumes but does not own.
//!
//! Every collaborator is optional and best-effort: the engine logs and
//! swallows their failures, so a slow or broken store never stalls a battle.

use async_trait::async_trait;
use schema::StatusType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::pokemon::Pokemon;

/// The persisted record of a Pokemon owned by a trainer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OwnedPokemonRecord {
    pub id: String,
    pub owner_id: String,
    pub combat_id: Option<String>,
    /// Position in the owner's party.
    pub roster_position: usize,
    pub level: u8,
    pub current_hp: u16,
    pub status: StatusType,
}

#[async_trait]
pub trait PokemonStore: Send + Sync {
    async fn find_owned_pokemon(&self, owner_id: &str) -> anyhow::Result<Vec<OwnedPokemonRecord>>;
    async fn save_pokemon(&self, record: OwnedPokemonRecord) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PpConsumption {
    Consumed { remaining: u8 },
    Exhausted,
}

/// Authoritative PP bookkeeping, keyed by `(player_id, move_id)`.
#[async_trait]
pub trait PpConsumer: Send + Sync {
    async fn consume_pp(&self, player_id: &str, move_id: &str) -> anyhow::Result<PpConsumption>;
}

/// Follow-up notifications produced by an experience award.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ProgressionEvent {
    LevelUp {
        pokemon_id: String,
        new_level: u8,
    },
    Evolution {
        pokemon_id: String,
        into_species: String,
    },
    NewMoves {
        pokemon_id: String,
        moves: Vec<String>,
    },
}

#[async_trait]
pub trait ExperienceService: Send + Sync {
    async fn award_experience(
        &self,
        owner_id: &str,
        pokemon_id: &str,
        amount: u32,
    ) -> anyhow::Result<Vec<ProgressionEvent>>;
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "milestone", rename_all = "snake_case")]
pub enum TrainerMilestone {
    BattleStarted { trainer_id: String },
    PokemonDefeated { trainer_id: String, pokemon_id: String },
    BattleFinished { trainer_id: String, trainer_won: bool },
}

#[async_trait]
pub trait NpcTelemetry: Send + Sync {
    async fn track(&self, player_id: &str, milestone: TrainerMilestone) -> anyhow::Result<()>;
}

#[async_trait]
pub trait EncounterService: Send + Sync {
    async fn record_encounter(&self, player_id: &str, pokemon: &Pokemon) -> anyhow::Result<()>;
}

/// Receives a captured Pokemon on behalf of the capturing player.
#[async_trait]
pub trait TeamManager: Send + Sync {
    async fn add_captured(&self, player_id: &str, pokemon: Pokemon) -> anyhow::Result<()>;
}

/// The set of collaborators wired into one engine.
#[derive(Clone, Default)]
pub struct Collaborators {
    pub store: Option<Arc<dyn PokemonStore>>,
    pub pp: Option<Arc<dyn PpConsumer>>,
    pub experience: Option<Arc<dyn ExperienceService>>,
    pub telemetry: Option<Arc<dyn NpcTelemetry>>,
    pub encounters: Option<Arc<dyn EncounterService>>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("store", &self.store.is_some())
            .field("pp", &self.pp.is_some())
            .field("experience", &self.experience.is_some())
            .field("telemetry", &self.telemetry.is_some())
            .field("encounters", &self.encounters.is_some())
            .finish()
    }
}

/// Process-local store, used by the demo binary and tests.
#[derive(Debug, Default)]
pub struct InMemoryPokemonStore {
    records: Mutex<HashMap<String, Vec<OwnedPokemonRecord>>>,
}

impl InMemoryPokemonStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: OwnedPokemonRecord) {
        self.records
            .lock()
            .await
            .entry(record.owner_id.clone())
            .or_default()
            .push(record);
    }

    pub async fn get(&self, owner_id: &str, id: &str) -> Option<OwnedPokemonRecord> {
        self.records
            .lock()
            .await
            .get(owner_id)
            .and_then(|records| records.iter().find(|record| record.id == id).cloned())
    }
}

#[async_trait]
impl PokemonStore for InMemoryPokemonStore {
    async fn find_owned_pokemon(&self, owner_id: &str) -> anyhow::Result<Vec<OwnedPokemonRecord>> {
        Ok(self
            .records
            .lock()
            .await
            .get(owner_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_pokemon(&self, record: OwnedPokemonRecord) -> anyhow::Result<()> {
        let mut records = self.records.lock().await;
        let owned = records.entry(record.owner_id.clone()).or_default();
        match owned.iter_mut().find(|existing| existing.id == record.id) {
            Some(existing) => *existing = record,
            None => owned.push(record),
        }
        Ok(())
    }
}
