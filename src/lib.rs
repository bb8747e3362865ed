// In: src/lib.rs

//! Pokemon Battle Engine
//!
//! A server-side, turn-based battle engine for wild, trainer and player
//! battles. Each battle is owned by one [`BattleEngine`], driven by a
//! [`session::BattleSession`] task that feeds it actions and wakes it for its
//! timers.

// --- MODULE DECLARATIONS ---
pub mod battle;
pub mod collaborators;
pub mod config;
pub mod errors;
pub mod player;
pub mod pokemon;
pub mod pool;
pub mod session;
pub mod trainer;

// --- PUBLIC API RE-EXPORTS ---

// --- From the `schema` crate ---
// Static definitions shared with clients.
pub use schema::{
    ActionType, BallType, BattleType, EndReason, ItemData, MoveCategory, MoveData, PlayerRole,
    PokemonType, StatusType, SwitchReason, SwitchTiePolicy,
};

// --- From this crate's modules (`src/`) ---

// The engine and its inputs and outputs.
pub use battle::action::{ActionPayload, BattleAction, SwitchData};
pub use battle::engine::{BattleConfig, BattleEngine, EngineResult, SideConfig, TrainerBattleConfig};
pub use battle::events::{EngineEvent, EventKind};
pub use battle::phase::{BattlePhase, TrainerPhase};
pub use battle::state::{BattleEvent, BattleGameState, BattleRng};

// Runtime types for a battle.
pub use player::{PlayerSlot, TeamConfig};
pub use pokemon::{CombatStats, MoveSlot, Pokemon};
pub use trainer::{AiProfile, TrainerData};

pub use config::{EngineConfig, SwitchRules};
pub use pool::EnginePool;
pub use session::{BattleHandle, BattleSession};

// Crate-specific error and result types.
pub use errors::{
    ActionRejected, BattleEngineError, BattleResult, ConfigValidationError, ProcessingFailure,
    StallTimeout, TransitionFailure,
};
