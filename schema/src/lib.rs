// Battle Engine Schema - Shared type definitions
// Static enums, the move catalogue and the item table that both the engine and
// the game clients agree on. Everything here is plain data with string forms
// that match the wire protocol.

pub use battle_data::*;
pub use item_data::*;
pub use move_data::*;
pub use pokemon_types::*;

pub mod battle_data;
pub mod item_data;
pub mod move_data;
pub mod pokemon_types;
