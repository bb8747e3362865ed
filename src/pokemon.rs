use schema::{Gender, MoveData, PokemonType, StatusType};
use serde::{Deserialize, Serialize};

fn default_capture_rate() -> u8 {
    120
}

fn default_base_experience() -> u16 {
    64
}

/// A known move and its remaining PP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveSlot {
    pub move_id: String,
    pub pp: u8,
    pub max_pp: u8,
}

impl MoveSlot {
    /// Create a slot at full PP. Moves missing from the catalogue get 0 PP and
    /// will resolve as struggle.
    pub fn new(move_id: &str) -> Self {
        let max_pp = MoveData::lookup(move_id).map_or(0, |data| data.max_pp);
        Self {
            move_id: move_id.to_string(),
            pp: max_pp,
            max_pp,
        }
    }

    pub fn with_pp(mut self, pp: u8) -> Self {
        self.pp = pp.min(self.max_pp);
        self
    }

    /// Use the move (decrease PP). Returns false when no PP was left.
    pub fn use_pp(&mut self) -> bool {
        if self.pp > 0 {
            self.pp -= 1;
            true
        } else {
            false
        }
    }

    pub fn data(&self) -> Option<&'static MoveData> {
        MoveData::lookup(&self.move_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatStats {
    pub attack: u16,
    pub defense: u16,
    pub special_attack: u16,
    pub special_defense: u16,
    pub speed: u16,
}

/// Battle-scoped snapshot of a Pokemon. Mutated in place while the battle
/// resolves; the permanent record is only touched by the end-of-battle
/// persistence step, which finds it again through `combat_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pokemon {
    pub id: String,
    #[serde(default)]
    pub combat_id: String,
    pub name: String,
    pub level: u8,
    pub current_hp: u16,
    pub max_hp: u16,
    #[serde(flatten)]
    pub stats: CombatStats,
    pub types: Vec<PokemonType>,
    pub moves: Vec<MoveSlot>,
    #[serde(default)]
    pub status: StatusType,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub shiny: bool,
    #[serde(default)]
    pub is_wild: bool,
    #[serde(default = "default_capture_rate")]
    pub capture_rate: u8,
    #[serde(default = "default_base_experience")]
    pub base_experience: u16,
}

impl Pokemon {
    pub fn new(id: &str, name: &str, level: u8, max_hp: u16, stats: CombatStats) -> Self {
        Self {
            id: id.to_string(),
            combat_id: String::new(),
            name: name.to_string(),
            level,
            current_hp: max_hp,
            max_hp,
            stats,
            types: vec![PokemonType::Normal],
            moves: Vec::new(),
            status: StatusType::None,
            gender: Gender::Unknown,
            shiny: false,
            is_wild: false,
            capture_rate: default_capture_rate(),
            base_experience: default_base_experience(),
        }
    }

    pub fn is_fainted(&self) -> bool {
        self.current_hp == 0
    }

    pub fn is_battle_ready(&self) -> bool {
        !self.is_fainted()
    }

    /// Apply damage, saturating at zero. Returns the HP actually lost.
    pub fn take_damage(&mut self, amount: u16) -> u16 {
        let lost = amount.min(self.current_hp);
        self.current_hp -= lost;
        lost
    }

    /// Restore HP up to the maximum. Returns the HP actually restored.
    pub fn heal(&mut self, amount: u16) -> u16 {
        let restored = amount.min(self.max_hp - self.current_hp.min(self.max_hp));
        self.current_hp += restored;
        restored
    }

    pub fn set_hp(&mut self, hp: u16) {
        self.current_hp = hp.min(self.max_hp);
    }

    pub fn hp_fraction(&self) -> f64 {
        if self.max_hp == 0 {
            return 0.0;
        }
        self.current_hp as f64 / self.max_hp as f64
    }

    fn move_index(&self, move_id: &str) -> Option<usize> {
        let wanted = MoveData::lookup(move_id).map(|data| data.id);
        self.moves.iter().position(|slot| {
            slot.move_id.eq_ignore_ascii_case(move_id)
                || (wanted.is_some() && slot.data().map(|data| data.id) == wanted)
        })
    }

    pub fn move_slot(&self, move_id: &str) -> Option<&MoveSlot> {
        self.move_index(move_id).map(|index| &self.moves[index])
    }

    pub fn move_slot_mut(&mut self, move_id: &str) -> Option<&mut MoveSlot> {
        let index = self.move_index(move_id)?;
        self.moves.get_mut(index)
    }

    pub fn knows_move(&self, move_id: &str) -> bool {
        self.move_slot(move_id).is_some()
    }

    /// True when every known move is out of PP (or nothing is known at all).
    pub fn all_moves_exhausted(&self) -> bool {
        self.moves.iter().all(|slot| slot.pp == 0)
    }
}
