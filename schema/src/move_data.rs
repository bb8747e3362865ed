use crate::PokemonType;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MoveCategory {
    Physical,
    Special,
    Status,
}

/// Static battle data for a move. Only the fields the engine resolves are
/// carried; secondary effects belong to the client-side presentation data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveData {
    pub id: &'static str,
    pub name: &'static str,
    pub move_type: PokemonType,
    pub category: MoveCategory,
    pub power: u16,
    pub max_pp: u8,
    pub priority: i8,
}

pub const STRUGGLE_ID: &str = "struggle";

macro_rules! move_entry {
    ($id:literal, $name:literal, $ty:ident, $cat:ident, $power:literal, $pp:literal) => {
        move_entry!($id, $name, $ty, $cat, $power, $pp, 0)
    };
    (
        $id:literal,
        $name:literal,
        $ty:ident,
        $cat:ident,
        $power:literal,
        $pp:literal,
        $priority:literal
    ) => {
        MoveData {
            id: $id,
            name: $name,
            move_type: PokemonType::$ty,
            category: MoveCategory::$cat,
            power: $power,
            max_pp: $pp,
            priority: $priority,
        }
    };
}

static MOVES: &[MoveData] = &[
    move_entry!("struggle", "Struggle", Normal, Physical, 50, 1),
    move_entry!("tackle", "Tackle", Normal, Physical, 40, 35),
    move_entry!("scratch", "Scratch", Normal, Physical, 40, 35),
    move_entry!("pound", "Pound", Normal, Physical, 40, 35),
    move_entry!("quick_attack", "Quick Attack", Normal, Physical, 40, 30, 1),
    move_entry!("body_slam", "Body Slam", Normal, Physical, 85, 15),
    move_entry!("hyper_beam", "Hyper Beam", Normal, Special, 150, 5),
    move_entry!("growl", "Growl", Normal, Status, 0, 40),
    move_entry!("tail_whip", "Tail Whip", Normal, Status, 0, 30),
    move_entry!("leer", "Leer", Normal, Status, 0, 30),
    move_entry!("sand_attack", "Sand Attack", Ground, Status, 0, 15),
    move_entry!("ember", "Ember", Fire, Special, 40, 25),
    move_entry!("flamethrower", "Flamethrower", Fire, Special, 90, 15),
    move_entry!("water_gun", "Water Gun", Water, Special, 40, 25),
    move_entry!("bubble", "Bubble", Water, Special, 40, 30),
    move_entry!("surf", "Surf", Water, Special, 90, 15),
    move_entry!("thunder_shock", "Thunder Shock", Electric, Special, 40, 30),
    move_entry!("thunderbolt", "Thunderbolt", Electric, Special, 90, 15),
    move_entry!("thunder_wave", "Thunder Wave", Electric, Status, 0, 20),
    move_entry!("vine_whip", "Vine Whip", Grass, Physical, 45, 25),
    move_entry!("razor_leaf", "Razor Leaf", Grass, Physical, 55, 25),
    move_entry!("absorb", "Absorb", Grass, Special, 20, 25),
    move_entry!("ice_beam", "Ice Beam", Ice, Special, 90, 10),
    move_entry!("karate_chop", "Karate Chop", Fighting, Physical, 50, 25),
    move_entry!("poison_sting", "Poison Sting", Poison, Physical, 15, 35),
    move_entry!("mud_slap", "Mud-Slap", Ground, Special, 20, 10),
    move_entry!("gust", "Gust", Flying, Special, 40, 35),
    move_entry!("wing_attack", "Wing Attack", Flying, Physical, 60, 35),
    move_entry!("confusion", "Confusion", Psychic, Special, 50, 25),
    move_entry!("bug_bite", "Bug Bite", Bug, Physical, 60, 20),
    move_entry!("rock_throw", "Rock Throw", Rock, Physical, 50, 15),
    move_entry!("lick", "Lick", Ghost, Physical, 30, 30),
    move_entry!("dragon_rage", "Dragon Rage", Dragon, Special, 40, 10),
    move_entry!("bite", "Bite", Dark, Physical, 60, 25),
    move_entry!("metal_claw", "Metal Claw", Steel, Physical, 50, 35),
    move_entry!("fairy_wind", "Fairy Wind", Fairy, Special, 40, 30),
];

fn normalize(id: &str) -> String {
    id.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

impl MoveData {
    /// Looks up a move by id. Ids are matched case-insensitively and accept
    /// `-` or spaces in place of `_` (`"Quick Attack"`, `"quick-attack"`).
    pub fn lookup(id: &str) -> Option<&'static MoveData> {
        let key = normalize(id);
        MOVES.iter().find(|data| data.id == key)
    }

    pub fn struggle() -> &'static MoveData {
        &MOVES[0]
    }

    pub fn all() -> &'static [MoveData] {
        MOVES
    }

    /// Offensive moves are the ones that deal direct damage.
    pub fn is_offensive(&self) -> bool {
        self.category != MoveCategory::Status && self.power > 0
    }
}
