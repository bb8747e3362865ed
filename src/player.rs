use crate::pokemon::Pokemon;
use serde::{Deserialize, Serialize};

/// Per-side team settings carried into the battle.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamConfig {
    /// Identity that owns the roster in the persistent store. Defaults to the
    /// side's session id when absent.
    pub owner_id: Option<String>,
    /// Voluntary switching for this side. Forced switches after a faint are
    /// never blocked by this flag.
    pub allow_switching: bool,
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            owner_id: None,
            allow_switching: true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSlot {
    // For a human this is the connection's session id, for an NPC something
    // like "wild" or the trainer id.
    pub session_id: String,
    pub name: String,

    // The full ordered roster. A side that only brought an active Pokemon
    // gets a one-member team.
    pub team: Vec<Pokemon>,

    // Index into `team` of the Pokemon currently on the field.
    pub active_index: usize,

    pub team_config: TeamConfig,
    pub is_ai: bool,
}

impl PlayerSlot {
    pub fn new(session_id: &str, name: &str, team: Vec<Pokemon>, is_ai: bool) -> Self {
        PlayerSlot {
            session_id: session_id.to_string(),
            name: name.to_string(),
            team,
            active_index: 0,
            team_config: TeamConfig::default(),
            is_ai,
        }
    }

    /// Get the currently active Pokemon
    pub fn active_pokemon(&self) -> Option<&Pokemon> {
        self.team.get(self.active_index)
    }

    /// Get the currently active Pokemon mutably
    pub fn active_pokemon_mut(&mut self) -> Option<&mut Pokemon> {
        self.team.get_mut(self.active_index)
    }

    pub fn owner_id(&self) -> &str {
        self.team_config.owner_id.as_deref().unwrap_or(&self.session_id)
    }

    /// Roster indices of every Pokemon that can still fight.
    pub fn battle_ready_indices(&self) -> Vec<usize> {
        self.team
            .iter()
            .enumerate()
            .filter(|(_, pokemon)| pokemon.is_battle_ready())
            .map(|(index, _)| index)
            .collect()
    }

    /// Battle-ready roster members other than the active one.
    pub fn valid_switch_targets(&self) -> Vec<usize> {
        self.battle_ready_indices()
            .into_iter()
            .filter(|&index| index != self.active_index)
            .collect()
    }

    pub fn has_battle_ready_pokemon(&self) -> bool {
        self.team.iter().any(Pokemon::is_battle_ready)
    }

    pub fn fainted_count(&self) -> usize {
        self.team.iter().filter(|pokemon| pokemon.is_fainted()).count()
    }

    pub fn has_multiple_pokemon(&self) -> bool {
        self.team.len() > 1
    }

    /// Put a different roster member on the field.
    pub fn switch_pokemon(&mut self, new_index: usize) -> Result<(), String> {
        if new_index >= self.team.len() {
            return Err(format!("roster slot {new_index} is empty"));
        }
        self.active_index = new_index;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pokemon::CombatStats;
    use pretty_assertions::assert_eq;

    fn roster() -> Vec<Pokemon> {
        ["Bulbasaur", "Squirtle", "Charmander"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                Pokemon::new(&format!("mon-{i}"), name, 10, 30, CombatStats::default())
            })
            .collect()
    }

    #[test]
    fn test_switch_targets_skip_active_and_fainted() {
        let mut player = PlayerSlot::new("session-1", "Ash", roster(), false);
        player.team[2].set_hp(0);

        assert_eq!(player.battle_ready_indices(), vec![0, 1]);
        assert_eq!(player.valid_switch_targets(), vec![1]);
        assert_eq!(player.fainted_count(), 1);

        player.switch_pokemon(1).unwrap();
        assert_eq!(player.active_pokemon().unwrap().name, "Squirtle");
        assert_eq!(player.valid_switch_targets(), vec![0]);
        assert!(player.switch_pokemon(3).is_err());
    }

    #[test]
    fn test_owner_defaults_to_session() {
        let mut player = PlayerSlot::new("session-1", "Ash", roster(), false);
        assert_eq!(player.owner_id(), "session-1");
        player.team_config.owner_id = Some("user-42".to_string());
        assert_eq!(player.owner_id(), "user-42");
    }
}
