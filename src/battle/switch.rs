use crate::battle::action::SwitchData;
use crate::battle::state::{BattleEvent, BattleGameState};
use crate::errors::ActionRejected;
use schema::PlayerRole;

/// What a side could switch to right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchAnalysis {
    pub can_switch: bool,
    pub available_indices: Vec<usize>,
    /// Where a forced switch would go: the next battle-ready member after
    /// the active slot, wrapping to the first battle-ready one.
    pub default_replacement: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchRecord {
    pub role: PlayerRole,
    pub from_index: usize,
    pub to_index: usize,
    pub pokemon: String,
    pub forced: bool,
    pub message: BattleEvent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForcedSwitchOutcome {
    Switched(SwitchRecord),
    TeamDefeated,
}

#[derive(Debug, Default)]
pub struct SwitchManager;

impl SwitchManager {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze_switch_options(
        &self,
        state: &BattleGameState,
        role: PlayerRole,
    ) -> SwitchAnalysis {
        let player = state.player(role);
        let available_indices = player.valid_switch_targets();
        let default_replacement = available_indices
            .iter()
            .copied()
            .find(|&index| index > player.active_index)
            .or_else(|| available_indices.first().copied());

        SwitchAnalysis {
            can_switch: state.switching_permitted()
                && player.team_config.allow_switching
                && !available_indices.is_empty(),
            available_indices,
            default_replacement,
        }
    }

    /// Checks a voluntary switch and returns the roster slot to bring in. The
    /// per-turn limit is enforced by the action queue.
    pub fn validate_switch(
        &self,
        state: &BattleGameState,
        role: PlayerRole,
        data: &SwitchData,
    ) -> Result<usize, ActionRejected> {
        let player = state.player(role);
        if !state.switching_permitted() || !player.team_config.allow_switching {
            return Err(ActionRejected::SwitchingDisabled);
        }
        if data.from_index.is_some_and(|from| from != player.active_index) {
            return Err(ActionRejected::InvalidSwitchTarget(data.to_index));
        }
        let analysis = self.analyze_switch_options(state, role);
        if analysis.available_indices.is_empty() {
            return Err(ActionRejected::NoSwitchTarget(role));
        }
        if !analysis.available_indices.contains(&data.to_index) {
            return Err(ActionRejected::InvalidSwitchTarget(data.to_index));
        }
        Ok(data.to_index)
    }

    pub fn execute_switch(
        &self,
        state: &mut BattleGameState,
        role: PlayerRole,
        to_index: usize,
        forced: bool,
    ) -> Result<SwitchRecord, ActionRejected> {
        let player = state.player_mut(role);
        let target_ready = player
            .team
            .get(to_index)
            .is_some_and(|pokemon| pokemon.is_battle_ready());
        if !target_ready || to_index == player.active_index {
            return Err(ActionRejected::InvalidSwitchTarget(to_index));
        }

        let from_index = player.active_index;
        let old_pokemon = player
            .active_pokemon()
            .map(|pokemon| pokemon.name.clone())
            .unwrap_or_default();
        player
            .switch_pokemon(to_index)
            .map_err(|_| ActionRejected::InvalidSwitchTarget(to_index))?;
        let new_pokemon = player
            .active_pokemon()
            .map(|pokemon| pokemon.name.clone())
            .unwrap_or_default();
        log::debug!(
            "{role} switched {old_pokemon} (slot {from_index}) for {new_pokemon} (slot {to_index})"
        );

        Ok(SwitchRecord {
            role,
            from_index,
            to_index,
            pokemon: new_pokemon.clone(),
            forced,
            message: BattleEvent::PokemonSwitched {
                role,
                old_pokemon,
                new_pokemon,
                forced,
            },
        })
    }

    /// Replace a fainted active Pokemon. Ignores the switching rules: a side
    /// with anyone left standing always sends them out.
    pub fn forced_switch(
        &self,
        state: &mut BattleGameState,
        role: PlayerRole,
    ) -> ForcedSwitchOutcome {
        match self.analyze_switch_options(state, role).default_replacement {
            Some(to_index) => match self.execute_switch(state, role, to_index, true) {
                Ok(record) => ForcedSwitchOutcome::Switched(record),
                Err(_) => ForcedSwitchOutcome::TeamDefeated,
            },
            None => ForcedSwitchOutcome::TeamDefeated,
        }
    }
}
