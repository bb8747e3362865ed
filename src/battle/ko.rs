use crate::battle::state::BattleGameState;
use schema::{EndReason, PlayerRole};

/// Detects knocked-out active Pokemon and defeated teams.
#[derive(Debug, Default)]
pub struct KOManager;

impl KOManager {
    pub fn new() -> Self {
        Self
    }

    /// Sides whose active Pokemon has fainted, the actor's target first.
    pub fn fainted_roles(&self, state: &BattleGameState, actor: PlayerRole) -> Vec<PlayerRole> {
        [actor.opponent(), actor]
            .into_iter()
            .filter(|role| {
                state
                    .player(*role)
                    .active_pokemon()
                    .is_some_and(|pokemon| pokemon.is_fainted())
            })
            .collect()
    }

    pub fn is_team_defeated(&self, state: &BattleGameState, role: PlayerRole) -> bool {
        !state.player(role).has_battle_ready_pokemon()
    }

    /// The winner if either team is out of battle-ready Pokemon. When both are,
    /// the side that made the final attack wins.
    pub fn check_battle_end(
        &self,
        state: &BattleGameState,
        actor: PlayerRole,
    ) -> Option<(PlayerRole, EndReason)> {
        [actor.opponent(), actor]
            .into_iter()
            .find(|role| self.is_team_defeated(state, *role))
            .map(|defeated| (defeated.opponent(), EndReason::TeamDefeat))
    }
}
