use crate::battle::action::{ActionPayload, BattleAction};
use crate::battle::state::BattleGameState;
use crate::config::SwitchRules;
use crate::pokemon::Pokemon;
use schema::{MoveData, PlayerRole, StatusType, SwitchTiePolicy};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActionPriority {
    action_priority: i8, // Run: 8, Switch: 6 (when switches go first), Item/Capture: 4, Move: 0
    move_priority: i8,   // Priority from move data (e.g., Quick Attack)
    speed: u16,          // Effective speed for tiebreaking
}

/// Effective speed after status modifiers.
pub fn effective_speed(pokemon: &Pokemon) -> u16 {
    let speed = pokemon.stats.speed;
    // Paralysis (quarter speed)
    if pokemon.status == StatusType::Paralysis {
        speed / 4
    } else {
        speed
    }
}

/// Orders a turn's queued actions. The order is total: two actions never
/// compare equal because the role breaks every remaining tie.
#[derive(Debug, Default)]
pub struct SpeedCalculator;

impl SpeedCalculator {
    pub fn new() -> Self {
        Self
    }

    pub fn order(
        &self,
        state: &BattleGameState,
        rules: &SwitchRules,
        mut actions: Vec<(PlayerRole, BattleAction)>,
    ) -> Vec<(PlayerRole, BattleAction)> {
        actions.sort_by(|(role_a, action_a), (role_b, action_b)| {
            let a = Self::priority(state, rules, *role_a, action_a);
            let b = Self::priority(state, rules, *role_b, action_b);
            Self::compare(rules, (*role_a, a, action_a), (*role_b, b, action_b))
        });
        actions
    }

    fn compare(
        rules: &SwitchRules,
        (role_a, a, action_a): (PlayerRole, ActionPriority, &BattleAction),
        (role_b, b, action_b): (PlayerRole, ActionPriority, &BattleAction),
    ) -> Ordering {
        let both_switches = matches!(action_a.payload, ActionPayload::Switch(_))
            && matches!(action_b.payload, ActionPayload::Switch(_));
        let use_speed = !both_switches || rules.tie_policy == SwitchTiePolicy::FasterFirst;

        b.action_priority
            .cmp(&a.action_priority)
            .then(b.move_priority.cmp(&a.move_priority))
            .then(if use_speed { b.speed.cmp(&a.speed) } else { Ordering::Equal })
            // Player 1 acts first on a full tie
            .then(role_a.cmp(&role_b))
    }

    fn priority(
        state: &BattleGameState,
        rules: &SwitchRules,
        role: PlayerRole,
        action: &BattleAction,
    ) -> ActionPriority {
        let speed = state
            .player(role)
            .active_pokemon()
            .map_or(0, effective_speed);

        match &action.payload {
            ActionPayload::Run => ActionPriority {
                action_priority: 8,
                move_priority: 0,
                speed,
            },
            ActionPayload::Switch(_) => ActionPriority {
                action_priority: if rules.switches_first { 6 } else { 0 },
                move_priority: 0,
                speed,
            },
            ActionPayload::Item { .. } | ActionPayload::Capture { .. } => ActionPriority {
                action_priority: 4,
                move_priority: 0,
                speed,
            },
            ActionPayload::Attack { move_id } => ActionPriority {
                action_priority: 0,
                move_priority: MoveData::lookup(move_id).map_or(0, |data| data.priority),
                speed,
            },
        }
    }
}
