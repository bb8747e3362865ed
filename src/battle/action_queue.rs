use crate::battle::action::BattleAction;
use crate::battle::speed::SpeedCalculator;
use crate::battle::state::BattleGameState;
use crate::config::SwitchRules;
use crate::errors::ActionRejected;
use schema::{ActionType, PlayerRole, SwitchTiePolicy};

/// Buffers the current turn's actions, one slot per side.
#[derive(Debug, Default)]
pub struct ActionQueue {
    slots: [Option<BattleAction>; 2],
    rules: SwitchRules,
    switches_this_turn: usize,
}

impl ActionQueue {
    pub fn new(rules: SwitchRules) -> Self {
        Self {
            slots: [None, None],
            rules,
            switches_this_turn: 0,
        }
    }

    pub fn configure_switch_behavior(
        &mut self,
        enabled: bool,
        max_per_turn: usize,
        tie_policy: SwitchTiePolicy,
    ) {
        self.rules.enabled = enabled;
        self.rules.max_per_turn = max_per_turn;
        self.rules.tie_policy = tie_policy;
    }

    pub fn switch_rules(&self) -> &SwitchRules {
        &self.rules
    }

    /// Queue `action` for `role`. A second submission for the same role in the
    /// same turn is rejected and leaves the queue untouched.
    pub fn add_action(
        &mut self,
        role: PlayerRole,
        action: BattleAction,
    ) -> Result<(), ActionRejected> {
        let slot = &mut self.slots[role.index()];
        if slot.is_some() {
            return Err(ActionRejected::Duplicate(role));
        }
        if action.action_type() == ActionType::Switch {
            if !self.rules.enabled {
                return Err(ActionRejected::SwitchingDisabled);
            }
            if self.switches_this_turn >= self.rules.max_per_turn {
                return Err(ActionRejected::SwitchLimitReached(self.rules.max_per_turn));
            }
            self.switches_this_turn += 1;
        }
        *slot = Some(action);
        Ok(())
    }

    pub fn has_action(&self, role: PlayerRole) -> bool {
        self.slots[role.index()].is_some()
    }

    pub fn are_all_actions_ready(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn switches_this_turn(&self) -> usize {
        self.switches_this_turn
    }

    /// Empty the queue and hand back the turn's actions in resolution order.
    pub fn take_ordered(
        &mut self,
        state: &BattleGameState,
        calculator: &SpeedCalculator,
    ) -> Vec<(PlayerRole, BattleAction)> {
        let actions: Vec<(PlayerRole, BattleAction)> = PlayerRole::BOTH
            .into_iter()
            .filter_map(|role| self.slots[role.index()].take().map(|action| (role, action)))
            .collect();
        self.switches_this_turn = 0;
        calculator.order(state, &self.rules, actions)
    }

    pub fn clear(&mut self) {
        self.slots = [None, None];
        self.switches_this_turn = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::tests::common::{wild_state, P1, P2};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_duplicate_submission_is_rejected() {
        let mut queue = ActionQueue::new(SwitchRules::default());
        queue.add_action(PlayerRole::Player1, BattleAction::attack(P1, "tackle")).unwrap();
        assert_eq!(queue.len(), 1);

        let err = queue
            .add_action(PlayerRole::Player1, BattleAction::attack(P1, "growl"))
            .unwrap_err();
        assert_eq!(err, ActionRejected::Duplicate(PlayerRole::Player1));
        assert_eq!(queue.len(), 1);
        assert!(!queue.are_all_actions_ready());

        queue.add_action(PlayerRole::Player2, BattleAction::attack(P2, "tackle")).unwrap();
        assert!(queue.are_all_actions_ready());
    }

    #[test]
    fn test_switch_limits() {
        let mut queue = ActionQueue::new(SwitchRules::default());
        queue.configure_switch_behavior(true, 1, SwitchTiePolicy::Player1First);
        queue.add_action(PlayerRole::Player1, BattleAction::switch(P1, 1)).unwrap();
        assert_eq!(
            queue.add_action(PlayerRole::Player2, BattleAction::switch(P2, 1)),
            Err(ActionRejected::SwitchLimitReached(1))
        );
        assert_eq!(queue.len(), 1);

        queue.clear();
        queue.configure_switch_behavior(false, 1, SwitchTiePolicy::Player1First);
        assert_eq!(
            queue.add_action(PlayerRole::Player1, BattleAction::switch(P1, 1)),
            Err(ActionRejected::SwitchingDisabled)
        );
    }

    #[test]
    fn test_take_ordered_empties_the_queue() {
        let state = wild_state();
        let mut queue = ActionQueue::new(SwitchRules::default());
        queue.add_action(PlayerRole::Player2, BattleAction::attack(P2, "tackle")).unwrap();
        queue.add_action(PlayerRole::Player1, BattleAction::run(P1)).unwrap();

        let ordered = queue.take_ordered(&state, &SpeedCalculator::new());
        assert_eq!(ordered.len(), 2);
        assert_eq!(ordered[0].0, PlayerRole::Player1);
        assert!(queue.is_empty());
        assert!(!queue.has_action(PlayerRole::Player2));
    }
}
