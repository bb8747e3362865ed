use crate::battle::state::BattleRng;
use crate::pokemon::Pokemon;
use crate::trainer::TrainerData;
use serde::{Deserialize, Serialize};

// Constants for reward calculations
const EXP_DIVISOR: u32 = 7;
const TRAINER_EXP_BONUS: f64 = 1.5;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RewardItem {
    pub item_id: String,
    pub quantity: u32,
}

/// What the player earns for beating a trainer.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrainerRewards {
    pub money: u32,
    pub items: Vec<RewardItem>,
    pub experience: u32,
}

/// Experience for defeating one Pokemon.
/// Formula: base_experience × level / 7
pub fn defeat_experience(defeated: &Pokemon) -> u32 {
    defeated.base_experience as u32 * defeated.level as u32 / EXP_DIVISOR
}

/// Calculator for trainer-battle rewards
#[derive(Debug, Default)]
pub struct TrainerRewardManager;

impl TrainerRewardManager {
    pub fn new() -> Self {
        Self
    }

    /// Money: base_money × trainer level × multiplier.
    /// Items: each reward rule rolls its own drop chance.
    /// Experience: every roster member's defeat experience, × 1.5 for a
    /// trainer battle, × the trainer's experience multiplier.
    pub fn calculate(&self, trainer: &TrainerData, rng: &mut BattleRng) -> TrainerRewards {
        let rules = &trainer.reward_rules;

        let money = (rules.base_money as f64 * trainer.level as f64 * rules.money_multiplier)
            .round()
            .max(0.0) as u32;

        let items = rules
            .items
            .iter()
            .filter(|reward| rng.chance(&format!("reward drop {}", reward.item_id), reward.chance))
            .map(|reward| RewardItem {
                item_id: reward.item_id.clone(),
                quantity: reward.quantity,
            })
            .collect();

        let roster_experience: u32 = trainer.roster.iter().map(defeat_experience).sum();
        let experience =
            (roster_experience as f64 * TRAINER_EXP_BONUS * rules.experience_multiplier)
                .floor()
                .max(0.0) as u32;

        TrainerRewards {
            money,
            items,
            experience,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pokemon::CombatStats;
    use crate::trainer::{AiProfile, ItemReward, RewardRules};
    use pretty_assertions::assert_eq;

    fn trainer() -> TrainerData {
        let mut rattata = Pokemon::new("t-1", "Rattata", 14, 35, CombatStats::default());
        rattata.base_experience = 51;
        let mut pidgey = Pokemon::new("t-2", "Pidgey", 14, 38, CombatStats::default());
        pidgey.base_experience = 50;
        TrainerData {
            trainer_id: "joey".to_string(),
            name: "Joey".to_string(),
            class: "Youngster".to_string(),
            level: 14,
            roster: vec![rattata, pidgey],
            ai_profile: AiProfile::default(),
            reward_rules: RewardRules {
                base_money: 16,
                money_multiplier: 1.5,
                experience_multiplier: 1.0,
                items: vec![
                    ItemReward { item_id: "potion".to_string(), quantity: 1, chance: 0.5 },
                    ItemReward { item_id: "full_heal".to_string(), quantity: 2, chance: 0.1 },
                ],
            },
        }
    }

    #[test]
    fn test_defeat_experience() {
        let mut pokemon = Pokemon::new("w", "Pidgey", 5, 20, CombatStats::default());
        pokemon.base_experience = 50;
        assert_eq!(defeat_experience(&pokemon), 35);
    }

    #[test]
    fn test_trainer_rewards() {
        let mut rng = BattleRng::new_for_test(vec![0.3, 0.3]);
        let rewards = TrainerRewardManager::new().calculate(&trainer(), &mut rng);

        assert_eq!(rewards.money, 336);
        assert_eq!(
            rewards.items,
            vec![RewardItem { item_id: "potion".to_string(), quantity: 1 }]
        );
        // (102 + 100) * 1.5
        assert_eq!(rewards.experience, 303);
    }
}
