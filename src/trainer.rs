use crate::pokemon::Pokemon;
use serde::{Deserialize, Serialize};

/// How a trainer's AI weighs its options.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AiProfile {
    /// 0.0 picks moves almost at random, 1.0 always takes the best scored move.
    pub aggression: f64,
    /// Active Pokemon below this HP fraction makes the AI look for a switch.
    pub switch_threshold: f64,
    /// Weight type effectiveness when scoring moves.
    pub uses_type_advantage: bool,
}

impl Default for AiProfile {
    fn default() -> Self {
        Self {
            aggression: 0.7,
            switch_threshold: 0.2,
            uses_type_advantage: true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemReward {
    pub item_id: String,
    pub quantity: u32,
    /// Drop chance in 0.0..=1.0.
    pub chance: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RewardRules {
    pub base_money: u32,
    pub money_multiplier: f64,
    pub experience_multiplier: f64,
    pub items: Vec<ItemReward>,
}

impl Default for RewardRules {
    fn default() -> Self {
        Self {
            base_money: 20,
            money_multiplier: 1.0,
            experience_multiplier: 1.0,
            items: Vec::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrainerData {
    pub trainer_id: String,
    pub name: String,
    pub class: String,
    pub level: u8,
    pub roster: Vec<Pokemon>,
    #[serde(default)]
    pub ai_profile: AiProfile,
    #[serde(default)]
    pub reward_rules: RewardRules,
}

impl TrainerData {
    /// Display name as shown in battle text, e.g. "Youngster Joey".
    pub fn display_name(&self) -> String {
        if self.class.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.class, self.name)
        }
    }
}
