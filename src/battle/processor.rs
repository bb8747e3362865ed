//! Applies a single queued action to the battle state.

use crate::battle::action::{ActionPayload, BattleAction};
use crate::battle::state::{BattleEvent, BattleGameState};
use crate::collaborators::{PpConsumer, PpConsumption};
use crate::errors::{BestEffort, ProcessingFailure};
use crate::pokemon::Pokemon;
use schema::{
    ActionType, ItemData, ItemEffect, MoveCategory, MoveData, PlayerRole, StatusType, STRUGGLE_ID,
};
use std::sync::Arc;

/// Outcome of one processed action.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedAction {
    pub role: PlayerRole,
    pub action_type: ActionType,
    pub move_used: Option<String>,
    pub damage: u16,
    pub recoil: u16,
    pub defender_fainted: bool,
    pub attacker_fainted: bool,
    pub fled: bool,
    pub messages: Vec<BattleEvent>,
}

impl ProcessedAction {
    fn new(role: PlayerRole, action_type: ActionType) -> Self {
        Self {
            role,
            action_type,
            move_used: None,
            damage: 0,
            recoil: 0,
            defender_fainted: false,
            attacker_fainted: false,
            fled: false,
            messages: Vec::new(),
        }
    }
}

/// Damage formula: floor(((2 × level / 5 + 2) × power × (atk / def)) / 50) + 2, minimum 1.
pub fn calculate_damage(level: u8, power: u16, attack: u16, defense: u16) -> u16 {
    let level = level as f64;
    let ratio = attack as f64 / defense.max(1) as f64;
    let damage = (((2.0 * level / 5.0 + 2.0) * power as f64 * ratio) / 50.0).floor() + 2.0;
    damage.clamp(1.0, u16::MAX as f64) as u16
}

/// Struggle hits the defender for floor(level / 2).
pub fn struggle_damage(attacker: &Pokemon) -> u16 {
    attacker.level as u16 / 2
}

/// Struggle recoil is floor(max_hp / 4) and may knock the attacker out.
pub fn struggle_recoil(attacker: &Pokemon) -> u16 {
    attacker.max_hp / 4
}

#[derive(Debug)]
enum MoveChoice {
    Regular(&'static MoveData),
    Struggle,
}

pub struct ActionProcessor {
    pp_consumer: Option<Arc<dyn PpConsumer>>,
}

impl std::fmt::Debug for ActionProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionProcessor")
            .field("pp_consumer", &self.pp_consumer.is_some())
            .finish()
    }
}

impl ActionProcessor {
    pub fn new(pp_consumer: Option<Arc<dyn PpConsumer>>) -> Self {
        Self { pp_consumer }
    }

    pub async fn process_action(
        &self,
        state: &mut BattleGameState,
        role: PlayerRole,
        action: &BattleAction,
    ) -> Result<ProcessedAction, ProcessingFailure> {
        match &action.payload {
            ActionPayload::Attack { move_id } => self.process_attack(state, role, move_id).await,
            ActionPayload::Item { item_id } => Self::process_item(state, role, item_id),
            ActionPayload::Run => {
                let mut result = ProcessedAction::new(role, ActionType::Run);
                result.fled = true;
                result.messages.push(BattleEvent::Fled { role });
                Ok(result)
            }
            ActionPayload::Switch(_) | ActionPayload::Capture { .. } => {
                Err(ProcessingFailure::Unsupported(action.action_type()))
            }
        }
    }

    async fn process_attack(
        &self,
        state: &mut BattleGameState,
        role: PlayerRole,
        move_id: &str,
    ) -> Result<ProcessedAction, ProcessingFailure> {
        let defender_role = role.opponent();
        if state.player(defender_role).active_pokemon().is_none() {
            return Err(ProcessingFailure::NoActivePokemon(defender_role));
        }

        let choice = self.choose_move(state, role, move_id).await?;
        let session_id = state.player(role).session_id.clone();
        let mut result = ProcessedAction::new(role, ActionType::Attack);

        let attacker = state
            .player(role)
            .active_pokemon()
            .ok_or(ProcessingFailure::NoActivePokemon(role))?
            .clone();

        match choice {
            MoveChoice::Struggle => {
                log::debug!("{session_id}'s {} struggles", attacker.name);
                let damage = struggle_damage(&attacker);
                let recoil = struggle_recoil(&attacker);
                result.move_used = Some(STRUGGLE_ID.to_string());
                result.messages.push(BattleEvent::Struggled {
                    role,
                    pokemon: attacker.name.clone(),
                });

                let (dealt, target, remaining_hp, fainted) =
                    Self::damage_defender(state, defender_role, damage)?;
                result.damage = dealt;
                result.defender_fainted = fainted;
                result.messages.push(BattleEvent::DamageDealt {
                    target,
                    damage: dealt,
                    remaining_hp,
                });

                let attacker = state
                    .player_mut(role)
                    .active_pokemon_mut()
                    .ok_or(ProcessingFailure::NoActivePokemon(role))?;
                result.recoil = attacker.take_damage(recoil);
                result.attacker_fainted = attacker.is_fainted();
                result.messages.push(BattleEvent::RecoilTaken {
                    pokemon: attacker.name.clone(),
                    damage: result.recoil,
                });
            }
            MoveChoice::Regular(data) => {
                result.move_used = Some(data.id.to_string());
                result.messages.push(BattleEvent::MoveUsed {
                    role,
                    pokemon: attacker.name.clone(),
                    move_name: data.name.to_string(),
                });

                if data.category != MoveCategory::Status && data.power > 0 {
                    let defender = state
                        .player(defender_role)
                        .active_pokemon()
                        .ok_or(ProcessingFailure::NoActivePokemon(defender_role))?;
                    let (attack, defense) = match data.category {
                        MoveCategory::Special => {
                            (attacker.stats.special_attack, defender.stats.special_defense)
                        }
                        _ => (attacker.stats.attack, defender.stats.defense),
                    };
                    let damage = calculate_damage(attacker.level, data.power, attack, defense);

                    let (dealt, target, remaining_hp, fainted) =
                        Self::damage_defender(state, defender_role, damage)?;
                    result.damage = dealt;
                    result.defender_fainted = fainted;
                    result.messages.push(BattleEvent::DamageDealt {
                        target,
                        damage: dealt,
                        remaining_hp,
                    });
                }
            }
        }

        Ok(result)
    }

    /// Regular move or struggle. Struggle is used when the slot is empty,
    /// every move is out of PP, or the PP service reports exhaustion.
    async fn choose_move(
        &self,
        state: &mut BattleGameState,
        role: PlayerRole,
        move_id: &str,
    ) -> Result<MoveChoice, ProcessingFailure> {
        let player = state.player(role);
        let attacker = player
            .active_pokemon()
            .ok_or(ProcessingFailure::NoActivePokemon(role))?;

        if attacker.all_moves_exhausted() {
            return Ok(MoveChoice::Struggle);
        }
        let slot_pp = attacker.move_slot(move_id).map(|slot| slot.pp);
        let is_struggle = MoveData::lookup(move_id).is_some_and(|data| data.id == STRUGGLE_ID);
        if slot_pp == Some(0) || is_struggle {
            return Ok(MoveChoice::Struggle);
        }
        let data = MoveData::lookup(move_id)
            .ok_or_else(|| ProcessingFailure::UnknownMove(move_id.to_string()))?;

        let consumption = match &self.pp_consumer {
            Some(consumer) => consumer
                .consume_pp(&player.session_id, data.id)
                .await
                .best_effort("pp consumption"),
            None => None,
        };

        let slot = state
            .player_mut(role)
            .active_pokemon_mut()
            .and_then(|pokemon| pokemon.move_slot_mut(data.id));
        match (consumption, slot) {
            (Some(PpConsumption::Exhausted), slot) => {
                if let Some(slot) = slot {
                    slot.pp = 0;
                }
                Ok(MoveChoice::Struggle)
            }
            (Some(PpConsumption::Consumed { remaining }), Some(slot)) => {
                slot.pp = remaining.min(slot.max_pp);
                Ok(MoveChoice::Regular(data))
            }
            // No authoritative answer: track PP locally.
            (None, Some(slot)) => {
                slot.use_pp();
                Ok(MoveChoice::Regular(data))
            }
            (_, None) => Ok(MoveChoice::Regular(data)),
        }
    }

    fn damage_defender(
        state: &mut BattleGameState,
        defender_role: PlayerRole,
        damage: u16,
    ) -> Result<(u16, String, u16, bool), ProcessingFailure> {
        let defender = state
            .player_mut(defender_role)
            .active_pokemon_mut()
            .ok_or(ProcessingFailure::NoActivePokemon(defender_role))?;
        let dealt = defender.take_damage(damage);
        Ok((dealt, defender.name.clone(), defender.current_hp, defender.is_fainted()))
    }

    fn process_item(
        state: &mut BattleGameState,
        role: PlayerRole,
        item_id: &str,
    ) -> Result<ProcessedAction, ProcessingFailure> {
        let item = ItemData::lookup(item_id)
            .ok_or_else(|| ProcessingFailure::UnknownItem(item_id.to_string()))?;
        let mut result = ProcessedAction::new(role, ActionType::Item);
        result.messages.push(BattleEvent::ItemUsed {
            role,
            item: item.name.to_string(),
        });

        let pokemon = state
            .player_mut(role)
            .active_pokemon_mut()
            .ok_or(ProcessingFailure::NoActivePokemon(role))?;
        if pokemon.is_fainted() {
            return Ok(result);
        }

        let heal = match item.effect {
            ItemEffect::Heal(amount) => Some(amount),
            ItemEffect::HealToFull | ItemEffect::FullRestore => Some(pokemon.max_hp),
            ItemEffect::CureStatus => None,
        };
        if let Some(amount) = heal {
            let restored = pokemon.heal(amount);
            result.messages.push(BattleEvent::PokemonHealed {
                target: pokemon.name.clone(),
                amount: restored,
                new_hp: pokemon.current_hp,
            });
        }
        if matches!(item.effect, ItemEffect::CureStatus | ItemEffect::FullRestore)
            && pokemon.status.is_afflicted()
        {
            result.messages.push(BattleEvent::StatusCured {
                target: pokemon.name.clone(),
                status: pokemon.status,
            });
            pokemon.status = StatusType::None;
        }
        Ok(result)
    }
}
