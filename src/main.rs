//! battle-sim: plays one wild battle between two sample Pokemon and prints
//! the battle log.
//!
//! Usage: `battle-sim [config.ron]`. Without a config the battle runs with
//! every pacing delay removed and a fixed seed.

use pokemon_battle_engine::battle::action::BattleAction;
use pokemon_battle_engine::battle::engine::{BattleConfig, BattleEngine, SideConfig};
use pokemon_battle_engine::battle::events::EngineEvent;
use pokemon_battle_engine::battle::phase::BattlePhase;
use pokemon_battle_engine::pokemon::{CombatStats, MoveSlot, Pokemon};
use pokemon_battle_engine::session::BattleSession;
use pokemon_battle_engine::EngineConfig;
use schema::PokemonType;
use std::path::Path;

const PLAYER_ID: &str = "red";
const MAX_TURNS_SHOWN: u32 = 50;

fn sample(
    id: &str,
    name: &str,
    level: u8,
    types: Vec<PokemonType>,
    moves: &[&str],
    stats: CombatStats,
) -> Pokemon {
    let max_hp = 10 + level as u16 * 3;
    let mut pokemon = Pokemon::new(id, name, level, max_hp, stats);
    pokemon.types = types;
    pokemon.moves = moves.iter().map(|id| MoveSlot::new(id)).collect();
    pokemon
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(Path::new(&path))?,
        None => EngineConfig {
            rng_seed: Some(2024),
            ..EngineConfig::immediate()
        },
    };

    let charmander = sample(
        "red-charmander",
        "Charmander",
        12,
        vec![PokemonType::Fire],
        &["scratch", "ember", "growl"],
        CombatStats { attack: 26, defense: 22, special_attack: 30, special_defense: 25, speed: 32 },
    );
    let oddish = sample(
        "wild-oddish",
        "Oddish",
        10,
        vec![PokemonType::Grass, PokemonType::Poison],
        &["absorb", "poison_sting"],
        CombatStats { attack: 20, defense: 22, special_attack: 28, special_defense: 26, speed: 14 },
    );

    let (handle, task) = BattleSession::spawn(BattleEngine::new(config));
    let start = handle
        .start_battle(BattleConfig {
            battle_id: None,
            battle_type: "wild".to_string(),
            player1: SideConfig::new(PLAYER_ID, "Red", vec![charmander]),
            player2: SideConfig::new("wild", "Wild Oddish", vec![oddish]),
            switch_rules: None,
        })
        .await?;
    if let Some(err) = start.error {
        anyhow::bail!("battle did not start: {err}");
    }

    let mut events = handle.subscribe().await?;
    let mut turns = 0;
    loop {
        let Some(state) = handle.state().await? else {
            break;
        };
        if state.is_ended || turns >= MAX_TURNS_SHOWN {
            break;
        }
        if state.phase == BattlePhase::ActionSelection {
            let result = handle
                .submit_action(BattleAction::attack(PLAYER_ID, "ember"), None)
                .await?;
            if let Some(err) = result.error {
                log::warn!("action refused: {err}");
            }
            turns += 1;
        } else {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }

        while let Ok(event) = events.try_recv() {
            if let EngineEvent::BattleEvent(entry) = &event {
                if let Some(text) = entry.format(&state) {
                    println!("{text}");
                }
            }
            if let EngineEvent::BattleEnd { winner, reason } = event {
                println!("Battle over: {winner} wins ({reason}).");
            }
        }
    }

    handle.shutdown().await?;
    task.await?;
    Ok(())
}
