//! Recycles battle engines between battles.

use crate::battle::engine::BattleEngine;
use crate::config::EngineConfig;
use std::sync::{Mutex, MutexGuard};

/// A bounded stack of idle engines sharing one config. Engines are always
/// reset before they are stored, so an acquired engine never carries a
/// previous battle's timers, listeners or state.
#[derive(Debug)]
pub struct EnginePool {
    config: EngineConfig,
    max_idle: usize,
    idle: Mutex<Vec<BattleEngine>>,
}

impl EnginePool {
    pub fn new(config: EngineConfig, max_idle: usize) -> Self {
        Self {
            config,
            max_idle,
            idle: Mutex::new(Vec::new()),
        }
    }

    fn idle(&self) -> MutexGuard<'_, Vec<BattleEngine>> {
        // Stored engines are already reset, so a poisoned lock is still usable.
        self.idle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn acquire(&self) -> BattleEngine {
        match self.idle().pop() {
            Some(engine) => engine,
            None => {
                log::debug!("engine pool empty, creating a new engine");
                BattleEngine::new(self.config.clone())
            }
        }
    }

    pub fn release(&self, mut engine: BattleEngine) {
        engine.reset();
        let mut idle = self.idle();
        if idle.len() < self.max_idle {
            idle.push(engine);
        }
    }

    pub fn idle_count(&self) -> usize {
        self.idle().len()
    }
}
