pub mod action;
pub mod action_queue;
pub mod ai;
pub mod catch;
pub mod end;
pub mod engine;
pub mod events;
pub mod ko;
pub mod phase;
pub mod processor;
pub mod rewards;
pub mod speed;
pub mod state;
pub mod switch;
pub mod timers;

#[cfg(test)]
pub(crate) mod tests;
