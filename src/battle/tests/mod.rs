pub mod common;


#[cfg(test)]
mod test_trainer_battle;

#[cfg(test)]
mod test_catch;
