pub mod calculation;
pub mod manager;
pub mod validation;

pub use calculation::*;
pub use manager::*;
pub use validation::*;
