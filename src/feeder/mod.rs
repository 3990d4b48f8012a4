pub mod assign_to_feeders;

pub use assign_to_feeders::*;
