pub mod conditions;
pub mod path_provider;
pub mod state_operators;
pub mod step;
pub mod trace;
pub mod tracker;

pub use conditions::*;
pub use path_provider::*;
pub use state_operators::*;
pub use step::*;
pub use trace::*;
pub use tracker::*;
