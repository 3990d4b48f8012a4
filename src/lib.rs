pub mod config;
pub mod error;
pub mod feeder;
pub mod model;
pub mod network_trace;
pub mod phases;
pub mod telemetry;
pub mod traversal;
pub mod tree;
pub mod util;

pub use error::{PhaseError, TracingError, TracingResult};
