pub mod limited_trace;
pub mod positions;

pub use limited_trace::*;
pub use positions::*;
