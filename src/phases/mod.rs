pub mod direction;
pub mod phase_code;
pub mod phase_status;
pub mod remove_phases;
pub mod set_phases;
pub mod single_phase_kind;
pub mod traced_phases;

pub use direction::*;
pub use phase_code::*;
pub use phase_status::*;
pub use remove_phases::*;
pub use set_phases::*;
pub use single_phase_kind::*;
pub use traced_phases::*;
