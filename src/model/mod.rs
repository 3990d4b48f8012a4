pub mod connectivity_node;
pub mod equipment;
pub mod feeder;
pub mod network;
pub mod terminal;

pub use connectivity_node::*;
pub use equipment::*;
pub use feeder::*;
pub use network::*;
pub use terminal::*;
