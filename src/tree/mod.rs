pub mod downstream_tree;

pub use downstream_tree::*;
