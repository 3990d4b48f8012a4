pub mod conditions;
pub mod context;
pub mod queue;
pub mod tracker;
#[allow(clippy::module_inception)]
pub mod traversal;

pub use conditions::{
    ActionGate, FnQueueCondition, FnQueueNext, FnStepAction, FnStopCondition, QueueCondition, QueueNext, StepAction,
    StopCondition,
};
pub use context::*;
pub use queue::*;
pub use tracker::*;
pub use traversal::*;
