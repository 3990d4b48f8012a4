use super::StepContext;
use anyhow::Result;
use async_trait::async_trait;

/// Work performed on every visited item.
#[async_trait]
pub trait StepAction<T>: Send + Sync {
    async fn apply(&self, item: &T, context: &StepContext) -> Result<()>;
}

/// Decides whether the traversal stops expanding past an item. The item
/// itself is still actioned.
pub trait StopCondition<T>: Send + Sync {
    fn should_stop(&self, item: &T, context: &StepContext) -> bool;
}

/// Decides whether a candidate item may enter the queue.
pub trait QueueCondition<T>: Send + Sync {
    fn should_queue(&self, next: &T, next_context: &StepContext, current: &T, current_context: &StepContext) -> bool;

    fn should_queue_start_item(&self, _item: &T) -> bool {
        true
    }
}

/// Produces the successors of an item.
#[async_trait]
pub trait QueueNext<T>: Send + Sync {
    async fn next_items(&self, item: &T, context: &StepContext) -> Result<Vec<T>>;

    /// Consulted by branching traversals once the successors have passed
    /// the queue conditions and tracker.
    fn should_branch(&self, _item: &T, next: &[T]) -> bool {
        next.len() > 1
    }
}

/// Decides whether stop conditions and step actions apply to an item. Items
/// that fail the gate are still expanded.
pub trait ActionGate<T>: Send + Sync {
    fn can_action(&self, item: &T, context: &StepContext) -> bool;
}

pub struct FnStepAction<F>(F);

impl<F> FnStepAction<F> {
    pub fn new<T>(f: F) -> Self
    where
        F: Fn(&T, &StepContext) -> Result<()> + Send + Sync,
    {
        Self(f)
    }
}

#[async_trait]
impl<T, F> StepAction<T> for FnStepAction<F>
where
    T: Send + Sync,
    F: Fn(&T, &StepContext) -> Result<()> + Send + Sync,
{
    async fn apply(&self, item: &T, context: &StepContext) -> Result<()> {
        (self.0)(item, context)
    }
}

pub struct FnStopCondition<F>(F);

impl<F> FnStopCondition<F> {
    pub fn new<T>(f: F) -> Self
    where
        F: Fn(&T, &StepContext) -> bool + Send + Sync,
    {
        Self(f)
    }
}

impl<T, F> StopCondition<T> for FnStopCondition<F>
where
    F: Fn(&T, &StepContext) -> bool + Send + Sync,
{
    fn should_stop(&self, item: &T, context: &StepContext) -> bool {
        (self.0)(item, context)
    }
}

pub struct FnQueueCondition<F>(F);

impl<F> FnQueueCondition<F> {
    pub fn new<T>(f: F) -> Self
    where
        F: Fn(&T, &StepContext, &T, &StepContext) -> bool + Send + Sync,
    {
        Self(f)
    }
}

impl<T, F> QueueCondition<T> for FnQueueCondition<F>
where
    F: Fn(&T, &StepContext, &T, &StepContext) -> bool + Send + Sync,
{
    fn should_queue(&self, next: &T, next_context: &StepContext, current: &T, current_context: &StepContext) -> bool {
        (self.0)(next, next_context, current, current_context)
    }
}

pub struct FnQueueNext<F>(F);

impl<F> FnQueueNext<F> {
    pub fn new<T>(f: F) -> Self
    where
        F: Fn(&T, &StepContext) -> Result<Vec<T>> + Send + Sync,
    {
        Self(f)
    }
}

#[async_trait]
impl<T, F> QueueNext<T> for FnQueueNext<F>
where
    T: Send + Sync,
    F: Fn(&T, &StepContext) -> Result<Vec<T>> + Send + Sync,
{
    async fn next_items(&self, item: &T, context: &StepContext) -> Result<Vec<T>> {
        (self.0)(item, context)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StoppingFilter {
    Stopping,
    NotStopping,
}

/// Runs the inner action only for stopping, or only for non-stopping, items.
pub(crate) struct FilteredStepAction<T> {
    pub(crate) inner: std::sync::Arc<dyn StepAction<T>>,
    pub(crate) filter: StoppingFilter,
}

#[async_trait]
impl<T: Send + Sync> StepAction<T> for FilteredStepAction<T> {
    async fn apply(&self, item: &T, context: &StepContext) -> Result<()> {
        let wanted = match self.filter {
            StoppingFilter::Stopping => context.is_stopping,
            StoppingFilter::NotStopping => !context.is_stopping,
        };
        if wanted {
            self.inner.apply(item, context).await
        } else {
            Ok(())
        }
    }
}
