//! # Traversal Engine
//!
//! Generic queue-driven walk over any item type. The caller supplies:
//! - a [`QueueNext`] producing successors
//! - step actions run on every visited item
//! - stop conditions that prevent expansion past an item
//! - queue conditions filtering what may be queued
//!
//! ## Algorithm
//!
//! 1. Unvisited start items are queued with a start context.
//! 2. Items are popped from the queue; items the tracker already knows are
//!    discarded, the rest are marked visited.
//! 3. Stop conditions are evaluated (all of them, no short-circuit) and the
//!    step actions run with the stopping flag set in the context.
//! 4. Unless stopping, successors that are unvisited and pass every queue
//!    condition are queued.
//!
//! ## Branching
//!
//! A branching traversal forks when an item has more than one accepted
//! successor. Each successor becomes a [`Branch`] holding a copy of the
//! tracker at the fork. Branches are kept on an explicit work-list and run
//! one after the other once the main queue drains, so deep networks do not
//! grow the call stack.

use super::conditions::{FilteredStepAction, StoppingFilter};
use super::{
    depth_first, priority_first, ActionGate, BasicTracker, FnQueueCondition, FnStepAction, FnStopCondition,
    QueueCondition, QueueFactory, QueueNext, SearchType, StepAction, StepContext, StopCondition, Tracker,
    TraversalQueue,
};
use crate::error::TracingError;
use anyhow::Result;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, trace};

/// Bounds every traversed item type must meet.
pub trait TraceItem: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> TraceItem for T {}

#[derive(Debug, Clone)]
pub struct QueueItem<T> {
    pub item: T,
    pub context: StepContext,
}

/// Pending branch: its first item and the tracker state at the fork.
pub struct Branch<T> {
    start: QueueItem<T>,
    tracker: Box<dyn Tracker<T>>,
}

impl<T> Branch<T> {
    pub fn start_item(&self) -> &T {
        &self.start.item
    }

    pub fn context(&self) -> &StepContext {
        &self.start.context
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    /// Items visited across the main run and every branch.
    pub steps: usize,
    /// Branches taken off the work-list.
    pub branches: usize,
}

type ItemQueue<T> = Box<dyn TraversalQueue<QueueItem<T>>>;
type BranchQueue<T> = Box<dyn TraversalQueue<Branch<T>>>;

struct Callbacks<T> {
    queue_next: Arc<dyn QueueNext<T>>,
    step_actions: Vec<Arc<dyn StepAction<T>>>,
    stop_conditions: Vec<Arc<dyn StopCondition<T>>>,
    queue_conditions: Vec<Arc<dyn QueueCondition<T>>>,
    action_gate: Option<Arc<dyn ActionGate<T>>>,
}

pub struct Traversal<T> {
    name: String,
    callbacks: Callbacks<T>,
    queue_factory: QueueFactory<QueueItem<T>>,
    branch_queue_factory: Option<QueueFactory<Branch<T>>>,
    tracker: Box<dyn Tracker<T>>,
    start_items: Vec<T>,
    has_run: bool,
    stats: TraversalStats,
}

impl<T: TraceItem + Hash + Eq> Traversal<T> {
    /// Depth-first traversal tracking visited items in a hash set.
    pub fn new(name: impl Into<String>, queue_next: impl QueueNext<T> + 'static) -> Self {
        Self::with_tracker(name, queue_next, BasicTracker::new())
    }
}

impl<T: TraceItem> Traversal<T> {
    pub fn with_tracker(
        name: impl Into<String>,
        queue_next: impl QueueNext<T> + 'static,
        tracker: impl Tracker<T> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            callbacks: Callbacks {
                queue_next: Arc::new(queue_next),
                step_actions: Vec::new(),
                stop_conditions: Vec::new(),
                queue_conditions: Vec::new(),
                action_gate: None,
            },
            queue_factory: depth_first(),
            branch_queue_factory: None,
            tracker: Box::new(tracker),
            start_items: Vec::new(),
            has_run: false,
            stats: TraversalStats::default(),
        }
    }

    pub fn with_search_type(mut self, search_type: SearchType) -> Self {
        self.queue_factory = search_type.queue_factory();
        self
    }

    /// Visits higher priority items first.
    pub fn with_priority<F>(mut self, priority: F) -> Self
    where
        F: Fn(&T) -> i64 + Send + Sync + 'static,
    {
        self.queue_factory = priority_first(move |queued: &QueueItem<T>| priority(&queued.item));
        self
    }

    /// Forks at every item with more than one accepted successor. Branches
    /// are processed last in, first out.
    pub fn branching(mut self) -> Self {
        self.branch_queue_factory = Some(depth_first());
        self
    }

    /// Like [`Self::branching`], with branches ordered by the priority of
    /// their first item.
    pub fn branching_with_priority<F>(mut self, priority: F) -> Self
    where
        F: Fn(&T) -> i64 + Send + Sync + 'static,
    {
        self.branch_queue_factory = Some(priority_first(move |branch: &Branch<T>| priority(branch.start_item())));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_branching(&self) -> bool {
        self.branch_queue_factory.is_some()
    }

    pub fn stats(&self) -> TraversalStats {
        self.stats
    }

    pub fn add_step_action(&mut self, action: impl StepAction<T> + 'static) -> &mut Self {
        self.callbacks.step_actions.push(Arc::new(action));
        self
    }

    pub fn add_step_fn<F>(&mut self, action: F) -> &mut Self
    where
        F: Fn(&T, &StepContext) -> Result<()> + Send + Sync + 'static,
    {
        self.add_step_action(FnStepAction::new(action))
    }

    /// Step action that only runs on items where the traversal stops.
    pub fn if_stopping(&mut self, action: impl StepAction<T> + 'static) -> &mut Self {
        self.add_step_action(FilteredStepAction {
            inner: Arc::new(action),
            filter: StoppingFilter::Stopping,
        })
    }

    pub fn if_not_stopping(&mut self, action: impl StepAction<T> + 'static) -> &mut Self {
        self.add_step_action(FilteredStepAction {
            inner: Arc::new(action),
            filter: StoppingFilter::NotStopping,
        })
    }

    pub fn add_stop_condition(&mut self, condition: impl StopCondition<T> + 'static) -> &mut Self {
        self.callbacks.stop_conditions.push(Arc::new(condition));
        self
    }

    pub fn add_stop_fn<F>(&mut self, condition: F) -> &mut Self
    where
        F: Fn(&T, &StepContext) -> bool + Send + Sync + 'static,
    {
        self.add_stop_condition(FnStopCondition::new(condition))
    }

    pub fn add_queue_condition(&mut self, condition: impl QueueCondition<T> + 'static) -> &mut Self {
        self.callbacks.queue_conditions.push(Arc::new(condition));
        self
    }

    pub fn add_queue_fn<F>(&mut self, condition: F) -> &mut Self
    where
        F: Fn(&T, &StepContext, &T, &StepContext) -> bool + Send + Sync + 'static,
    {
        self.add_queue_condition(FnQueueCondition::new(condition))
    }

    pub fn set_action_gate(&mut self, gate: impl ActionGate<T> + 'static) -> &mut Self {
        self.callbacks.action_gate = Some(Arc::new(gate));
        self
    }

    pub fn add_start_item(&mut self, item: T) -> &mut Self {
        self.start_items.push(item);
        self
    }

    pub fn has_visited(&self, item: &T) -> bool {
        self.tracker.has_visited(item)
    }

    /// Clears the tracker and pending start items so the traversal can run
    /// again. Registered callbacks are kept.
    pub fn reset(&mut self) -> &mut Self {
        self.tracker.clear();
        self.start_items.clear();
        self.has_run = false;
        self.stats = TraversalStats::default();
        self
    }

    pub async fn run_from<I>(&mut self, items: I, can_stop_on_start_item: bool) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        self.start_items.extend(items);
        self.run(can_stop_on_start_item).await
    }

    pub async fn run(&mut self, can_stop_on_start_item: bool) -> Result<()> {
        if self.has_run {
            return Err(TracingError::NotReset(self.name.clone()).into());
        }
        self.has_run = true;

        let start_items = std::mem::take(&mut self.start_items);
        debug!(trace = %self.name, start_items = start_items.len(), branching = self.is_branching(), "traversal starting");

        let mut queue: ItemQueue<T> = (self.queue_factory)();
        let mut branches: Option<BranchQueue<T>> = self.branch_queue_factory.as_ref().map(|factory| factory());
        let split_start_items = branches.is_some() && start_items.len() > 1;

        for item in start_items {
            if self.tracker.has_visited(&item) || !self.callbacks.can_queue_start_item(&item) {
                continue;
            }
            let start = QueueItem {
                item,
                context: StepContext::start(),
            };
            match branches.as_mut() {
                Some(branch_queue) if split_start_items => branch_queue.put(Branch {
                    start,
                    tracker: self.tracker.copy(),
                }),
                _ => queue.put(start),
            }
        }

        let mut stats = TraversalStats::default();
        let result = self
            .run_queues(&mut queue, &mut branches, can_stop_on_start_item, &mut stats)
            .await;
        self.stats = stats;

        match &result {
            Ok(()) => debug!(trace = %self.name, steps = stats.steps, branches = stats.branches, "traversal complete"),
            Err(err) => debug!(trace = %self.name, steps = stats.steps, error = %err, "traversal failed"),
        }
        result
    }

    async fn run_queues(
        &mut self,
        queue: &mut ItemQueue<T>,
        branches: &mut Option<BranchQueue<T>>,
        can_stop_on_start_item: bool,
        stats: &mut TraversalStats,
    ) -> Result<()> {
        self.callbacks
            .traverse(queue, &mut self.tracker, branches, can_stop_on_start_item, stats)
            .await?;

        while let Some(branch) = branches.as_mut().and_then(|branch_queue| branch_queue.get()) {
            stats.branches += 1;
            let Branch { start, mut tracker } = branch;
            trace!(trace = %self.name, depth = start.context.branch_depth, "starting branch");

            let mut branch_items: ItemQueue<T> = (self.queue_factory)();
            branch_items.put(start);
            self.callbacks
                .traverse(&mut branch_items, &mut tracker, branches, can_stop_on_start_item, stats)
                .await?;
        }
        Ok(())
    }
}

impl<T: TraceItem> Callbacks<T> {
    async fn traverse(
        &self,
        queue: &mut ItemQueue<T>,
        tracker: &mut Box<dyn Tracker<T>>,
        branches: &mut Option<BranchQueue<T>>,
        can_stop_on_start_item: bool,
        stats: &mut TraversalStats,
    ) -> Result<()> {
        while let Some(QueueItem { item, mut context }) = queue.get() {
            if !tracker.visit(&item) {
                continue;
            }
            stats.steps += 1;

            context.is_actionable_item = self.can_action(&item, &context);
            if context.is_actionable_item {
                if can_stop_on_start_item || !context.is_start_item {
                    context.is_stopping = self.matches_any_stop_condition(&item, &context);
                }
                for action in &self.step_actions {
                    action.apply(&item, &context).await?;
                }
            }

            if !context.is_stopping {
                self.queue_next(&item, &context, queue, &**tracker, branches).await?;
            }
        }
        Ok(())
    }

    async fn queue_next(
        &self,
        item: &T,
        context: &StepContext,
        queue: &mut ItemQueue<T>,
        tracker: &dyn Tracker<T>,
        branches: &mut Option<BranchQueue<T>>,
    ) -> Result<()> {
        let next_context = context.next();
        let accepted: Vec<T> = self
            .queue_next
            .next_items(item, context)
            .await?
            .into_iter()
            .filter(|next| !tracker.has_visited(next) && self.can_queue(next, &next_context, item, context))
            .collect();

        if let Some(branch_queue) = branches.as_mut() {
            if accepted.len() > 1 && self.queue_next.should_branch(item, &accepted) {
                let branch_context = next_context.branch_start();
                for next in accepted {
                    branch_queue.put(Branch {
                        start: QueueItem {
                            item: next,
                            context: branch_context,
                        },
                        tracker: tracker.copy(),
                    });
                }
                return Ok(());
            }
        }

        queue.extend(
            accepted
                .into_iter()
                .map(|next| QueueItem {
                    item: next,
                    context: next_context,
                })
                .collect(),
        );
        Ok(())
    }

    fn can_action(&self, item: &T, context: &StepContext) -> bool {
        self.action_gate
            .as_ref()
            .map_or(true, |gate| gate.can_action(item, context))
    }

    fn matches_any_stop_condition(&self, item: &T, context: &StepContext) -> bool {
        self.stop_conditions
            .iter()
            .fold(false, |stop, condition| condition.should_stop(item, context) | stop)
    }

    fn can_queue(&self, next: &T, next_context: &StepContext, current: &T, current_context: &StepContext) -> bool {
        self.queue_conditions
            .iter()
            .all(|condition| condition.should_queue(next, next_context, current, current_context))
    }

    fn can_queue_start_item(&self, item: &T) -> bool {
        self.queue_conditions
            .iter()
            .all(|condition| condition.should_queue_start_item(item))
    }
}
