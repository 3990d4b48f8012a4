//! # Traversal Queues
//!
//! The queue decides the order in which pending items are visited:
//! - [`LifoQueue`]: last in, first out (depth first)
//! - [`FifoQueue`]: first in, first out (breadth first)
//! - [`PriorityQueue`]: highest priority first, insertion order among equals

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::sync::Arc;
use strum_macros::{Display, EnumString};

pub trait TraversalQueue<T>: Send {
    fn get(&mut self) -> Option<T>;

    fn put(&mut self, item: T);

    fn peek(&self) -> Option<&T>;

    fn clear(&mut self);

    fn len(&self) -> usize;

    fn has_next(&self) -> bool {
        self.len() > 0
    }

    fn is_empty(&self) -> bool {
        !self.has_next()
    }

    fn extend(&mut self, items: Vec<T>) {
        for item in items {
            self.put(item);
        }
    }
}

/// Produces a fresh, empty queue. Branches use it to get their own queue.
pub type QueueFactory<T> = Arc<dyn Fn() -> Box<dyn TraversalQueue<T>> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    #[default]
    Depth,
    Breadth,
}

impl SearchType {
    pub fn queue_factory<T: Send + 'static>(self) -> QueueFactory<T> {
        match self {
            Self::Depth => depth_first(),
            Self::Breadth => breadth_first(),
        }
    }
}

pub fn depth_first<T: Send + 'static>() -> QueueFactory<T> {
    Arc::new(|| Box::new(LifoQueue::new()))
}

pub fn breadth_first<T: Send + 'static>() -> QueueFactory<T> {
    Arc::new(|| Box::new(FifoQueue::new()))
}

pub fn priority_first<T, F>(priority: F) -> QueueFactory<T>
where
    T: Send + 'static,
    F: Fn(&T) -> i64 + Send + Sync + 'static,
{
    let priority: PriorityFn<T> = Arc::new(priority);
    Arc::new(move || Box::new(PriorityQueue::with_priority_fn(priority.clone())))
}

#[derive(Debug)]
pub struct LifoQueue<T> {
    items: Vec<T>,
}

impl<T> LifoQueue<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Default for LifoQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> TraversalQueue<T> for LifoQueue<T> {
    fn get(&mut self) -> Option<T> {
        self.items.pop()
    }

    fn put(&mut self, item: T) {
        self.items.push(item);
    }

    fn peek(&self) -> Option<&T> {
        self.items.last()
    }

    fn clear(&mut self) {
        self.items.clear();
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

#[derive(Debug)]
pub struct FifoQueue<T> {
    items: VecDeque<T>,
}

impl<T> FifoQueue<T> {
    pub fn new() -> Self {
        Self { items: VecDeque::new() }
    }
}

impl<T> Default for FifoQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> TraversalQueue<T> for FifoQueue<T> {
    fn get(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    fn put(&mut self, item: T) {
        self.items.push_back(item);
    }

    fn peek(&self) -> Option<&T> {
        self.items.front()
    }

    fn clear(&mut self) {
        self.items.clear();
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

type PriorityFn<T> = Arc<dyn Fn(&T) -> i64 + Send + Sync>;

struct Prioritised<T> {
    priority: i64,
    sequence: u64,
    item: T,
}

impl<T> PartialEq for Prioritised<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Prioritised<T> {}

impl<T> PartialOrd for Prioritised<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Prioritised<T> {
    // Max-heap: higher priority wins, then the earlier insertion.
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

pub struct PriorityQueue<T> {
    heap: BinaryHeap<Prioritised<T>>,
    priority: PriorityFn<T>,
    sequence: u64,
}

impl<T> PriorityQueue<T> {
    pub fn new<F>(priority: F) -> Self
    where
        F: Fn(&T) -> i64 + Send + Sync + 'static,
    {
        Self::with_priority_fn(Arc::new(priority))
    }

    fn with_priority_fn(priority: PriorityFn<T>) -> Self {
        Self {
            heap: BinaryHeap::new(),
            priority,
            sequence: 0,
        }
    }
}

impl<T: Send> TraversalQueue<T> for PriorityQueue<T> {
    fn get(&mut self) -> Option<T> {
        self.heap.pop().map(|p| p.item)
    }

    fn put(&mut self, item: T) {
        let priority = (self.priority)(&item);
        self.sequence += 1;
        self.heap.push(Prioritised {
            priority,
            sequence: self.sequence,
            item,
        });
    }

    fn peek(&self) -> Option<&T> {
        self.heap.peek().map(|p| &p.item)
    }

    fn clear(&mut self) {
        self.heap.clear();
    }

    fn len(&self) -> usize {
        self.heap.len()
    }
}
