use std::collections::HashSet;
use std::hash::Hash;

/// Records which items a traversal has already visited.
pub trait Tracker<T>: Send + Sync {
    fn has_visited(&self, item: &T) -> bool;

    /// Marks the item visited. Returns `true` only the first time.
    fn visit(&mut self, item: &T) -> bool;

    fn clear(&mut self);

    /// Independent duplicate holding the same visited items. Later visits to
    /// either tracker are not seen by the other.
    fn copy(&self) -> Box<dyn Tracker<T>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Hash set tracker. Each instance owns its own set.
#[derive(Debug, Clone)]
pub struct BasicTracker<T> {
    visited: HashSet<T>,
}

impl<T> BasicTracker<T> {
    pub fn new() -> Self {
        Self { visited: HashSet::new() }
    }
}

impl<T> Default for BasicTracker<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Tracker<T> for BasicTracker<T>
where
    T: Hash + Eq + Clone + Send + Sync + 'static,
{
    fn has_visited(&self, item: &T) -> bool {
        self.visited.contains(item)
    }

    fn visit(&mut self, item: &T) -> bool {
        if self.visited.contains(item) {
            return false;
        }
        self.visited.insert(item.clone())
    }

    fn clear(&mut self) {
        self.visited.clear();
    }

    fn copy(&self) -> Box<dyn Tracker<T>> {
        Box::new(self.clone())
    }

    fn len(&self) -> usize {
        self.visited.len()
    }
}
