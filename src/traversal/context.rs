/// Per-item bookkeeping carried alongside every queued item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepContext {
    pub is_start_item: bool,
    pub is_branch_start_item: bool,
    /// Steps taken from the start item, which is step 0.
    pub step_number: usize,
    /// Number of forks between the start item and this item.
    pub branch_depth: usize,
    /// Set once the stop conditions have been evaluated for the item.
    pub is_stopping: bool,
    /// Whether stop conditions and step actions apply to the item.
    pub is_actionable_item: bool,
}

impl StepContext {
    pub fn start() -> Self {
        Self {
            is_start_item: true,
            is_branch_start_item: false,
            step_number: 0,
            branch_depth: 0,
            is_stopping: false,
            is_actionable_item: true,
        }
    }

    /// Context for an item queued one step after this one.
    pub fn next(&self) -> Self {
        Self {
            is_start_item: false,
            is_branch_start_item: false,
            step_number: self.step_number + 1,
            branch_depth: self.branch_depth,
            is_stopping: false,
            is_actionable_item: true,
        }
    }

    /// Marks the context as the first item of a new branch.
    pub fn branch_start(mut self) -> Self {
        self.is_branch_start_item = true;
        self.branch_depth += 1;
        self
    }
}

impl Default for StepContext {
    fn default() -> Self {
        Self::start()
    }
}
