/// Snapshot reported after every settled load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub completed: usize,
    pub total: usize,
    /// True only on the update that first reached `total`.
    pub became_ready: bool,
}

/// Count of settled load attempts out of a fixed total.
///
/// Successes and failures count the same. The counter never decreases and
/// `ready` flips to true exactly once; an empty manifest is ready from the
/// start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadProgress {
    completed: usize,
    total: usize,
    ready: bool,
}

impl LoadProgress {
    pub fn new(total: usize) -> Self {
        Self {
            completed: 0,
            total,
            ready: total == 0,
        }
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Share of settled loads in `0.0..=1.0`.
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f32 / self.total as f32
        }
    }

    /// Counts one more settled load.
    pub fn record_completion(&mut self) -> ProgressUpdate {
        self.advance_to(self.completed.saturating_add(1))
    }

    /// Moves the counter forward to `completed`; lower values are ignored and
    /// values past `total` saturate.
    pub fn advance_to(&mut self, completed: usize) -> ProgressUpdate {
        let target = completed.min(self.total);
        if target > self.completed {
            self.completed = target;
        }
        let became_ready = !self.ready && self.completed == self.total;
        if became_ready {
            self.ready = true;
        }
        ProgressUpdate {
            completed: self.completed,
            total: self.total,
            became_ready,
        }
    }
}
