/// Counts items written or processed since the last checkpoint
///
/// Both the page crawl and the reachability checker own one of these on their
/// orchestrating loop. The counter is reset after every checkpoint call that
/// returns, whether git recorded a commit or found nothing to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointCounter {
    /// Items since the last checkpoint
    pending: usize,

    /// Items that make a checkpoint due
    interval: usize,
}

impl CheckpointCounter {
    /// Creates a counter that becomes due every `interval` items
    pub fn new(interval: usize) -> Self {
        Self {
            pending: 0,
            interval: interval.max(1),
        }
    }

    /// Adds `count` items and returns the new pending total
    pub fn record(&mut self, count: usize) -> usize {
        self.pending += count;
        self.pending
    }

    /// Whether enough items have accumulated for a checkpoint
    pub fn is_due(&self) -> bool {
        self.pending >= self.interval
    }

    /// Whether anything is left for a final checkpoint
    pub fn has_pending(&self) -> bool {
        self.pending > 0
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn interval(&self) -> usize {
        self.interval
    }

    /// Clears the pending count after a checkpoint
    pub fn reset(&mut self) {
        self.pending = 0;
    }
}
