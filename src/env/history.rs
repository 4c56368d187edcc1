use std::collections::VecDeque;

use crate::types::Position;

/// Sliding window of recent agent positions.
#[derive(Debug, Clone)]
pub struct LoopDetector {
    window: usize,
    threshold: usize,
    recent: VecDeque<Position>,
}

impl LoopDetector {
    pub fn new(window: usize, threshold: usize) -> Self {
        Self {
            window,
            threshold,
            recent: VecDeque::with_capacity(window),
        }
    }

    /// Record `pos` and report whether it now occurs `threshold` times in the window.
    pub fn record(&mut self, pos: Position) -> bool {
        if self.recent.len() == self.window {
            self.recent.pop_front();
        }
        self.recent.push_back(pos);
        self.recent.iter().filter(|&&p| p == pos).count() >= self.threshold
    }

    pub fn clear(&mut self) {
        self.recent.clear();
    }
}
