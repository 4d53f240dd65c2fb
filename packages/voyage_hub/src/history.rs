//! Bounded window of recent broadcasts per room.
//!
//! Frames are stored already serialized so a late joiner receives exactly the
//! bytes the other members saw.

use std::collections::VecDeque;
use std::sync::Arc;

pub(crate) struct RecentHistory {
    frames: VecDeque<Arc<str>>,
    limit: usize,
}

impl RecentHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            frames: VecDeque::with_capacity(limit),
            limit,
        }
    }

    /// Record a frame, evicting the oldest once the window is full.
    /// A zero limit disables recording.
    pub fn push(&mut self, frame: Arc<str>) {
        if self.limit == 0 {
            return;
        }
        while self.frames.len() >= self.limit {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
    }

    /// Oldest-first copy of the window.
    pub fn snapshot(&self) -> Vec<Arc<str>> {
        self.frames.iter().cloned().collect()
    }
}
