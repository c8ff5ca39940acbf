//! LRU Tracker Module
//!
//! Recency order for the in-memory backend's capacity eviction.

use std::collections::VecDeque;

// == LRU Tracker ==
/// Keys ordered by last write or read; front is most recent.
#[derive(Debug, Default)]
pub struct LruTracker {
    order: VecDeque<String>,
}

impl LruTracker {
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Moves `key` to the most-recent end, inserting it if unseen.
    pub fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(existing) = self.order.remove(pos) {
                self.order.push_front(existing);
            }
        } else {
            self.order.push_front(key.to_string());
        }
    }

    /// Stops tracking `key`.
    pub fn remove(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    /// Pops the least recently used key.
    pub fn evict_oldest(&mut self) -> Option<String> {
        self.order.pop_back()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[cfg(test)]
    fn oldest(&self) -> Option<&str> {
        self.order.back().map(String::as_str)
    }
}
