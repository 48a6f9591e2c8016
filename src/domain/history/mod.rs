//! Rolling log of recent queries used as follow-up context

use std::collections::VecDeque;
use std::fmt::Display;

/// Message returned when a follow-up arrives before any query was recorded
pub const NO_CONTEXT_MESSAGE: &str =
    "No context available for follow-up. Please ask a main query first.";

/// Bounded FIFO of raw queries; the oldest is dropped once full
#[derive(Debug, Clone)]
pub struct QueryHistory<K> {
    queries: VecDeque<K>,
    max_size: usize,
}

impl<K> QueryHistory<K> {
    /// Create an empty history holding at most `max_size` queries
    pub fn new(max_size: usize) -> Self {
        Self {
            queries: VecDeque::new(),
            max_size,
        }
    }

    /// Record a query, dropping the oldest if the history is full
    pub fn record(&mut self, query: K) {
        if self.max_size == 0 {
            return;
        }

        if self.queries.len() == self.max_size {
            self.queries.pop_front();
        }

        self.queries.push_back(query);
    }

    /// Recorded queries, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.queries.iter()
    }

    /// Maximum number of retained queries
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Number of recorded queries
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Forget all recorded queries
    pub fn clear(&mut self) {
        self.queries.clear();
    }
}

impl<K: Display> QueryHistory<K> {
    /// Summary sentence listing the recorded queries, if any
    pub fn summary(&self) -> Option<String> {
        if self.queries.is_empty() {
            return None;
        }

        let joined = self
            .queries
            .iter()
            .map(|q| q.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        Some(format!("In your previous queries, you asked about: {}.", joined))
    }

    /// Answer a follow-up question with the recorded context
    pub fn follow_up(&self, follow_up: &str) -> String {
        match self.summary() {
            Some(summary) => format!("Follow-Up Response: {}\n{}", follow_up, summary),
            None => NO_CONTEXT_MESSAGE.to_string(),
        }
    }
}
