//! Generation counter for detecting superseded ingestions.
//!
//! Every ingestion request takes a [`Generation`] ticket. Starting a newer
//! request bumps the shared counter, and an in-flight ingestion holding an
//! older ticket abandons its remaining batches at the next batch boundary.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared, monotonically increasing request counter.
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter {
    current: Arc<AtomicU64>,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding every older ticket.
    pub fn begin(&self) -> Generation {
        let value = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        Generation {
            value,
            counter: self.clone(),
        }
    }

    /// Ticket for follow-up work on the current request.
    ///
    /// Does not bump the counter, so it supersedes nothing, but the next
    /// `begin` still supersedes it.
    pub fn join(&self) -> Generation {
        Generation {
            value: self.current(),
            counter: self.clone(),
        }
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }
}

/// Ticket for one ingestion request.
#[derive(Debug, Clone)]
pub struct Generation {
    value: u64,
    counter: GenerationCounter,
}

impl Generation {
    pub fn value(&self) -> u64 {
        self.value
    }

    /// False once a newer request has begun.
    pub fn is_current(&self) -> bool {
        self.counter.current() == self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_ticket_supersedes_older() {
        let counter = GenerationCounter::new();
        let first = counter.begin();
        assert!(first.is_current());

        let second = counter.begin();
        assert!(!first.is_current());
        assert!(second.is_current());
        assert!(second.value() > first.value());
    }

    #[test]
    fn test_joined_ticket_supersedes_nothing() {
        let counter = GenerationCounter::new();
        let pending = counter.begin();
        let follow_up = counter.join();

        assert!(pending.is_current());
        assert!(follow_up.is_current());
        assert_eq!(follow_up.value(), pending.value());

        counter.begin();
        assert!(!follow_up.is_current());
    }

    #[test]
    fn test_clones_share_the_counter() {
        let counter = GenerationCounter::new();
        let ticket = counter.begin();
        counter.clone().begin();
        assert!(!ticket.is_current());
        assert_eq!(counter.current(), 2);
    }
}
