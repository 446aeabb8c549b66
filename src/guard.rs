//! Stale-response guard.
//!
//! An async fetch takes a [`Ticket`] when it starts. Any later call to
//! [`Generation::advance`] (the user or story changed, a newer fetch began)
//! invalidates older tickets, and their results are dropped instead of
//! applied. In-flight requests are not aborted, only their effect.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counter identifying the current fetch context.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    current: Arc<AtomicU64>,
}

/// Snapshot of a [`Generation`] taken when a fetch started.
#[derive(Debug, Clone)]
pub struct Ticket {
    issued: u64,
    current: Arc<AtomicU64>,
}

impl Generation {
    /// New counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new context, invalidating all outstanding tickets.
    pub fn advance(&self) -> Ticket {
        let issued = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        Ticket {
            issued,
            current: self.current.clone(),
        }
    }

    /// Ticket for the current context, without invalidating anything.
    pub fn ticket(&self) -> Ticket {
        Ticket {
            issued: self.current.load(Ordering::SeqCst),
            current: self.current.clone(),
        }
    }
}

impl Ticket {
    /// Whether no newer context has started since this ticket was issued.
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_invalidates_older_tickets() {
        let generation = Generation::new();
        let first = generation.advance();
        let shared = generation.ticket();
        assert!(first.is_current());
        assert!(shared.is_current());

        let second = generation.advance();
        assert!(!first.is_current());
        assert!(!shared.is_current());
        assert!(second.is_current());
    }
}
