//! Generation tickets for last-writer-wins ordering of async results.

use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one dispatched operation within its class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Issues monotonically increasing tickets for one operation class.
///
/// An operation takes a ticket when it starts; when it completes, its result
/// may be applied only if [`Sequencer::is_latest`] still holds.
#[derive(Debug, Default)]
pub struct Sequencer {
    latest: AtomicU64,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_latest(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}
