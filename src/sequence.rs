use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestTicket(u64);

/// Last-request-wins guard for one UI surface: results of superseded requests are dropped.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> RequestTicket {
        RequestTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_latest(&self, ticket: RequestTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Runs `work` under a fresh ticket; `None` if another request was issued before it finished.
    pub async fn latest<F, T>(&self, work: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let ticket = self.issue();
        let output = work.await;
        self.is_latest(ticket).then_some(output)
    }
}
