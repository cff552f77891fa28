use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing upload and chat activity.
#[derive(Default)]
pub struct ChatMetrics {
    uploads_completed: AtomicU64,
    uploads_failed: AtomicU64,
    chats_answered: AtomicU64,
    chats_failed: AtomicU64,
}

impl ChatMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one upload.
    pub fn record_upload(&self, succeeded: bool) {
        let counter = if succeeded {
            &self.uploads_completed
        } else {
            &self.uploads_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one chat turn.
    pub fn record_chat(&self, succeeded: bool) {
        let counter = if succeeded {
            &self.chats_answered
        } else {
            &self.chats_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters alongside the live session count.
    pub fn snapshot(&self, sessions: usize) -> MetricsSnapshot {
        MetricsSnapshot {
            uploads_completed: self.uploads_completed.load(Ordering::Relaxed),
            uploads_failed: self.uploads_failed.load(Ordering::Relaxed),
            chats_answered: self.chats_answered.load(Ordering::Relaxed),
            chats_failed: self.chats_failed.load(Ordering::Relaxed),
            sessions,
        }
    }
}

/// Immutable view of activity counters used for reporting.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Uploads whose text is now available for chat.
    pub uploads_completed: u64,
    /// Uploads rejected by storage or extraction.
    pub uploads_failed: u64,
    /// Chat turns that produced an answer.
    pub chats_answered: u64,
    /// Chat turns that ended in an error.
    pub chats_failed: u64,
    /// Number of session identifiers currently holding document text.
    pub sessions: usize,
}
