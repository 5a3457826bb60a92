//! Transient status line.
//!
//! Results of user actions are posted here and disappear on their own after
//! [`STATUS_TTL`]. Expiry is evaluated lazily against the caller's clock.

use std::time::{Duration, Instant};

/// How long a status message stays visible.
pub const STATUS_TTL: Duration = Duration::from_secs(5);

/// Tone of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// A message on the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
    pub posted_at: Instant,
}

/// Holds the latest status message until it expires.
#[derive(Debug, Clone)]
pub struct StatusBoard {
    current: Option<StatusMessage>,
    ttl: Duration,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::with_ttl(STATUS_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self { current: None, ttl }
    }

    /// Post a message, replacing any previous one.
    pub fn post(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.post_at(kind, text, Instant::now());
    }

    pub fn post_at(&mut self, kind: StatusKind, text: impl Into<String>, now: Instant) {
        self.current = Some(StatusMessage {
            kind,
            text: text.into(),
            posted_at: now,
        });
    }

    /// The visible message, if it has not expired.
    pub fn current(&self) -> Option<&StatusMessage> {
        self.current_at(Instant::now())
    }

    pub fn current_at(&self, now: Instant) -> Option<&StatusMessage> {
        self.current
            .as_ref()
            .filter(|m| now.saturating_duration_since(m.posted_at) < self.ttl)
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
