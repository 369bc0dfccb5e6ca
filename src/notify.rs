// src/notify.rs
use log::{info, warn};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::errors::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    raised_at: Instant,
}

impl Notification {
    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.raised_at) >= ttl
    }
}

/// Transient toasts. Each controller owns one; nothing is global.
#[derive(Debug)]
pub struct Notifier {
    ttl: Duration,
    next_id: u64,
    queue: VecDeque<Notification>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(crate::config::NOTIFICATION_TTL)
    }
}

impl Notifier {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            next_id: 0,
            queue: VecDeque::new(),
        }
    }

    pub fn push(&mut self, message: impl Into<String>, severity: Severity) -> u64 {
        self.push_at(message, severity, Instant::now())
    }

    pub fn push_at(&mut self, message: impl Into<String>, severity: Severity, now: Instant) -> u64 {
        let message = message.into();
        let ttl = self.ttl;
        self.queue.retain(|n| !n.is_expired(now, ttl));
        match severity {
            Severity::Error | Severity::Warning => warn!("{}", message),
            _ => info!("{}", message),
        }
        self.next_id += 1;
        self.queue.push_back(Notification {
            id: self.next_id,
            message,
            severity,
            raised_at: now,
        });
        self.next_id
    }

    pub fn success(&mut self, message: impl Into<String>) -> u64 {
        self.push(message, Severity::Success)
    }

    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.push(message, Severity::Error)
    }

    /// Error toast carrying the backend's message, or `fallback` when there is none.
    pub fn failure(&mut self, err: &ClientError, fallback: &str) -> u64 {
        self.error(err.user_message(fallback))
    }

    pub fn dismiss(&mut self, id: u64) {
        self.queue.retain(|n| n.id != id);
    }

    /// Drops expired toasts and returns what is still on screen.
    pub fn visible(&mut self, now: Instant) -> Vec<&Notification> {
        let ttl = self.ttl;
        self.queue.retain(|n| !n.is_expired(now, ttl));
        self.queue.iter().collect()
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.queue.back()
    }

    pub fn drain(&mut self) -> Vec<Notification> {
        self.queue.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toasts_auto_dismiss_after_ttl() {
        let start = Instant::now();
        let mut notifier = Notifier::new(Duration::from_secs(6));
        notifier.push_at("Image uploaded successfully!", Severity::Success, start);

        assert_eq!(notifier.visible(start + Duration::from_secs(5)).len(), 1);
        assert!(notifier.visible(start + Duration::from_secs(6)).is_empty());
    }

    #[test]
    fn expired_toasts_are_pruned_on_push() {
        let start = Instant::now();
        let mut notifier = Notifier::new(Duration::from_secs(6));
        for i in 0..3 {
            notifier.push_at(format!("Failed to load images ({})", i), Severity::Error, start);
        }
        notifier.push_at("Image uploaded successfully!", Severity::Success, start + Duration::from_secs(7));

        let left = notifier.drain();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].message, "Image uploaded successfully!");
    }

    #[test]
    fn manual_dismiss_removes_only_that_toast() {
        let mut notifier = Notifier::default();
        let first = notifier.success("Transformer created successfully");
        notifier.error("Failed to load images");
        notifier.dismiss(first);

        let left = notifier.drain();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].severity, Severity::Error);
    }

    #[test]
    fn failure_uses_backend_message() {
        let mut notifier = Notifier::default();
        let err = ClientError::Backend {
            status: 400,
            message: Some("Baseline requires weather".to_string()),
        };
        notifier.failure(&err, "Failed to upload image");
        assert_eq!(notifier.latest().unwrap().message, "Baseline requires weather");
    }
}
