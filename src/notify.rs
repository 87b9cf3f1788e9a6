//! Outbound notifications.
//!
//! Delivery is best-effort and at-most-once: procedures enqueue without
//! waiting, a full or closed queue drops the notification with a warning, and
//! a failed delivery is logged and never retried. The primary write of the
//! procedure that produced the notification is never affected.

use std::future::Future;

use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::model::Notification;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification store failed: {0}")]
    Store(#[from] sqlx::Error),
    #[error("notification rejected: {0}")]
    Rejected(String),
}

/// Sink that actually delivers a notification.
pub trait Notifier: Send + Sync + 'static {
    fn deliver(
        &self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Persists notifications into the `notifications` table for clients to poll.
#[derive(Debug, Clone)]
pub struct PgNotifier {
    pool: PgPool,
}

impl PgNotifier {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl Notifier for PgNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        crate::db::notification::insert_notification(&self.pool, notification).await?;
        Ok(())
    }
}

/// Producer side of the notification queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::Sender<Notification>,
}

impl Outbox {
    /// Start a dispatcher task draining the queue into `notifier`.
    pub fn spawn<N: Notifier>(notifier: N, capacity: usize) -> (Self, JoinHandle<()>) {
        let (outbox, mut rx) = Self::detached(capacity);
        let handle = tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                if let Err(err) = notifier.deliver(&notification).await {
                    tracing::warn!(
                        error = %err,
                        title = %notification.title,
                        "notification delivery failed"
                    );
                }
            }
            tracing::debug!("notification dispatcher stopped");
        });
        (outbox, handle)
    }

    /// A queue with no dispatcher; the caller owns the receiving end.
    pub fn detached(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Queue a notification. Returns whether it was accepted; never blocks
    /// and never fails the caller.
    pub fn enqueue(&self, notification: Notification) -> bool {
        match self.tx.try_send(notification) {
            Ok(()) => true,
            Err(TrySendError::Full(n)) => {
                tracing::warn!(title = %n.title, "notification queue full, dropping");
                false
            }
            Err(TrySendError::Closed(n)) => {
                tracing::warn!(title = %n.title, "notification queue closed, dropping");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::model::Priority;

    fn note(title: &str) -> Notification {
        Notification::to_country(1, "diplomatic", Priority::Medium, title, "body")
    }

    #[derive(Clone, Default)]
    struct Recording {
        seen: Arc<Mutex<Vec<String>>>,
        fail_on: Option<&'static str>,
    }

    impl Notifier for Recording {
        async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
            if self.fail_on == Some(notification.title.as_str()) {
                return Err(NotifyError::Rejected("boom".to_string()));
            }
            self.seen.lock().unwrap().push(notification.title.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn dispatcher_delivers_in_order_and_survives_failures() {
        let recording = Recording {
            fail_on: Some("second"),
            ..Recording::default()
        };
        let seen = recording.seen.clone();
        let (outbox, handle) = Outbox::spawn(recording, 8);
        assert!(outbox.enqueue(note("first")));
        assert!(outbox.enqueue(note("second")));
        assert!(outbox.enqueue(note("third")));
        drop(outbox);
        handle.await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["first", "third"]);
    }

    #[test]
    fn full_queue_drops_without_error() {
        let (outbox, mut rx) = Outbox::detached(1);
        assert!(outbox.enqueue(note("a")));
        assert!(!outbox.enqueue(note("b")));
        assert_eq!(rx.try_recv().unwrap().title, "a");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_queue_drops_without_error() {
        let (outbox, rx) = Outbox::detached(4);
        drop(rx);
        assert!(!outbox.enqueue(note("lost")));
    }
}
