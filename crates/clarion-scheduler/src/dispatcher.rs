//! The `DelayedDispatcher` capability (§9 design note): schedules a
//! `(when, phone, message)` payload for delivery at a future UTC instant.
//! `InMemoryDispatcher` is the in-process realisation — a `tokio::spawn`
//! per job sleeping until its ETA — standing in for whatever durable
//! broker with delay/ETA semantics a production deployment would wire up
//! behind the same trait.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::dialer_client::PlaceCaller;

pub trait DelayedDispatcher: Send + Sync {
    /// Schedules `phone`/`message` to be dispatched at `when`. Returns
    /// immediately; the actual dial happens asynchronously, independent
    /// of the HTTP request that requested it (§5 — no suspension point
    /// here blocks the caller).
    fn schedule(&self, when: DateTime<Utc>, phone: String, message: String);
}

pub struct InMemoryDispatcher {
    dialer: Arc<dyn PlaceCaller>,
}

impl InMemoryDispatcher {
    pub fn new(dialer: Arc<dyn PlaceCaller>) -> Self {
        Self { dialer }
    }
}

impl DelayedDispatcher for InMemoryDispatcher {
    fn schedule(&self, when: DateTime<Utc>, phone: String, message: String) {
        let dialer = self.dialer.clone();
        tokio::spawn(async move {
            let now = Utc::now();
            if when > now {
                let delay = (when - now).to_std().unwrap_or(std::time::Duration::ZERO);
                tokio::time::sleep(delay).await;
            }
            match dialer.place_call(&phone, &message).await {
                Ok(status) => tracing::info!(%phone, status, "scheduled call dispatched"),
                Err(e) => tracing::error!(error = %e, %phone, "scheduled call dispatch failed"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    struct RecordingDialer {
        calls: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl PlaceCaller for RecordingDialer {
        async fn place_call(&self, phone: &str, message: &str) -> clarion_core::error::Result<u16> {
            self.calls.lock().unwrap().push((phone.to_string(), message.to_string()));
            Ok(200)
        }
    }

    #[tokio::test]
    async fn schedule_dispatches_once_the_eta_arrives() {
        let dialer = Arc::new(RecordingDialer { calls: Mutex::new(Vec::new()) });
        let dispatcher = InMemoryDispatcher::new(dialer.clone());

        let when = Utc::now() + chrono::Duration::milliseconds(20);
        dispatcher.schedule(when, "+15550001".to_string(), "fire".to_string());

        // Not yet due.
        assert!(dialer.calls.lock().unwrap().is_empty());
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(dialer.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn schedule_dispatches_immediately_for_a_past_eta() {
        let dialer = Arc::new(RecordingDialer { calls: Mutex::new(Vec::new()) });
        let dispatcher = InMemoryDispatcher::new(dialer.clone());

        let when = Utc::now() - chrono::Duration::seconds(5);
        dispatcher.schedule(when, "+15550002".to_string(), "fire".to_string());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(dialer.calls.lock().unwrap().len(), 1);
    }
}
