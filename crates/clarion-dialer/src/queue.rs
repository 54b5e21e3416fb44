//! The in-process outbound call queue (§4.2 call_to_queue, §5, §9).
//!
//! A bounded FIFO; overflow surfaces as a 4xx to the enqueue caller rather
//! than blocking the HTTP handler. The worker drains at a fixed pace: one
//! call per `seconds_to_forget` when that duration is known and positive,
//! otherwise a longer idle sleep so it isn't spinning on an empty queue.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::dialer::Dialer;

#[derive(Debug, Clone)]
pub struct QueuedCall {
    pub phone: String,
    pub message: String,
}

#[derive(Clone)]
pub struct CallQueue {
    sender: mpsc::Sender<QueuedCall>,
}

/// Idle pace used when `seconds_to_forget` is zero or unset — avoids a
/// tight loop against an empty channel.
const IDLE_SLEEP: Duration = Duration::from_secs(30);

impl CallQueue {
    /// Spawns the worker task and returns a handle for enqueueing. The
    /// worker survives independently of any one HTTP request (§5).
    pub fn spawn(dialer: Dialer, capacity: usize, seconds_to_forget: i64) -> Self {
        let (sender, mut receiver) = mpsc::channel::<QueuedCall>(capacity);

        tokio::spawn(async move {
            let pace = if seconds_to_forget > 0 {
                Duration::from_secs(seconds_to_forget as u64)
            } else {
                IDLE_SLEEP
            };

            while let Some(call) = receiver.recv().await {
                match dialer.place_call(&call.phone, &call.message, false).await {
                    Ok(outcome) => tracing::info!(status = outcome.status, phone = %call.phone, "queued call placed"),
                    Err(e) => tracing::warn!(error = %e, phone = %call.phone, "queued call failed"),
                }
                tokio::time::sleep(pace).await;
            }
        });

        Self { sender }
    }

    /// Enqueues a call; returns an error the caller should surface as a
    /// 4xx (queue full) rather than retry internally.
    pub fn enqueue(&self, phone: String, message: String) -> clarion_core::error::Result<()> {
        self.sender
            .try_send(QueuedCall { phone, message })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    clarion_core::Error::UpstreamRejected { status: 429, body: "call queue is full".to_string() }
                }
                mpsc::error::TrySendError::Closed(_) => clarion_core::Error::Fatal("call queue worker has exited".to_string()),
            })
    }
}
