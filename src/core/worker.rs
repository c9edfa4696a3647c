//! # Worker lane - background drain loop.
//!
//! One long-lived task drains the worker queue for the life of the bus:
//! block-wait for the next event, snapshot the topic's listener set, fan out
//! sequentially, repeat. Events whose topic has no listeners at drain time
//! are discarded.
//!
//! ```text
//! publish(event) ──► [unbounded queue] ──► worker task
//!                                            ├─ snapshot(topic)
//!                                            ├─ empty → discard, continue
//!                                            └─ for each listener:
//!                                                 on_event(&event)   (panic caught)
//! ```
//!
//! The loop exits only when the bus's cancellation token fires or every
//! sender is gone; per-event trouble (a panicking listener) is logged and
//! treated as a no-op so the lane keeps running.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use crate::events::Event;
use crate::listeners::{Subscribe, TopicRegistry};

/// Spawns the worker drain loop. Called once per bus, at construction.
pub(crate) fn spawn(
    mut rx: mpsc::UnboundedReceiver<Event>,
    listeners: Arc<TopicRegistry<dyn Subscribe>>,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                next = rx.recv() => match next {
                    Some(event) => deliver(&listeners, &event).await,
                    None => break,
                },
            }
        }
    })
}

/// Fans one event out to the current listeners of its topic.
async fn deliver(listeners: &TopicRegistry<dyn Subscribe>, event: &Event) {
    let handles = listeners.snapshot(event.topic());
    if handles.is_empty() {
        trace!(
            topic = event.topic(),
            seq = event.seq,
            "no worker listeners at drain time, discarding"
        );
        return;
    }

    for handle in &handles {
        let callback = handle.on_event(event);
        if let Err(panic) = AssertUnwindSafe(callback).catch_unwind().await {
            let info = {
                let any = &*panic;
                if let Some(msg) = any.downcast_ref::<&'static str>() {
                    (*msg).to_string()
                } else if let Some(msg) = any.downcast_ref::<String>() {
                    msg.clone()
                } else {
                    "unknown panic".to_string()
                }
            };
            warn!(
                listener = handle.name(),
                topic = event.topic(),
                seq = event.seq,
                info = %info,
                "worker listener panicked"
            );
        }
    }
}
