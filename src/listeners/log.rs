//! # Simple logging listener for debugging and demos.
//!
//! [`LogWriter`] prints delivered events to stdout in a human-readable
//! format. This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [delivered] topic=tick seq=3
//! [delivered] topic=sensor/temperature seq=4
//! ```

use async_trait::async_trait;

use crate::events::Event;
use crate::listeners::Subscribe;

/// Simple stdout logging listener for the worker lane.
///
/// Enabled via the `logging` feature. Subscribe it to the topics of interest
/// and every delivered event produces one line on stdout.
///
/// Not intended for production use - implement a custom [`Subscribe`] for
/// structured logging or metrics collection.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, event: &Event) {
        println!("[delivered] topic={} seq={}", event.topic(), event.seq);
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
