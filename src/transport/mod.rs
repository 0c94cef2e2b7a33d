pub mod channel;
pub mod http;
pub mod sse;

use futures::{ Stream, StreamExt };
use std::pin::Pin;
use tokio::time::Instant;

use crate::models::events::TransportEvent;

pub use channel::{ ChannelConnector, ConnectionRecord, OpenedConnection };
pub use http::HttpConnector;

pub type EventStream = Pin<Box<dyn Stream<Item = TransportEvent> + Send>>;

/// Opens one push-event connection per question.
///
/// `open` must not block: the returned stream performs its I/O lazily or in a
/// background task, and dropping it closes the connection.
pub trait Connector: Send + Sync {
    fn open(&self, question: &str) -> EventStream;
}

/// Exclusive handle on a live connection. Closing is dropping.
pub struct Connection {
    events: EventStream,
    opened_at: Instant,
}

impl Connection {
    pub fn new(events: EventStream) -> Self {
        Self { events, opened_at: Instant::now() }
    }

    /// Next event in delivery order; `None` once the server ends the stream.
    pub async fn next(&mut self) -> Option<TransportEvent> {
        self.events.next().await
    }

    pub fn opened_at(&self) -> Instant {
        self.opened_at
    }
}
