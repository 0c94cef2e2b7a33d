use futures::Stream;
use std::pin::Pin;
use std::sync::{ Arc, Mutex };
use std::task::{ Context, Poll };
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::{ Connector, EventStream };
use crate::models::events::TransportEvent;

/// Lifecycle entry kept by [`ChannelConnector`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionRecord {
    Opened(String),
    Closed(String),
}

/// The feeding end of a connection opened through [`ChannelConnector`].
pub struct OpenedConnection {
    pub question: String,
    pub events: mpsc::UnboundedSender<TransportEvent>,
}

/// Connector whose connections are fed by hand: each `open` hands the sending
/// half to whoever holds the matching receiver. Used to drive the controller
/// with synthetic event sequences.
#[derive(Clone)]
pub struct ChannelConnector {
    opened: mpsc::UnboundedSender<OpenedConnection>,
    log: Arc<Mutex<Vec<ConnectionRecord>>>,
}

impl ChannelConnector {
    pub fn pair() -> (Self, mpsc::UnboundedReceiver<OpenedConnection>) {
        let (opened, rx) = mpsc::unbounded_channel();
        (Self { opened, log: Arc::new(Mutex::new(Vec::new())) }, rx)
    }

    /// Opens and closes in the order they happened.
    pub fn records(&self) -> Vec<ConnectionRecord> {
        self.log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

impl Connector for ChannelConnector {
    fn open(&self, question: &str) -> EventStream {
        let (events, rx) = mpsc::unbounded_channel();
        if let Ok(mut log) = self.log.lock() {
            log.push(ConnectionRecord::Opened(question.to_string()));
        }
        let _ = self.opened.send(OpenedConnection { question: question.to_string(), events });
        Box::pin(TrackedStream {
            inner: UnboundedReceiverStream::new(rx),
            question: question.to_string(),
            log: Arc::clone(&self.log),
        })
    }
}

struct TrackedStream {
    inner: UnboundedReceiverStream<TransportEvent>,
    question: String,
    log: Arc<Mutex<Vec<ConnectionRecord>>>,
}

impl Stream for TrackedStream {
    type Item = TransportEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl Drop for TrackedStream {
    fn drop(&mut self) {
        if let Ok(mut log) = self.log.lock() {
            log.push(ConnectionRecord::Closed(self.question.clone()));
        }
    }
}
