use serde::{ Deserialize, Serialize };
use std::fmt;

use super::chat::MessageMetadata;
use crate::transport::sse::SseEvent;

pub const DEFAULT_ERROR_MESSAGE: &str = "Terjadi kesalahan saat memproses permintaan Anda.";
pub const CONNECTION_ERROR_MESSAGE: &str = "Kesalahan koneksi. Silakan coba lagi.";

/// A typed push event as delivered by the answering service.
#[derive(Clone, Debug, PartialEq)]
pub enum PushEvent {
    Info(String),
    Cypher(String),
    Retrieval(String),
    Generation(String),
    /// Raw `done` payload; parsed by the dispatcher so a malformed body fails
    /// only the session it belongs to.
    Done(String),
    Error(Option<String>),
}

impl PushEvent {
    /// Maps a decoded wire event onto a known event type. Unknown names,
    /// including the unnamed `message` type, yield `None`.
    pub fn from_sse(event: SseEvent) -> Option<Self> {
        let SseEvent { event, data } = event;
        match event.as_str() {
            "info" => Some(PushEvent::Info(data)),
            "cypher" => Some(PushEvent::Cypher(data)),
            "retrieval" => Some(PushEvent::Retrieval(data)),
            "generation" => Some(PushEvent::Generation(data)),
            "done" => Some(PushEvent::Done(data)),
            "error" => Some(PushEvent::Error(Some(data).filter(|d| !d.trim().is_empty()))),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PushEvent::Info(_) => "info",
            PushEvent::Cypher(_) => "cypher",
            PushEvent::Retrieval(_) => "retrieval",
            PushEvent::Generation(_) => "generation",
            PushEvent::Done(_) => "done",
            PushEvent::Error(_) => "error",
        }
    }
}

/// Body of the `done` event.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DonePayload {
    #[serde(default)]
    pub sources: Option<Vec<String>>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl DonePayload {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn into_metadata(self) -> MessageMetadata {
        MessageMetadata {
            sources: self.sources.unwrap_or_default(),
            confidence: self.confidence
                .filter(|c| c.is_finite())
                .map(|c| c.clamp(0.0, 1.0)),
        }
    }
}

/// What a live connection yields to the controller.
#[derive(Clone, Debug, PartialEq)]
pub enum TransportEvent {
    /// The service accepted the request and the push stream is open.
    Connected,
    Event(PushEvent),
    /// Connection-level failure with a diagnostic detail.
    Failure(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    Application,
    Transport,
}

/// Every way a session can end badly, consumed by one recovery path.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl SessionFailure {
    pub fn application(message: impl Into<String>) -> Self {
        Self { kind: FailureKind::Application, message: message.into() }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self { kind: FailureKind::Transport, message: message.into() }
    }

    /// Text of the synthetic bot message shown for this failure. Transport
    /// details stay in the log; the user sees the generic message.
    pub fn chat_text(&self) -> String {
        match self.kind {
            FailureKind::Application => format!("Error: {}", self.message),
            FailureKind::Transport => CONNECTION_ERROR_MESSAGE.to_string(),
        }
    }
}

impl fmt::Display for SessionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FailureKind::Application => write!(f, "application error: {}", self.message),
            FailureKind::Transport => write!(f, "transport error: {}", self.message),
        }
    }
}
