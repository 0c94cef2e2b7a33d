use chrono::Utc;
use serde::{ Deserialize, Serialize };

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    Bot,
}

/// Answer provenance attached once to a completed bot message.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    pub sources: Vec<String>,
    pub confidence: Option<f64>,
}

impl MessageMetadata {
    pub fn is_empty(&self) -> bool {
        self.tags().is_empty()
    }

    /// Display tags in render order: sources first, then confidence.
    pub fn tags(&self) -> Vec<String> {
        let mut tags = Vec::new();
        if !self.sources.is_empty() {
            tags.push(format!("Sumber: {}", self.sources.join(", ")));
        }
        if let Some(confidence) = self.confidence {
            tags.push(format!("Kepercayaan: {}%", (confidence * 100.0).round() as i64));
        }
        tags
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub author: Author,
    pub content: String,
    pub metadata: Option<MessageMetadata>,
    pub timestamp: i64,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Author::User, content.into())
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self::new(Author::Bot, content.into())
    }

    pub fn with_metadata(mut self, metadata: MessageMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    fn new(author: Author, content: String) -> Self {
        Self {
            author,
            content,
            metadata: None,
            timestamp: Utc::now().timestamp(),
        }
    }
}
