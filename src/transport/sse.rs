//! Incremental `text/event-stream` decoder.

/// A dispatched server-sent event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk of bytes and returns every event completed by it.
    /// Bytes after the last line break are kept for the next chunk.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=newline).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line).into_owned();
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        events
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        let data = std::mem::take(&mut self.data);
        if event.is_none() && data.is_empty() {
            return None;
        }
        Some(SseEvent {
            event: event.filter(|e| !e.is_empty()).unwrap_or_else(|| "message".to_string()),
            data: data.join("\n"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str, data: &str) -> SseEvent {
        SseEvent { event: name.to_string(), data: data.to_string() }
    }

    #[test]
    fn decodes_named_events() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"event: cypher\ndata: MATCH (n)\n\nevent: generation\ndata: X is\n\n");
        assert_eq!(events, vec![event("cypher", "MATCH (n)"), event("generation", "X is")]);
    }

    #[test]
    fn events_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"event: gener").is_empty());
        assert!(decoder.feed(b"ation\ndata: a th").is_empty());
        assert_eq!(decoder.feed(b"ing.\n\n"), vec![event("generation", "a thing.")]);
    }

    #[test]
    fn multiple_data_lines_join_with_newline() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"event: generation\ndata: line one\ndata: line two\n\n");
        assert_eq!(events, vec![event("generation", "line one\nline two")]);
    }

    #[test]
    fn crlf_and_comments_are_handled() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b": keep-alive\r\nevent: info\r\ndata: hello\r\nid: 7\r\n\r\n");
        assert_eq!(events, vec![event("info", "hello")]);
    }

    #[test]
    fn multibyte_characters_survive_chunk_boundaries() {
        let mut decoder = SseDecoder::new();
        let bytes = "event: generation\ndata: kartu \u{1F451}\n\n".as_bytes();
        let split = bytes.len() - 4;
        assert!(decoder.feed(&bytes[..split]).is_empty());
        assert_eq!(decoder.feed(&bytes[split..]), vec![event("generation", "kartu \u{1F451}")]);
    }

    #[test]
    fn unnamed_event_defaults_to_message() {
        let mut decoder = SseDecoder::new();
        assert_eq!(decoder.feed(b"data: plain\n\n"), vec![event("message", "plain")]);
    }

    #[test]
    fn named_event_without_data_is_dispatched() {
        let mut decoder = SseDecoder::new();
        assert_eq!(decoder.feed(b"event: error\n\n"), vec![event("error", "")]);
    }

    #[test]
    fn blank_lines_alone_dispatch_nothing() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"\n\n\n").is_empty());
    }

    #[test]
    fn data_without_space_after_colon() {
        let mut decoder = SseDecoder::new();
        assert_eq!(decoder.feed(b"event:done\ndata:{}\n\n"), vec![event("done", "{}")]);
    }
}
