use log::{ debug, warn };

use crate::accumulator::ContentAccumulator;
use crate::models::chat::ChatMessage;
use crate::models::events::{ DonePayload, PushEvent, SessionFailure, DEFAULT_ERROR_MESSAGE };
use crate::sink::{ publish_status, MessageHandle, PresentationSink };
use crate::status::{ StatusCategory, StatusController };

/// Status text the service sends before it has a real query to show.
pub const GRAPH_QUERY_SENTINEL: &str = "Translating question to graph query...";

/// Result of handling one push event.
#[derive(Debug, PartialEq)]
pub enum Dispatch {
    Continue,
    /// The answer is complete; the message is what the session produced.
    Completed(ChatMessage),
    Failed(SessionFailure),
}

/// Per-session event handling: owns the session's accumulator, its streaming
/// placeholder and the typing-indicator bracket.
#[derive(Debug, Default)]
pub struct EventDispatcher {
    accumulator: ContentAccumulator,
    placeholder: Option<MessageHandle>,
    generation_started: bool,
    completed: bool,
    typing_visible: bool,
    typing_shown: bool,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows the typing indicator. It is shown at most once per dispatcher.
    pub fn begin(&mut self, sink: &mut dyn PresentationSink) {
        if !self.typing_shown {
            self.typing_shown = true;
            self.typing_visible = true;
            sink.show_typing_indicator();
        }
    }

    pub fn hide_typing(&mut self, sink: &mut dyn PresentationSink) {
        if self.typing_visible {
            self.typing_visible = false;
            sink.hide_typing_indicator();
        }
    }

    pub fn is_generating(&self) -> bool {
        self.generation_started && !self.completed
    }

    pub fn dispatch(
        &mut self,
        event: PushEvent,
        sink: &mut dyn PresentationSink,
        status: &mut StatusController
    ) -> Dispatch {
        debug!("Dispatching '{}' event", event.kind());
        match event {
            PushEvent::Info(text) => {
                self.hide_typing(sink);
                sink.append_info(&text);
                Dispatch::Continue
            }
            PushEvent::Cypher(text) => {
                if text != GRAPH_QUERY_SENTINEL {
                    sink.append_trace(&text);
                }
                publish_status(sink, status.set(text, StatusCategory::Processing));
                Dispatch::Continue
            }
            PushEvent::Retrieval(text) => {
                publish_status(sink, status.set(text, StatusCategory::Processing));
                Dispatch::Continue
            }
            PushEvent::Generation(fragment) => {
                self.on_generation(fragment, sink);
                Dispatch::Continue
            }
            PushEvent::Done(raw) => self.on_done(&raw, sink),
            PushEvent::Error(text) => {
                let message = text.unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string());
                Dispatch::Failed(SessionFailure::application(message))
            }
        }
    }

    fn on_generation(&mut self, fragment: String, sink: &mut dyn PresentationSink) {
        if self.completed {
            debug!("Ignoring generation after completion");
            return;
        }
        if !self.generation_started {
            self.generation_started = true;
            self.hide_typing(sink);
            self.accumulator.reset();
            self.placeholder = Some(sink.begin_streaming_message());
        }
        if let Some(handle) = self.placeholder {
            self.accumulator.append(fragment);
            sink.append_to_streaming_message(handle, &self.accumulator.render());
        }
    }

    fn on_done(&mut self, raw: &str, sink: &mut dyn PresentationSink) -> Dispatch {
        if self.completed {
            debug!("Ignoring repeated done event");
            return Dispatch::Continue;
        }
        let payload = match DonePayload::parse(raw) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Malformed done payload {:?}: {}", raw, e);
                return Dispatch::Failed(
                    SessionFailure::application(format!("Malformed completion payload: {}", e))
                );
            }
        };
        self.completed = true;
        self.hide_typing(sink);
        debug!("Answer complete after {} fragments", self.accumulator.len());

        let metadata = payload.into_metadata();
        // Taking the handle clears the streaming marker; metadata can only
        // attach while it is set.
        if let Some(handle) = self.placeholder.take() {
            if !metadata.is_empty() {
                sink.attach_metadata(handle, &metadata);
            }
            sink.finalize_streaming_message(handle);
        }
        Dispatch::Completed(ChatMessage::bot(self.accumulator.render()).with_metadata(metadata))
    }

    /// Tears down presentation state when the session fails or is cancelled.
    /// Renders already made stay; an open placeholder is finalized as-is.
    pub fn abort(&mut self, sink: &mut dyn PresentationSink) {
        self.hide_typing(sink);
        if let Some(handle) = self.placeholder.take() {
            sink.finalize_streaming_message(handle);
        }
        self.completed = true;
    }

    /// Drops buffered content without touching the sink.
    pub fn discard(&mut self) {
        if !self.accumulator.is_empty() {
            debug!("Discarding {} buffered fragments", self.accumulator.len());
        }
        self.accumulator.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{ RecordingSink, SinkCommand };

    fn setup() -> (EventDispatcher, RecordingSink, StatusController) {
        let mut dispatcher = EventDispatcher::new();
        let mut sink = RecordingSink::new();
        dispatcher.begin(&mut sink);
        (dispatcher, sink, StatusController::default())
    }

    #[test]
    fn generation_fragments_render_in_order() {
        let (mut dispatcher, mut sink, mut status) = setup();
        for fragment in ["a", "b", "c"] {
            let outcome = dispatcher.dispatch(PushEvent::Generation(fragment.into()), &mut sink, &mut status);
            assert_eq!(outcome, Dispatch::Continue);
        }
        assert_eq!(sink.streaming_content(MessageHandle(1)), Some("a\nb\nc"));
        assert_eq!(sink.count(|c| matches!(c, SinkCommand::BeginStreaming(_))), 1);
        assert!(dispatcher.is_generating());
    }

    #[test]
    fn sentinel_cypher_updates_status_without_trace() {
        let (mut dispatcher, mut sink, mut status) = setup();
        dispatcher.dispatch(PushEvent::Cypher(GRAPH_QUERY_SENTINEL.into()), &mut sink, &mut status);
        dispatcher.dispatch(PushEvent::Cypher("MATCH (c:Card) RETURN c".into()), &mut sink, &mut status);

        assert_eq!(sink.count(|c| matches!(c, SinkCommand::Trace(_))), 1);
        assert!(sink.position(&SinkCommand::Trace("MATCH (c:Card) RETURN c".into())).is_some());
        assert_eq!(status.state().label, "MATCH (c:Card) RETURN c");
        assert_eq!(sink.last_status(), Some(("MATCH (c:Card) RETURN c", StatusCategory::Processing)));
    }

    #[test]
    fn retrieval_only_touches_status() {
        let (mut dispatcher, mut sink, mut status) = setup();
        sink.take();
        dispatcher.dispatch(PushEvent::Retrieval("Found 4 results".into()), &mut sink, &mut status);
        assert_eq!(
            sink.commands(),
            &[SinkCommand::Status("Found 4 results".into(), StatusCategory::Processing)]
        );
    }

    #[test]
    fn typing_indicator_hidden_once() {
        let (mut dispatcher, mut sink, mut status) = setup();
        dispatcher.dispatch(PushEvent::Info("Auto-corrected: Hog Rider".into()), &mut sink, &mut status);
        dispatcher.dispatch(PushEvent::Generation("X".into()), &mut sink, &mut status);
        dispatcher.dispatch(PushEvent::Done("{}".into()), &mut sink, &mut status);
        dispatcher.begin(&mut sink);

        assert_eq!(sink.count(|c| *c == SinkCommand::ShowTyping), 1);
        assert_eq!(sink.count(|c| *c == SinkCommand::HideTyping), 1);
        let hidden = sink.position(&SinkCommand::HideTyping).unwrap();
        let info = sink.position(&SinkCommand::Info("Auto-corrected: Hog Rider".into())).unwrap();
        assert!(hidden < info);
    }

    #[test]
    fn done_attaches_metadata_once() {
        let (mut dispatcher, mut sink, mut status) = setup();
        dispatcher.dispatch(PushEvent::Generation("X is".into()), &mut sink, &mut status);
        let payload = r#"{"sources":["doc1"],"confidence":0.8}"#;

        let first = dispatcher.dispatch(PushEvent::Done(payload.into()), &mut sink, &mut status);
        let second = dispatcher.dispatch(PushEvent::Done(payload.into()), &mut sink, &mut status);

        match first {
            Dispatch::Completed(message) => {
                assert_eq!(message.content, "X is");
                let metadata = message.metadata.unwrap();
                assert_eq!(metadata.sources, vec!["doc1"]);
            }
            other => panic!("expected completion, got {:?}", other),
        }
        assert_eq!(second, Dispatch::Continue);
        assert_eq!(sink.count(|c| matches!(c, SinkCommand::Metadata(..))), 1);
        assert_eq!(sink.count(|c| matches!(c, SinkCommand::FinalizeStreaming(_))), 1);
        assert!(!dispatcher.is_generating());
    }

    #[test]
    fn done_without_tags_skips_metadata() {
        let (mut dispatcher, mut sink, mut status) = setup();
        dispatcher.dispatch(PushEvent::Generation("X".into()), &mut sink, &mut status);
        dispatcher.dispatch(PushEvent::Done(r#"{"sources":[]}"#.into()), &mut sink, &mut status);
        assert_eq!(sink.count(|c| matches!(c, SinkCommand::Metadata(..))), 0);
        assert_eq!(sink.count(|c| matches!(c, SinkCommand::FinalizeStreaming(_))), 1);
    }

    #[test]
    fn done_without_generation_completes_empty() {
        let (mut dispatcher, mut sink, mut status) = setup();
        let outcome = dispatcher.dispatch(PushEvent::Done("{}".into()), &mut sink, &mut status);
        assert!(matches!(outcome, Dispatch::Completed(ref m) if m.content.is_empty()));
        assert_eq!(sink.count(|c| *c == SinkCommand::HideTyping), 1);
        assert_eq!(sink.count(|c| matches!(c, SinkCommand::BeginStreaming(_))), 0);
    }

    #[test]
    fn malformed_done_fails_session() {
        let (mut dispatcher, mut sink, mut status) = setup();
        dispatcher.dispatch(PushEvent::Generation("partial".into()), &mut sink, &mut status);
        let outcome = dispatcher.dispatch(PushEvent::Done("{not json".into()), &mut sink, &mut status);
        match outcome {
            Dispatch::Failed(failure) => {
                assert!(failure.message.starts_with("Malformed completion payload"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(sink.count(|c| matches!(c, SinkCommand::Metadata(..))), 0);
    }

    #[test]
    fn error_event_uses_default_text() {
        let (mut dispatcher, mut sink, mut status) = setup();
        let outcome = dispatcher.dispatch(PushEvent::Error(None), &mut sink, &mut status);
        assert_eq!(outcome, Dispatch::Failed(SessionFailure::application(DEFAULT_ERROR_MESSAGE)));

        let outcome = dispatcher.dispatch(
            PushEvent::Error(Some("Translation error: timeout".into())),
            &mut sink,
            &mut status
        );
        assert_eq!(
            outcome,
            Dispatch::Failed(SessionFailure::application("Translation error: timeout"))
        );
    }

    #[test]
    fn abort_finalizes_open_placeholder() {
        let (mut dispatcher, mut sink, mut status) = setup();
        dispatcher.dispatch(PushEvent::Generation("half an".into()), &mut sink, &mut status);
        dispatcher.abort(&mut sink);
        dispatcher.dispatch(PushEvent::Generation("answer".into()), &mut sink, &mut status);

        assert_eq!(sink.count(|c| matches!(c, SinkCommand::FinalizeStreaming(_))), 1);
        assert_eq!(sink.streaming_content(MessageHandle(1)), Some("half an"));
    }
}
