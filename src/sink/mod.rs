pub mod recording;
pub mod terminal;

use crate::models::chat::MessageMetadata;
use crate::status::{ StatusCategory, StatusState };

pub use recording::{ RecordingSink, SinkCommand };
pub use terminal::TerminalSink;

/// Identifies a streaming bot message inside a sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageHandle(pub u64);

/// Rendering surface driven by the session controller.
///
/// Every call is a fire-and-forget command; the controller never reads state
/// back from the surface.
pub trait PresentationSink {
    fn append_user_message(&mut self, text: &str);
    fn append_bot_message(&mut self, text: &str);
    fn append_info(&mut self, text: &str);
    fn append_trace(&mut self, text: &str);

    fn begin_streaming_message(&mut self) -> MessageHandle;
    /// Replaces the streaming message's content with `content`, which is the
    /// full re-render of the answer so far.
    fn append_to_streaming_message(&mut self, handle: MessageHandle, content: &str);
    fn attach_metadata(&mut self, handle: MessageHandle, metadata: &MessageMetadata);
    fn finalize_streaming_message(&mut self, handle: MessageHandle);

    fn show_typing_indicator(&mut self);
    fn hide_typing_indicator(&mut self);

    fn set_status(&mut self, label: &str, category: StatusCategory);

    fn reset_input(&mut self) {}
    fn set_input_enabled(&mut self, _enabled: bool) {}
}

pub fn publish_status(sink: &mut dyn PresentationSink, state: &StatusState) {
    sink.set_status(&state.label, state.category);
}
