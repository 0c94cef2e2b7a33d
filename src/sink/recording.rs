use super::{ MessageHandle, PresentationSink };
use crate::models::chat::MessageMetadata;
use crate::status::StatusCategory;

/// One call received by a [`RecordingSink`].
#[derive(Clone, Debug, PartialEq)]
pub enum SinkCommand {
    UserMessage(String),
    BotMessage(String),
    Info(String),
    Trace(String),
    BeginStreaming(MessageHandle),
    StreamingContent(MessageHandle, String),
    Metadata(MessageHandle, MessageMetadata),
    FinalizeStreaming(MessageHandle),
    ShowTyping,
    HideTyping,
    Status(String, StatusCategory),
    ResetInput,
    InputEnabled(bool),
}

/// Headless sink that keeps every command in call order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    commands: Vec<SinkCommand>,
    next_handle: u64,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[SinkCommand] {
        &self.commands
    }

    pub fn take(&mut self) -> Vec<SinkCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn count(&self, predicate: impl Fn(&SinkCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| predicate(c)).count()
    }

    /// Last content rendered into the given streaming message.
    pub fn streaming_content(&self, handle: MessageHandle) -> Option<&str> {
        self.commands.iter().rev().find_map(|c| match c {
            SinkCommand::StreamingContent(h, content) if *h == handle => Some(content.as_str()),
            _ => None,
        })
    }

    pub fn last_status(&self) -> Option<(&str, StatusCategory)> {
        self.commands.iter().rev().find_map(|c| match c {
            SinkCommand::Status(label, category) => Some((label.as_str(), *category)),
            _ => None,
        })
    }

    pub fn position(&self, command: &SinkCommand) -> Option<usize> {
        self.commands.iter().position(|c| c == command)
    }

    fn record(&mut self, command: SinkCommand) {
        self.commands.push(command);
    }
}

impl PresentationSink for RecordingSink {
    fn append_user_message(&mut self, text: &str) {
        self.record(SinkCommand::UserMessage(text.to_string()));
    }

    fn append_bot_message(&mut self, text: &str) {
        self.record(SinkCommand::BotMessage(text.to_string()));
    }

    fn append_info(&mut self, text: &str) {
        self.record(SinkCommand::Info(text.to_string()));
    }

    fn append_trace(&mut self, text: &str) {
        self.record(SinkCommand::Trace(text.to_string()));
    }

    fn begin_streaming_message(&mut self) -> MessageHandle {
        self.next_handle += 1;
        let handle = MessageHandle(self.next_handle);
        self.record(SinkCommand::BeginStreaming(handle));
        handle
    }

    fn append_to_streaming_message(&mut self, handle: MessageHandle, content: &str) {
        self.record(SinkCommand::StreamingContent(handle, content.to_string()));
    }

    fn attach_metadata(&mut self, handle: MessageHandle, metadata: &MessageMetadata) {
        self.record(SinkCommand::Metadata(handle, metadata.clone()));
    }

    fn finalize_streaming_message(&mut self, handle: MessageHandle) {
        self.record(SinkCommand::FinalizeStreaming(handle));
    }

    fn show_typing_indicator(&mut self) {
        self.record(SinkCommand::ShowTyping);
    }

    fn hide_typing_indicator(&mut self) {
        self.record(SinkCommand::HideTyping);
    }

    fn set_status(&mut self, label: &str, category: StatusCategory) {
        self.record(SinkCommand::Status(label.to_string(), category));
    }

    fn reset_input(&mut self) {
        self.record(SinkCommand::ResetInput);
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.record(SinkCommand::InputEnabled(enabled));
    }
}
