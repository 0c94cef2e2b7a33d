use log::{ debug, error };
use std::collections::HashMap;
use std::io::{ self, Write };

use super::{ MessageHandle, PresentationSink };
use crate::models::chat::MessageMetadata;
use crate::status::StatusCategory;

const TYPING_INDICATOR: &str = "Bot: ...";
const CLEAR_LINE: &str = "\r\x1b[2K";

/// Line-oriented rendering of the conversation onto a terminal.
///
/// Streaming messages are re-rendered in full by the controller; since the
/// content only ever grows, the sink prints just the suffix it has not
/// written yet.
pub struct TerminalSink<W: Write> {
    out: W,
    verbose: bool,
    typing_visible: bool,
    next_handle: u64,
    printed: HashMap<MessageHandle, usize>,
}

impl TerminalSink<io::Stdout> {
    pub fn stdout(verbose: bool) -> Self {
        Self::new(io::stdout(), verbose)
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W, verbose: bool) -> Self {
        Self {
            out,
            verbose,
            typing_visible: false,
            next_handle: 0,
            printed: HashMap::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            error!("Failed to write to terminal: {}", e);
        }
    }

    /// Writes a full line. A visible typing indicator is cleared first and
    /// redrawn below the line.
    fn line(&mut self, text: &str) {
        if self.typing_visible {
            self.write(&format!("{}{}\n{}", CLEAR_LINE, text, TYPING_INDICATOR));
        } else {
            self.write(&format!("{}\n", text));
        }
    }
}

impl<W: Write> PresentationSink for TerminalSink<W> {
    fn append_user_message(&mut self, text: &str) {
        self.line(&format!("You: {}", text));
    }

    fn append_bot_message(&mut self, text: &str) {
        self.line(&format!("Bot: {}", text));
    }

    fn append_info(&mut self, text: &str) {
        self.line(&format!("INFO: {}", text));
    }

    fn append_trace(&mut self, text: &str) {
        for trace_line in text.lines() {
            self.line(&format!("  > {}", trace_line));
        }
    }

    fn begin_streaming_message(&mut self) -> MessageHandle {
        self.next_handle += 1;
        let handle = MessageHandle(self.next_handle);
        self.printed.insert(handle, 0);
        self.write("Bot: ");
        handle
    }

    fn append_to_streaming_message(&mut self, handle: MessageHandle, content: &str) {
        let Some(&printed) = self.printed.get(&handle) else {
            debug!("Ignoring content for finished message {:?}", handle);
            return;
        };
        match content.get(printed..) {
            Some(suffix) => self.write(suffix),
            None => {
                // Not a continuation of what is on screen; print it whole.
                self.write(&format!("\n{}", content));
            }
        }
        self.printed.insert(handle, content.len());
    }

    fn attach_metadata(&mut self, handle: MessageHandle, metadata: &MessageMetadata) {
        if !self.printed.contains_key(&handle) {
            return;
        }
        let tags = metadata
            .tags()
            .iter()
            .map(|tag| format!("[{}]", tag))
            .collect::<Vec<_>>()
            .join(" ");
        self.write(&format!("\n  {}", tags));
    }

    fn finalize_streaming_message(&mut self, handle: MessageHandle) {
        if self.printed.remove(&handle).is_some() {
            self.write("\n");
        }
    }

    fn show_typing_indicator(&mut self) {
        if !self.typing_visible {
            self.typing_visible = true;
            self.write(TYPING_INDICATOR);
        }
    }

    fn hide_typing_indicator(&mut self) {
        if self.typing_visible {
            self.typing_visible = false;
            self.write(CLEAR_LINE);
        }
    }

    fn set_status(&mut self, label: &str, category: StatusCategory) {
        debug!("Status: {} ({:?})", label, category);
        // Mid-stream the cursor sits inside the answer; status lines wait.
        if self.verbose && self.printed.is_empty() {
            self.line(&format!("  · {}", label));
        }
    }
}
