pub mod commands;

use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Service Args ---
    /// Base URL of the question-answering service (e.g., http://127.0.0.1:8000)
    #[arg(long, env = "CHAT_SERVER_URL", default_value = "http://127.0.0.1:8000")]
    pub server_url: String,

    /// Path of the push-event endpoint; the question is sent as the `question` query parameter.
    #[arg(long, env = "CHAT_STREAM_PATH", default_value = "/api/chat/stream")]
    pub stream_path: String,

    /// Give up on a stream after this many seconds without data. Unset means wait indefinitely.
    #[arg(long, env = "STREAM_IDLE_TIMEOUT_SECS")]
    pub idle_timeout_secs: Option<u64>,

    // --- Presentation Args ---
    /// How long an error status stays visible before reverting to ready, in milliseconds.
    #[arg(long, env = "STATUS_ERROR_REVERT_MS", default_value = "3000")]
    pub error_revert_ms: u64,

    /// Print status line updates (query traces, retrieval progress).
    #[arg(long, env = "VERBOSE", default_value = "false")]
    pub verbose: bool,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,

    /// Ask a single question, wait for the answer and exit.
    #[arg(short = 'q', long)]
    pub question: Option<String>,
}

impl Args {
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.filter(|s| *s > 0).map(Duration::from_secs)
    }

    pub fn error_revert(&self) -> Duration {
        Duration::from_millis(self.error_revert_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_layout() {
        let args = Args::try_parse_from(["graph-chat-client"]).unwrap();
        assert_eq!(args.stream_path, "/api/chat/stream");
        assert_eq!(args.error_revert(), Duration::from_millis(3000));
        assert_eq!(args.idle_timeout(), None);
        assert!(args.question.is_none());
    }

    #[test]
    fn zero_idle_timeout_disables_it() {
        let args = Args::try_parse_from(["graph-chat-client", "--idle-timeout-secs", "0"]).unwrap();
        assert_eq!(args.idle_timeout(), None);

        let args = Args::try_parse_from(["graph-chat-client", "--idle-timeout-secs", "30"]).unwrap();
        assert_eq!(args.idle_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn one_shot_question() {
        let args = Args::try_parse_from(["graph-chat-client", "-q", "What is X?"]).unwrap();
        assert_eq!(args.question.as_deref(), Some("What is X?"));
    }
}
