use log::{ debug, info, warn };
use std::sync::Arc;
use tokio::time::Instant;
use uuid::Uuid;

use crate::dispatcher::{ Dispatch, EventDispatcher };
use crate::models::chat::ChatMessage;
use crate::models::events::{ FailureKind, SessionFailure, TransportEvent };
use crate::sink::{ publish_status, PresentationSink };
use crate::status::{
    StatusCategory,
    StatusController,
    StatusState,
    CONNECTION_ERROR_LABEL,
    ERROR_LABEL,
    PROCESSING_LABEL,
};
use crate::transport::{ Connection, Connector };

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Opened,
    AwaitingFirstContent,
    Generating,
    Completed,
    Errored,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Errored | SessionStatus::Cancelled)
    }
}

/// One question/answer cycle and the connection it exclusively owns.
pub struct StreamSession {
    id: Uuid,
    question: String,
    status: SessionStatus,
    dispatcher: EventDispatcher,
    connection: Option<Connection>,
}

impl StreamSession {
    fn new(question: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: question.to_string(),
            status: SessionStatus::Opened,
            dispatcher: EventDispatcher::new(),
            connection: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    fn close(&mut self, status: SessionStatus) {
        if let Some(connection) = self.connection.take() {
            debug!(
                "Closing connection for session {} after {:?}",
                self.id,
                connection.opened_at().elapsed()
            );
        }
        self.status = status;
    }
}

/// Owns the single active session, the status line and the transcript.
pub struct SessionManager<S: PresentationSink> {
    sink: S,
    connector: Arc<dyn Connector>,
    status: StatusController,
    active: Option<StreamSession>,
    last: Option<StreamSession>,
    processing: bool,
    transcript: Vec<ChatMessage>,
}

impl<S: PresentationSink> SessionManager<S> {
    pub fn new(sink: S, connector: Arc<dyn Connector>, status: StatusController) -> Self {
        Self {
            sink,
            connector,
            status,
            active: None,
            last: None,
            processing: false,
            transcript: Vec::new(),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn status(&self) -> &StatusState {
        self.status.state()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn active_session(&self) -> Option<&StreamSession> {
        self.active.as_ref()
    }

    /// The most recent session that reached a terminal state.
    pub fn last_session(&self) -> Option<&StreamSession> {
        self.last.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.processing
    }

    /// Starts a session for `question`. Returns `false` without side effects
    /// when the question is blank or a session is still being processed.
    pub fn submit(&mut self, question: &str) -> bool {
        let question = question.trim();
        if question.is_empty() {
            debug!("Ignoring empty submission");
            return false;
        }
        if self.processing {
            debug!("Ignoring submission while a session is in progress");
            return false;
        }
        self.start(question);
        true
    }

    /// Replaces any open session with a new one for `question`.
    pub fn interrupt(&mut self, question: &str) -> bool {
        let question = question.trim();
        if question.is_empty() {
            debug!("Ignoring empty submission");
            return false;
        }
        if let Some(session) = self.active.take() {
            self.cancel_session(session);
        }
        self.start(question);
        true
    }

    pub fn cancel(&mut self) {
        let Some(session) = self.active.take() else {
            return;
        };
        self.cancel_session(session);
        self.release();
        publish_status(&mut self.sink, self.status.set_ready());
    }

    fn start(&mut self, question: &str) {
        self.sink.append_user_message(question);
        self.transcript.push(ChatMessage::user(question));
        self.sink.reset_input();

        self.processing = true;
        self.sink.set_input_enabled(false);
        publish_status(&mut self.sink, self.status.set(PROCESSING_LABEL, StatusCategory::Processing));

        if let Some(prior) = self.active.take() {
            warn!("Session {} still open at submission; cancelling it", prior.id);
            self.cancel_session(prior);
        }

        let mut session = StreamSession::new(question);
        session.dispatcher.begin(&mut self.sink);
        session.connection = Some(Connection::new(self.connector.open(question)));
        info!("Session {} opened for question: {}", session.id, question);
        self.active = Some(session);
    }

    fn cancel_session(&mut self, mut session: StreamSession) {
        session.close(SessionStatus::Cancelled);
        session.dispatcher.discard();
        session.dispatcher.abort(&mut self.sink);
        info!("Session {} cancelled: {}", session.id, session.question());
        self.last = Some(session);
    }

    /// Waits for the active connection's next event. Never resolves while no
    /// connection is open.
    pub async fn next_transport_event(&mut self) -> Option<TransportEvent> {
        match self.active.as_mut().and_then(|s| s.connection.as_mut()) {
            Some(connection) => connection.next().await,
            None => std::future::pending::<Option<TransportEvent>>().await,
        }
    }

    /// Handles one item from the active connection; `None` means the server
    /// ended the stream.
    pub fn handle_transport(&mut self, event: Option<TransportEvent>) {
        let Some(session) = self.active.as_mut().filter(|s| s.is_connected()) else {
            debug!("No open connection; dropping transport event {:?}", event);
            return;
        };
        match event {
            None => self.fail(SessionFailure::transport("connection closed by server")),
            Some(TransportEvent::Failure(detail)) => self.fail(SessionFailure::transport(detail)),
            Some(TransportEvent::Connected) => {
                if session.status == SessionStatus::Opened {
                    session.status = SessionStatus::AwaitingFirstContent;
                }
            }
            Some(TransportEvent::Event(event)) => {
                let outcome = session.dispatcher.dispatch(event, &mut self.sink, &mut self.status);
                if session.dispatcher.is_generating() && !session.status.is_terminal() {
                    session.status = SessionStatus::Generating;
                }
                match outcome {
                    Dispatch::Continue => {}
                    Dispatch::Completed(message) => self.complete(message),
                    Dispatch::Failed(failure) => self.fail(failure),
                }
            }
        }
    }

    fn complete(&mut self, message: ChatMessage) {
        let Some(mut session) = self.active.take() else {
            return;
        };
        session.close(SessionStatus::Completed);
        info!("Session {} completed ({} chars)", session.id, message.content.len());
        self.transcript.push(message);
        self.last = Some(session);

        self.release();
        publish_status(&mut self.sink, self.status.set_ready());
    }

    fn fail(&mut self, failure: SessionFailure) {
        let Some(mut session) = self.active.take() else {
            return;
        };
        session.dispatcher.abort(&mut self.sink);
        let text = failure.chat_text();
        self.sink.append_bot_message(&text);
        self.transcript.push(ChatMessage::bot(text));
        session.close(SessionStatus::Errored);
        warn!("Session {} failed ({}): {}", session.id, session.question(), failure);
        self.last = Some(session);

        self.release();
        let label = match failure.kind {
            FailureKind::Application => ERROR_LABEL,
            FailureKind::Transport => CONNECTION_ERROR_LABEL,
        };
        publish_status(&mut self.sink, self.status.set_error(label));
    }

    fn release(&mut self) {
        self.processing = false;
        self.sink.set_input_enabled(true);
    }

    pub fn revert_deadline(&self) -> Option<Instant> {
        self.status.revert_deadline()
    }

    pub fn revert_status_if_due(&mut self, now: Instant) {
        if let Some(state) = self.status.revert_if_due(now) {
            debug!("Status reverted to {}", state.label);
            publish_status(&mut self.sink, state);
        }
    }
}
