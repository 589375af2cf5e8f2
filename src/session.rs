//! Session-scoped chat state and the send/receive flow.

use log::{debug, info};
use std::sync::Arc;
use crate::exchange::{ChatRequest, ConnectivityProbe, Exchange, Transport};
use crate::locale::Language;
use crate::messages::{ChatMessage, MessageLog};
use crate::state::UiState;

/// Everything one conversation owns. Nothing here is shared between
/// sessions.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub messages: MessageLog,
    pub client_id: String,
    pub state: UiState,
    pub language: Language,
    /// Current contents of the input control.
    pub input: String,
}

impl ChatSession {
    pub fn new(client_id: String, language: Language) -> Self {
        Self {
            messages: MessageLog::new(),
            client_id,
            state: UiState::Idle,
            language,
            input: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing to send after trimming.
    Empty,
    /// An exchange is already pending.
    Busy,
    /// The user message was appended and the exchange completed.
    Sent,
}

/// A chat session wired to an endpoint.
pub struct ChatClient {
    session: ChatSession,
    transport: Arc<dyn Transport>,
    probe: Arc<dyn ConnectivityProbe>,
}

impl ChatClient {
    pub fn new(
        session: ChatSession,
        transport: Arc<dyn Transport>,
        probe: Arc<dyn ConnectivityProbe>,
    ) -> Self {
        Self {
            session,
            transport,
            probe,
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ChatSession {
        &mut self.session
    }

    pub fn messages(&self) -> &MessageLog {
        &self.session.messages
    }

    pub fn state(&self) -> UiState {
        self.session.state
    }

    /// Start an exchange: append the user message, enter `Thinking` and
    /// return the exchange to run.
    ///
    /// `text` wins over the input buffer; the buffer is cleared only when it
    /// was the source. Returns the reason nothing happened otherwise, with
    /// the session untouched.
    pub fn prepare(&mut self, text: Option<&str>) -> Result<Exchange, SendOutcome> {
        let from_input = text.is_none();
        let trimmed = text.unwrap_or(&self.session.input).trim().to_string();
        if trimmed.is_empty() {
            return Err(SendOutcome::Empty);
        }
        if !self.session.state.begin() {
            debug!("Send ignored, an exchange is already pending");
            return Err(SendOutcome::Busy);
        }
        if from_input {
            self.session.input.clear();
        }

        self.session.messages.append(ChatMessage::user(trimmed.clone()));
        info!("Sending message ({} chars)", trimmed.chars().count());

        let request = ChatRequest {
            text: trimmed,
            client_id: self.session.client_id.clone(),
            language: self.session.language.as_str().to_string(),
        };
        Ok(Exchange::new(
            Arc::clone(&self.transport),
            Arc::clone(&self.probe),
            request,
            self.session.language,
        ))
    }

    /// Append the assistant reply and return to `Idle`.
    pub fn finish(&mut self, reply: String) {
        self.session.messages.append(ChatMessage::assistant(reply));
        self.session.state.finish();
    }

    /// Send `text` (or the input buffer) and wait for the reply.
    pub async fn send_text(&mut self, text: Option<&str>) -> SendOutcome {
        match self.prepare(text) {
            Ok(exchange) => {
                let reply = exchange.run().await;
                self.finish(reply);
                SendOutcome::Sent
            }
            Err(outcome) => outcome,
        }
    }
}
