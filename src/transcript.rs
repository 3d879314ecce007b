//! In-memory chat transcript and the session state around it.

use crate::error::{ClientError, SessionError};
use crate::types::Role;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What a transcript entry says
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    /// One element per newline-delimited segment of a reply
    Paragraphs(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub role: Role,
    pub content: Content,
}

impl Entry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Content::Text(text.into()),
        }
    }

    pub fn assistant(reply: &str) -> Self {
        Self {
            role: Role::Assistant,
            content: Content::Paragraphs(reply.split('\n').map(str::to_string).collect()),
        }
    }
}

/// Append-only, ordered list of chat turns. Never empty: it always starts
/// from the greeting, so there is no `Default`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    entries: Vec<Entry>,
}

impl Transcript {
    /// A transcript seeded with the assistant's greeting
    pub fn new(greeting: &str) -> Self {
        Self {
            entries: vec![Entry::assistant(greeting)],
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Record one successful exchange: the user's prompt, then the reply
    pub fn push_exchange(&mut self, prompt: &str, reply: &str) {
        self.entries.push(Entry::user(prompt));
        self.entries.push(Entry::assistant(reply));
    }

    /// Start a new chat
    pub fn reset(&mut self, greeting: &str) {
        *self = Self::new(greeting);
    }

    /// Display lines, oldest first
    pub fn render(&self) -> Vec<String> {
        self.render_from(0)
    }

    /// Display lines for entries at `start` and later
    pub fn render_from(&self, start: usize) -> Vec<String> {
        let mut lines = Vec::new();
        for entry in self.entries.iter().skip(start) {
            match (&entry.role, &entry.content) {
                (Role::User, Content::Text(text)) => lines.push(format!("you> {}", text)),
                (Role::Assistant, Content::Paragraphs(paragraphs)) => {
                    lines.extend(paragraphs.iter().map(|p| format!("bot> {}", p)));
                }
                (role, Content::Text(text)) => lines.push(format!("{:?}> {}", role, text)),
                (role, Content::Paragraphs(paragraphs)) => {
                    lines.extend(paragraphs.iter().map(|p| format!("{:?}> {}", role, p)));
                }
            }
            lines.push(String::new());
        }
        lines
    }
}

/// One round trip to something that turns a prompt into a reply
#[async_trait]
pub trait PromptSender: Send + Sync {
    async fn send_prompt(&self, prompt: &str) -> Result<String, ClientError>;
}

/// Draft captured by [`ChatSession::begin_submit`]
#[derive(Debug)]
#[must_use = "a pending submit must be finished"]
pub struct PendingSubmit {
    prompt: String,
}

impl PendingSubmit {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

/// Transcript plus the user's draft. Only one submit may be in flight,
/// so entries always appear in submission order.
#[derive(Debug)]
pub struct ChatSession {
    transcript: Transcript,
    draft: String,
    in_flight: bool,
    greeting: String,
}

impl ChatSession {
    pub fn new(greeting: impl Into<String>) -> Self {
        let greeting = greeting.into();
        Self {
            transcript: Transcript::new(&greeting),
            draft: String::new(),
            in_flight: false,
            greeting,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Capture the draft and mark the session busy
    pub fn begin_submit(&mut self) -> Result<PendingSubmit, SessionError> {
        if self.in_flight {
            return Err(SessionError::Busy);
        }
        if self.draft.trim().is_empty() {
            return Err(SessionError::EmptyDraft);
        }

        self.in_flight = true;
        Ok(PendingSubmit {
            prompt: std::mem::take(&mut self.draft),
        })
    }

    /// Apply the outcome of a pending submit.
    /// Success appends two entries. Failure leaves the transcript as it was
    /// and puts the prompt back into the draft.
    pub fn finish_submit(
        &mut self,
        pending: PendingSubmit,
        outcome: Result<String, ClientError>,
    ) -> Result<(), ClientError> {
        self.in_flight = false;

        match outcome {
            Ok(reply) => {
                self.transcript.push_exchange(&pending.prompt, &reply);
                Ok(())
            }
            Err(e) => {
                self.draft = pending.prompt;
                Err(e)
            }
        }
    }

    /// Send the current draft and wait for the reply
    pub async fn submit(&mut self, sender: &dyn PromptSender) -> anyhow::Result<()> {
        let pending = self.begin_submit()?;
        let outcome = sender.send_prompt(pending.prompt()).await;
        self.finish_submit(pending, outcome)?;
        Ok(())
    }

    /// Drop the conversation and start over from the greeting
    pub fn new_chat(&mut self) {
        self.transcript.reset(&self.greeting);
        self.draft.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const GREETING: &str = "How can I help you today?";

    struct Canned(Result<String, String>);

    #[async_trait]
    impl PromptSender for Canned {
        async fn send_prompt(&self, _prompt: &str) -> Result<String, ClientError> {
            self.0
                .clone()
                .map_err(|detail| ClientError::Relay(json!(detail)))
        }
    }

    #[test]
    fn test_new_transcript_has_greeting() {
        let transcript = Transcript::new(GREETING);

        assert_eq!(transcript.entries().len(), 1);
        assert_eq!(transcript.entries()[0], Entry::assistant(GREETING));
    }

    #[test]
    fn test_push_exchange_appends_user_then_assistant() {
        let mut transcript = Transcript::new(GREETING);
        transcript.push_exchange("Hello", "Hi there!\nHow can I help?");

        assert_eq!(transcript.entries().len(), 3);
        assert_eq!(transcript.entries()[1], Entry::user("Hello"));
        assert_eq!(
            transcript.entries()[2].content,
            Content::Paragraphs(vec!["Hi there!".into(), "How can I help?".into()])
        );
        assert_eq!(transcript.entries()[2].role, Role::Assistant);
    }

    #[test]
    fn test_render_one_line_per_paragraph() {
        let mut transcript = Transcript::new(GREETING);
        transcript.push_exchange("Hello", "a\nb");

        let lines = transcript.render();
        assert_eq!(
            lines,
            vec![
                format!("bot> {}", GREETING),
                String::new(),
                "you> Hello".to_string(),
                String::new(),
                "bot> a".to_string(),
                "bot> b".to_string(),
                String::new(),
            ]
        );
        assert_eq!(transcript.render_from(1)[0], "you> Hello");
    }

    #[test]
    fn test_entry_serializes_like_wire_message() {
        let value = serde_json::to_value(Entry::assistant("x\ny")).unwrap();
        assert_eq!(value, json!({ "role": "assistant", "content": ["x", "y"] }));
    }

    #[test]
    fn test_successful_submit_appends_two_entries() {
        let mut session = ChatSession::new(GREETING);
        session.set_draft("Hello");

        let pending = session.begin_submit().unwrap();
        assert!(session.is_busy());
        assert_eq!(session.draft(), "");

        session
            .finish_submit(pending, Ok("Hi there!\nHow can I help?".into()))
            .unwrap();

        assert!(!session.is_busy());
        assert_eq!(session.transcript().entries().len(), 3);
        assert_eq!(session.transcript().entries()[1], Entry::user("Hello"));
    }

    #[test]
    fn test_failed_submit_keeps_transcript_and_restores_draft() {
        let mut session = ChatSession::new(GREETING);
        session.set_draft("Hello");

        let pending = session.begin_submit().unwrap();
        let result = session.finish_submit(pending, Err(ClientError::Transport("refused".into())));

        assert!(result.is_err());
        assert_eq!(session.transcript().entries().len(), 1);
        assert_eq!(session.draft(), "Hello");
        assert!(!session.is_busy());
    }

    #[test]
    fn test_second_submit_while_busy_is_rejected() {
        let mut session = ChatSession::new(GREETING);
        session.set_draft("first");
        let pending = session.begin_submit().unwrap();

        session.set_draft("second");
        assert_eq!(session.begin_submit().unwrap_err(), SessionError::Busy);
        assert_eq!(session.draft(), "second");

        session.finish_submit(pending, Ok("one".into())).unwrap();
        let pending = session.begin_submit().unwrap();
        assert_eq!(pending.prompt(), "second");
        session.finish_submit(pending, Ok("two".into())).unwrap();

        let entries = session.transcript().entries();
        assert_eq!(entries[1], Entry::user("first"));
        assert_eq!(entries[3], Entry::user("second"));
    }

    #[test]
    fn test_blank_draft_is_not_sent() {
        let mut session = ChatSession::new(GREETING);
        session.set_draft("  ");

        assert_eq!(session.begin_submit().unwrap_err(), SessionError::EmptyDraft);
        assert!(!session.is_busy());
    }

    #[test]
    fn test_submit_through_sender() {
        let mut session = ChatSession::new(GREETING);
        session.set_draft("Hello");

        tokio_test::block_on(session.submit(&Canned(Ok("Hi".into())))).unwrap();
        assert_eq!(session.transcript().entries().len(), 3);

        session.set_draft("again");
        let result = tokio_test::block_on(session.submit(&Canned(Err("bad key".into()))));
        assert!(result.is_err());
        assert_eq!(session.transcript().entries().len(), 3);
        assert_eq!(session.draft(), "again");
    }

    #[test]
    fn test_new_chat_resets_to_greeting() {
        let mut session = ChatSession::new(GREETING);
        session.set_draft("Hello");
        let pending = session.begin_submit().unwrap();
        session.finish_submit(pending, Ok("Hi".into())).unwrap();
        session.set_draft("unsent");

        session.new_chat();

        assert_eq!(session.transcript(), &Transcript::new(GREETING));
        assert_eq!(session.transcript().entries()[0], Entry::assistant(GREETING));
        assert_eq!(session.draft(), "");
    }
}
