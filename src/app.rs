use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::client::{AnswerClient, AskError};

/// Shown in place of an answer whenever a request fails, regardless of
/// why. The actual reason goes to the log file, never to the chat.
pub const FALLBACK_ANSWER: &str =
    "Desculpe, não consegui buscar a resposta agora. Tente de novo em instantes.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Ai,
}

/// One chat line. Immutable once appended to the log.
#[derive(Debug, Clone)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
}

impl Message {
    pub fn user(text: String) -> Self {
        Self {
            text,
            sender: Sender::User,
        }
    }

    pub fn ai(text: String) -> Self {
        Self {
            text,
            sender: Sender::Ai,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Awaiting,
}

/// Owns the message log and the single-slot request state. `status` is
/// `Awaiting` exactly while `task` holds the one outstanding request;
/// the typing indicator is rendered from `status`, so it can never
/// outlive the request it belongs to.
pub struct App {
    pub should_quit: bool,

    // Conversation log (append-only, insertion order)
    pub messages: Vec<Message>,

    // Input bar
    pub input: String,
    pub cursor: usize, // char index, not byte index

    // Request state
    pub status: Status,
    pub task: Option<JoinHandle<Result<String, AskError>>>,

    // Typing-indicator animation (0-2 for the ellipsis)
    pub animation_frame: u8,

    // Chat viewport, updated during render
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,

    pub client: AnswerClient,
}

impl App {
    pub fn new(client: AnswerClient) -> Self {
        Self {
            should_quit: false,
            messages: Vec::new(),
            input: String::new(),
            cursor: 0,
            status: Status::Idle,
            task: None,
            animation_frame: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            client,
        }
    }

    /// Submit whatever is in the input bar. A no-op while a request is
    /// outstanding, and a no-op for input that trims to nothing.
    pub fn submit(&mut self) {
        if self.status == Status::Awaiting {
            return;
        }

        let question = self.input.trim().to_string();
        if question.is_empty() {
            return;
        }

        // Clear the input before the request settles
        self.input.clear();
        self.cursor = 0;

        self.messages.push(Message::user(question.clone()));
        self.status = Status::Awaiting;
        self.animation_frame = 0;
        self.scroll_chat_to_bottom();

        debug!(%question, "dispatching question");
        let client = self.client.clone();
        self.task = Some(tokio::spawn(async move { client.ask(&question).await }));
    }

    /// Called on every tick. Settles the outstanding request once it has
    /// finished; does nothing while it is still in flight.
    pub async fn poll_answer(&mut self) {
        if !self.task.as_ref().is_some_and(JoinHandle::is_finished) {
            return;
        }
        let Some(task) = self.task.take() else {
            return;
        };

        let outcome = match task.await {
            Ok(Ok(answer)) => Ok(answer),
            Ok(Err(err)) => Err(err.to_string()),
            Err(err) => Err(format!("answer task aborted: {err}")),
        };
        self.settle(outcome);
    }

    /// Leave `Awaiting` and append the answer, or the fixed fallback text
    /// when the request failed. The diagnostic reason is logged only.
    pub fn settle(&mut self, outcome: Result<String, String>) {
        self.status = Status::Idle;
        match outcome {
            Ok(answer) => self.messages.push(Message::ai(answer)),
            Err(reason) => {
                warn!(%reason, "answer request failed");
                self.messages.push(Message::ai(FALLBACK_ANSWER.to_string()));
            }
        }
        self.scroll_chat_to_bottom();
    }

    /// Advance the ellipsis while waiting (called by Tick).
    pub fn tick_animation(&mut self) {
        if self.status == Status::Awaiting {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_chat_down(&mut self, lines: u16) {
        let max = self.chat_line_count().saturating_sub(self.visible_chat_height());
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
    }

    /// Scroll so the newest entry (indicator included) is visible.
    pub fn scroll_chat_to_bottom(&mut self) {
        self.chat_scroll = self
            .chat_line_count()
            .saturating_sub(self.visible_chat_height());
    }

    /// Wrap-aware estimate of how many lines the chat pane holds,
    /// mirroring how the render lays messages out.
    fn chat_line_count(&self) -> u16 {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total: u16 = 0;
        for msg in &self.messages {
            total += 1; // label line ("Você:" / "Chiquinho:")
            for line in msg.text.lines() {
                // Character count, not byte length, for UTF-8 text
                let char_count = line.chars().count();
                if char_count == 0 {
                    total += 1;
                } else {
                    total += (char_count / wrap_width + 1) as u16;
                }
            }
            total += 1; // blank line after each message
        }

        if self.status == Status::Awaiting {
            total += 2; // label + animated "Pensando..."
        }

        total
    }

    fn visible_chat_height(&self) -> u16 {
        if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        }
    }
}
