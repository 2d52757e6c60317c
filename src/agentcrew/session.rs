//! Per-conversation state.
//!
//! A [`Session`] lives as long as one user's conversation. It keeps every turn in
//! chronological order (there is no deletion), the memory window used when replaying
//! history to the model, and the prompt variant the [`PromptSelector`] picked last.
//!
//! ```
//! use agentcrew::session::Session;
//!
//! let mut session = Session::new(2).unwrap();
//! session.append_turn("Oi", "Olá!");
//! session.append_turn("Tudo bem?", "Tudo ótimo.");
//! session.append_turn("E o clima?", "Ensolarado.");
//!
//! let recent: Vec<_> = session.windowed_history(2).map(|t| t.question.as_str()).collect();
//! assert_eq!(recent, vec!["Tudo bem?", "E o clima?"]);
//! ```
//!
//! [`PromptSelector`]: crate::prompt_selector::PromptSelector

use crate::prompt_selector::PromptVariant;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::error::Error;
use std::fmt;
use uuid::Uuid;

/// Smallest accepted memory window.
pub const MIN_MEMORY_WINDOW: usize = 1;
/// Largest accepted memory window.
pub const MAX_MEMORY_WINDOW: usize = 50;
/// Window used by [`Session::default`].
pub const DEFAULT_MEMORY_WINDOW: usize = 5;

/// One question/answer exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub question: String,
    pub answer: String,
    pub at: DateTime<Utc>,
}

/// The memory window was outside `1..=50`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidMemoryWindow(pub usize);

impl fmt::Display for InvalidMemoryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Memory window must be between {} and {}, got {}",
            MIN_MEMORY_WINDOW, MAX_MEMORY_WINDOW, self.0
        )
    }
}

impl Error for InvalidMemoryWindow {}

/// Turn history plus prompt-alternation state for one conversation.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    turns: Vec<Turn>,
    memory_window: usize,
    last_prompt: Option<PromptVariant>,
}

impl Session {
    pub fn new(memory_window: usize) -> Result<Self, InvalidMemoryWindow> {
        validate_window(memory_window)?;
        Ok(Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            turns: Vec::new(),
            memory_window,
            last_prompt: None,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn memory_window(&self) -> usize {
        self.memory_window
    }

    /// Change the window used by [`memory`](Session::memory). Stored turns are untouched.
    pub fn set_memory_window(&mut self, memory_window: usize) -> Result<(), InvalidMemoryWindow> {
        validate_window(memory_window)?;
        self.memory_window = memory_window;
        Ok(())
    }

    pub fn append_turn(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.turns.push(Turn {
            question: question.into(),
            answer: answer.into(),
            at: Utc::now(),
        });
    }

    /// The `k` most recent turns, oldest first.
    ///
    /// The iterator borrows the history, so it can be cloned and re-read freely; reading
    /// it never changes the session.
    pub fn windowed_history(&self, k: usize) -> impl Iterator<Item = &Turn> + Clone + '_ {
        let start = self.turns.len().saturating_sub(k);
        self.turns[start..].iter()
    }

    /// [`windowed_history`](Session::windowed_history) using the session's own window.
    pub fn memory(&self) -> impl Iterator<Item = &Turn> + Clone + '_ {
        self.windowed_history(self.memory_window)
    }

    /// Every turn, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn get_last_prompt_variant(&self) -> Option<PromptVariant> {
        self.last_prompt
    }

    pub fn set_last_prompt_variant(&mut self, variant: PromptVariant) {
        self.last_prompt = Some(variant);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            turns: Vec::new(),
            memory_window: DEFAULT_MEMORY_WINDOW,
            last_prompt: None,
        }
    }
}

fn validate_window(memory_window: usize) -> Result<(), InvalidMemoryWindow> {
    if (MIN_MEMORY_WINDOW..=MAX_MEMORY_WINDOW).contains(&memory_window) {
        Ok(())
    } else {
        Err(InvalidMemoryWindow(memory_window))
    }
}
