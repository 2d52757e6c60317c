//! The remote model seam.
//!
//! A [`ClientWrapper`] is a wrapper around a hosted chat-completion service. It only knows
//! how to turn a list of [`Message`]s into one assistant [`Message`]; it does not keep track
//! of the conversation, of rate-limit budgets or of retries. Those concerns live in
//! [`Session`](crate::Session), [`RateLimiter`](crate::RateLimiter) and
//! [`retry`](crate::retry) respectively.
//!
//! Implementations signal throttling with [`ClientError::RateLimited`] so the retry policy
//! can tell it apart from every other failure.

use async_trait::async_trait;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Represents the possible roles for a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Role {
    // set by the developer to steer the model's responses
    System,
    // a message sent by a human user (or app user)
    User,
    // lets the model know the content was generated as a response to a user message
    Assistant,
}

impl Role {
    /// Wire name used by OpenAI-compatible chat endpoints.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// How many tokens were spent on prompt vs. completion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub total_tokens: usize,
}

/// Represents a generic message to be sent to an LLM.
#[derive(Clone, Debug)]
pub struct Message {
    /// The role associated with the message.
    pub role: Role,
    /// The actual content of the message. Stored as `Arc<str>` so cloning is cheap.
    pub content: Arc<str>,
}

impl Message {
    pub fn new(role: Role, content: impl AsRef<str>) -> Self {
        Self {
            role,
            content: Arc::from(content.as_ref()),
        }
    }
}

/// What the remote endpoint told us about how long to back off.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WaitHint {
    /// The endpoint suggested a concrete wait.
    Suggested(Duration),
    /// The endpoint did not say anything about waiting.
    Absent,
    /// The endpoint sent a wait value we could not read. The raw value is kept for the
    /// user-visible warning.
    Unparseable(String),
}

/// Failures reported by a [`ClientWrapper`].
#[derive(Debug, Clone)]
pub enum ClientError {
    /// The endpoint throttled the request.
    RateLimited { wait: WaitHint, message: String },
    /// The endpoint answered with a non-success status other than throttling.
    Api { status: u16, message: String },
    /// The request never produced an HTTP response (DNS, TLS, timeout...).
    Transport(String),
    /// The endpoint answered 2xx but the body did not contain a completion.
    InvalidResponse(String),
}

impl ClientError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ClientError::RateLimited { .. })
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::RateLimited { message, .. } => write!(f, "Rate limited: {}", message),
            ClientError::Api { status, message } => {
                write!(f, "API error ({}): {}", status, message)
            }
            ClientError::Transport(msg) => write!(f, "Transport error: {}", msg),
            ClientError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
        }
    }
}

impl Error for ClientError {}

/// Trait defining the interface to interact with a hosted LLM.
#[async_trait]
pub trait ClientWrapper: Send + Sync {
    /// Send the full message list and get the assistant reply.
    async fn send_message(&self, messages: &[Message]) -> Result<Message, ClientError>;

    /// Model identifier used to key rate-limit budgets.
    fn model_name(&self) -> &str;

    /// Usage from the *last* `send_message()` call.
    /// The default reads [`usage_slot`](ClientWrapper::usage_slot) so wrappers that do not
    /// track usage don't have to implement anything.
    async fn get_last_usage(&self) -> Option<TokenUsage> {
        match self.usage_slot() {
            Some(slot) => slot.lock().await.clone(),
            None => None,
        }
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        // Wrappers supporting TokenUsage tracking should return their slot here.
        None
    }
}
