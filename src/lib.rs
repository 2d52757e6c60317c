//! # agentcrew
//!
//! agentcrew runs a small, fixed crew of LLM personas (for example a researcher, a writer
//! and an evaluator) over one user question. Each persona owns one task; tasks run strictly
//! in sequence and each one sees the previous task's output.
//!
//! The crate provides:
//!
//! * **Validated pipelines**: [`PipelineBuilder`] resolves every task owner, delegate and
//!   `{topic}` placeholder before anything is sent, so a [`Pipeline`] that builds can only
//!   fail because of the remote endpoint.
//! * **Rate-limit handling**: throttled calls are retried under a bounded
//!   [`retry::RetryPolicy`], and a process-wide [`RateLimiter`] keeps per-model budgets
//!   behind a lock so concurrent sessions never race on a counter.
//! * **Conversation state**: [`Session`] keeps the turn history, the memory window replayed
//!   to the model and the alternation between the primary and secondary chat prompts.
//! * **A chat facade**: [`chat::CrewChat`] turns one question (plus optional JSON/CSV
//!   attachments) into one answer and one recorded turn.
//! * **Provider access**: the [`ClientWrapper`] trait, implemented for Groq's hosted models
//!   by [`clients::groq::GroqClient`].
//! * **Tools**: agents can call [`Tool`]s such as [`tools::WebSearchTool`] between model
//!   calls, bounded by their iteration limit.
//!
//! ## Getting Started
//!
//! ```rust,no_run
//! use agentcrew::chat::CrewChat;
//! use agentcrew::config::CrewConfig;
//! use agentcrew::presets::academic_crew;
//! use agentcrew::RateLimiter;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     agentcrew::init_logger();
//!
//!     let config = CrewConfig::from_secrets_file("secrets.toml")?;
//!     let limiter = Arc::new(RateLimiter::with_default_ceilings());
//!
//!     let pipeline = academic_crew(Arc::new(config.groq_client()?))
//!         .with_rate_limiter(limiter)
//!         .build()?;
//!     let chat = CrewChat::new(Arc::new(pipeline), config.prompt_selector());
//!
//!     let mut session = config.new_session()?;
//!     let reply = chat.ask(&mut session, "energia solar").await?;
//!     for notice in &reply.notices {
//!         eprintln!("{}", notice);
//!     }
//!     println!("{}", reply.answer);
//!     Ok(())
//! }
//! ```

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// ```rust
/// agentcrew::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

// Import the top-level `agentcrew` module.
pub mod agentcrew;

// Re-exporting key items for easier external access.
pub use agentcrew::agent;
pub use agentcrew::agent::{Agent, AgentId, AgentSpec};
pub use agentcrew::artifact;
pub use agentcrew::attachment;
pub use agentcrew::chat;
pub use agentcrew::client_wrapper;
pub use agentcrew::client_wrapper::{ClientError, ClientWrapper, Message, Role, TokenUsage};
pub use agentcrew::clients;
pub use agentcrew::config;
pub use agentcrew::event;
pub use agentcrew::event::{EventHandler, PipelineEvent};
pub use agentcrew::pipeline;
pub use agentcrew::pipeline::{Pipeline, PipelineBuilder, PipelineError, PipelineOutput, RunRequest};
pub use agentcrew::presets;
pub use agentcrew::prompt_selector;
pub use agentcrew::prompt_selector::{PromptSelector, PromptVariant};
pub use agentcrew::rate_limit;
pub use agentcrew::rate_limit::RateLimiter;
pub use agentcrew::retry;
pub use agentcrew::session;
pub use agentcrew::session::{Session, Turn};
pub use agentcrew::task;
pub use agentcrew::task::{Task, TaskSpec};
pub use agentcrew::template;
pub use agentcrew::tool_protocol;
pub use agentcrew::tool_protocol::{Tool, ToolResult};
pub use agentcrew::tools;
