//! Pipeline event callbacks.
//!
//! Implement [`EventHandler`] and register it with
//! [`PipelineBuilder::with_event_handler`](crate::pipeline::PipelineBuilder::with_event_handler)
//! to follow a run as it happens: task boundaries, rate-limit waits, tool calls and
//! artifact writes.
//! The single method has a default no-op implementation.
//!
//! ```rust,no_run
//! use agentcrew::event::{EventHandler, PipelineEvent};
//! use async_trait::async_trait;
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl EventHandler for Printer {
//!     async fn on_pipeline_event(&self, event: &PipelineEvent) {
//!         if let PipelineEvent::TaskStarted { index, agent_role, .. } = event {
//!             println!("task {} -> {}", index, agent_role);
//!         }
//!     }
//! }
//! ```

use crate::client_wrapper::TokenUsage;
use async_trait::async_trait;
use std::time::Duration;

/// Events emitted by [`Pipeline::run`](crate::pipeline::Pipeline::run).
///
/// ```text
/// RunStarted
///   └─ TaskStarted { index: 0 }
///       └─ (BudgetExhausted | RateLimited | ToolCalled)*
///       └─ ToolLimitReached?
///       └─ TaskCompleted { index: 0 }
///       └─ ArtifactWritten?
///   └─ TaskStarted { index: 1 } ...
/// RunCompleted | RunFailed
/// ```
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    RunStarted {
        topic: String,
        task_count: usize,
    },
    TaskStarted {
        index: usize,
        /// Role of the agent that owns the task.
        agent_role: String,
        /// Role of the agent the request is routed through, if delegated.
        delegate_role: Option<String>,
    },
    TaskCompleted {
        index: usize,
        agent_role: String,
        response_length: usize,
        /// `None` when the client did not report usage.
        tokens_used: Option<TokenUsage>,
    },
    /// The local budget for `model` was spent; the runner is cooling down before calling.
    BudgetExhausted { model: String, wait: Duration },
    /// The endpoint throttled attempt `attempt` (1-based); the runner sleeps `wait`.
    RateLimited {
        model: String,
        attempt: u32,
        wait: Duration,
    },
    /// An agent ran one of its tools; `call` counts from 1 within the task.
    ToolCalled {
        index: usize,
        agent_role: String,
        tool_name: String,
        call: u32,
        success: bool,
    },
    /// The model still wanted a tool after `max_iterations` calls; its last reply was kept.
    ToolLimitReached {
        index: usize,
        agent_role: String,
        max_iterations: u32,
    },
    ArtifactWritten { index: usize, name: String },
    RunCompleted {
        task_count: usize,
        total_tokens: usize,
    },
    RunFailed {
        /// Index of the task that failed, when the failure happened inside a task.
        index: Option<usize>,
        error: String,
    },
}

/// Receives [`PipelineEvent`]s. Shared as `Arc<dyn EventHandler>`.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn on_pipeline_event(&self, _event: &PipelineEvent) {}
}
