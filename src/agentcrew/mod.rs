// src/agentcrew/mod.rs

pub mod agent;
pub mod artifact;
pub mod attachment;
pub mod chat;
pub mod client_wrapper;
pub mod clients;
pub mod config;
pub mod event;
pub mod pipeline;
pub mod presets;
pub mod prompt_selector;
pub mod rate_limit;
pub mod retry;
pub mod session;
pub mod task;
pub mod template;
pub mod tool_protocol;
pub mod tools;

// Export the types every caller touches so they are reachable as agentcrew::Pipeline etc.
pub use pipeline::{Pipeline, PipelineBuilder};
pub use rate_limit::RateLimiter;
pub use session::Session;
