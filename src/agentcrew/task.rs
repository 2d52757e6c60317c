//! Units of work in a pipeline.
//!
//! A [`TaskSpec`] names its owner (and optional delegate) by role. Once the pipeline is
//! built those names are replaced by [`AgentId`]s, so a [`Task`] can never point at an
//! agent that does not exist.

use crate::agent::AgentId;
use crate::template::{Template, TemplateError};

/// Unresolved task description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub(crate) description: String,
    pub(crate) expected_output: String,
    pub(crate) agent_role: String,
    pub(crate) delegate_role: Option<String>,
    pub(crate) output_file: Option<String>,
}

impl TaskSpec {
    pub fn new(
        description: impl Into<String>,
        expected_output: impl Into<String>,
        agent_role: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            expected_output: expected_output.into(),
            agent_role: agent_role.into(),
            delegate_role: None,
            output_file: None,
        }
    }

    /// Persist the task's output under `name` through the pipeline's artifact sink.
    pub fn with_output_file(mut self, name: impl Into<String>) -> Self {
        self.output_file = Some(name.into());
        self
    }

    /// Route this task's request through the agent playing `role`.
    /// The owner must allow delegation.
    pub fn delegate_to(mut self, role: impl Into<String>) -> Self {
        self.delegate_role = Some(role.into());
        self
    }

    pub fn agent_role(&self) -> &str {
        &self.agent_role
    }
}

/// A resolved task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub(crate) description: Template,
    pub(crate) expected_output: Template,
    pub(crate) agent: AgentId,
    pub(crate) delegate: Option<AgentId>,
    pub(crate) output_file: Option<String>,
}

impl Task {
    pub(crate) fn resolve(
        spec: TaskSpec,
        agent: AgentId,
        delegate: Option<AgentId>,
        declared: &[&str],
    ) -> Result<Self, TemplateError> {
        Ok(Self {
            description: Template::parse(spec.description, declared)?,
            expected_output: Template::parse(spec.expected_output, declared)?,
            agent,
            delegate,
            output_file: spec.output_file,
        })
    }

    pub fn description(&self) -> &Template {
        &self.description
    }

    pub fn expected_output(&self) -> &Template {
        &self.expected_output
    }

    pub fn agent(&self) -> AgentId {
        self.agent
    }

    pub fn delegate(&self) -> Option<AgentId> {
        self.delegate
    }

    pub fn output_file(&self) -> Option<&str> {
        self.output_file.as_deref()
    }
}
