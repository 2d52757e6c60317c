//! Agent personas.
//!
//! An [`AgentSpec`] is the static description of a persona (role, goal, backstory) as it
//! is written in configuration. [`PipelineBuilder::build`](crate::pipeline::PipelineBuilder::build)
//! resolves every spec into an immutable [`Agent`]: the goal template is parsed, a client is
//! bound and the agent receives its [`AgentId`] in the pipeline.
//!
//! # Example
//!
//! ```rust
//! use agentcrew::agent::AgentSpec;
//!
//! let researcher = AgentSpec::new(
//!     "Pesquisador",
//!     "Encontrar fontes confiáveis sobre {topic}",
//!     "Bibliotecário acadêmico com vinte anos de experiência.",
//! )
//! .allow_delegation(true)
//! .with_max_iterations(10);
//!
//! assert_eq!(researcher.role(), "Pesquisador");
//! ```

use crate::client_wrapper::ClientWrapper;
use crate::template::{Template, TemplateError, TemplateParams};
use crate::tool_protocol::Tool;
use std::fmt;
use std::sync::Arc;

/// Model calls one task may take when none are configured. Only agents with tools ever
/// need more than one.
pub const DEFAULT_MAX_ITERATIONS: u32 = 15;

/// Position of an agent in its pipeline's agent set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub usize);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

/// Unresolved persona description.
#[derive(Clone)]
pub struct AgentSpec {
    pub(crate) role: String,
    pub(crate) goal: String,
    pub(crate) backstory: String,
    pub(crate) allow_delegation: bool,
    pub(crate) max_iterations: u32,
    pub(crate) client: Option<Arc<dyn ClientWrapper>>,
    pub(crate) tools: Vec<Arc<dyn Tool>>,
}

impl AgentSpec {
    pub fn new(
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            allow_delegation: false,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            client: None,
            tools: Vec::new(),
        }
    }

    /// Allow this agent's tasks to be routed through another agent.
    pub fn allow_delegation(mut self, allow: bool) -> Self {
        self.allow_delegation = allow;
        self
    }

    /// Cap on model calls per task, tool round-trips included. Must be positive.
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Use a dedicated client instead of the pipeline's default one.
    pub fn with_client(mut self, client: Arc<dyn ClientWrapper>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub(crate) fn resolve(
        self,
        id: AgentId,
        default_client: &Arc<dyn ClientWrapper>,
        declared: &[&str],
    ) -> Result<Agent, TemplateError> {
        let goal = Template::parse(self.goal, declared)?;
        Ok(Agent {
            id,
            role: self.role,
            goal,
            backstory: self.backstory,
            allow_delegation: self.allow_delegation,
            max_iterations: self.max_iterations,
            client: self
                .client
                .unwrap_or_else(|| Arc::clone(default_client)),
            tools: self.tools,
        })
    }
}

impl fmt::Debug for AgentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentSpec")
            .field("role", &self.role)
            .field("goal", &self.goal)
            .field("allow_delegation", &self.allow_delegation)
            .field("max_iterations", &self.max_iterations)
            .field(
                "client",
                &self.client.as_ref().map(|c| c.model_name().to_string()),
            )
            .field("tools", &tool_names(&self.tools))
            .finish()
    }
}

/// A resolved persona. Immutable for the lifetime of its pipeline.
pub struct Agent {
    id: AgentId,
    role: String,
    goal: Template,
    backstory: String,
    allow_delegation: bool,
    max_iterations: u32,
    client: Arc<dyn ClientWrapper>,
    tools: Vec<Arc<dyn Tool>>,
}

impl Agent {
    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn goal(&self) -> &Template {
        &self.goal
    }

    pub fn backstory(&self) -> &str {
        &self.backstory
    }

    pub fn allows_delegation(&self) -> bool {
        self.allow_delegation
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn client(&self) -> &Arc<dyn ClientWrapper> {
        &self.client
    }

    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// The system message for one call: the chat prompt picked for this question (if any)
    /// followed by the persona.
    pub fn system_prompt(
        &self,
        chat_prompt: Option<&str>,
        params: &TemplateParams,
    ) -> Result<String, TemplateError> {
        let mut prompt = String::new();

        if let Some(chat_prompt) = chat_prompt.filter(|p| !p.trim().is_empty()) {
            prompt.push_str(chat_prompt);
            prompt.push_str("\n\n");
        }

        prompt.push_str(&format!("You are {}.\n", self.role));
        if !self.backstory.trim().is_empty() {
            prompt.push_str(&self.backstory);
            prompt.push('\n');
        }
        prompt.push_str(&format!("Your personal goal is: {}", self.goal.render(params)?));

        Ok(prompt)
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("goal", &self.goal.source())
            .field("allow_delegation", &self.allow_delegation)
            .field("max_iterations", &self.max_iterations)
            .field("model", &self.client.model_name())
            .field("tools", &tool_names(&self.tools))
            .finish()
    }
}

fn tool_names(tools: &[Arc<dyn Tool>]) -> Vec<&str> {
    tools.iter().map(|t| t.name()).collect()
}
