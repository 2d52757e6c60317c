//! Sequential multi-agent task pipeline.
//!
//! A [`Pipeline`] is an ordered chain of one to three [`Task`]s, each owned by one
//! [`Agent`]. It is assembled with a [`PipelineBuilder`], which checks every reference
//! (task owners, delegates, template parameters) before anything is sent to a model, so a
//! pipeline that builds can only fail at run time because of the remote endpoint or the
//! artifact sink.
//!
//! [`Pipeline::run`] executes the tasks strictly in order. A task whose agent has no tools
//! makes exactly one successful remote call; agents with [tools](crate::tool_protocol) may
//! go back and forth with the model up to their `max_iterations`. The previous task's output
//! travels forward as context and the last task's output is the result. Throttled calls are
//! retried through [`RetryRunner`](crate::retry::RetryRunner).
//!
//! # Example
//!
//! ```rust,no_run
//! use agentcrew::agent::AgentSpec;
//! use agentcrew::clients::groq::{GroqClient, Model};
//! use agentcrew::pipeline::{PipelineBuilder, RunRequest};
//! use agentcrew::task::TaskSpec;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(GroqClient::new_with_model_enum(
//!         &std::env::var("GROQ_API_KEY")?,
//!         Model::Llama3_70b8192,
//!     ));
//!
//!     let pipeline = PipelineBuilder::new(client)
//!         .agent(AgentSpec::new("Pesquisador", "Pesquisar sobre {topic}", "Bibliotecário."))
//!         .agent(AgentSpec::new("Escritor", "Escrever sobre {topic}", "Redator técnico."))
//!         .task(TaskSpec::new("Liste fontes sobre {topic}", "Lista de 10 fontes", "Pesquisador"))
//!         .task(
//!             TaskSpec::new("Escreva um post sobre {topic}", "Post em markdown", "Escritor")
//!                 .with_output_file("blog-post.md"),
//!         )
//!         .build()?;
//!
//!     let output = pipeline.run(RunRequest::new("clima")).await?;
//!     println!("{}", output.final_output);
//!     Ok(())
//! }
//! ```

use crate::agent::{Agent, AgentId, AgentSpec};
use crate::artifact::{ArtifactError, ArtifactSink, FsArtifactSink};
use crate::client_wrapper::{ClientError, ClientWrapper, Message, Role, TokenUsage};
use crate::event::{EventHandler, PipelineEvent};
use crate::rate_limit::RateLimiter;
use crate::retry::{RetryError, RetryPolicy, RetryRunner, Sleeper, TokioSleeper};
use crate::session::Turn;
use crate::task::{Task, TaskSpec};
use crate::template::{TemplateError, TemplateParams, TOPIC};
use crate::tool_protocol::{parse_tool_call, tool_result_message, tools_prompt, ToolError};
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Most tasks a pipeline may chain.
pub const MAX_TASKS: usize = 3;

/// Errors raised while assembling or running a [`Pipeline`].
///
/// Run-time failures carry the notices gathered before the run stopped, such as the waits
/// already sat through.
#[derive(Debug, Clone)]
pub enum PipelineError {
    /// A task names an owner or delegate role that is not in the agent set.
    TaskBinding { task: usize, role: String },
    /// A task asks for delegation its owner is not allowed to make.
    DelegationNotAllowed {
        task: usize,
        owner: String,
        delegate: String,
    },
    /// The pipeline shape is invalid (task count, duplicate roles, zero iterations...).
    InvalidPipeline(String),
    Template(TemplateError),
    /// Blank question or topic.
    EmptyQuestion,
    /// The endpoint kept throttling task `task`, or sent a wait that could not be read.
    RateLimitExceeded {
        task: usize,
        model: String,
        attempts: u32,
        unknown_wait: Option<String>,
        notices: Vec<String>,
    },
    /// Any other remote failure; not retried.
    GenericRemoteFailure {
        task: usize,
        model: String,
        source: ClientError,
        notices: Vec<String>,
    },
    Artifact {
        task: usize,
        source: ArtifactError,
        notices: Vec<String>,
    },
}

impl PipelineError {
    /// User-facing notices collected before the failure.
    pub fn notices(&self) -> &[String] {
        match self {
            PipelineError::RateLimitExceeded { notices, .. }
            | PipelineError::GenericRemoteFailure { notices, .. }
            | PipelineError::Artifact { notices, .. } => notices,
            _ => &[],
        }
    }

    /// Put `earlier` ahead of the notices already carried. Errors without notices are
    /// returned unchanged.
    pub fn with_earlier_notices(mut self, mut earlier: Vec<String>) -> Self {
        if let PipelineError::RateLimitExceeded { notices, .. }
        | PipelineError::GenericRemoteFailure { notices, .. }
        | PipelineError::Artifact { notices, .. } = &mut self
        {
            earlier.append(notices);
            *notices = earlier;
        }
        self
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::TaskBinding { task, role } => write!(
                f,
                "Task {} references agent '{}' which is not part of the pipeline",
                task, role
            ),
            PipelineError::DelegationNotAllowed {
                task,
                owner,
                delegate,
            } => write!(
                f,
                "Task {}: agent '{}' may not delegate to '{}'",
                task, owner, delegate
            ),
            PipelineError::InvalidPipeline(msg) => write!(f, "Invalid pipeline: {}", msg),
            PipelineError::Template(err) => write!(f, "{}", err),
            PipelineError::EmptyQuestion => write!(f, "The question is empty"),
            PipelineError::RateLimitExceeded {
                task,
                model,
                unknown_wait: Some(_),
                ..
            } => write!(
                f,
                "Task {}: rate limit reached on {}, unknown wait time",
                task, model
            ),
            PipelineError::RateLimitExceeded {
                task,
                model,
                attempts,
                ..
            } => write!(
                f,
                "Task {}: rate limit on {} persisted after {} attempts",
                task, model, attempts
            ),
            PipelineError::GenericRemoteFailure {
                task,
                model,
                source,
                ..
            } => write!(f, "Task {}: call to {} failed: {}", task, model, source),
            PipelineError::Artifact { task, source, .. } => write!(f, "Task {}: {}", task, source),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Template(err) => Some(err),
            PipelineError::GenericRemoteFailure { source, .. } => Some(source),
            PipelineError::Artifact { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<TemplateError> for PipelineError {
    fn from(err: TemplateError) -> Self {
        PipelineError::Template(err)
    }
}

/// Inputs for one [`Pipeline::run`].
#[derive(Debug, Clone)]
pub struct RunRequest {
    params: TemplateParams,
    topic: String,
    chat_prompt: Option<String>,
    history: Vec<Turn>,
    reference_data: Option<String>,
}

impl RunRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        let topic = topic.into();
        Self {
            params: TemplateParams::topic(topic.clone()),
            topic,
            chat_prompt: None,
            history: Vec::new(),
            reference_data: None,
        }
    }

    /// Value for an extra parameter declared with
    /// [`PipelineBuilder::with_parameter`].
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params = self.params.with(name, value);
        self
    }

    /// Prompt text placed at the top of every system message.
    pub fn with_chat_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.chat_prompt = Some(prompt.into());
        self
    }

    /// Earlier turns replayed to every task, oldest first.
    pub fn with_history<'a>(mut self, turns: impl IntoIterator<Item = &'a Turn>) -> Self {
        self.history = turns.into_iter().cloned().collect();
        self
    }

    /// Text the user attached to the question. Given to the first task only.
    pub fn with_reference_data(mut self, data: impl Into<String>) -> Self {
        self.reference_data = Some(data.into());
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// What one task produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutput {
    pub index: usize,
    pub agent_role: String,
    pub delegate_role: Option<String>,
    pub output: String,
    /// Usage summed over every model call the task made.
    pub usage: Option<TokenUsage>,
    /// Remote call attempts, throttled ones and tool round-trips included.
    pub attempts: u32,
    pub tool_calls: u32,
    pub output_file: Option<String>,
}

/// What the model calls of one task came to.
struct TaskRun {
    output: String,
    usage: Option<TokenUsage>,
    attempts: u32,
    tool_calls: u32,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    /// Output of the last task.
    pub final_output: String,
    pub task_outputs: Vec<TaskOutput>,
    /// User-facing lines about waits taken during the run.
    pub notices: Vec<String>,
    pub total_tokens: usize,
}

/// Validating builder for [`Pipeline`].
pub struct PipelineBuilder {
    default_client: Arc<dyn ClientWrapper>,
    agents: Vec<AgentSpec>,
    tasks: Vec<TaskSpec>,
    parameters: Vec<String>,
    retry_policy: RetryPolicy,
    rate_limiter: Option<Arc<RateLimiter>>,
    sleeper: Arc<dyn Sleeper>,
    artifact_sink: Arc<dyn ArtifactSink>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl PipelineBuilder {
    /// `default_client` serves every agent that was not given its own client.
    pub fn new(default_client: Arc<dyn ClientWrapper>) -> Self {
        Self {
            default_client,
            agents: Vec::new(),
            tasks: Vec::new(),
            parameters: vec![TOPIC.to_string()],
            retry_policy: RetryPolicy::default(),
            rate_limiter: None,
            sleeper: Arc::new(TokioSleeper),
            artifact_sink: Arc::new(FsArtifactSink::new(".")),
            event_handler: None,
        }
    }

    pub fn agent(mut self, agent: AgentSpec) -> Self {
        self.agents.push(agent);
        self
    }

    /// Tasks run in the order they are added.
    pub fn task(mut self, task: TaskSpec) -> Self {
        self.tasks.push(task);
        self
    }

    /// Declare a template parameter besides `{topic}`.
    pub fn with_parameter(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.parameters.contains(&name) {
            self.parameters.push(name);
        }
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Share a process-wide limiter with this pipeline.
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_artifact_sink(mut self, sink: Arc<dyn ArtifactSink>) -> Self {
        self.artifact_sink = sink;
        self
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    pub fn build(self) -> Result<Pipeline, PipelineError> {
        if self.tasks.is_empty() || self.tasks.len() > MAX_TASKS {
            return Err(PipelineError::InvalidPipeline(format!(
                "expected 1 to {} tasks, got {}",
                MAX_TASKS,
                self.tasks.len()
            )));
        }

        let mut ids: HashMap<String, AgentId> = HashMap::new();
        for (index, spec) in self.agents.iter().enumerate() {
            if spec.max_iterations == 0 {
                return Err(PipelineError::InvalidPipeline(format!(
                    "agent '{}' must allow at least one iteration",
                    spec.role
                )));
            }
            for (position, tool) in spec.tools.iter().enumerate() {
                if spec.tools[..position].iter().any(|t| t.name() == tool.name()) {
                    return Err(PipelineError::InvalidPipeline(format!(
                        "agent '{}' has two tools named '{}'",
                        spec.role,
                        tool.name()
                    )));
                }
            }
            if ids.insert(spec.role.clone(), AgentId(index)).is_some() {
                return Err(PipelineError::InvalidPipeline(format!(
                    "duplicate agent role '{}'",
                    spec.role
                )));
            }
        }

        let declared: Vec<&str> = self.parameters.iter().map(String::as_str).collect();

        let mut tasks = Vec::with_capacity(self.tasks.len());
        for (index, spec) in self.tasks.into_iter().enumerate() {
            let owner = *ids
                .get(&spec.agent_role)
                .ok_or_else(|| PipelineError::TaskBinding {
                    task: index,
                    role: spec.agent_role.clone(),
                })?;

            let delegate = match &spec.delegate_role {
                None => None,
                Some(role) => {
                    let delegate = *ids.get(role).ok_or_else(|| PipelineError::TaskBinding {
                        task: index,
                        role: role.clone(),
                    })?;
                    if delegate == owner || !self.agents[owner.0].allow_delegation {
                        return Err(PipelineError::DelegationNotAllowed {
                            task: index,
                            owner: spec.agent_role.clone(),
                            delegate: role.clone(),
                        });
                    }
                    Some(delegate)
                }
            };

            tasks.push(Task::resolve(spec, owner, delegate, &declared)?);
        }

        let agents = self
            .agents
            .into_iter()
            .enumerate()
            .map(|(index, spec)| spec.resolve(AgentId(index), &self.default_client, &declared))
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!(
            "PipelineBuilder::build(): {} agents, {} tasks",
            agents.len(),
            tasks.len()
        );

        Ok(Pipeline {
            agents,
            tasks,
            retry_policy: self.retry_policy,
            rate_limiter: self.rate_limiter,
            sleeper: self.sleeper,
            artifact_sink: self.artifact_sink,
            event_handler: self.event_handler,
        })
    }
}

/// A validated chain of tasks. Cheap to share: `run` takes `&self`.
pub struct Pipeline {
    agents: Vec<Agent>,
    tasks: Vec<Task>,
    retry_policy: RetryPolicy,
    rate_limiter: Option<Arc<RateLimiter>>,
    sleeper: Arc<dyn Sleeper>,
    artifact_sink: Arc<dyn ArtifactSink>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

/// Everything a task needs that can be computed before the first remote call.
struct PreparedTask<'p> {
    owner: &'p Agent,
    caller: &'p Agent,
    system_prompt: String,
    description: String,
    expected_output: String,
}

impl Pipeline {
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.0)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Run every task in order and return the last task's output.
    ///
    /// All templates are rendered before the first call, so a missing parameter value
    /// fails the run without touching the endpoint.
    pub async fn run(&self, request: RunRequest) -> Result<PipelineOutput, PipelineError> {
        if request.topic.trim().is_empty() {
            return Err(PipelineError::EmptyQuestion);
        }

        self.emit(PipelineEvent::RunStarted {
            topic: request.topic.clone(),
            task_count: self.tasks.len(),
        })
        .await;

        let result = self.run_tasks(&request).await;
        match &result {
            Ok(output) => {
                log::info!(
                    "Pipeline::run(): completed {} tasks, {} tokens",
                    output.task_outputs.len(),
                    output.total_tokens
                );
                self.emit(PipelineEvent::RunCompleted {
                    task_count: output.task_outputs.len(),
                    total_tokens: output.total_tokens,
                })
                .await;
            }
            Err(err) => {
                log::error!("Pipeline::run(): {}", err);
                self.emit(PipelineEvent::RunFailed {
                    index: failed_task(err),
                    error: err.to_string(),
                })
                .await;
            }
        }
        result
    }

    async fn run_tasks(&self, request: &RunRequest) -> Result<PipelineOutput, PipelineError> {
        let prepared = self.prepare(request)?;

        let mut runner = RetryRunner::new(&self.retry_policy, self.sleeper.as_ref());
        if let Some(limiter) = &self.rate_limiter {
            runner = runner.with_limiter(limiter.as_ref());
        }
        if let Some(handler) = &self.event_handler {
            runner = runner.with_events(handler.as_ref());
        }

        let mut notices = Vec::new();
        let mut task_outputs: Vec<TaskOutput> = Vec::with_capacity(prepared.len());
        let mut total_tokens = 0usize;

        for (index, (task, step)) in self.tasks.iter().zip(&prepared).enumerate() {
            let delegated = step.caller.id() != step.owner.id();
            log::info!(
                "Pipeline::run(): task {} -> {}{}",
                index,
                step.owner.role(),
                if delegated {
                    format!(" (delegated to {})", step.caller.role())
                } else {
                    String::new()
                }
            );
            self.emit(PipelineEvent::TaskStarted {
                index,
                agent_role: step.owner.role().to_string(),
                delegate_role: delegated.then(|| step.caller.role().to_string()),
            })
            .await;

            let previous = task_outputs.last().map(|t| t.output.as_str());
            let reference = if index == 0 {
                request.reference_data.as_deref()
            } else {
                None
            };
            let messages = build_messages(step, &request.history, previous, reference);

            let run = match self.run_task(&runner, index, step, messages, &mut notices).await {
                Ok(run) => run,
                Err(err) => {
                    let model = step.caller.client().model_name();
                    return Err(remote_error(index, model, err, notices));
                }
            };

            let output = run.output;
            if let Some(usage) = &run.usage {
                total_tokens += usage.total_tokens;
            }

            self.emit(PipelineEvent::TaskCompleted {
                index,
                agent_role: step.owner.role().to_string(),
                response_length: output.len(),
                tokens_used: run.usage.clone(),
            })
            .await;

            if let Some(name) = task.output_file() {
                if let Err(source) = self.artifact_sink.write(name, &output).await {
                    return Err(PipelineError::Artifact {
                        task: index,
                        source,
                        notices,
                    });
                }
                self.emit(PipelineEvent::ArtifactWritten {
                    index,
                    name: name.to_string(),
                })
                .await;
            }

            task_outputs.push(TaskOutput {
                index,
                agent_role: step.owner.role().to_string(),
                delegate_role: delegated.then(|| step.caller.role().to_string()),
                output,
                usage: run.usage,
                attempts: run.attempts,
                tool_calls: run.tool_calls,
                output_file: task.output_file().map(str::to_string),
            });
        }

        let final_output = task_outputs
            .last()
            .map(|t| t.output.clone())
            .unwrap_or_default();

        Ok(PipelineOutput {
            final_output,
            task_outputs,
            notices,
            total_tokens,
        })
    }

    /// Call the model until it answers without a tool request. Agents without tools make
    /// exactly one successful call; the rest stop after `max_iterations` calls.
    async fn run_task(
        &self,
        runner: &RetryRunner<'_>,
        index: usize,
        step: &PreparedTask<'_>,
        mut messages: Vec<Message>,
        notices: &mut Vec<String>,
    ) -> Result<TaskRun, RetryError> {
        let agent = step.caller;
        let mut usage: Option<TokenUsage> = None;
        let mut attempts = 0;
        let mut tool_calls = 0;
        let mut iteration = 0;

        loop {
            iteration += 1;
            let outcome = runner
                .call_with_retry(agent.client().as_ref(), &messages, notices)
                .await?;
            attempts += outcome.attempts;
            if let Some(spent) = &outcome.usage {
                let total = usage.get_or_insert_with(TokenUsage::default);
                total.input_tokens += spent.input_tokens;
                total.output_tokens += spent.output_tokens;
                total.total_tokens += spent.total_tokens;
            }
            let reply = outcome.message.content.to_string();

            let call = if agent.tools().is_empty() {
                None
            } else {
                parse_tool_call(&reply)
            };
            let Some(call) = call else {
                return Ok(TaskRun {
                    output: reply,
                    usage,
                    attempts,
                    tool_calls,
                });
            };

            if iteration >= agent.max_iterations() {
                log::warn!(
                    "Pipeline::run(): {} hit its limit of {} iterations on task {}",
                    agent.role(),
                    agent.max_iterations(),
                    index
                );
                notices.push(format!(
                    "{} reached its limit of {} iterations; its last reply was kept.",
                    agent.role(),
                    agent.max_iterations()
                ));
                self.emit(PipelineEvent::ToolLimitReached {
                    index,
                    agent_role: agent.role().to_string(),
                    max_iterations: agent.max_iterations(),
                })
                .await;
                return Ok(TaskRun {
                    output: reply,
                    usage,
                    attempts,
                    tool_calls,
                });
            }

            tool_calls += 1;
            let result = match agent.tool(&call.name) {
                Some(tool) => tool.execute(call.parameters.clone()).await,
                None => Err(ToolError::NotFound(call.name.clone())),
            };
            let success = matches!(&result, Ok(r) if r.success);
            log::info!(
                "Pipeline::run(): task {} tool '{}' ({})",
                index,
                call.name,
                if success { "ok" } else { "failed" }
            );
            self.emit(PipelineEvent::ToolCalled {
                index,
                agent_role: agent.role().to_string(),
                tool_name: call.name.clone(),
                call: tool_calls,
                success,
            })
            .await;

            messages.push(Message::new(Role::Assistant, reply));
            messages.push(Message::new(Role::User, tool_result_message(&call.name, &result)));
        }
    }

    fn prepare(&self, request: &RunRequest) -> Result<Vec<PreparedTask<'_>>, PipelineError> {
        let mut prepared = Vec::with_capacity(self.tasks.len());
        for task in &self.tasks {
            let owner = &self.agents[task.agent.0];
            let caller = task.delegate.map_or(owner, |id| &self.agents[id.0]);
            prepared.push(PreparedTask {
                owner,
                caller,
                system_prompt: caller
                    .system_prompt(request.chat_prompt.as_deref(), &request.params)?,
                description: task.description.render(&request.params)?,
                expected_output: task.expected_output.render(&request.params)?,
            });
        }
        Ok(prepared)
    }

    async fn emit(&self, event: PipelineEvent) {
        if let Some(handler) = &self.event_handler {
            handler.on_pipeline_event(&event).await;
        }
    }
}

fn build_messages(
    step: &PreparedTask<'_>,
    history: &[Turn],
    previous: Option<&str>,
    reference: Option<&str>,
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(2 + history.len() * 2);
    messages.push(Message::new(Role::System, &step.system_prompt));
    for turn in history {
        messages.push(Message::new(Role::User, &turn.question));
        messages.push(Message::new(Role::Assistant, &turn.answer));
    }

    let mut prompt = String::new();
    if step.caller.id() != step.owner.id() {
        prompt.push_str(&format!(
            "{} delegated this task to you.\n\n",
            step.owner.role()
        ));
    }
    prompt.push_str(&step.description);
    prompt.push_str("\n\nThis is the expected criteria for your final answer: ");
    prompt.push_str(&step.expected_output);
    if let Some(previous) = previous {
        prompt.push_str("\n\nThis is the context you're working with:\n");
        prompt.push_str(previous);
    }
    if let Some(reference) = reference {
        prompt.push_str("\n\nReference data provided by the user:\n");
        prompt.push_str(reference);
    }
    if !step.caller.tools().is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(&tools_prompt(step.caller.tools()));
    }
    messages.push(Message::new(Role::User, prompt));
    messages
}

fn remote_error(
    task: usize,
    model: &str,
    err: RetryError,
    notices: Vec<String>,
) -> PipelineError {
    match err {
        RetryError::RateLimitExceeded {
            attempts,
            unknown_wait,
            ..
        } => PipelineError::RateLimitExceeded {
            task,
            model: model.to_string(),
            attempts,
            unknown_wait,
            notices,
        },
        RetryError::Remote(source) => PipelineError::GenericRemoteFailure {
            task,
            model: model.to_string(),
            source,
            notices,
        },
    }
}

fn failed_task(err: &PipelineError) -> Option<usize> {
    match err {
        PipelineError::RateLimitExceeded { task, .. }
        | PipelineError::GenericRemoteFailure { task, .. }
        | PipelineError::Artifact { task, .. } => Some(*task),
        _ => None,
    }
}
