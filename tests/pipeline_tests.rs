use agentcrew::artifact::MemoryArtifactSink;
use agentcrew::client_wrapper::{ClientError, ClientWrapper, Message, Role, TokenUsage};
use agentcrew::event::{EventHandler, PipelineEvent};
use agentcrew::pipeline::{PipelineBuilder, PipelineError, RunRequest};
use agentcrew::session::Session;
use agentcrew::template::TemplateError;
use agentcrew::{AgentSpec, TaskSpec};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

struct MockClient {
    name: String,
    replies: Mutex<VecDeque<Result<String, ClientError>>>,
    calls: Mutex<Vec<Vec<Message>>>,
    usage: tokio::sync::Mutex<Option<TokenUsage>>,
}

impl MockClient {
    fn new(name: &str, replies: Vec<Result<String, ClientError>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
            usage: tokio::sync::Mutex::new(None),
        })
    }

    fn replying(name: &str, replies: &[&str]) -> Arc<Self> {
        Self::new(name, replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ClientWrapper for MockClient {
    async fn send_message(&self, messages: &[Message]) -> Result<Message, ClientError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        let next = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("default reply".to_string()));
        let text = next?;
        *self.usage.lock().await = Some(TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
            total_tokens: 15,
        });
        Ok(Message::new(Role::Assistant, text))
    }

    fn model_name(&self) -> &str {
        &self.name
    }

    fn usage_slot(&self) -> Option<&tokio::sync::Mutex<Option<TokenUsage>>> {
        Some(&self.usage)
    }
}

#[derive(Default)]
struct RecordingHandler {
    events: Mutex<Vec<String>>,
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn on_pipeline_event(&self, event: &PipelineEvent) {
        let label = match event {
            PipelineEvent::RunStarted { task_count, .. } => format!("run:{}", task_count),
            PipelineEvent::TaskStarted { index, .. } => format!("start:{}", index),
            PipelineEvent::TaskCompleted { index, .. } => format!("done:{}", index),
            PipelineEvent::ArtifactWritten { name, .. } => format!("artifact:{}", name),
            PipelineEvent::RunCompleted { .. } => "completed".to_string(),
            PipelineEvent::RunFailed { index, .. } => format!("failed:{:?}", index),
            PipelineEvent::RateLimited { .. } => "rate-limited".to_string(),
            PipelineEvent::BudgetExhausted { .. } => "budget".to_string(),
            PipelineEvent::ToolCalled { tool_name, .. } => format!("tool:{}", tool_name),
            PipelineEvent::ToolLimitReached { .. } => "tool-limit".to_string(),
        };
        self.events.lock().unwrap().push(label);
    }
}

fn researcher() -> AgentSpec {
    AgentSpec::new("Pesquisador", "Pesquisar sobre {topic}", "Bibliotecário acadêmico.")
}

fn writer() -> AgentSpec {
    AgentSpec::new("Escritor", "Escrever sobre {topic}", "Redator técnico.")
}

fn research_task() -> TaskSpec {
    TaskSpec::new("Liste fontes sobre {topic}", "Lista de fontes", "Pesquisador")
}

fn write_task() -> TaskSpec {
    TaskSpec::new("Escreva um post sobre {topic}", "Post em markdown", "Escritor")
}

fn last_user_text(call: &[Message]) -> String {
    call.last().map(|m| m.content.to_string()).unwrap_or_default()
}

#[tokio::test]
async fn two_task_pipeline_returns_second_output() {
    let client = MockClient::replying("mock", &["pesquisa sobre clima", "post sobre clima"]);
    let pipeline = PipelineBuilder::new(client.clone())
        .agent(researcher())
        .agent(writer())
        .task(research_task())
        .task(write_task())
        .build()
        .unwrap();

    let output = pipeline.run(RunRequest::new("clima")).await.unwrap();

    assert_eq!(client.call_count(), 2);
    assert_eq!(output.final_output, "post sobre clima");
    assert_eq!(output.task_outputs.len(), 2);
    assert_eq!(output.task_outputs[0].output, "pesquisa sobre clima");
    assert_eq!(output.task_outputs[1].agent_role, "Escritor");
    assert_eq!(output.total_tokens, 30);
    assert!(output.notices.is_empty());

    // strict index order, with {topic} substituted everywhere
    let calls = client.calls();
    assert!(calls[0][0].content.contains("You are Pesquisador."));
    assert!(calls[0][0].content.contains("Pesquisar sobre clima"));
    assert!(last_user_text(&calls[0]).starts_with("Liste fontes sobre clima"));
    assert!(calls[1][0].content.contains("You are Escritor."));
    assert!(last_user_text(&calls[1]).starts_with("Escreva um post sobre clima"));
}

#[tokio::test]
async fn previous_output_is_passed_as_context() {
    let client = MockClient::replying("mock", &["três fontes", "o post"]);
    let pipeline = PipelineBuilder::new(client.clone())
        .agent(researcher())
        .agent(writer())
        .task(research_task())
        .task(write_task())
        .build()
        .unwrap();

    pipeline.run(RunRequest::new("clima")).await.unwrap();

    let calls = client.calls();
    assert!(!last_user_text(&calls[0]).contains("context you're working with"));
    let second = last_user_text(&calls[1]);
    assert!(second.contains("This is the context you're working with:\ntrês fontes"));
    assert!(second.contains("expected criteria for your final answer: Post em markdown"));
}

#[tokio::test]
async fn unknown_task_agent_fails_before_any_call() {
    let client = MockClient::replying("mock", &[]);
    let result = PipelineBuilder::new(client.clone())
        .agent(researcher())
        .agent(writer())
        .task(research_task())
        .task(TaskSpec::new("Avalie {topic}", "Avaliação", "Avaliador"))
        .build();

    match result {
        Err(PipelineError::TaskBinding { task, role }) => {
            assert_eq!(task, 1);
            assert_eq!(role, "Avaliador");
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("pipeline should not build"),
    }
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn unknown_delegate_is_a_binding_error() {
    let client = MockClient::replying("mock", &[]);
    let result = PipelineBuilder::new(client)
        .agent(researcher().allow_delegation(true))
        .task(research_task().delegate_to("Revisor"))
        .build();
    assert!(matches!(
        result,
        Err(PipelineError::TaskBinding { task: 0, ref role }) if role == "Revisor"
    ));
}

#[tokio::test]
async fn delegation_requires_permission_and_another_agent() {
    let client = MockClient::replying("mock", &[]);

    let not_allowed = PipelineBuilder::new(client.clone())
        .agent(researcher())
        .agent(writer())
        .task(research_task().delegate_to("Escritor"))
        .build();
    assert!(matches!(
        not_allowed,
        Err(PipelineError::DelegationNotAllowed { task: 0, .. })
    ));

    let to_self = PipelineBuilder::new(client)
        .agent(researcher().allow_delegation(true))
        .task(research_task().delegate_to("Pesquisador"))
        .build();
    assert!(matches!(
        to_self,
        Err(PipelineError::DelegationNotAllowed { .. })
    ));
}

#[tokio::test]
async fn delegated_task_uses_delegate_persona_and_client() {
    let owner_client = MockClient::replying("owner-model", &[]);
    let delegate_client = MockClient::replying("delegate-model", &["resposta delegada"]);

    let pipeline = PipelineBuilder::new(owner_client.clone())
        .agent(researcher().allow_delegation(true))
        .agent(writer().with_client(delegate_client.clone()))
        .task(research_task().delegate_to("Escritor"))
        .build()
        .unwrap();

    let output = pipeline.run(RunRequest::new("clima")).await.unwrap();

    assert_eq!(owner_client.call_count(), 0);
    assert_eq!(delegate_client.call_count(), 1);
    assert_eq!(output.final_output, "resposta delegada");
    assert_eq!(output.task_outputs[0].agent_role, "Pesquisador");
    assert_eq!(
        output.task_outputs[0].delegate_role.as_deref(),
        Some("Escritor")
    );

    let calls = delegate_client.calls();
    let call = &calls[0];
    assert!(call[0].content.contains("You are Escritor."));
    assert!(last_user_text(call).starts_with("Pesquisador delegated this task to you."));
}

#[tokio::test]
async fn pipeline_shape_is_validated() {
    let client = MockClient::replying("mock", &[]);

    let empty = PipelineBuilder::new(client.clone()).agent(researcher()).build();
    assert!(matches!(empty, Err(PipelineError::InvalidPipeline(_))));

    let mut too_many = PipelineBuilder::new(client.clone()).agent(researcher());
    for _ in 0..4 {
        too_many = too_many.task(research_task());
    }
    assert!(matches!(
        too_many.build(),
        Err(PipelineError::InvalidPipeline(_))
    ));

    let duplicate = PipelineBuilder::new(client.clone())
        .agent(researcher())
        .agent(researcher())
        .task(research_task())
        .build();
    assert!(matches!(duplicate, Err(PipelineError::InvalidPipeline(_))));

    let no_iterations = PipelineBuilder::new(client)
        .agent(researcher().with_max_iterations(0))
        .task(research_task())
        .build();
    assert!(matches!(
        no_iterations,
        Err(PipelineError::InvalidPipeline(_))
    ));
}

#[tokio::test]
async fn undeclared_template_parameter_is_rejected_at_build() {
    let client = MockClient::replying("mock", &[]);
    let result = PipelineBuilder::new(client)
        .agent(researcher())
        .task(TaskSpec::new("Escreva sobre {tema}", "Texto", "Pesquisador"))
        .build();
    assert!(matches!(
        result,
        Err(PipelineError::Template(TemplateError::UndeclaredParameter { ref parameter, .. }))
            if parameter == "tema"
    ));
}

#[tokio::test]
async fn missing_parameter_value_fails_before_any_call() {
    let client = MockClient::replying("mock", &[]);
    let pipeline = PipelineBuilder::new(client.clone())
        .with_parameter("audience")
        .agent(researcher())
        .task(TaskSpec::new("Explique {topic} para {audience}", "Texto", "Pesquisador"))
        .build()
        .unwrap();

    let missing = pipeline.run(RunRequest::new("clima")).await;
    assert!(matches!(
        missing,
        Err(PipelineError::Template(TemplateError::MissingValue(ref name))) if name == "audience"
    ));
    assert_eq!(client.call_count(), 0);

    pipeline
        .run(RunRequest::new("clima").with_param("audience", "crianças"))
        .await
        .unwrap();
    assert!(last_user_text(&client.calls()[0]).starts_with("Explique clima para crianças"));
}

#[tokio::test]
async fn blank_topic_is_rejected() {
    let client = MockClient::replying("mock", &[]);
    let pipeline = PipelineBuilder::new(client.clone())
        .agent(researcher())
        .task(research_task())
        .build()
        .unwrap();
    assert!(matches!(
        pipeline.run(RunRequest::new("   ")).await,
        Err(PipelineError::EmptyQuestion)
    ));
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn generic_failure_aborts_remaining_tasks() {
    let client = MockClient::new(
        "mock",
        vec![Err(ClientError::Api {
            status: 500,
            message: "boom".to_string(),
        })],
    );
    let pipeline = PipelineBuilder::new(client.clone())
        .agent(researcher())
        .agent(writer())
        .task(research_task())
        .task(write_task())
        .build()
        .unwrap();

    let err = pipeline.run(RunRequest::new("clima")).await.unwrap_err();
    match err {
        PipelineError::GenericRemoteFailure {
            task,
            model,
            source,
            notices,
        } => {
            assert!(notices.is_empty());
            assert_eq!(task, 0);
            assert_eq!(model, "mock");
            assert!(matches!(source, ClientError::Api { status: 500, .. }));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(client.call_count(), 1);
}

#[tokio::test]
async fn output_file_is_written_to_the_sink() {
    let client = MockClient::replying("mock", &["fontes", "# Post"]);
    let sink = Arc::new(MemoryArtifactSink::new());
    let pipeline = PipelineBuilder::new(client)
        .agent(researcher())
        .agent(writer())
        .task(research_task())
        .task(write_task().with_output_file("blog-post.md"))
        .with_artifact_sink(sink.clone())
        .build()
        .unwrap();

    let output = pipeline.run(RunRequest::new("clima")).await.unwrap();

    assert_eq!(sink.get("blog-post.md").await.as_deref(), Some("# Post"));
    assert_eq!(sink.names().await.len(), 1);
    assert_eq!(
        output.task_outputs[1].output_file.as_deref(),
        Some("blog-post.md")
    );
}

#[tokio::test]
async fn history_and_reference_data_reach_the_model() {
    let client = MockClient::replying("mock", &["a", "b"]);
    let pipeline = PipelineBuilder::new(client.clone())
        .agent(researcher())
        .agent(writer())
        .task(research_task())
        .task(write_task())
        .build()
        .unwrap();

    let mut session = Session::default();
    session.append_turn("pergunta antiga", "resposta antiga");

    pipeline
        .run(
            RunRequest::new("clima")
                .with_chat_prompt("Como posso ajudar?")
                .with_history(session.memory())
                .with_reference_data("cidade | temp"),
        )
        .await
        .unwrap();

    let calls = client.calls();
    for call in &calls {
        assert_eq!(call.len(), 4);
        assert_eq!(call[0].role, Role::System);
        assert!(call[0].content.starts_with("Como posso ajudar?"));
        assert_eq!(call[1].role, Role::User);
        assert_eq!(&*call[1].content, "pergunta antiga");
        assert_eq!(call[2].role, Role::Assistant);
        assert_eq!(&*call[2].content, "resposta antiga");
    }
    assert!(last_user_text(&calls[0]).contains("Reference data provided by the user:\ncidade | temp"));
    assert!(!last_user_text(&calls[1]).contains("Reference data"));
}

#[tokio::test]
async fn events_follow_the_run() {
    let client = MockClient::replying("mock", &["a", "b"]);
    let handler = Arc::new(RecordingHandler::default());
    let pipeline = PipelineBuilder::new(client)
        .agent(researcher())
        .agent(writer())
        .task(research_task())
        .task(write_task().with_output_file("post.md"))
        .with_artifact_sink(Arc::new(MemoryArtifactSink::new()))
        .with_event_handler(handler.clone())
        .build()
        .unwrap();

    pipeline.run(RunRequest::new("clima")).await.unwrap();

    assert_eq!(
        *handler.events.lock().unwrap(),
        vec![
            "run:2",
            "start:0",
            "done:0",
            "start:1",
            "done:1",
            "artifact:post.md",
            "completed"
        ]
    );
}

#[tokio::test]
async fn pipeline_can_be_shared_across_concurrent_runs() {
    let client = MockClient::replying("mock", &[]);
    let pipeline = Arc::new(
        PipelineBuilder::new(client.clone())
            .agent(researcher())
            .task(research_task())
            .build()
            .unwrap(),
    );

    let mut handles = Vec::new();
    for i in 0..4 {
        let pipeline = Arc::clone(&pipeline);
        handles.push(tokio::spawn(async move {
            pipeline.run(RunRequest::new(format!("tema {}", i))).await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().final_output, "default reply");
    }
    assert_eq!(client.call_count(), 4);
}
