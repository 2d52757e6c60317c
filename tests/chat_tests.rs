use agentcrew::attachment::{Attachment, AttachmentError, DocumentReader};
use agentcrew::chat::CrewChat;
use agentcrew::client_wrapper::{ClientError, ClientWrapper, Message, Role, WaitHint};
use agentcrew::pipeline::{PipelineBuilder, PipelineError};
use agentcrew::prompt_selector::{PromptSelector, PromptVariant};
use agentcrew::retry::Sleeper;
use agentcrew::session::Session;
use agentcrew::{AgentSpec, TaskSpec};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct MockClient {
    replies: Mutex<VecDeque<Result<String, ClientError>>>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl MockClient {
    fn new(replies: Vec<Result<String, ClientError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
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
            .unwrap_or_else(|| Ok("resposta".to_string()));
        Ok(Message::new(Role::Assistant, next?))
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

struct ByteCountReader;

impl DocumentReader for ByteCountReader {
    fn read(&self, attachment: &Attachment) -> Result<String, AttachmentError> {
        Ok(format!("{} bytes", attachment.bytes().len()))
    }
}

struct InstantSleeper;

#[async_trait]
impl Sleeper for InstantSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

fn chat(client: Arc<MockClient>) -> CrewChat {
    let pipeline = PipelineBuilder::new(client)
        .agent(AgentSpec::new("Assistente", "Responder sobre {topic}", ""))
        .task(TaskSpec::new("Responda: {topic}", "Uma resposta curta", "Assistente"))
        .build()
        .unwrap();
    CrewChat::new(
        Arc::new(pipeline),
        PromptSelector::new("Como posso ajudar?", "Algo mais?"),
    )
}

fn system_text(call: &[Message]) -> String {
    call[0].content.to_string()
}

#[tokio::test]
async fn ask_records_turns_and_alternates_prompts() {
    let client = MockClient::new(vec![Ok("primeira".into()), Ok("segunda".into())]);
    let chat = chat(client.clone());
    let mut session = Session::default();

    let first = chat.ask(&mut session, "  O que é El Niño?  ").await.unwrap();
    assert_eq!(first.answer, "primeira");
    assert_eq!(first.prompt, "Como posso ajudar?");

    let second = chat.ask(&mut session, "E La Niña?").await.unwrap();
    assert_eq!(second.prompt, "Algo mais?");

    assert_eq!(session.len(), 2);
    assert_eq!(session.turns()[0].question, "O que é El Niño?");
    assert_eq!(session.turns()[1].answer, "segunda");

    let calls = client.calls();
    assert!(system_text(&calls[0]).starts_with("Como posso ajudar?"));
    assert!(system_text(&calls[1]).starts_with("Algo mais?"));
    // the second question replays the first turn
    assert_eq!(calls[0].len(), 2);
    assert_eq!(calls[1].len(), 4);
    assert_eq!(&*calls[1][1].content, "O que é El Niño?");
    assert_eq!(&*calls[1][2].content, "primeira");
}

#[tokio::test]
async fn memory_window_limits_replayed_turns() {
    let client = MockClient::new(vec![]);
    let chat = chat(client.clone());
    let mut session = Session::new(2).unwrap();
    for i in 0..5 {
        session.append_turn(format!("q{}", i), format!("a{}", i));
    }

    chat.ask(&mut session, "nova pergunta").await.unwrap();

    let calls = client.calls();
    let call = &calls[0];
    assert_eq!(call.len(), 1 + 2 * 2 + 1);
    assert_eq!(&*call[1].content, "q3");
}

#[tokio::test]
async fn blank_question_changes_nothing() {
    let client = MockClient::new(vec![]);
    let chat = chat(client.clone());
    let mut session = Session::default();

    let err = chat.ask(&mut session, " \n ").await.unwrap_err();

    assert!(matches!(err, PipelineError::EmptyQuestion));
    assert!(session.is_empty());
    assert_eq!(session.get_last_prompt_variant(), None);
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn failed_run_keeps_history_intact() {
    let client = MockClient::new(vec![
        Ok("ok".into()),
        Err(ClientError::Api {
            status: 503,
            message: "unavailable".into(),
        }),
    ]);
    let chat = chat(client);
    let mut session = Session::default();

    chat.ask(&mut session, "primeira").await.unwrap();
    let err = chat.ask(&mut session, "segunda").await.unwrap_err();

    assert!(matches!(err, PipelineError::GenericRemoteFailure { .. }));
    assert_eq!(session.len(), 1);
    assert_eq!(session.turns()[0].question, "primeira");
    // the prompt was picked before the run started
    assert_eq!(
        session.get_last_prompt_variant(),
        Some(PromptVariant::Secondary)
    );
}

#[tokio::test]
async fn readable_attachments_feed_the_first_task() {
    let client = MockClient::new(vec![]);
    let chat = chat(client.clone());
    let mut session = Session::default();

    let csv = Attachment::new("clima.csv", Some("text/csv"), b"cidade,temp\nRecife,30\n".to_vec())
        .unwrap();
    let broken = Attachment::new("dados.json", None, b"{not json".to_vec()).unwrap();

    let reply = chat
        .ask_with_attachments(&mut session, "Resuma os dados", &[csv, broken])
        .await
        .unwrap();

    let prompt = client.calls()[0].last().unwrap().content.to_string();
    assert!(prompt.contains("### clima.csv (CSV)"));
    assert!(prompt.contains("Recife | 30"));
    assert_eq!(reply.notices.len(), 1);
    assert!(reply.notices[0].contains("dados.json"));
    assert_eq!(session.len(), 1);
}

#[tokio::test]
async fn pdf_attachments_need_a_reader() {
    let client = MockClient::new(vec![]);
    let pdf = Attachment::new("artigo.pdf", None, vec![1, 2, 3]).unwrap();

    let without = chat(client.clone());
    let mut session = Session::default();
    let reply = without
        .ask_with_attachments(&mut session, "Resuma", &[pdf.clone()])
        .await
        .unwrap();
    assert!(reply.notices[0].contains("No reader configured"));

    let with = chat(client.clone()).with_document_reader(Arc::new(ByteCountReader));
    let reply = with
        .ask_with_attachments(&mut session, "Resuma", &[pdf])
        .await
        .unwrap();
    assert!(reply.notices.is_empty());
    let prompt = client.calls()[1].last().unwrap().content.to_string();
    assert!(prompt.contains("3 bytes"));
}

#[tokio::test]
async fn failed_run_still_reports_waits_and_attachment_warnings() {
    let client = MockClient::new(vec![
        Err(ClientError::RateLimited {
            wait: WaitHint::Suggested(Duration::from_secs(5)),
            message: "Rate limit reached".into(),
        }),
        Err(ClientError::Api {
            status: 500,
            message: "boom".into(),
        }),
    ]);
    let pipeline = PipelineBuilder::new(client)
        .agent(AgentSpec::new("Assistente", "Responder sobre {topic}", ""))
        .task(TaskSpec::new("Responda: {topic}", "Uma resposta curta", "Assistente"))
        .with_sleeper(Arc::new(InstantSleeper))
        .build()
        .unwrap();
    let chat = CrewChat::new(
        Arc::new(pipeline),
        PromptSelector::new("Como posso ajudar?", "Algo mais?"),
    );
    let mut session = Session::default();
    let broken = Attachment::new("dados.json", None, b"{not json".to_vec()).unwrap();

    let err = chat
        .ask_with_attachments(&mut session, "Resuma os dados", &[broken])
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::GenericRemoteFailure { .. }));
    let notices = err.notices();
    assert_eq!(notices.len(), 2);
    assert!(notices[0].contains("dados.json"));
    assert!(notices[1].contains("Waiting 5.0 seconds"));
    assert!(session.is_empty());
}
