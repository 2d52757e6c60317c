//! Question in, answer out.
//!
//! [`CrewChat`] ties the pieces together for one user turn: pick the system prompt, replay
//! the session's memory window, run the pipeline and record the turn. The session is only
//! extended when the run succeeds.
//!
//! ```rust,no_run
//! use agentcrew::chat::CrewChat;
//! use agentcrew::config::CrewConfig;
//! use agentcrew::presets::academic_crew;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CrewConfig::from_env()?;
//!     let pipeline = academic_crew(Arc::new(config.groq_client()?)).build()?;
//!     let chat = CrewChat::new(Arc::new(pipeline), config.prompt_selector());
//!
//!     let mut session = config.new_session()?;
//!     let reply = chat.ask(&mut session, "mudanças climáticas").await?;
//!     println!("{}", reply.answer);
//!     Ok(())
//! }
//! ```

use crate::attachment::{collect_reference_data, Attachment, DocumentReader};
use crate::pipeline::{Pipeline, PipelineError, RunRequest, TaskOutput};
use crate::prompt_selector::PromptSelector;
use crate::session::Session;
use std::sync::Arc;

/// One answered question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub answer: String,
    /// The system prompt picked for this question.
    pub prompt: String,
    /// Warnings and wait notices to show the user.
    pub notices: Vec<String>,
    pub task_outputs: Vec<TaskOutput>,
}

/// Chat front door over a shared [`Pipeline`].
pub struct CrewChat {
    pipeline: Arc<Pipeline>,
    selector: PromptSelector,
    reader: Option<Arc<dyn DocumentReader>>,
}

impl CrewChat {
    pub fn new(pipeline: Arc<Pipeline>, selector: PromptSelector) -> Self {
        Self {
            pipeline,
            selector,
            reader: None,
        }
    }

    /// Reader used for XLSX and PDF attachments.
    pub fn with_document_reader(mut self, reader: Arc<dyn DocumentReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    pub fn selector(&self) -> &PromptSelector {
        &self.selector
    }

    pub async fn ask(
        &self,
        session: &mut Session,
        question: &str,
    ) -> Result<ChatReply, PipelineError> {
        self.ask_with_attachments(session, question, &[]).await
    }

    /// Like [`ask`](CrewChat::ask), feeding readable attachments to the first task.
    /// Attachments that cannot be read become notices, on the reply or on the error.
    pub async fn ask_with_attachments(
        &self,
        session: &mut Session,
        question: &str,
        attachments: &[Attachment],
    ) -> Result<ChatReply, PipelineError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(PipelineError::EmptyQuestion);
        }

        let prompt = self.selector.select(session).to_string();

        let mut notices = Vec::new();
        let reference = collect_reference_data(attachments, self.reader.as_deref(), &mut notices);

        let mut request = RunRequest::new(question)
            .with_chat_prompt(prompt.as_str())
            .with_history(session.memory());
        if let Some(reference) = reference {
            request = request.with_reference_data(reference);
        }

        let output = match self.pipeline.run(request).await {
            Ok(output) => output,
            Err(err) => return Err(err.with_earlier_notices(notices)),
        };

        session.append_turn(question, output.final_output.as_str());
        notices.extend(output.notices);
        log::info!(
            "CrewChat::ask(): session {} now has {} turns",
            session.id(),
            session.len()
        );

        Ok(ChatReply {
            answer: output.final_output,
            prompt,
            notices,
            task_outputs: output.task_outputs,
        })
    }
}
