//! The academic crew: a researcher, an article writer and an article evaluator.
//!
//! [`academic_crew`] returns a [`PipelineBuilder`] already holding the three agents and
//! their three tasks, so callers can still attach a rate limiter, artifact sink or event
//! handler before building. Every agent of the crew can search the web; the individual
//! [`researcher`], [`writer`] and [`evaluator`] specs come without tools.

use crate::agent::AgentSpec;
use crate::client_wrapper::ClientWrapper;
use crate::pipeline::PipelineBuilder;
use crate::task::TaskSpec;
use crate::tool_protocol::Tool;
use crate::tools::WebSearchTool;
use std::sync::Arc;

pub const RESEARCHER: &str = "Pesquisador Acadêmico";
pub const WRITER: &str = "Escritor de Artigos";
pub const EVALUATOR: &str = "Avaliador de Artigos";

/// Artifact written by the writing task.
pub const BLOG_POST_FILE: &str = "blog-post.md";

pub fn researcher() -> AgentSpec {
    AgentSpec::new(
        RESEARCHER,
        "Encontrar informações confiáveis e atuais sobre {topic}, seguindo as normas \
         científicas e da ABNT.",
        "Como pesquisador acadêmico, seu objetivo é contribuir para o avanço do conhecimento \
         científico em sua área. Você segue rigorosamente as normas e metodologias científicas \
         e da ABNT para garantir a qualidade e confiabilidade de suas pesquisas. Sua busca por \
         informações é guiada pela busca da verdade e pela contribuição para a comunidade \
         acadêmica.",
    )
    .allow_delegation(true)
}

pub fn writer() -> AgentSpec {
    AgentSpec::new(
        WRITER,
        "Escrever conteúdos envolventes sobre {topic}.",
        "Como escritor de artigos, sua habilidade em transformar assuntos complexos em \
         narrativas envolventes é excepcional. Sua escrita ilumina novas perspectivas e \
         descobertas, tornando-as acessíveis para todos.",
    )
}

pub fn evaluator() -> AgentSpec {
    AgentSpec::new(
        EVALUATOR,
        "Avaliar criticamente artigos acadêmicos sobre {topic}.",
        "Como avaliador de artigos, você possui habilidades analíticas aguçadas e um profundo \
         entendimento do processo de pesquisa acadêmica. Sua análise crítica destaca os pontos \
         fortes e as falhas potenciais dos artigos.",
    )
}

pub fn research_task() -> TaskSpec {
    TaskSpec::new(
        "Pesquise e compile informações relevantes e atualizadas sobre {topic}, seguindo as \
         normas científicas e a formatação ABNT. Inclua referências bibliográficas adequadas.",
        "Um resumo detalhado e bem estruturado sobre {topic}, seguindo as normas científicas \
         e da ABNT.",
        RESEARCHER,
    )
}

pub fn write_task() -> TaskSpec {
    TaskSpec::new(
        "Escreva um conteúdo envolvente sobre {topic}, destacando as últimas tendências e seu \
         impacto. O texto deve ser acessível, envolvente e positivo.",
        "Um artigo de quatro parágrafos sobre os avanços em {topic}, em formato markdown.",
        WRITER,
    )
    .with_output_file(BLOG_POST_FILE)
}

pub fn evaluate_task() -> TaskSpec {
    TaskSpec::new(
        "Avalie criticamente o artigo sobre {topic}. Destaque os pontos fortes e as possíveis \
         falhas.",
        "Uma avaliação crítica do artigo sobre {topic}, com pontos fortes e possíveis falhas.",
        EVALUATOR,
    )
}

/// Research, write, evaluate, with DuckDuckGo search for every agent.
pub fn academic_crew(client: Arc<dyn ClientWrapper>) -> PipelineBuilder {
    academic_crew_with_search(client, Arc::new(WebSearchTool::new()))
}

/// [`academic_crew`] with a caller-supplied search tool.
pub fn academic_crew_with_search(
    client: Arc<dyn ClientWrapper>,
    search: Arc<dyn Tool>,
) -> PipelineBuilder {
    PipelineBuilder::new(client)
        .agent(researcher().with_tool(Arc::clone(&search)))
        .agent(writer().with_tool(Arc::clone(&search)))
        .agent(evaluator().with_tool(search))
        .task(research_task())
        .task(write_task())
        .task(evaluate_task())
}
