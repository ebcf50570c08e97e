use std::sync::Arc;

use async_trait::async_trait;
use quill_domain::{
    AgentName, AgentTrace, ChatModel, DocumentSearch, Fallback, Prompt, ResearchInput,
    ResearchOutput, SearchResult, Section, SectionSchema, Template, TraceEvent,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::Stage;
use crate::TemplateEngine;

const TEMPERATURE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ResearchField {
    Notes,
    Sources,
    Gaps,
}

const SECTIONS: &[Section<ResearchField>] = &[
    Section::new("RESEARCH NOTES:", ResearchField::Notes),
    Section::new("SOURCES USED:", ResearchField::Sources),
    Section::new("INFORMATION GAPS:", ResearchField::Gaps),
];

/// Unheaded replies are treated as notes.
const SCHEMA: SectionSchema<ResearchField> = SectionSchema::new(SECTIONS).with_fallback(Fallback::LeadingText);

#[derive(Serialize)]
struct ResearchContext<'a> {
    task: &'a str,
    goal: &'a str,
    current_step: usize,
    documents: &'a [SearchResult],
}

/// Retrieves supporting chunks and has the model condense them into cited
/// notes.
pub struct Researcher<M, D> {
    model: Arc<M>,
    search: Arc<D>,
    top_k: usize,
}

impl<M, D> Researcher<M, D> {
    pub fn new(model: Arc<M>, search: Arc<D>, top_k: usize) -> Self {
        Self { model, search, top_k }
    }
}

#[async_trait]
impl<M: ChatModel, D: DocumentSearch> Stage for Researcher<M, D> {
    type Input = ResearchInput;
    type Output = ResearchOutput;

    async fn run(&self, input: ResearchInput, trace: &mut AgentTrace) -> anyhow::Result<ResearchOutput> {
        trace.push(TraceEvent::new(AgentName::Research, "Searching documents").input(input.task.clone()));

        let query = input.query();
        let retrieved_docs = self.search.search(query, self.top_k).await?;
        info!(
            query = %query,
            documents = retrieved_docs.len(),
            sources = %retrieved_docs.iter().map(|d| d.source.as_str()).collect::<Vec<_>>().join(", "),
            "Retrieved documents"
        );

        let context = ResearchContext {
            task: &input.task,
            goal: &input.goal,
            current_step: input.current_step,
            documents: &retrieved_docs,
        };
        let content = TemplateEngine::default().render(Template::new("researcher.md"), &context)?;
        let response = self.model.invoke(Prompt::new(content).temperature(TEMPERATURE)).await?;

        let extracted = SCHEMA.extract(&response);
        let research_notes = extracted.text(ResearchField::Notes).to_string();
        let citations = extracted.list(ResearchField::Sources);
        if research_notes.is_empty() {
            warn!("Research reply contained no notes");
        }
        debug!(gaps = %extracted.text(ResearchField::Gaps), "Information gaps");

        trace.push(TraceEvent::new(AgentName::Research, "Research completed").output(format!(
            "Found {} relevant documents, created notes with {} sources",
            retrieved_docs.len(),
            citations.len()
        )));

        Ok(ResearchOutput { retrieved_docs, research_notes, citations })
    }
}
