use std::sync::Arc;

use async_trait::async_trait;
use quill_domain::{
    AgentName, AgentTrace, ChatModel, Prompt, Template, TraceEvent, WriterInput, WriterOutput,
};
use tracing::{info, warn};

use super::Stage;
use crate::TemplateEngine;

pub(crate) const TEMPERATURE: f32 = 0.3;
pub const NO_NOTES_DRAFT: &str = "Cannot create deliverable: No research notes available.";

/// Writes a single cited deliverable from the research notes.
pub struct Writer<M> {
    model: Arc<M>,
}

impl<M> Writer<M> {
    pub fn new(model: Arc<M>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl<M: ChatModel> Stage for Writer<M> {
    type Input = WriterInput;
    type Output = WriterOutput;

    async fn run(&self, input: WriterInput, trace: &mut AgentTrace) -> anyhow::Result<WriterOutput> {
        trace.push(
            TraceEvent::new(AgentName::Writer, "Creating deliverable").input(format!("Task: {}", input.task)),
        );

        if input.research_notes.is_empty() {
            warn!("No research notes, skipping writer");
            trace.push(TraceEvent::new(AgentName::Writer, "Failed").output("Missing research notes"));
            return Ok(WriterOutput::draft(NO_NOTES_DRAFT));
        }

        let content = TemplateEngine::default().render(Template::new("writer.md"), &input)?;
        let draft = self
            .model
            .invoke(Prompt::new(content).temperature(TEMPERATURE))
            .await?
            .trim()
            .to_string();

        info!(chars = draft.chars().count(), revision = !input.feedback.is_empty(), "Draft completed");
        trace.push(
            TraceEvent::new(AgentName::Writer, "Draft completed")
                .output(format!("Created deliverable ({} characters)", draft.chars().count())),
        );
        Ok(WriterOutput::draft(draft))
    }
}
