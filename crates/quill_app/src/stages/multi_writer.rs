use std::sync::Arc;

use async_trait::async_trait;
use quill_domain::{
    AgentName, AgentTrace, ChatModel, DeliverableKind, Prompt, Section, SectionSchema, Template,
    TraceEvent, WriterInput, WriterOutput,
};
use tracing::{info, warn};

use super::Stage;
use super::writer::TEMPERATURE;
use crate::TemplateEngine;

pub const NO_NOTES_DRAFTS: &str = "Cannot create deliverables: No research notes available.";

const SECTIONS: &[Section<DeliverableKind>] = &[
    section(DeliverableKind::ExecutiveSummary),
    section(DeliverableKind::DetailedReport),
    section(DeliverableKind::ActionItems),
];

const fn section(kind: DeliverableKind) -> Section<DeliverableKind> {
    Section::new(kind.marker(), kind)
}

const SCHEMA: SectionSchema<DeliverableKind> = SectionSchema::new(SECTIONS);

/// Writes an executive summary, a detailed report and action items in one
/// model call. The whole reply is kept as the draft.
pub struct MultiOutputWriter<M> {
    model: Arc<M>,
}

impl<M> MultiOutputWriter<M> {
    pub fn new(model: Arc<M>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl<M: ChatModel> Stage for MultiOutputWriter<M> {
    type Input = WriterInput;
    type Output = WriterOutput;

    async fn run(&self, input: WriterInput, trace: &mut AgentTrace) -> anyhow::Result<WriterOutput> {
        trace.push(
            TraceEvent::new(AgentName::MultiOutputWriter, "Creating multiple outputs")
                .input(format!("Task: {}", input.task)),
        );

        if input.research_notes.is_empty() {
            warn!("No research notes, skipping multi-output writer");
            trace.push(
                TraceEvent::new(AgentName::MultiOutputWriter, "Failed").output("Missing research notes"),
            );
            return Ok(WriterOutput::draft(NO_NOTES_DRAFTS));
        }

        let content = TemplateEngine::default().render(Template::new("multi_output_writer.md"), &input)?;
        let draft = self
            .model
            .invoke(Prompt::new(content).temperature(TEMPERATURE))
            .await?
            .trim()
            .to_string();
        let multi_outputs = SCHEMA.extract(&draft).into_inner();

        info!(formats = ?multi_outputs.keys().collect::<Vec<_>>(), "Multi-output completed");
        trace.push(
            TraceEvent::new(AgentName::MultiOutputWriter, "Multi-output completed")
                .output(format!("Created {} output formats", multi_outputs.len())),
        );
        Ok(WriterOutput { draft, multi_outputs })
    }
}
