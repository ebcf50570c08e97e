use std::sync::Arc;

use async_trait::async_trait;
use quill_domain::{
    AgentName, AgentTrace, ChatModel, Prompt, Recommendation, Section, SectionSchema, Template,
    TraceEvent, VerificationResult, VerificationStatus, VerifierInput, VerifierOutput,
};
use tracing::{info, warn};

use super::Stage;
use crate::TemplateEngine;

const TEMPERATURE: f32 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ReportField {
    Status,
    Issues,
    MissingCitations,
    Hallucinations,
    Recommendation,
}

const SECTIONS: &[Section<ReportField>] = &[
    Section::new("VERIFICATION STATUS:", ReportField::Status),
    Section::new("ISSUES:", ReportField::Issues),
    Section::new("MISSING CITATIONS:", ReportField::MissingCitations),
    Section::new("HALLUCINATIONS:", ReportField::Hallucinations),
    Section::new("RECOMMENDATION:", ReportField::Recommendation),
];

const SCHEMA: SectionSchema<ReportField> = SectionSchema::new(SECTIONS);

/// Checks a draft against the research notes and decides whether it can be
/// released.
pub struct Verifier<M> {
    model: Arc<M>,
}

impl<M> Verifier<M> {
    pub fn new(model: Arc<M>) -> Self {
        Self { model }
    }
}

/// Parses a verification report. Hallucinations are folded into the issue
/// list with a `Hallucination: ` prefix.
pub fn parse_report(report: &str) -> VerifierOutput {
    let extracted = SCHEMA.extract(report);
    let status = VerificationStatus::classify(extracted.first_line(ReportField::Status).unwrap_or_default());
    let recommendation =
        Recommendation::classify(extracted.first_line(ReportField::Recommendation).unwrap_or_default());

    let mut issues_found = extracted.list(ReportField::Issues);
    issues_found.extend(
        extracted
            .list(ReportField::Hallucinations)
            .into_iter()
            .map(|item| format!("Hallucination: {item}")),
    );

    VerifierOutput {
        result: VerificationResult {
            status,
            recommendation,
            full_report: report.to_string(),
            missing_citations: extracted.list(ReportField::MissingCitations),
            reason: None,
        },
        issues_found,
    }
}

fn short_circuit(issue: &str, reason: &str) -> VerifierOutput {
    VerifierOutput {
        result: VerificationResult::rejected(reason),
        issues_found: vec![issue.to_string()],
    }
}

#[async_trait]
impl<M: ChatModel> Stage for Verifier<M> {
    type Input = VerifierInput;
    type Output = VerifierOutput;

    async fn run(&self, input: VerifierInput, trace: &mut AgentTrace) -> anyhow::Result<VerifierOutput> {
        trace.push(
            TraceEvent::new(AgentName::Verifier, "Verifying draft")
                .input("Checking draft against research notes"),
        );

        let output = if input.draft.is_empty() {
            warn!("Nothing to verify");
            short_circuit("No draft to verify", "Missing draft")
        } else if input.research_notes.is_empty() {
            warn!("No research notes to verify against");
            short_circuit("No research notes to verify against", "Missing research notes")
        } else {
            let content = TemplateEngine::default().render(Template::new("verifier.md"), &input)?;
            let report = self.model.invoke(Prompt::new(content).temperature(TEMPERATURE)).await?;
            parse_report(&report)
        };

        let result = &output.result;
        info!(
            status = %result.status,
            recommendation = %result.recommendation,
            issues = output.issues_found.len(),
            "Verification completed"
        );
        trace.push(TraceEvent::new(AgentName::Verifier, "Verification completed").output(format!(
            "Status: {}, Recommendation: {}, Issues: {}",
            result.status,
            result.recommendation,
            output.issues_found.len()
        )));
        Ok(output)
    }
}
