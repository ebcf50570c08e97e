use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    AgentTrace, DeliverableKind, PlannerInput, PlannerOutput, ResearchInput, ResearchOutput,
    SearchResult, TraceEvent, VerificationResult, VerifierInput, VerifierOutput, WriterInput,
    WriterOutput,
};

/// The record threaded through every stage of a single task.
///
/// Stages never touch this directly. The orchestrator projects it into a
/// stage input and applies the stage output, so each field has exactly one
/// writer and `agent_trace` only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    pub task: String,
    pub goal: String,
    pub plan: Vec<String>,
    pub current_step: usize,
    pub retrieved_docs: Vec<SearchResult>,
    pub research_notes: String,
    pub draft: String,
    pub citations: Vec<String>,
    pub verification_result: Option<VerificationResult>,
    pub issues_found: Vec<String>,
    pub agent_trace: AgentTrace,
    pub final_output: String,
    pub completed: bool,
    pub multi_outputs: IndexMap<DeliverableKind, String>,
    /// Number of times the writer was re-run on verifier feedback.
    pub revisions: usize,
}

impl PipelineState {
    pub fn new(task: impl Into<String>) -> Self {
        Self { task: task.into(), ..Default::default() }
    }

    pub fn trace(&mut self) -> &mut AgentTrace {
        &mut self.agent_trace
    }

    pub fn record(&mut self, event: TraceEvent) {
        self.agent_trace.push(event);
    }

    pub fn planner_input(&self) -> PlannerInput {
        PlannerInput { task: self.task.clone() }
    }

    pub fn apply_plan(&mut self, output: PlannerOutput) {
        self.goal = output.goal;
        self.plan = output.plan;
        self.current_step = 0;
    }

    pub fn research_input(&self) -> ResearchInput {
        ResearchInput {
            task: self.task.clone(),
            goal: self.goal.clone(),
            current_step: self.current_step,
        }
    }

    pub fn apply_research(&mut self, output: ResearchOutput) {
        self.retrieved_docs = output.retrieved_docs;
        self.research_notes = output.research_notes;
        self.citations = output.citations;
    }

    /// Writer input; carries the verifier's issues as feedback once a draft
    /// has been verified.
    pub fn writer_input(&self) -> WriterInput {
        let feedback = if self.verification_result.is_some() {
            self.issues_found.clone()
        } else {
            Vec::new()
        };

        WriterInput {
            task: self.task.clone(),
            goal: self.goal.clone(),
            research_notes: self.research_notes.clone(),
            citations: self.citations.clone(),
            feedback,
        }
    }

    pub fn apply_draft(&mut self, output: WriterOutput) {
        self.draft = output.draft;
        self.multi_outputs = output.multi_outputs;
    }

    pub fn verifier_input(&self) -> VerifierInput {
        VerifierInput {
            task: self.task.clone(),
            draft: self.draft.clone(),
            research_notes: self.research_notes.clone(),
        }
    }

    pub fn apply_verification(&mut self, output: VerifierOutput) {
        if output.result.is_approved() {
            self.final_output = self.draft.clone();
            self.completed = true;
        }
        self.verification_result = Some(output.result);
        self.issues_found = output.issues_found;
    }

    pub fn recommendation(&self) -> Option<crate::Recommendation> {
        self.verification_result.as_ref().map(|result| result.recommendation)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{Recommendation, VerificationStatus};

    fn verified(recommendation: Recommendation) -> VerifierOutput {
        VerifierOutput {
            result: VerificationResult {
                status: VerificationStatus::Pass,
                recommendation,
                full_report: "report".to_string(),
                missing_citations: vec![],
                reason: None,
            },
            issues_found: vec!["Hallucination: CEO name".to_string()],
        }
    }

    #[test]
    fn test_new_state_is_blank() {
        let actual = PipelineState::new("Summarize Q4");

        assert_eq!(actual.task, "Summarize Q4");
        assert!(actual.agent_trace.is_empty());
        assert!(!actual.completed);
        assert_eq!(actual.verification_result, None);
    }

    #[test]
    fn test_approval_finalizes_draft() {
        let mut fixture = PipelineState::new("t");
        fixture.apply_draft(WriterOutput::draft("the draft"));

        fixture.apply_verification(verified(Recommendation::Approve));

        assert!(fixture.completed);
        assert_eq!(fixture.final_output, "the draft");
    }

    #[test]
    fn test_rejection_keeps_final_output_empty() {
        let mut fixture = PipelineState::new("t");
        fixture.apply_draft(WriterOutput::draft("the draft"));

        fixture.apply_verification(verified(Recommendation::Reject));

        assert!(!fixture.completed);
        assert_eq!(fixture.final_output, "");
        assert_eq!(fixture.issues_found, vec!["Hallucination: CEO name".to_string()]);
    }

    #[test]
    fn test_writer_feedback_only_after_verification() {
        let mut fixture = PipelineState::new("t");
        fixture.issues_found = vec!["stale".to_string()];
        assert_eq!(fixture.writer_input().feedback, Vec::<String>::new());

        fixture.apply_verification(verified(Recommendation::Revise));

        let actual = fixture.writer_input().feedback;
        let expected = vec!["Hallucination: CEO name".to_string()];
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_plan_resets_current_step() {
        let mut fixture = PipelineState::new("t");
        fixture.current_step = 3;

        fixture.apply_plan(PlannerOutput { goal: "g".to_string(), plan: vec!["s1".to_string()] });

        assert_eq!(fixture.current_step, 0);
        assert_eq!(fixture.research_input().query(), "g");
    }
}
