//! Runs a suite of questions through the pipeline and scores grounding,
//! citation and refusal behaviour.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Local};
use quill_domain::{ChatModel, DocumentSearch, PipelineState, VerificationStatus};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::Orchestrator;

const DEFAULT_SUITE: &str = include_str!("../evals/default_suite.yml");

/// Phrases a grounded answer uses when the corpus lacks the information.
const DECLINE_PHRASES: [&str; 3] = ["not found in sources", "information not available", "not mentioned"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalCategory {
    FactualRetrieval,
    Extraction,
    Comparison,
    Summarization,
    /// Questions the corpus cannot answer.
    HallucinationCheck,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalCase {
    pub id: u32,
    pub question: String,
    pub category: EvalCategory,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expected_sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_behavior: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalSuite {
    pub cases: Vec<EvalCase>,
}

impl EvalSuite {
    pub fn parse(yaml: &str) -> anyhow::Result<Self> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// The built-in suite: ten answerable questions and three the corpus
    /// cannot answer.
    pub fn builtin() -> anyhow::Result<Self> {
        Self::parse(DEFAULT_SUITE).context("Invalid built-in evaluation suite")
    }

    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read evaluation suite {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid evaluation suite {}", path.display()))
    }
}

/// Scores for a case whose pipeline run reached a terminal state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseScore {
    pub output_length: usize,
    pub citations: Vec<String>,
    pub has_citations: bool,
    pub passed_verification: bool,
    pub verification_status: Option<VerificationStatus>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub expected_sources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found_expected_sources: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_found: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correctly_declined: Option<bool>,
}

impl CaseScore {
    /// Scores the approved output, or the unapproved draft when there is none.
    pub fn new(case: &EvalCase, state: &PipelineState) -> Self {
        let output = if state.final_output.is_empty() { &state.draft } else { &state.final_output };
        let output_lower = output.to_lowercase();
        let verification = state.verification_result.as_ref();

        let found_expected_sources = (!case.expected_sources.is_empty()).then(|| {
            case.expected_sources
                .iter()
                .any(|expected| state.citations.iter().any(|citation| citation.contains(expected.as_str())))
        });
        let answer_found = case
            .expected_answer
            .as_ref()
            .map(|answer| output_lower.contains(&answer.to_lowercase()));
        let correctly_declined = (case.category == EvalCategory::HallucinationCheck)
            .then(|| DECLINE_PHRASES.iter().any(|phrase| output_lower.contains(phrase)));

        Self {
            output_length: output.chars().count(),
            citations: state.citations.clone(),
            has_citations: !state.citations.is_empty(),
            passed_verification: verification.is_some_and(|result| result.is_approved()),
            verification_status: verification.map(|result| result.status),
            expected_sources: case.expected_sources.clone(),
            found_expected_sources,
            expected_answer: case.expected_answer.clone(),
            answer_found,
            correctly_declined,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CaseOutcome {
    Scored(CaseScore),
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalResult {
    pub test_id: u32,
    pub question: String,
    pub category: EvalCategory,
    #[serde(flatten)]
    pub outcome: CaseOutcome,
    pub timestamp: DateTime<Local>,
}

impl EvalResult {
    fn score(&self) -> Option<&CaseScore> {
        match &self.outcome {
            CaseOutcome::Scored(score) => Some(score),
            CaseOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationSummary {
    pub total: usize,
    pub passed_verification: usize,
    pub with_citations: usize,
    pub errors: usize,
    pub hallucination_checks: usize,
    pub correctly_declined: usize,
}

impl EvaluationSummary {
    pub fn from_results(results: &[EvalResult]) -> Self {
        let scores = || results.iter().filter_map(EvalResult::score);
        let declines = results
            .iter()
            .filter(|result| result.category == EvalCategory::HallucinationCheck)
            .collect::<Vec<_>>();

        Self {
            total: results.len(),
            passed_verification: scores().filter(|score| score.passed_verification).count(),
            with_citations: scores().filter(|score| score.has_citations).count(),
            errors: results.iter().filter(|result| result.score().is_none()).count(),
            hallucination_checks: declines.len(),
            correctly_declined: declines
                .iter()
                .filter_map(|result| result.score())
                .filter(|score| score.correctly_declined == Some(true))
                .count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub summary: EvaluationSummary,
    pub results: Vec<EvalResult>,
}

impl Evaluation {
    /// Writes the per-case results to `eval_results_<timestamp>.json` in
    /// `dir` and returns the file path.
    pub async fn write(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create evaluation directory {}", dir.display()))?;
        let path = dir.join(format!("eval_results_{}.json", Local::now().format("%Y%m%d_%H%M%S")));
        tokio::fs::write(&path, serde_json::to_string_pretty(&self.results)?)
            .await
            .with_context(|| format!("Failed to write evaluation results {}", path.display()))?;
        Ok(path)
    }
}

/// Runs every case of a suite sequentially through one orchestrator.
pub struct Evaluator<'a, M, D> {
    orchestrator: &'a Orchestrator<M, D>,
}

impl<'a, M: ChatModel, D: DocumentSearch> Evaluator<'a, M, D> {
    pub fn new(orchestrator: &'a Orchestrator<M, D>) -> Self {
        Self { orchestrator }
    }

    /// A failing case is recorded with its error and does not stop the suite.
    pub async fn run(&self, suite: &EvalSuite) -> Evaluation {
        let total = suite.cases.len();
        let mut results = Vec::with_capacity(total);

        for (index, case) in suite.cases.iter().enumerate() {
            info!(case = case.id, progress = %format!("{}/{total}", index + 1), question = %case.question, "Evaluating");
            let outcome = match self.orchestrator.run(case.question.as_str()).await {
                Ok(state) => {
                    let score = CaseScore::new(case, &state);
                    info!(
                        case = case.id,
                        passed = score.passed_verification,
                        citations = score.citations.len(),
                        output_length = score.output_length,
                        "Case finished"
                    );
                    CaseOutcome::Scored(score)
                }
                Err(error) => {
                    warn!(case = case.id, error = %format!("{error:#}"), "Case failed");
                    CaseOutcome::Failed { error: format!("{error:#}") }
                }
            };

            results.push(EvalResult {
                test_id: case.id,
                question: case.question.clone(),
                category: case.category,
                outcome,
                timestamp: Local::now(),
            });
        }

        Evaluation { summary: EvaluationSummary::from_results(&results), results }
    }
}
