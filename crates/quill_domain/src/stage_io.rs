use derive_setters::Setters;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{DeliverableKind, SearchResult, VerificationResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerInput {
    pub task: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlannerOutput {
    pub goal: String,
    pub plan: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchInput {
    pub task: String,
    pub goal: String,
    pub current_step: usize,
}

impl ResearchInput {
    /// The goal when the planner produced one, otherwise the raw task.
    pub fn query(&self) -> &str {
        if self.goal.is_empty() { &self.task } else { &self.goal }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchOutput {
    pub retrieved_docs: Vec<SearchResult>,
    pub research_notes: String,
    pub citations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Setters, Serialize, Deserialize)]
#[setters(into)]
pub struct WriterInput {
    pub task: String,
    pub goal: String,
    pub research_notes: String,
    pub citations: Vec<String>,
    /// Issues raised by the verifier on a previous draft.
    pub feedback: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriterOutput {
    pub draft: String,
    pub multi_outputs: IndexMap<DeliverableKind, String>,
}

impl WriterOutput {
    pub fn draft(draft: impl Into<String>) -> Self {
        Self { draft: draft.into(), multi_outputs: IndexMap::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifierInput {
    pub task: String,
    pub draft: String,
    pub research_notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifierOutput {
    pub result: VerificationResult,
    pub issues_found: Vec<String>,
}
