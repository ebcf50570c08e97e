use std::sync::Arc;

use quill_domain::{
    AgentTrace, ChatModel, DocumentSearch, PipelineState, Recommendation, WriterInput, WriterOutput,
};
use quill_env::Environment;
use strum_macros::Display;
use tracing::{debug, info};

use crate::stages::{MultiOutputWriter, Planner, Researcher, Stage, Verifier, Writer};

/// Position of a task in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Phase {
    Planning,
    Researching,
    Writing,
    Verifying,
    Done,
}

enum DraftWriter<M> {
    Single(Writer<M>),
    Multi(MultiOutputWriter<M>),
}

impl<M: ChatModel> DraftWriter<M> {
    async fn run(&self, input: WriterInput, trace: &mut AgentTrace) -> anyhow::Result<WriterOutput> {
        match self {
            Self::Single(writer) => writer.run(input, trace).await,
            Self::Multi(writer) => writer.run(input, trace).await,
        }
    }
}

/// Drives one task through plan, research, write and verify.
///
/// After verification the task goes back to writing only when the verifier
/// asked for a revision, the draft is not final and fewer than
/// `max_revisions` rewrites have happened. Every other outcome ends the run.
pub struct Orchestrator<M, D> {
    model: Arc<M>,
    planner: Planner<M>,
    researcher: Researcher<M, D>,
    writer: DraftWriter<M>,
    verifier: Verifier<M>,
    max_revisions: usize,
}

impl<M, D> Orchestrator<M, D> {
    pub fn new(model: Arc<M>, search: Arc<D>, top_k: usize) -> Self {
        Self {
            planner: Planner::new(model.clone()),
            researcher: Researcher::new(model.clone(), search, top_k),
            writer: DraftWriter::Single(Writer::new(model.clone())),
            verifier: Verifier::new(model.clone()),
            model,
            max_revisions: 0,
        }
    }

    /// Builds an orchestrator with `top_k`, `max_revisions` and
    /// `multi_output` taken from the environment.
    pub fn from_env(model: Arc<M>, search: Arc<D>, env: &Environment) -> Self {
        Self::new(model, search, env.top_k)
            .max_revisions(env.max_revisions)
            .multi_output(env.multi_output)
    }

    pub fn max_revisions(mut self, max_revisions: usize) -> Self {
        self.max_revisions = max_revisions;
        self
    }

    /// Switches the writing phase between a single deliverable and the
    /// summary/report/action-items trio.
    pub fn multi_output(mut self, enabled: bool) -> Self {
        self.writer = if enabled {
            DraftWriter::Multi(MultiOutputWriter::new(self.model.clone()))
        } else {
            DraftWriter::Single(Writer::new(self.model.clone()))
        };
        self
    }
}

impl<M: ChatModel, D: DocumentSearch> Orchestrator<M, D> {
    /// Runs `task` to a terminal state. Model and retrieval errors abort the
    /// run; a rejected draft does not.
    pub async fn run(&self, task: impl Into<String>) -> anyhow::Result<PipelineState> {
        let mut state = PipelineState::new(task);
        let mut phase = Phase::Planning;
        info!(task = %state.task, "Starting workflow");

        while phase != Phase::Done {
            debug!(%phase, "Entering phase");
            phase = self.step(phase, &mut state).await?;
        }

        info!(
            completed = state.completed,
            revisions = state.revisions,
            trace_len = state.agent_trace.len(),
            "Workflow finished"
        );
        Ok(state)
    }

    async fn step(&self, phase: Phase, state: &mut PipelineState) -> anyhow::Result<Phase> {
        match phase {
            Phase::Planning => {
                let output = self.planner.run(state.planner_input(), state.trace()).await?;
                state.apply_plan(output);
                Ok(Phase::Researching)
            }
            Phase::Researching => {
                let output = self.researcher.run(state.research_input(), state.trace()).await?;
                state.apply_research(output);
                Ok(Phase::Writing)
            }
            Phase::Writing => {
                let output = self.writer.run(state.writer_input(), state.trace()).await?;
                state.apply_draft(output);
                Ok(Phase::Verifying)
            }
            Phase::Verifying => {
                let output = self.verifier.run(state.verifier_input(), state.trace()).await?;
                state.apply_verification(output);
                Ok(self.after_verification(state))
            }
            Phase::Done => Ok(Phase::Done),
        }
    }

    fn after_verification(&self, state: &mut PipelineState) -> Phase {
        let revise = state.recommendation() == Some(Recommendation::Revise)
            && state.revisions < self.max_revisions
            && !state.completed;

        if revise {
            state.revisions += 1;
            info!(revision = state.revisions, issues = state.issues_found.len(), "Revising draft");
            Phase::Writing
        } else {
            Phase::Done
        }
    }
}
