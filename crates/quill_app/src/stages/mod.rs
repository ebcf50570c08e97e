//! The four pipeline stages. Each stage owns its prompt template and the
//! [`SectionSchema`](quill_domain::SectionSchema) used to read the reply.

mod multi_writer;
mod planner;
mod researcher;
mod verifier;
mod writer;

use async_trait::async_trait;
pub use multi_writer::*;
pub use planner::*;
use quill_domain::AgentTrace;
pub use researcher::*;
pub use verifier::*;
pub use writer::*;

/// One model-backed step of the pipeline.
///
/// `run` appends exactly one start and one end event to `trace` on every
/// successful return. Errors from the model propagate unchanged.
#[async_trait]
pub trait Stage: Send + Sync {
    type Input: Send + 'static;
    type Output: Send;

    async fn run(&self, input: Self::Input, trace: &mut AgentTrace) -> anyhow::Result<Self::Output>;
}
