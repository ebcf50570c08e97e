mod evaluation;
mod orchestrator;
mod run_log;
pub mod stages;
mod template_engine;
#[cfg(test)]
mod test_utils;

pub use evaluation::*;
pub use orchestrator::*;
pub use run_log::*;
pub use template_engine::*;
