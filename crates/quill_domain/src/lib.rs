mod chunk;
mod deliverable;
mod error;
mod extraction;
mod model;
mod search;
mod stage_io;
mod state;
mod template;
mod trace;
mod verification;

pub use chunk::*;
pub use deliverable::*;
pub use error::*;
pub use extraction::*;
pub use model::*;
pub use search::*;
pub use stage_io::*;
pub use state::*;
pub use template::*;
pub use trace::*;
pub use verification::*;
