mod env;
mod model_config;
mod retry_config;

pub use env::*;
pub use model_config::*;
pub use retry_config::*;
