#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{provider} returned {status}: {body}")]
    InvalidStatusCode {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} response contained no text content")]
    EmptyContent { provider: &'static str },
}
