#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{operation} failed with status {status}: {detail}")]
    Api {
        operation: &'static str,
        status: u16,
        detail: String,
    },
    #[error("Token decoding error: {0}")]
    Token(String),
    #[error("Configuration error: {0}")]
    Config(String),
}
