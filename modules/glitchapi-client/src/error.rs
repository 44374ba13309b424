use thiserror::Error;

pub type Result<T> = std::result::Result<T, GlitchApiError>;

#[derive(Debug, Error)]
pub enum GlitchApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for GlitchApiError {
    fn from(err: reqwest::Error) -> Self {
        GlitchApiError::Network(err.to_string())
    }
}
