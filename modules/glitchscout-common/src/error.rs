use thiserror::Error;

#[derive(Error, Debug)]
pub enum GlitchScoutError {
    #[error("Discovery error: {0}")]
    Discovery(String),

    #[error("Verification error: {0}")]
    Verification(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
