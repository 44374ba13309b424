use std::env;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the deal-finder backend.
    pub api_base_url: String,
    /// Transport timeout applied to every discovery/verification call.
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables, falling back to the
    /// hosted backend when nothing is set.
    pub fn from_env() -> Self {
        Self {
            api_base_url: env::var("GLITCH_API_URL")
                .unwrap_or_else(|_| "https://deal-finder-backend-y9wb.onrender.com".to_string()),
            request_timeout_secs: env::var("GLITCH_API_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .expect("GLITCH_API_TIMEOUT_SECS must be a number"),
        }
    }
}
