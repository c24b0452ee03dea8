use std::env;

use notebook_grid::ErrorDisplay;

/// Process configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// tracing filter directive
    pub log_filter: String,
    /// Overrides the document's error display mode when set
    pub error_display: Option<ErrorDisplay>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let log_filter = env::var("NOTEBOOK_LOG").unwrap_or_else(|_| "info".to_string());
        let error_display = match env::var("NOTEBOOK_ERROR_DISPLAY") {
            Ok(mode) => Some(mode.parse()?),
            Err(_) => None,
        };

        Ok(Self {
            log_filter,
            error_display,
        })
    }
}
