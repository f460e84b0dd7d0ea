//! Runtime configuration, read from the environment.

use secrecy::SecretString;

use crate::error::ConfigError;

/// Survey service configuration.
#[derive(Debug, Clone)]
pub struct SurveyConfig {
    /// Path to the local database file.
    pub db_path: String,
    /// Port for the HTTP API.
    pub port: u16,
    /// OpenAI API key for narrative generation. Absent → fallback narratives.
    pub openai_api_key: Option<SecretString>,
    /// Model used for narrative generation.
    pub openai_model: String,
    /// Cloudinary cloud name for certificate rendering. Absent → no certificates.
    pub cloudinary_cloud_name: Option<String>,
    /// Completion webhook endpoint. Absent → webhook disabled.
    pub webhook_url: Option<String>,
    /// Shared secret sent in the webhook header.
    pub webhook_secret: Option<String>,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            db_path: "./data/survey.db".to_string(),
            port: 3001,
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            cloudinary_cloud_name: None,
            webhook_url: None,
            webhook_secret: None,
        }
    }
}

impl SurveyConfig {
    /// Load configuration from environment variables.
    ///
    /// Enrichment credentials are optional: the pipeline degrades to
    /// deterministic fallbacks when they are missing. Only a malformed
    /// value (e.g. a non-numeric port) is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match std::env::var("SURVEY_PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "SURVEY_PORT".to_string(),
                message: format!("not a valid port number: {raw}"),
            })?,
            Err(_) => defaults.port,
        };

        Ok(Self {
            db_path: std::env::var("SURVEY_DB_PATH").unwrap_or(defaults.db_path),
            port,
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.is_empty())
                .map(SecretString::from),
            openai_model: std::env::var("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            cloudinary_cloud_name: std::env::var("CLOUDINARY_CLOUD_NAME")
                .ok()
                .filter(|n| !n.is_empty()),
            webhook_url: std::env::var("SURVEY_WEBHOOK_URL").ok().filter(|u| !u.is_empty()),
            webhook_secret: std::env::var("SURVEY_WEBHOOK_SECRET").ok(),
        })
    }
}
