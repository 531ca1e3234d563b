//! Application configuration loaded from environment variables.
//!
//! Secrets are read once at startup and cached in memory; in production the
//! hosting platform injects them as environment variables.

use std::env;

/// Default upstream earthquake catalog (USGS FDSN event service).
pub const DEFAULT_FEED_URL: &str = "https://earthquake.usgs.gov/fdsnws/event/1/query";
/// Default SMS gateway endpoint.
pub const DEFAULT_SMS_URL: &str = "https://api.sms-gate.app/3rdparty/v1/message";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL for CORS
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Upstream event catalog URL
    pub feed_base_url: String,
    /// SMS gateway URL
    pub sms_api_url: String,
    /// Path to the gazetteer GeoJSON file
    pub gazetteer_path: String,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// SMS gateway credentials
    pub sms_api_username: String,
    pub sms_api_password: String,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            feed_base_url: DEFAULT_FEED_URL.to_string(),
            sms_api_url: DEFAULT_SMS_URL.to_string(),
            gazetteer_path: "data/gazetteer.geojson".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            sms_api_username: "test_sms_user".to_string(),
            sms_api_password: "test_sms_pass".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            feed_base_url: env::var("FEED_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_FEED_URL.to_string()),
            sms_api_url: env::var("SMS_API_URL").unwrap_or_else(|_| DEFAULT_SMS_URL.to_string()),
            gazetteer_path: env::var("GAZETTEER_PATH")
                .unwrap_or_else(|_| "data/gazetteer.geojson".to_string()),

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            sms_api_username: env::var("SMS_API_USERNAME")
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
            sms_api_password: env::var("SMS_API_PASSWORD")
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
