use serde::Deserialize;

use crate::models::DEFAULT_EMOTIONS;

/// Request body limit for image uploads, 16 MiB
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 16 * 1024 * 1024;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// SQLite connection URL for the prediction log
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Redis connection URL; recommendation results are cached only when set
    #[serde(default)]
    pub redis_url: Option<String>,

    /// REST `predict` endpoint of the served emotion model
    #[serde(default = "default_classifier_url")]
    pub classifier_url: String,

    /// Spotify client credentials; recommendations are disabled unless both are set
    #[serde(default)]
    pub spotify_client_id: Option<String>,

    #[serde(default)]
    pub spotify_client_secret: Option<String>,

    /// Spotify Web API base URL
    #[serde(default = "default_spotify_api_url")]
    pub spotify_api_url: String,

    /// Spotify accounts token endpoint
    #[serde(default = "default_spotify_auth_url")]
    pub spotify_auth_url: String,

    /// Ordered label vocabulary, index-aligned with the classifier output
    #[serde(default = "default_emotion_labels")]
    pub emotion_labels: Vec<String>,

    /// Side length of the square classifier input
    #[serde(default = "default_image_size")]
    pub image_size: u32,

    /// Maximum number of tracks requested per classification
    #[serde(default = "default_recommendation_limit")]
    pub recommendation_limit: usize,

    /// Largest trailing window accepted by the daily analytics queries
    #[serde(default = "default_max_window_days")]
    pub max_window_days: u32,

    /// Largest `/predict` request body; base64 inflates the image by about a third
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,

    /// Origin allowed by the CORS layer
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_database_url() -> String {
    "sqlite://predictions.db?mode=rwc".to_string()
}

fn default_classifier_url() -> String {
    "http://localhost:8501/v1/models/emotion_cnn:predict".to_string()
}

fn default_spotify_api_url() -> String {
    "https://api.spotify.com/v1".to_string()
}

fn default_spotify_auth_url() -> String {
    "https://accounts.spotify.com/api/token".to_string()
}

fn default_emotion_labels() -> Vec<String> {
    DEFAULT_EMOTIONS.iter().map(|s| s.to_string()).collect()
}

fn default_image_size() -> u32 {
    48
}

fn default_recommendation_limit() -> usize {
    5
}

fn default_max_window_days() -> u32 {
    366
}

fn default_max_request_bytes() -> usize {
    DEFAULT_MAX_REQUEST_BYTES
}

fn default_allowed_origin() -> String {
    "https://mood-tune-nine.vercel.app".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of key/value pairs
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Spotify credentials, if both halves are configured
    pub fn spotify_credentials(&self) -> Option<(&str, &str)> {
        match (&self.spotify_client_id, &self.spotify_client_secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some((id.as_str(), secret.as_str()))
            }
            _ => None,
        }
    }
}
