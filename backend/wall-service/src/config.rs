/// Configuration management for Wall Service
///
/// Loads settings from environment variables. Supabase credentials are
/// required; everything else has a development default.
use serde::{Deserialize, Serialize};
use supabase_client::SupabaseConfig;

pub const DEFAULT_MEDIA_BUCKET: &str = "posts-media";
pub const DEFAULT_CACHE_CONTROL_SECS: u64 = 3600;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Hosted backend project and credentials
    pub supabase: SupabaseConfig,
    /// Media storage settings
    pub media: MediaConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Storage bucket for post attachments
    pub bucket: String,
    /// `Cache-Control: max-age` applied to uploaded objects
    pub cache_control_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let supabase = SupabaseConfig::from_env().map_err(|e| e.to_string())?;

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("WALL_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("WALL_SERVICE_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
            },
            cors: {
                let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                    Ok(value) => value,
                    Err(_) if app_env.eq_ignore_ascii_case("production") => {
                        return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                    }
                    Err(_) => "http://localhost:3000".to_string(),
                };

                if app_env.eq_ignore_ascii_case("production") && allowed_origins.trim() == "*" {
                    return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
                }

                CorsConfig { allowed_origins }
            },
            supabase,
            media: MediaConfig {
                bucket: std::env::var("WALL_MEDIA_BUCKET")
                    .ok()
                    .filter(|b| !b.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_MEDIA_BUCKET.to_string()),
                cache_control_secs: parse_env_or_default(
                    "WALL_MEDIA_CACHE_CONTROL_SECS",
                    DEFAULT_CACHE_CONTROL_SECS,
                )?,
            },
        })
    }
}

fn parse_env_or_default(key: &str, default: u64) -> Result<u64, String> {
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}
