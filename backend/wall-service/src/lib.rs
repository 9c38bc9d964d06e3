/// Wall Service Library
///
/// A shared social wall: short text posts with optional image or video
/// attachments, a live feed, and per-post delete. Storage, media and change
/// events are delegated to a hosted Supabase project.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers (page, JSON API, live stream)
/// - `views`: server-rendered HTML
/// - `components`: composer, feed view, previews and profile state
/// - `services`: post repository and media rules
/// - `db`: backend seam and the Supabase implementation
/// - `models`: post and row shapes
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod components;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;
pub mod views;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
