//! Application-level configuration constants.

// Backend
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:5000";

/// Base origin of the recommendation backend. Can be overridden at build time
/// with `RECOMMENDER_API_BASE=https://... trunk build`.
pub fn api_base() -> &'static str {
    option_env!("RECOMMENDER_API_BASE").unwrap_or(DEFAULT_API_BASE)
}

// Durable browser storage keys
pub const SESSION_STORAGE_KEY: &str = "sessionId";
pub const DEBUG_STORAGE_KEY: &str = "debug_enabled";

// Dataset files
pub const CSV_MIME_TYPE: &str = "text/csv";
pub const CSV_EXTENSION: &str = ".csv";
pub const MIN_MULTI_FILES: usize = 2;

// Recommendations
pub const DEFAULT_RECOMMENDATIONS: usize = 5;
pub const MIN_RECOMMENDATIONS: usize = 1;
pub const MAX_RECOMMENDATIONS: usize = 50;

// UI behavior
pub const NOTICE_DISMISS_MS: u32 = 4_000;
pub const DEFAULT_EXPORT_FILENAME: &str = "recommender_model.bin";
pub const CONFIG_EXPORT_FILENAME: &str = "model_configuration.json";
