//! Centralized constants for the club spend tool
//!
//! Per-user settings (snapshot source, default currency and scope) are loaded
//! from config.toml; everything here applies to every run.

// =============================================================================
// Snapshot Source
// =============================================================================

/// Snapshot used when neither --source nor config.toml names one
pub const DEFAULT_SOURCE: &str = "data/teams.json";

/// Config file looked up in the working directory
pub const CONFIG_FILE: &str = "config.toml";

// =============================================================================
// Fetching
// =============================================================================

/// Attempts per snapshot download
pub const DEFAULT_FETCH_RETRIES: u32 = 3;

/// Base delay for exponential backoff between attempts (seconds, doubled per retry)
pub const RETRY_BASE_DELAY_SECS: u64 = 1;

/// Longest wait between attempts
pub const MAX_RETRY_DELAY_SECS: u64 = 60;

/// Per-request timeout
pub const FETCH_TIMEOUT_SECS: u64 = 30;

/// Sent with every snapshot request
pub const USER_AGENT: &str = concat!("club-spend/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// File Names
// =============================================================================

/// Cache database filename
pub const CACHE_FILENAME: &str = "cache.sqlite";

/// Club table CSV filename
pub const CLUBS_FILENAME: &str = "clubs.csv";

/// Incoming transfer view CSV filename
pub const TRANSFERS_IN_FILENAME: &str = "transfers_in.csv";

/// Outgoing transfer view CSV filename
pub const TRANSFERS_OUT_FILENAME: &str = "transfers_out.csv";

/// Data-quality ranking CSV filename
pub const QUALITY_FILENAME: &str = "quality.csv";

// =============================================================================
// Cache Metadata Keys
// =============================================================================

/// Source of the most recent successful load
pub const LAST_SOURCE_KEY: &str = "last_source";

// =============================================================================
// Display
// =============================================================================

/// Transfer rows printed to the console before truncating
pub const CONSOLE_TRANSFER_ROWS: usize = 25;

/// Longest club or player name shown in console tables
pub const MAX_NAME_WIDTH: usize = 24;
