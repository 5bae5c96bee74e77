//! Configuration schema for memo
//!
//! Configuration is stored at `~/.config/memo/config.toml`, optionally
//! overridden per project by a `.memo.toml`.

use crate::cache::Strategy;
use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache settings
    pub cache: CacheConfig,

    /// HTTP fetcher settings
    pub fetch: FetchConfig,

    /// Key producer / consumer settings
    pub pipeline: PipelineConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Concurrency strategy: "confinement" or "mutex"
    pub strategy: Strategy,

    /// Capacity of the confinement worker's request channel
    pub request_buffer: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Confinement,
            request_buffer: crate::cache::DEFAULT_REQUEST_BUFFER,
        }
    }
}

/// HTTP fetcher configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Overall timeout for one HTTP request, in seconds (unset = no timeout)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// URLs fetched when none are given on the command line
    pub urls: Vec<String>,

    /// How many extra times the URL list is replayed
    pub repeat: u32,

    /// Capacity of the key and response channels
    pub buffer: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            urls: vec![
                "https://golang.org".to_string(),
                "https://godoc.org".to_string(),
                "https://play.golang.org".to_string(),
                "https://gopl.io".to_string(),
            ],
            repeat: 4,
            buffer: 16,
        }
    }
}
