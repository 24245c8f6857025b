//! Game configuration
//!
//! Round timings, playfield size and the leaderboard endpoint. Loaded from JSON
//! (a file on native, LocalStorage on web) with every field optional.
//!
//! The leaderboard endpoint can also come from the host: baked in at build time
//! through `SHAPE_STACKER_LEADERBOARD_URL` / `SHAPE_STACKER_LEADERBOARD_KEY`, or
//! from `data-leaderboard-url` / `data-leaderboard-key` on `#game-container`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Configuration load failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unable to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Playfield size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: MAX_VIEWPORT_WIDTH,
            height: MAX_VIEWPORT_HEIGHT,
        }
    }
}

impl Viewport {
    /// Fit to a container, never growing past the maximum playfield
    pub fn fit(container_width: f32, container_height: f32) -> Self {
        Self {
            width: container_width.min(MAX_VIEWPORT_WIDTH),
            height: container_height.min(MAX_VIEWPORT_HEIGHT),
        }
    }
}

/// Hosted leaderboard table endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    /// Project base URL, e.g. `https://example.supabase.co`
    pub url: String,
    /// Public (anon) API key
    pub anon_key: String,
    /// Table holding `initials` and `score` columns
    pub table: String,
    /// Entries to fetch and show
    pub limit: usize,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            url: option_env!("SHAPE_STACKER_LEADERBOARD_URL")
                .unwrap_or_default()
                .to_string(),
            anon_key: option_env!("SHAPE_STACKER_LEADERBOARD_KEY")
                .unwrap_or_default()
                .to_string(),
            table: "scores".to_string(),
            limit: LEADERBOARD_LIMIT,
        }
    }
}

impl LeaderboardConfig {
    /// Both URL and key are needed before any request is made
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty() && !self.anon_key.is_empty()
    }

    /// Take the endpoint the host page supplies; blank values are ignored
    pub fn apply_endpoint(&mut self, url: Option<&str>, anon_key: Option<&str>) {
        if let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) {
            self.url = url.to_string();
        }
        if let Some(key) = anon_key.map(str::trim).filter(|k| !k.is_empty()) {
            self.anon_key = key.to_string();
        }
    }

    /// REST endpoint for the scores table
    pub fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.url.trim_end_matches('/'), self.table)
    }

    /// Query for the top `n` entries, best first
    pub fn top_url(&self, n: usize) -> String {
        format!(
            "{}?select=initials,score&order=score.desc&limit={}",
            self.table_url(),
            n
        )
    }
}

/// Complete game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Main countdown, seconds
    pub countdown_secs: u32,
    /// Lock-in grace window, seconds
    pub grace_secs: u32,
    /// Playfield size
    pub viewport: Viewport,
    /// Remote leaderboard
    pub leaderboard: LeaderboardConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            countdown_secs: COUNTDOWN_SECS,
            grace_secs: GRACE_SECS,
            viewport: Viewport::default(),
            leaderboard: LeaderboardConfig::default(),
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON file
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.countdown_secs == 0 {
            return Err(ConfigError::Invalid("countdown_secs must be at least 1"));
        }
        if self.grace_secs == 0 {
            return Err(ConfigError::Invalid("grace_secs must be at least 1"));
        }
        if self.viewport.width <= 0.0 || self.viewport.height <= 0.0 {
            return Err(ConfigError::Invalid("viewport must have a positive size"));
        }
        if self.leaderboard.limit == 0 {
            return Err(ConfigError::Invalid("leaderboard.limit must be at least 1"));
        }
        Ok(())
    }

    /// Load overrides from LocalStorage (WASM only), falling back to defaults,
    /// then take the leaderboard endpoint from the page if it names one
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let mut config = Self::load_stored().unwrap_or_else(|| {
            log::info!("Using default config");
            Self::default()
        });

        let container = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("game-container"));
        if let Some(container) = container {
            let url = container.get_attribute("data-leaderboard-url");
            let key = container.get_attribute("data-leaderboard-key");
            config
                .leaderboard
                .apply_endpoint(url.as_deref(), key.as_deref());
        }

        if !config.leaderboard.is_configured() {
            log::warn!("No leaderboard endpoint configured; scores stay local");
        }
        config
    }

    #[cfg(target_arch = "wasm32")]
    fn load_stored() -> Option<Self> {
        let storage = web_sys::window()?.local_storage().ok()??;
        let json = storage.get_item(CONFIG_KEY).ok()??;
        match Self::from_json(&json) {
            Ok(config) => {
                log::info!("Loaded config from LocalStorage");
                Some(config)
            }
            Err(e) => {
                log::warn!("Ignoring stored config: {}", e);
                None
            }
        }
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}
