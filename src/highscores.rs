//! Local high score
//!
//! A single best score persisted to LocalStorage. Read once at startup, written
//! on every new record.

use crate::consts::HIGH_SCORE_KEY;

/// Where the best score is kept
pub trait HighScoreStore {
    /// Stored best, 0 when nothing has been saved yet
    fn load_high_score(&self) -> u32;
    fn save_high_score(&mut self, score: u32);
}

/// Parse a stored value; anything unreadable counts as no score
pub fn parse_stored(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok()).unwrap_or(0)
}

/// LocalStorage-backed store (in-memory on native)
#[derive(Debug, Default)]
pub struct LocalHighScore {
    #[cfg(not(target_arch = "wasm32"))]
    value: Option<u32>,
}

impl LocalHighScore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(target_arch = "wasm32")]
impl HighScoreStore for LocalHighScore {
    fn load_high_score(&self) -> u32 {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        let raw = storage.and_then(|s| s.get_item(HIGH_SCORE_KEY).ok().flatten());
        let score = parse_stored(raw.as_deref());
        log::info!("Loaded high score {}", score);
        score
    }

    fn save_high_score(&mut self, score: u32) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        match storage {
            Some(storage) => {
                record_save(score, storage.set_item(HIGH_SCORE_KEY, &score.to_string()));
            }
            None => log::warn!("LocalStorage unavailable; high score {} not saved", score),
        }
    }
}

/// Log the outcome of a storage write; true when it stuck
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn record_save<E: std::fmt::Debug>(score: u32, result: Result<(), E>) -> bool {
    match result {
        Ok(()) => {
            log::info!("High score saved ({})", score);
            true
        }
        Err(e) => {
            log::warn!("Failed to save high score {}: {:?}", score, e);
            false
        }
    }
}

/// Native stand-in
#[cfg(not(target_arch = "wasm32"))]
impl HighScoreStore for LocalHighScore {
    fn load_high_score(&self) -> u32 {
        self.value.unwrap_or(0)
    }

    fn save_high_score(&mut self, score: u32) {
        log::debug!("High score {} kept in memory under {}", score, HIGH_SCORE_KEY);
        self.value = Some(score);
    }
}

/// In-memory store that counts writes
#[derive(Debug, Clone, Default)]
pub struct MemoryHighScore {
    pub value: u32,
    pub saves: u32,
}

impl MemoryHighScore {
    pub fn with_score(value: u32) -> Self {
        Self { value, saves: 0 }
    }
}

impl HighScoreStore for MemoryHighScore {
    fn load_high_score(&self) -> u32 {
        self.value
    }

    fn save_high_score(&mut self, score: u32) {
        self.value = score;
        self.saves += 1;
    }
}
