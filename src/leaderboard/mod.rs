//! Remote leaderboard
//!
//! Top-10 board shared by every player. Calls are best effort: a failure is
//! logged and the board simply keeps what it last showed. Nothing here can
//! affect a round in progress.

#[cfg(target_arch = "wasm32")]
pub mod rest;

use std::cell::{Cell, RefCell};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::consts::{LEADERBOARD_LIMIT, MAX_INITIALS};

#[cfg(target_arch = "wasm32")]
pub use rest::RestLeaderboard;

/// Leaderboard call failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaderboardError {
    #[error("leaderboard endpoint not configured")]
    NotConfigured,
    #[error("network error: {0}")]
    Transport(String),
    #[error("server returned status {0}")]
    Status(u16),
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Rejected initials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InitialsError {
    #[error("please enter your initials")]
    Empty,
    #[error("initials may only contain letters, found {0:?}")]
    InvalidChar(char),
}

/// One to three uppercase ASCII letters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Initials(String);

impl Initials {
    /// Normalize raw input: uppercase, trim, keep the first three characters
    pub fn parse(raw: &str) -> Result<Self, InitialsError> {
        let upper = raw.to_uppercase();
        let trimmed: String = upper.trim().chars().take(MAX_INITIALS).collect();
        if trimmed.is_empty() {
            return Err(InitialsError::Empty);
        }
        if let Some(c) = trimmed.chars().find(|c| !c.is_ascii_uppercase()) {
            return Err(InitialsError::InvalidChar(c));
        }
        Ok(Self(trimmed))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Initials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A row on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub initials: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: u32,
}

impl ScoreEntry {
    pub fn new(initials: &Initials, score: u32) -> Self {
        Self {
            initials: initials.as_str().to_string(),
            score,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Remote board operations
#[allow(async_fn_in_trait)]
pub trait LeaderboardClient {
    async fn submit(&self, entry: &ScoreEntry) -> Result<(), LeaderboardError>;
    /// Best `n` entries, highest score first
    async fn fetch_top(&self, n: usize) -> Result<Vec<ScoreEntry>, LeaderboardError>;
}

/// Submit an entry, then re-read the board. A failed submit skips the re-read.
pub async fn submit_and_refresh<C: LeaderboardClient>(
    client: &C,
    entry: &ScoreEntry,
    n: usize,
) -> Result<Vec<ScoreEntry>, LeaderboardError> {
    client.submit(entry).await?;
    log::info!("Submitted {} with {}", entry.initials, entry.score);
    client.fetch_top(n).await
}

/// In-process board for native runs and tests
#[derive(Debug, Default)]
pub struct MemoryLeaderboard {
    entries: RefCell<Vec<ScoreEntry>>,
    offline: Cell<bool>,
}

impl MemoryLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with a transport error
    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn check_online(&self) -> Result<(), LeaderboardError> {
        if self.offline.get() {
            Err(LeaderboardError::Transport("offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl LeaderboardClient for MemoryLeaderboard {
    async fn submit(&self, entry: &ScoreEntry) -> Result<(), LeaderboardError> {
        self.check_online()?;
        self.entries.borrow_mut().push(entry.clone());
        Ok(())
    }

    async fn fetch_top(&self, n: usize) -> Result<Vec<ScoreEntry>, LeaderboardError> {
        self.check_online()?;
        let mut entries = self.entries.borrow().clone();
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(n);
        Ok(entries)
    }
}

/// The board as last rendered
#[derive(Debug, Clone)]
pub struct LeaderboardView {
    entries: Vec<ScoreEntry>,
    limit: usize,
}

impl Default for LeaderboardView {
    fn default() -> Self {
        Self::new(LEADERBOARD_LIMIT)
    }
}

impl LeaderboardView {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit,
        }
    }

    /// Take a fetch result. On error the current entries stay.
    /// Returns whether the board changed.
    pub fn apply_fetch(&mut self, result: Result<Vec<ScoreEntry>, LeaderboardError>) -> bool {
        match result {
            Ok(entries) => {
                log::info!("Leaderboard updated ({} entries)", entries.len());
                self.entries = entries;
                true
            }
            Err(LeaderboardError::NotConfigured) => {
                log::warn!("Leaderboard endpoint not configured");
                false
            }
            Err(e) => {
                log::warn!("Unable to update leaderboard: {}", e);
                false
            }
        }
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    /// Display lines, best first
    pub fn rows(&self) -> Vec<String> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.score.cmp(&a.score));
        sorted
            .iter()
            .take(self.limit)
            .enumerate()
            .map(|(i, entry)| {
                let initials = if entry.initials.is_empty() {
                    "???".to_string()
                } else {
                    entry.initials.to_uppercase()
                };
                format!("{}. {} — {}", i + 1, initials, entry.score)
            })
            .collect()
    }
}
