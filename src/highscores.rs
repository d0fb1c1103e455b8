//! High score leaderboard for climber runs
//!
//! Persisted as JSON through the injected key-value store, keeps the top 10.

use serde::{Deserialize, Serialize};

use crate::platform::KeyValueStore;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Final score of the run
    pub score: f32,
    /// Difficulty tier reached
    pub tier: u32,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// High score leaderboard, sorted best first
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    pub const STORAGE_KEY: &'static str = "climb_defender_highscores";

    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: f32) -> bool {
        if !score.is_finite() || score <= 0.0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Rank a score would achieve (1-indexed), `None` if it doesn't qualify
    pub fn potential_rank(&self, score: f32) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Insert a run if it qualifies. Returns the rank achieved (1-indexed).
    pub fn add_score(&mut self, score: f32, tier: u32, timestamp: f64) -> Option<usize> {
        let rank = self.potential_rank(score)?;
        self.entries.insert(
            rank - 1,
            HighScoreEntry {
                score,
                tier,
                timestamp,
            },
        );
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<f32> {
        self.entries.first().map(|e| e.score)
    }

    /// Best score on record, 0 when empty
    pub fn best(&self) -> f32 {
        self.top_score().unwrap_or(0.0)
    }

    /// Load from the store; missing or corrupt data starts fresh
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let Some(json) = store.get(Self::STORAGE_KEY) else {
            log::info!("No high scores found, starting fresh");
            return Self::new();
        };
        match serde_json::from_str::<HighScores>(&json) {
            Ok(mut scores) => {
                scores.entries.retain(|e| e.score.is_finite());
                scores
                    .entries
                    .sort_by(|a, b| b.score.total_cmp(&a.score));
                scores.entries.truncate(MAX_HIGH_SCORES);
                log::info!("Loaded {} high scores", scores.entries.len());
                scores
            }
            Err(e) => {
                log::warn!("Discarding unreadable high scores: {}", e);
                Self::new()
            }
        }
    }

    /// Save to the store. Returns false if nothing was written.
    pub fn save(&self, store: &mut dyn KeyValueStore) -> bool {
        match serde_json::to_string(self) {
            Ok(json) => {
                let saved = store.set(Self::STORAGE_KEY, &json);
                if saved {
                    log::info!("High scores saved ({} entries)", self.entries.len());
                }
                saved
            }
            Err(e) => {
                log::warn!("Failed to serialize high scores: {}", e);
                false
            }
        }
    }
}

/// Format a timestamp as a relative date string
#[cfg(target_arch = "wasm32")]
pub fn format_date(timestamp: f64) -> String {
    let date = js_sys::Date::new(&wasm_bindgen::JsValue::from_f64(timestamp));
    let absolute = format!(
        "{}/{}/{}",
        date.get_month() + 1,
        date.get_date(),
        date.get_full_year() % 100
    );
    format_relative(js_sys::Date::now() - timestamp, absolute)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn format_date(timestamp: f64) -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(timestamp);
    format_relative(now - timestamp, "long ago".to_string())
}

/// Relative wording for an age in milliseconds; ages past a week use `absolute`
fn format_relative(diff_ms: f64, absolute: String) -> String {
    let mins = (diff_ms / 60_000.0).floor() as i64;
    let hours = mins / 60;
    let days = hours / 24;

    match (days, hours, mins) {
        (d, _, _) if d >= 7 => absolute,
        (1, _, _) => "Yesterday".to_string(),
        (d, _, _) if d > 1 => format!("{} days ago", d),
        (_, 1, _) => "1 hour ago".to_string(),
        (_, h, _) if h > 1 => format!("{} hours ago", h),
        (_, _, 1) => "1 min ago".to_string(),
        (_, _, m) if m > 1 => format!("{} mins ago", m),
        _ => "Just now".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStore;

    #[test]
    fn test_entries_stay_sorted_and_capped() {
        let mut scores = HighScores::new();
        for i in 0..15 {
            scores.add_score((i * 10 + 5) as f32, i, 0.0);
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.best(), 145.0);
        assert!(
            scores
                .entries
                .windows(2)
                .all(|w| w[0].score >= w[1].score)
        );
        // Lowest surviving entry
        assert_eq!(scores.entries.last().map(|e| e.score), Some(55.0));
    }

    #[test]
    fn test_rejects_non_qualifying() {
        let mut scores = HighScores::new();
        assert_eq!(scores.add_score(0.0, 0, 0.0), None);
        assert_eq!(scores.add_score(f32::NAN, 0, 0.0), None);
        assert_eq!(scores.add_score(50.0, 2, 0.0), Some(1));
        assert_eq!(scores.add_score(80.0, 3, 0.0), Some(1));
        assert_eq!(scores.add_score(60.0, 2, 0.0), Some(2));
        assert_eq!(scores.potential_rank(10.0), Some(4));
    }

    #[test]
    fn test_round_trip_through_store() {
        let mut store = MemoryStore::new();
        let mut scores = HighScores::new();
        scores.add_score(210.0, 8, 1_700_000_000_000.0);
        assert!(scores.save(&mut store));

        let loaded = HighScores::load(&store);
        assert_eq!(loaded.entries, scores.entries);
    }

    #[test]
    fn test_corrupt_store_starts_fresh() {
        let mut store = MemoryStore::new();
        store.set(HighScores::STORAGE_KEY, "{not json");
        assert!(HighScores::load(&store).is_empty());
        assert_eq!(HighScores::load(&MemoryStore::new()).best(), 0.0);
    }

    #[test]
    fn test_relative_wording() {
        let abs = || "1/2/24".to_string();
        assert_eq!(format_relative(5_000.0, abs()), "Just now");
        assert_eq!(format_relative(90_000.0, abs()), "1 min ago");
        assert_eq!(format_relative(3.0 * 3_600_000.0, abs()), "3 hours ago");
        assert_eq!(format_relative(30.0 * 3_600_000.0, abs()), "Yesterday");
        assert_eq!(format_relative(10.0 * 86_400_000.0, abs()), "1/2/24");
    }
}
