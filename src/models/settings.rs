//! User-level settings and study-streak bookkeeping.
//!
//! Streaks advance at local-midnight granularity: studying on consecutive
//! days increments the count, a same-day session changes nothing, and a
//! gap resets to 1.

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

use super::scheduler::DAY_MS;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub streak_count: u32,
    /// Local midnight (Unix milliseconds) of the last day with a review.
    pub last_study_date: Option<i64>,
    pub total_cards_studied: u64,
    pub theme: Theme,
}

impl UserSettings {
    /// Records a study event on the day starting at `today` (a local
    /// midnight in Unix milliseconds) and returns the new streak count.
    pub fn update_streak(&mut self, today: i64) -> u32 {
        let yesterday = today - DAY_MS;
        self.streak_count = match self.last_study_date {
            None => 1,
            Some(last) if last == today => self.streak_count,
            Some(last) if last == yesterday => self.streak_count + 1,
            Some(_) => 1,
        };
        self.last_study_date = Some(today);
        self.streak_count
    }
}

/// Local midnight of the day containing `now`, in Unix milliseconds.
pub fn local_midnight_millis(now: i64) -> i64 {
    let fallback = now - now.rem_euclid(DAY_MS);
    let Some(local) = Local.timestamp_millis_opt(now).earliest() else {
        return fallback;
    };
    local
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| Local.from_local_datetime(&midnight).earliest())
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(fallback)
}
