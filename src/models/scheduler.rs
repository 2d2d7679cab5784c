//! Adapted SM-2 (SuperMemo 2) spaced repetition scheduler.
//!
//! Review outcomes come in three grades that map onto the SM-2 quality
//! scale as hard=2, medium=3, easy=5:
//! - Each card has an easiness factor (EF) that adjusts after every
//!   review and never falls below 1.3
//! - A hard answer is a lapse: the interval drops back to 1 day and one
//!   repetition of progress is lost
//! - Medium/easy answers grow the interval: 1 day, then 3 days, then the
//!   previous interval times EF
//!
//! Every function is pure over its inputs; the wall-clock entry points
//! delegate to `_at` variants taking an explicit timestamp, which is
//! what the tests drive.

use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use super::{Card, CardStage};

pub const MIN_E_FACTOR: f64 = 1.3;
pub const DEFAULT_E_FACTOR: f64 = 2.5;

/// One day in milliseconds. Intervals are raw wall-clock offsets, not
/// calendar days.
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// How well a review went. Three coarse grades only; the study screen
/// shows three buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Difficulty {
    Hard,
    Medium,
    Easy,
}

impl Difficulty {
    /// SM-2 quality grade. Quality 4 is intentionally unused: medium maps
    /// straight to the SM-2 passing grade 3.
    pub fn quality(self) -> u8 {
        match self {
            Difficulty::Hard => 2,
            Difficulty::Medium => 3,
            Difficulty::Easy => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Hard => "hard",
            Difficulty::Medium => "medium",
            Difficulty::Easy => "easy",
        }
    }

    /// Parses a stored or user-facing label. Unknown labels fall back to
    /// `Medium` so review processing stays total.
    pub fn from_label(label: &str) -> Self {
        match label {
            "hard" => Difficulty::Hard,
            "easy" => Difficulty::Easy,
            _ => Difficulty::Medium,
        }
    }
}

/// Aggregate view of one deck's cards at a single instant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StudyStats {
    pub due_count: usize,
    pub new_count: usize,
    pub learning_count: usize,
    pub mastered_count: usize,
    pub total_count: usize,
    pub next_7_days: [usize; 7],
}

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Builds a new card that is due immediately. The caller supplies the id;
/// the scheduler never generates identifiers.
pub fn create_card(
    id: String,
    front: String,
    back: String,
    image: Option<String>,
    audio: Option<String>,
) -> Card {
    create_card_at(id, front, back, image, audio, now_millis())
}

pub fn create_card_at(
    id: String,
    front: String,
    back: String,
    image: Option<String>,
    audio: Option<String>,
    now: i64,
) -> Card {
    Card {
        id,
        front,
        back,
        e_factor: DEFAULT_E_FACTOR,
        interval: 0,
        repetitions: 0,
        due_date: now,
        last_reviewed: 0,
        image,
        audio,
    }
}

/// Applies one review outcome and returns the rescheduled card. Content
/// fields are carried over unchanged.
pub fn process_review(card: &Card, difficulty: Difficulty) -> Card {
    process_review_at(card, difficulty, now_millis())
}

pub fn process_review_at(card: &Card, difficulty: Difficulty, now: i64) -> Card {
    let quality = difficulty.quality();
    let q = f64::from(quality);

    // Standard SM-2 easiness update, floored at 1.3.
    let new_e_factor =
        (card.e_factor + (0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02))).max(MIN_E_FACTOR);

    let (repetitions, interval) = if quality < 3 {
        // Lapse: back to a one-day interval, but give up only one step of
        // repetition history rather than resetting to zero.
        (card.repetitions.saturating_sub(1), 1)
    } else {
        let repetitions = card.repetitions + 1;
        let interval = match repetitions {
            1 => 1,
            2 => 3,
            _ => (f64::from(card.interval) * new_e_factor).round() as u32,
        };
        (repetitions, interval)
    };

    Card {
        e_factor: new_e_factor,
        interval,
        repetitions,
        due_date: now + i64::from(interval) * DAY_MS,
        last_reviewed: now,
        ..card.clone()
    }
}

/// Snapshot of the cards whose due date has passed, in input order.
pub fn due_cards(cards: &[Card]) -> Vec<Card> {
    due_cards_at(cards, now_millis())
}

pub fn due_cards_at(cards: &[Card], now: i64) -> Vec<Card> {
    cards
        .iter()
        .filter(|card| card.due_date <= now)
        .cloned()
        .collect()
}

/// Computes deck statistics from a single snapshot of the clock.
pub fn study_stats(cards: &[Card]) -> StudyStats {
    study_stats_at(cards, now_millis())
}

pub fn study_stats_at(cards: &[Card], now: i64) -> StudyStats {
    let mut next_7_days = [0usize; 7];
    for (i, bucket) in next_7_days.iter_mut().enumerate() {
        let target = now + (i as i64 + 1) * DAY_MS;
        // Every bucket shares `now` as its lower bound, so a card due in
        // two days is counted in the 2-day bucket and every later one.
        *bucket = cards
            .iter()
            .filter(|card| card.due_date > now && card.due_date <= target)
            .count();
    }

    StudyStats {
        due_count: cards.iter().filter(|card| card.due_date <= now).count(),
        new_count: cards
            .iter()
            .filter(|card| card.stage() == CardStage::New)
            .count(),
        learning_count: cards
            .iter()
            .filter(|card| card.stage() == CardStage::Learning)
            .count(),
        mastered_count: cards
            .iter()
            .filter(|card| card.stage() == CardStage::Mastered)
            .count(),
        total_count: cards.len(),
        next_7_days,
    }
}
