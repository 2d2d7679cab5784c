//! Card is a front/back pair plus the memory-strength fields the
//! scheduler updates after every review.
use serde::{Deserialize, Serialize};

/// Learning stage derived from the repetition count; never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardStage {
    New,
    Learning,
    Mastered,
}

impl CardStage {
    pub fn label(self) -> &'static str {
        match self {
            CardStage::New => "New",
            CardStage::Learning => "Learning",
            CardStage::Mastered => "Mastered",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub front: String,
    pub back: String,
    /// Easiness factor, never below 1.3.
    pub e_factor: f64,
    /// Days until the next review.
    pub interval: u32,
    /// Consecutive passing reviews since the last lapse.
    pub repetitions: u32,
    /// Unix milliseconds at which the card becomes due.
    pub due_date: i64,
    /// Unix milliseconds of the most recent review, 0 if never reviewed.
    pub last_reviewed: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
}

impl Card {
    pub fn stage(&self) -> CardStage {
        match self.repetitions {
            0 => CardStage::New,
            1..=2 => CardStage::Learning,
            _ => CardStage::Mastered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scheduler;

    #[test]
    fn test_stage_follows_repetitions() {
        let mut card = scheduler::create_card_at(
            "c1".to_string(),
            "hola".to_string(),
            "hello".to_string(),
            None,
            None,
            0,
        );
        assert_eq!(card.stage(), CardStage::New);

        card.repetitions = 1;
        assert_eq!(card.stage(), CardStage::Learning);
        card.repetitions = 2;
        assert_eq!(card.stage(), CardStage::Learning);
        card.repetitions = 3;
        assert_eq!(card.stage(), CardStage::Mastered);
        card.repetitions = 12;
        assert_eq!(card.stage(), CardStage::Mastered);
    }

    #[test]
    fn test_card_clone_keeps_scheduling_fields() {
        let card = Card {
            id: "c1".to_string(),
            front: "hola".to_string(),
            back: "hello".to_string(),
            e_factor: 2.18,
            interval: 7,
            repetitions: 4,
            due_date: 1_700_000_000_000,
            last_reviewed: 1_699_000_000_000,
            image: Some("img/hola.png".to_string()),
            audio: None,
        };

        let copy = card.clone();
        assert_eq!(copy.e_factor, card.e_factor);
        assert_eq!(copy.interval, card.interval);
        assert_eq!(copy.repetitions, card.repetitions);
        assert_eq!(copy.due_date, card.due_date);
        assert_eq!(copy.image, card.image);
    }
}
