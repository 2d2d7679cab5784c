//! Deck is a titled collection of cards for one language pair.
use super::Card;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Deck {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub source_lang: String,
    pub target_lang: String,
    pub cards: Vec<Card>,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_studied: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Deck {
    pub fn new(
        id: String,
        title: String,
        description: String,
        source_lang: String,
        target_lang: String,
        created_at: i64,
    ) -> Self {
        Self {
            id,
            title,
            description,
            source_lang,
            target_lang,
            cards: Vec::new(),
            created_at,
            last_studied: None,
            tags: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_deck_is_empty() {
        let deck = Deck::new(
            "d1".to_string(),
            "Spanish Basics".to_string(),
            "Everyday phrases".to_string(),
            "en".to_string(),
            "es".to_string(),
            1_700_000_000_000,
        );

        assert!(deck.cards.is_empty());
        assert!(deck.last_studied.is_none());
        assert!(deck.tags.is_empty());
        assert_eq!(deck.title, "Spanish Basics");
    }
}
