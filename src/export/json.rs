//! JSON import/export for decks.
//!
//! The exported file carries the whole deck including each card's
//! scheduling state, so moving a deck between machines keeps its review
//! progress.

use std::fs;
use std::path::Path;

use crate::error::AppError;
use crate::models::Deck;

/// Writes the deck as pretty-printed JSON to `path`.
pub fn export_json_to_path(deck: &Deck, path: &Path) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(deck)?;
    fs::write(path, json)?;
    log::info!("deck '{}' exported to '{}'", deck.title, path.display());
    Ok(())
}

/// Reads a deck back from a JSON file.
pub fn import_json(path: &Path) -> Result<Deck, AppError> {
    let contents = fs::read_to_string(path)?;
    let deck: Deck = serde_json::from_str(&contents)?;
    log::info!("deck '{}' imported from '{}'", deck.title, path.display());
    Ok(deck)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scheduler::{create_card_at, process_review_at};
    use crate::models::Difficulty;

    const NOW: i64 = 1_700_000_000_000;

    fn test_deck() -> Deck {
        let mut deck = Deck::new(
            "d1".to_string(),
            "Test Deck".to_string(),
            "For the export tests".to_string(),
            "en".to_string(),
            "es".to_string(),
            NOW,
        );
        let card = create_card_at(
            "c1".to_string(),
            "goodbye".to_string(),
            "adiós".to_string(),
            None,
            None,
            NOW,
        );
        deck.cards.push(process_review_at(&card, Difficulty::Easy, NOW));
        deck.cards.push(create_card_at(
            "c2".to_string(),
            "hello".to_string(),
            "hola".to_string(),
            Some("img/hello.png".to_string()),
            None,
            NOW,
        ));
        deck
    }

    #[test]
    fn test_export_and_import_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_deck.json");

        let original = test_deck();
        export_json_to_path(&original, &path).unwrap();

        let imported = import_json(&path).unwrap();
        assert_eq!(imported.id, original.id);
        assert_eq!(imported.title, original.title);
        assert_eq!(imported.cards.len(), original.cards.len());

        // Scheduling state survives the trip.
        assert_eq!(imported.cards[0].repetitions, 1);
        assert_eq!(imported.cards[0].interval, 1);
        assert_eq!(imported.cards[0].e_factor, original.cards[0].e_factor);
        assert_eq!(imported.cards[0].due_date, original.cards[0].due_date);
        assert_eq!(imported.cards[1].image, original.cards[1].image);
    }

    #[test]
    fn test_import_accepts_minimal_deck() {
        let json = r#"{
  "id": "imported",
  "title": "Imported Deck",
  "source_lang": "en",
  "target_lang": "fr",
  "created_at": 1700000000000,
  "cards": [
    {
      "id": "c1",
      "front": "bread",
      "back": "pain",
      "e_factor": 2.5,
      "interval": 0,
      "repetitions": 0,
      "due_date": 1700000000000,
      "last_reviewed": 0
    }
  ]
}"#;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("minimal.json");
        fs::write(&path, json).unwrap();

        let deck = import_json(&path).unwrap();
        assert_eq!(deck.title, "Imported Deck");
        assert_eq!(deck.description, "");
        assert!(deck.tags.is_empty());
        assert_eq!(deck.cards[0].back, "pain");
        assert!(deck.cards[0].image.is_none());
    }

    #[test]
    fn test_import_nonexistent_file_fails() {
        let result = import_json(Path::new("no_such_file_xyz123.json"));
        assert!(result.is_err());
    }

    #[test]
    fn test_import_invalid_json_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ this is not valid json }").unwrap();

        assert!(matches!(import_json(&path), Err(AppError::Json(_))));
    }
}
