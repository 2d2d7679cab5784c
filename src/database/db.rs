//! SQLite-backed deck store.
//!
//! Decks and their cards live in two tables keyed by the deck id; user
//! settings are a single JSON blob in a key-value table. Card rows carry
//! the scheduling columns (easiness factor, interval, repetitions, due
//! date) so review progress survives restarts. The store trusts the
//! invariants of the `Card` values it is handed.

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::AppError;
use crate::models::{Card, Deck, UserSettings};

type Result<T> = std::result::Result<T, AppError>;

const SETTINGS_KEY: &str = "user_settings";

/// Opens (or creates) the database at `path` and ensures the schema.
pub fn open_database(path: &str) -> Result<Connection> {
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Creates the tables if they do not exist and enables cascade deletes.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS decks (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            source_lang TEXT NOT NULL,
            target_lang TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            last_studied INTEGER,
            tags TEXT NOT NULL DEFAULT '[]'
        );

        CREATE TABLE IF NOT EXISTS cards (
            id TEXT PRIMARY KEY,
            deck_id TEXT NOT NULL REFERENCES decks(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            front TEXT NOT NULL,
            back TEXT NOT NULL,
            e_factor REAL NOT NULL DEFAULT 2.5,
            interval_days INTEGER NOT NULL DEFAULT 0,
            repetitions INTEGER NOT NULL DEFAULT 0,
            due_date INTEGER NOT NULL,
            last_reviewed INTEGER NOT NULL DEFAULT 0,
            image TEXT,
            audio TEXT
        );

        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
    )?;
    Ok(())
}

/// Creates or updates a deck and rewrites its cards in order.
pub fn save_deck(deck: &Deck, conn: &Connection) -> Result<()> {
    let tags = serde_json::to_string(&deck.tags)?;
    conn.execute(
        "INSERT INTO decks (id, title, description, source_lang, target_lang, created_at, last_studied, tags)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            description = excluded.description,
            source_lang = excluded.source_lang,
            target_lang = excluded.target_lang,
            last_studied = excluded.last_studied,
            tags = excluded.tags",
        params![
            deck.id,
            deck.title,
            deck.description,
            deck.source_lang,
            deck.target_lang,
            deck.created_at,
            deck.last_studied,
            tags
        ],
    )?;

    conn.execute("DELETE FROM cards WHERE deck_id = ?1", params![deck.id])?;

    let mut stmt = conn.prepare(
        "INSERT INTO cards (id, deck_id, position, front, back, e_factor, interval_days,
                            repetitions, due_date, last_reviewed, image, audio)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    )?;
    for (position, card) in deck.cards.iter().enumerate() {
        stmt.execute(params![
            card.id,
            deck.id,
            position as i64,
            card.front,
            card.back,
            card.e_factor,
            card.interval,
            card.repetitions,
            card.due_date,
            card.last_reviewed,
            card.image,
            card.audio
        ])?;
    }

    Ok(())
}

/// Loads a single deck with its cards, or `None` if the id is unknown.
pub fn load_deck(deck_id: &str, conn: &Connection) -> Result<Option<Deck>> {
    let row = conn
        .query_row(
            "SELECT id, title, description, source_lang, target_lang, created_at, last_studied, tags
             FROM decks WHERE id = ?1",
            params![deck_id],
            deck_from_row,
        )
        .optional()?;

    match row {
        Some((mut deck, tags_json)) => {
            deck.tags = serde_json::from_str(&tags_json).unwrap_or_default();
            deck.cards = load_cards(&deck.id, conn)?;
            Ok(Some(deck))
        }
        None => Ok(None),
    }
}

/// Loads every deck with its cards, oldest deck first.
pub fn load_all_decks(conn: &Connection) -> Result<Vec<Deck>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, description, source_lang, target_lang, created_at, last_studied, tags
         FROM decks ORDER BY created_at ASC, id ASC",
    )?;
    let rows = stmt
        .query_map([], deck_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut decks = Vec::with_capacity(rows.len());
    for (mut deck, tags_json) in rows {
        deck.tags = serde_json::from_str(&tags_json).unwrap_or_default();
        deck.cards = load_cards(&deck.id, conn)?;
        decks.push(deck);
    }

    Ok(decks)
}

/// Deletes a deck; its cards go with it via the cascade.
pub fn delete_deck(deck_id: &str, conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM decks WHERE id = ?1", params![deck_id])?;
    Ok(())
}

/// Updates a single card row after a review.
pub fn update_card(deck_id: &str, card: &Card, conn: &Connection) -> Result<()> {
    conn.execute(
        "UPDATE cards
         SET front = ?1, back = ?2, e_factor = ?3, interval_days = ?4,
             repetitions = ?5, due_date = ?6, last_reviewed = ?7, image = ?8, audio = ?9
         WHERE id = ?10 AND deck_id = ?11",
        params![
            card.front,
            card.back,
            card.e_factor,
            card.interval,
            card.repetitions,
            card.due_date,
            card.last_reviewed,
            card.image,
            card.audio,
            card.id,
            deck_id
        ],
    )?;
    Ok(())
}

/// Stamps the deck's last-studied time.
pub fn touch_last_studied(deck_id: &str, when: i64, conn: &Connection) -> Result<()> {
    conn.execute(
        "UPDATE decks SET last_studied = ?1 WHERE id = ?2",
        params![when, deck_id],
    )?;
    Ok(())
}

/// Loads user settings, falling back to defaults when absent or
/// unreadable.
pub fn load_settings(conn: &Connection) -> Result<UserSettings> {
    let json: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![SETTINGS_KEY],
            |row| row.get(0),
        )
        .optional()?;

    Ok(match json {
        Some(json) => serde_json::from_str(&json).unwrap_or_default(),
        None => UserSettings::default(),
    })
}

pub fn save_settings(settings: &UserSettings, conn: &Connection) -> Result<()> {
    let json = serde_json::to_string(settings)?;
    conn.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![SETTINGS_KEY, json],
    )?;
    Ok(())
}

/// Maps a deck row; tags come back as raw JSON for the caller to parse.
fn deck_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(Deck, String)> {
    Ok((
        Deck {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            source_lang: row.get(3)?,
            target_lang: row.get(4)?,
            cards: Vec::new(),
            created_at: row.get(5)?,
            last_studied: row.get(6)?,
            tags: Vec::new(),
        },
        row.get(7)?,
    ))
}

fn load_cards(deck_id: &str, conn: &Connection) -> Result<Vec<Card>> {
    let mut stmt = conn.prepare(
        "SELECT id, front, back, e_factor, interval_days, repetitions, due_date,
                last_reviewed, image, audio
         FROM cards WHERE deck_id = ?1 ORDER BY position ASC",
    )?;

    let cards = stmt
        .query_map(params![deck_id], |row| {
            Ok(Card {
                id: row.get(0)?,
                front: row.get(1)?,
                back: row.get(2)?,
                e_factor: row.get(3)?,
                interval: row.get(4)?,
                repetitions: row.get(5)?,
                due_date: row.get(6)?,
                last_reviewed: row.get(7)?,
                image: row.get(8)?,
                audio: row.get(9)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<Card>>>()?;

    Ok(cards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scheduler::{DAY_MS, create_card_at, process_review_at};
    use crate::models::{Difficulty, Theme};

    const NOW: i64 = 1_700_000_000_000;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn sample_deck() -> Deck {
        let mut deck = Deck::new(
            "d1".to_string(),
            "Spanish Basics".to_string(),
            "Everyday phrases".to_string(),
            "en".to_string(),
            "es".to_string(),
            NOW,
        );
        deck.tags = vec!["spanish".to_string(), "beginner".to_string()];
        for (i, (front, back)) in [("Hello", "Hola"), ("Please", "Por favor"), ("Cat", "Gato")]
            .iter()
            .enumerate()
        {
            deck.cards.push(create_card_at(
                format!("c{i}"),
                front.to_string(),
                back.to_string(),
                None,
                None,
                NOW,
            ));
        }
        deck
    }

    #[test]
    fn test_save_and_load_roundtrip_preserves_order_and_scheduling() {
        let conn = test_conn();
        let mut deck = sample_deck();
        deck.cards[1] = process_review_at(&deck.cards[1], Difficulty::Easy, NOW);
        save_deck(&deck, &conn).unwrap();

        let loaded = load_deck("d1", &conn).unwrap().unwrap();
        assert_eq!(loaded.title, "Spanish Basics");
        assert_eq!(loaded.tags, deck.tags);

        let ids: Vec<&str> = loaded.cards.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["c0", "c1", "c2"]);

        let reviewed = &loaded.cards[1];
        assert_eq!(reviewed.repetitions, 1);
        assert_eq!(reviewed.interval, 1);
        assert_eq!(reviewed.due_date, NOW + DAY_MS);
        assert!((reviewed.e_factor - 2.6).abs() < 1e-9);
    }

    #[test]
    fn test_save_deck_is_an_upsert() {
        let conn = test_conn();
        let mut deck = sample_deck();
        save_deck(&deck, &conn).unwrap();

        deck.title = "Spanish 101".to_string();
        deck.cards.remove(0);
        save_deck(&deck, &conn).unwrap();

        let decks = load_all_decks(&conn).unwrap();
        assert_eq!(decks.len(), 1);
        assert_eq!(decks[0].title, "Spanish 101");
        assert_eq!(decks[0].cards.len(), 2);
    }

    #[test]
    fn test_delete_deck_cascades_to_cards() {
        let conn = test_conn();
        save_deck(&sample_deck(), &conn).unwrap();
        delete_deck("d1", &conn).unwrap();

        assert!(load_deck("d1", &conn).unwrap().is_none());
        let orphans: i64 = conn
            .query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0))
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn test_update_card_touches_only_that_row() {
        let conn = test_conn();
        let deck = sample_deck();
        save_deck(&deck, &conn).unwrap();

        let updated = process_review_at(&deck.cards[0], Difficulty::Medium, NOW);
        update_card("d1", &updated, &conn).unwrap();

        let loaded = load_deck("d1", &conn).unwrap().unwrap();
        assert_eq!(loaded.cards[0].repetitions, 1);
        assert_eq!(loaded.cards[1].repetitions, 0);
        assert_eq!(loaded.cards[2].repetitions, 0);
    }

    #[test]
    fn test_settings_roundtrip_and_default() {
        let conn = test_conn();

        let fresh = load_settings(&conn).unwrap();
        assert_eq!(fresh.streak_count, 0);
        assert_eq!(fresh.theme, Theme::System);

        let settings = UserSettings {
            streak_count: 4,
            total_cards_studied: 250,
            theme: Theme::Dark,
            ..UserSettings::default()
        };
        save_settings(&settings, &conn).unwrap();

        let loaded = load_settings(&conn).unwrap();
        assert_eq!(loaded.streak_count, 4);
        assert_eq!(loaded.total_cards_studied, 250);
        assert_eq!(loaded.theme, Theme::Dark);
    }
}
