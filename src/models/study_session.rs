//! Study session over the due cards of a single deck.
//!
//! A session takes one snapshot of the deck's due cards when it begins
//! and walks through them exactly once. Grading a card reschedules it
//! with the SM-2 update, persists the result, and advances the streak
//! and per-user counters.

use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use crate::database::db;
use crate::models::scheduler::{self, Difficulty};
use crate::models::settings::local_midnight_millis;
use crate::models::{Card, Deck};

/// Per-difficulty tallies shown on the completion screen.
#[derive(Clone, Copy, Debug, Default)]
pub struct SessionTally {
    pub total: usize,
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

pub struct StudySession {
    pub deck_id: String,
    pub deck_title: String,
    cards: Vec<Card>,
    current_index: usize,
    pub show_back: bool,
    pub tally: SessionTally,
    conn: Arc<Mutex<Connection>>,
}

impl StudySession {
    /// Snapshots the deck's currently due cards. Returns `None` when
    /// nothing is due.
    pub fn begin(deck: &Deck, conn: Arc<Mutex<Connection>>) -> Option<Self> {
        let due = scheduler::due_cards(&deck.cards);
        if due.is_empty() {
            return None;
        }

        Some(Self {
            deck_id: deck.id.clone(),
            deck_title: deck.title.clone(),
            tally: SessionTally {
                total: due.len(),
                ..SessionTally::default()
            },
            cards: due,
            current_index: 0,
            show_back: false,
            conn,
        })
    }

    pub fn current_card(&self) -> Option<&Card> {
        self.cards.get(self.current_index)
    }

    pub fn reveal(&mut self) {
        self.show_back = true;
    }

    pub fn reviewed_count(&self) -> usize {
        self.current_index.min(self.cards.len())
    }

    pub fn total_count(&self) -> usize {
        self.cards.len()
    }

    pub fn is_complete(&self) -> bool {
        self.current_index >= self.cards.len()
    }

    /// Grades the current card, persists the rescheduled card together
    /// with the session bookkeeping, and moves on to the next one.
    pub fn grade_current(&mut self, difficulty: Difficulty) {
        let Some(card) = self.cards.get(self.current_index) else {
            return;
        };

        let updated = scheduler::process_review(card, difficulty);
        let now = scheduler::now_millis();

        match difficulty {
            Difficulty::Easy => self.tally.easy += 1,
            Difficulty::Medium => self.tally.medium += 1,
            Difficulty::Hard => self.tally.hard += 1,
        }

        let conn = self.conn.lock().unwrap();
        if let Err(e) = db::update_card(&self.deck_id, &updated, &conn) {
            log::warn!("failed to persist review of card {}: {e}", updated.id);
        }
        if let Err(e) = db::touch_last_studied(&self.deck_id, now, &conn) {
            log::warn!("failed to stamp deck {}: {e}", self.deck_id);
        }
        match db::load_settings(&conn) {
            Ok(mut settings) => {
                settings.total_cards_studied += 1;
                settings.update_streak(local_midnight_millis(now));
                if let Err(e) = db::save_settings(&settings, &conn) {
                    log::warn!("failed to save settings: {e}");
                }
            }
            Err(e) => log::warn!("failed to load settings: {e}"),
        }
        drop(conn);

        self.cards[self.current_index] = updated;
        self.current_index += 1;
        self.show_back = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scheduler::create_card;

    fn session_fixture() -> (Arc<Mutex<Connection>>, Deck) {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();

        let mut deck = Deck::new(
            "d1".to_string(),
            "Spanish Basics".to_string(),
            String::new(),
            "en".to_string(),
            "es".to_string(),
            scheduler::now_millis(),
        );
        deck.cards.push(create_card(
            "c1".to_string(),
            "Hello".to_string(),
            "Hola".to_string(),
            None,
            None,
        ));
        deck.cards.push(create_card(
            "c2".to_string(),
            "Thank you".to_string(),
            "Gracias".to_string(),
            None,
            None,
        ));
        db::save_deck(&deck, &conn).unwrap();

        (Arc::new(Mutex::new(conn)), deck)
    }

    #[test]
    fn test_session_walks_all_due_cards_once() {
        let (conn, deck) = session_fixture();
        let mut session = StudySession::begin(&deck, Arc::clone(&conn)).unwrap();

        assert_eq!(session.total_count(), 2);
        assert!(!session.is_complete());

        session.grade_current(Difficulty::Easy);
        assert_eq!(session.reviewed_count(), 1);
        session.grade_current(Difficulty::Hard);
        assert!(session.is_complete());
        assert!(session.current_card().is_none());

        assert_eq!(session.tally.easy, 1);
        assert_eq!(session.tally.hard, 1);
        assert_eq!(session.tally.medium, 0);
    }

    #[test]
    fn test_grading_persists_reschedule_and_bookkeeping() {
        let (conn, deck) = session_fixture();
        let mut session = StudySession::begin(&deck, Arc::clone(&conn)).unwrap();

        session.grade_current(Difficulty::Easy);

        let guard = conn.lock().unwrap();
        let stored = db::load_deck("d1", &guard).unwrap().unwrap();
        let reviewed = stored.cards.iter().find(|c| c.id == "c1").unwrap();
        assert_eq!(reviewed.repetitions, 1);
        assert_eq!(reviewed.interval, 1);
        assert!(reviewed.last_reviewed > 0);
        assert!(stored.last_studied.is_some());

        let settings = db::load_settings(&guard).unwrap();
        assert_eq!(settings.total_cards_studied, 1);
        assert_eq!(settings.streak_count, 1);
    }

    #[test]
    fn test_no_session_when_nothing_is_due() {
        let (conn, mut deck) = session_fixture();
        let far_future = scheduler::now_millis() + 30 * scheduler::DAY_MS;
        for card in &mut deck.cards {
            card.due_date = far_future;
        }
        assert!(StudySession::begin(&deck, conn).is_none());
    }
}
