mod app;
use cardify_app::*;

use app::CardifyApp;
use database::db;
use models::Deck;
use models::scheduler;
use uuid::Uuid;

fn main() -> eframe::Result<()> {
    env_logger::init();

    let conn = db::open_database("cardify.sqlite3").expect("Failed to open database");

    let mut decks = db::load_all_decks(&conn).expect("Failed to load decks from database");
    if decks.is_empty() {
        let deck = sample_deck();
        db::save_deck(&deck, &conn).expect("Failed to seed sample deck");
        log::info!("sample deck '{}' created", deck.title);
        decks.push(deck);
    }

    let settings = db::load_settings(&conn).unwrap_or_default();

    log::info!("loaded {} decks from database", decks.len());
    for deck in &decks {
        log::info!("  - {} ({} cards)", deck.title, deck.cards.len());
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([500.0, 700.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Cardify Lingo",
        options,
        Box::new(|_cc| Ok(Box::new(CardifyApp::new(decks, settings, conn)))),
    )
}

/// First-run starter deck so the app never opens empty.
fn sample_deck() -> Deck {
    let mut deck = Deck::new(
        Uuid::new_v4().to_string(),
        "Spanish Basics".to_string(),
        "A few everyday phrases to get started".to_string(),
        "en".to_string(),
        "es".to_string(),
        scheduler::now_millis(),
    );

    for (front, back) in [
        ("Hello", "Hola"),
        ("Thank you", "Gracias"),
        ("Please", "Por favor"),
        ("Goodbye", "Adiós"),
    ] {
        deck.cards.push(scheduler::create_card(
            Uuid::new_v4().to_string(),
            front.to_string(),
            back.to_string(),
            None,
            None,
        ));
    }

    deck
}
