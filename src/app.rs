//! Main application UI and state management.
//! Dashboard, study session, and per-deck statistics screens.

use std::sync::{Arc, Mutex};

use chrono::{Local, TimeZone};
use eframe::egui;
use rusqlite::Connection;
use uuid::Uuid;

use crate::database::db;
use crate::error::AppError;
use crate::export::json::{export_json_to_path, import_json};
use crate::models::scheduler::{self, DAY_MS, Difficulty};
use crate::models::{Card, Deck, StudySession, UserSettings};

/// Application screen states
#[derive(Default)]
enum AppScreen {
    #[default]
    Dashboard,
    Study,
    DeckStats,
}

/// Main application state
pub struct CardifyApp {
    show_confirmation_dialog: bool,
    allowed_to_close: bool,

    decks: Vec<Deck>,
    settings: UserSettings,
    selected_deck_index: Option<usize>,

    new_deck_title: String,
    new_deck_description: String,
    new_deck_source_lang: String,
    new_deck_target_lang: String,

    new_card_front: String,
    new_card_back: String,

    conn: Arc<Mutex<Connection>>,

    current_screen: AppScreen,
    study_session: Option<StudySession>,
    stats_deck_index: Option<usize>,

    show_export_dialog: bool,
    pending_delete: Option<usize>,
    show_result_dialog: bool,
    result_message: String,
}

/// Human-friendly "last studied" description for the deck list.
fn format_last_studied(timestamp: Option<i64>) -> String {
    let Some(ts) = timestamp else {
        return "Never".to_string();
    };
    let Some(date) = Local.timestamp_millis_opt(ts).earliest() else {
        return "Never".to_string();
    };

    let days = (Local::now().date_naive() - date.date_naive()).num_days();
    match days {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        2..=6 => format!("{days} days ago"),
        _ => date.format("%Y-%m-%d").to_string(),
    }
}

fn format_due(card: &Card, now: i64) -> String {
    if card.due_date <= now {
        return "due now".to_string();
    }
    let days = (card.due_date - now + DAY_MS - 1) / DAY_MS;
    if days == 1 {
        "due tomorrow".to_string()
    } else {
        format!("due in {days} days")
    }
}

impl eframe::App for CardifyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        match self.current_screen {
            AppScreen::Dashboard => self.render_dashboard(ctx),
            AppScreen::Study => self.render_study(ctx),
            AppScreen::DeckStats => self.render_deck_stats(ctx),
        }

        // Handle window close requests with confirmation dialog
        if ctx.input(|i| i.viewport().close_requested()) {
            if self.allowed_to_close {
                // Allow close
            } else {
                ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
                self.show_confirmation_dialog = true;
            }
        }

        if self.show_confirmation_dialog {
            egui::Window::new("Do you want to quit?")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("No").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = false;
                        }

                        if ui.button("Yes").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = true;
                            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                        }
                    });
                });
        }

        if self.show_export_dialog {
            let mut export_deck_index: Option<usize> = None;
            let mut should_cancel = false;

            egui::Window::new("Export Deck")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label("Select a deck to export:");
                    ui.separator();

                    for (i, deck) in self.decks.iter().enumerate() {
                        if ui
                            .button(format!("{} ({} cards)", deck.title, deck.cards.len()))
                            .clicked()
                        {
                            export_deck_index = Some(i);
                        }
                    }

                    ui.separator();

                    if ui.button("Cancel").clicked() {
                        should_cancel = true;
                    }
                });

            if let Some(i) = export_deck_index {
                self.handle_export(i);
            }
            if should_cancel {
                self.show_export_dialog = false;
            }
        }

        if let Some(delete_index) = self.pending_delete {
            let mut confirmed = false;
            let mut cancelled = false;
            let title = self
                .decks
                .get(delete_index)
                .map(|d| d.title.clone())
                .unwrap_or_default();

            egui::Window::new("Delete Deck?")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(format!(
                        "Delete '{title}' and all of its cards? This cannot be undone."
                    ));
                    ui.add_space(10.0);
                    ui.horizontal(|ui| {
                        if ui.button("Cancel").clicked() {
                            cancelled = true;
                        }
                        if ui.button("Delete").clicked() {
                            confirmed = true;
                        }
                    });
                });

            if confirmed {
                self.delete_deck(delete_index);
                self.pending_delete = None;
            }
            if cancelled {
                self.pending_delete = None;
            }
        }

        if self.show_result_dialog {
            egui::Window::new("Import/Export Result")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(&self.result_message);
                    ui.add_space(10.0);
                    if ui.button("OK").clicked() {
                        self.show_result_dialog = false;
                    }
                });
        }
    }
}

impl CardifyApp {
    /// Creates the application with decks and settings loaded from the store.
    pub fn new(decks: Vec<Deck>, settings: UserSettings, conn: Connection) -> Self {
        let has_decks = !decks.is_empty();
        Self {
            show_confirmation_dialog: false,
            allowed_to_close: false,
            decks,
            settings,
            selected_deck_index: if has_decks { Some(0) } else { None },
            new_deck_title: String::new(),
            new_deck_description: String::new(),
            new_deck_source_lang: "en".to_string(),
            new_deck_target_lang: "es".to_string(),
            new_card_front: String::new(),
            new_card_back: String::new(),
            conn: Arc::new(Mutex::new(conn)),
            current_screen: AppScreen::Dashboard,
            study_session: None,
            stats_deck_index: None,
            show_export_dialog: false,
            pending_delete: None,
            show_result_dialog: false,
            result_message: String::new(),
        }
    }

    /// Renders the dashboard with streak header and deck management.
    fn render_dashboard(&mut self, ctx: &egui::Context) {
        let now = scheduler::now_millis();
        let due_today: usize = self
            .decks
            .iter()
            .map(|deck| scheduler::due_cards_at(&deck.cards, now).len())
            .sum();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Cardify Lingo");
            ui.horizontal(|ui| {
                ui.label(format!("Streak: {} days", self.settings.streak_count));
                ui.separator();
                ui.label(format!(
                    "Cards studied: {}",
                    self.settings.total_cards_studied
                ));
                ui.separator();
                ui.label(format!("Due today: {due_today}"));
            });

            ui.separator();

            ui.horizontal(|ui| {
                if ui.button("Export Deck").clicked() {
                    self.show_export_dialog = true;
                }
                if ui.button("Import Deck").clicked() {
                    self.handle_import();
                }
            });

            ui.separator();

            // Deck creation section
            ui.heading("Create New Deck");
            ui.horizontal(|ui| {
                ui.label("Title:");
                ui.text_edit_singleline(&mut self.new_deck_title);
            });
            ui.horizontal(|ui| {
                ui.label("Description:");
                ui.text_edit_singleline(&mut self.new_deck_description);
            });
            ui.horizontal(|ui| {
                ui.label("Languages:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.new_deck_source_lang).desired_width(40.0),
                );
                ui.label("→");
                ui.add(
                    egui::TextEdit::singleline(&mut self.new_deck_target_lang).desired_width(40.0),
                );
                if ui.button("Create Deck").clicked() {
                    self.create_deck();
                }
            });

            ui.separator();

            ui.heading(format!("Decks ({})", self.decks.len()));

            // We store actions to execute after UI rendering to avoid
            // borrowing conflicts
            let mut action_select: Option<usize> = None;
            let mut action_study: Option<usize> = None;
            let mut action_stats: Option<usize> = None;
            let mut action_delete: Option<usize> = None;

            egui::ScrollArea::vertical()
                .id_source("decks_list")
                .max_height(150.0)
                .show(ui, |ui| {
                    for (i, deck) in self.decks.iter().enumerate() {
                        let is_selected = self.selected_deck_index == Some(i);
                        let due = scheduler::due_cards_at(&deck.cards, now).len();

                        ui.horizontal(|ui| {
                            if ui
                                .selectable_label(
                                    is_selected,
                                    format!(
                                        "{} ({} cards, {} due)",
                                        deck.title,
                                        deck.cards.len(),
                                        due
                                    ),
                                )
                                .clicked()
                            {
                                action_select = Some(i);
                            }

                            ui.label(format!(
                                "Last studied: {}",
                                format_last_studied(deck.last_studied)
                            ));

                            if ui.button("Study").clicked() {
                                action_study = Some(i);
                            }
                            if ui.button("Stats").clicked() {
                                action_stats = Some(i);
                            }
                            if ui.button("Delete").clicked() {
                                action_delete = Some(i);
                            }
                        });
                    }
                });

            // Execute deferred actions
            if let Some(i) = action_select {
                self.selected_deck_index = Some(i);
            }
            if let Some(i) = action_study {
                self.start_study(i);
            }
            if let Some(i) = action_stats {
                self.stats_deck_index = Some(i);
                self.current_screen = AppScreen::DeckStats;
            }
            if let Some(i) = action_delete {
                self.pending_delete = Some(i);
            }

            ui.separator();

            // Card management for selected deck
            if let Some(deck_index) = self.selected_deck_index {
                if let Some(current_deck) = self.decks.get_mut(deck_index) {
                    ui.heading(format!(
                        "Selected Deck: {} ({} → {})",
                        current_deck.title, current_deck.source_lang, current_deck.target_lang
                    ));
                    if !current_deck.description.is_empty() {
                        ui.label(&current_deck.description);
                    }

                    ui.horizontal(|ui| {
                        ui.label("Front:");
                        ui.text_edit_singleline(&mut self.new_card_front);
                    });
                    ui.horizontal(|ui| {
                        ui.label("Back:");
                        ui.text_edit_singleline(&mut self.new_card_back);
                    });
                    if ui.button("Add Card").clicked()
                        && !self.new_card_front.trim().is_empty()
                        && !self.new_card_back.trim().is_empty()
                    {
                        let card = scheduler::create_card(
                            Uuid::new_v4().to_string(),
                            self.new_card_front.trim().to_string(),
                            self.new_card_back.trim().to_string(),
                            None,
                            None,
                        );
                        current_deck.cards.push(card);

                        let conn = self.conn.lock().unwrap();
                        if let Err(e) = db::save_deck(current_deck, &conn) {
                            log::error!("failed to save deck '{}': {e}", current_deck.title);
                        }
                        drop(conn);

                        self.new_card_front.clear();
                        self.new_card_back.clear();
                    }

                    ui.separator();

                    ui.heading(format!("Cards ({})", current_deck.cards.len()));

                    egui::ScrollArea::vertical()
                        .id_source("cards_list")
                        .max_height(200.0)
                        .show(ui, |ui| {
                            for (i, card) in current_deck.cards.iter().enumerate() {
                                ui.group(|ui| {
                                    ui.label(format!(
                                        "{}. {} — {}",
                                        i + 1,
                                        card.front,
                                        card.back
                                    ));
                                    ui.label(format!(
                                        "   {} · {}",
                                        card.stage().label(),
                                        format_due(card, now)
                                    ));
                                });
                            }
                        });
                }
            } else {
                ui.label("Select a deck to add cards");
            }
        });
    }

    /// Renders the study screen driving a single review session.
    fn render_study(&mut self, ctx: &egui::Context) {
        let mut finish = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(session) = &mut self.study_session {
                ui.heading(format!("Studying: {}", session.deck_title));
                ui.label(format!(
                    "Progress: {} / {} reviewed",
                    session.reviewed_count(),
                    session.total_count()
                ));

                ui.add_space(20.0);

                if session.is_complete() {
                    let tally = session.tally;
                    ui.heading("Session complete!");
                    ui.label(format!("{} cards reviewed:", tally.total));
                    ui.label(format!("  Easy: {}", tally.easy));
                    ui.label(format!("  Medium: {}", tally.medium));
                    ui.label(format!("  Hard: {}", tally.hard));

                    ui.add_space(20.0);

                    if ui.button("Back to Dashboard").clicked() {
                        finish = true;
                    }
                } else if let Some(card) = session.current_card() {
                    let show_back = session.show_back;
                    let front = card.front.clone();
                    let back = card.back.clone();

                    ui.group(|ui| {
                        ui.set_min_height(200.0);
                        ui.vertical_centered(|ui| {
                            ui.add_space(20.0);

                            ui.heading("Front:");
                            ui.label(&front);

                            ui.add_space(20.0);

                            if show_back {
                                ui.heading("Back:");
                                ui.label(&back);
                            } else {
                                ui.label("(Reveal to see the translation)");
                            }

                            ui.add_space(20.0);
                        });
                    });

                    ui.add_space(20.0);

                    // Store actions to execute after UI rendering
                    let mut action_reveal = false;
                    let mut action_grade: Option<Difficulty> = None;

                    if !show_back {
                        if ui.button("Reveal").clicked() {
                            action_reveal = true;
                        }
                    } else {
                        ui.label("How well did you know it?");
                        ui.horizontal(|ui| {
                            if ui.button("Hard").clicked() {
                                action_grade = Some(Difficulty::Hard);
                            }
                            if ui.button("Medium").clicked() {
                                action_grade = Some(Difficulty::Medium);
                            }
                            if ui.button("Easy").clicked() {
                                action_grade = Some(Difficulty::Easy);
                            }
                        });
                    }

                    ui.add_space(20.0);

                    if ui.button("End Session").clicked() {
                        finish = true;
                    }

                    // Execute deferred actions
                    if action_reveal {
                        session.reveal();
                    }
                    if let Some(difficulty) = action_grade {
                        session.grade_current(difficulty);
                    }
                }
            }
        });

        if finish {
            self.study_session = None;
            self.current_screen = AppScreen::Dashboard;
            self.reload();
        }
    }

    /// Renders per-deck statistics including the 7-day due forecast.
    fn render_deck_stats(&mut self, ctx: &egui::Context) {
        let mut action_study: Option<usize> = None;
        let mut action_back = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(deck) = self.stats_deck_index.and_then(|i| self.decks.get(i)) else {
                action_back = true;
                return;
            };

            let stats = scheduler::study_stats(&deck.cards);

            ui.heading(format!("{} — Statistics", deck.title));
            ui.add_space(10.0);

            ui.label(format!("Total cards: {}", stats.total_count));
            ui.label(format!("Due now: {}", stats.due_count));
            ui.label(format!("New: {}", stats.new_count));
            ui.label(format!("Learning: {}", stats.learning_count));
            ui.label(format!("Mastered: {}", stats.mastered_count));

            ui.add_space(10.0);

            let mastery = if stats.total_count > 0 {
                stats.mastered_count as f32 / stats.total_count as f32
            } else {
                0.0
            };
            ui.label("Mastery:");
            ui.add(egui::ProgressBar::new(mastery).show_percentage());

            ui.add_space(10.0);
            ui.heading("Upcoming reviews");
            let today = Local::now();
            for (i, count) in stats.next_7_days.iter().enumerate() {
                let day = today + chrono::Duration::days(i as i64 + 1);
                ui.label(format!(
                    "within {} day(s), by {}: {} cards",
                    i + 1,
                    day.format("%a"),
                    count
                ));
            }

            ui.add_space(20.0);
            ui.horizontal(|ui| {
                if stats.due_count > 0 && ui.button("Study Now").clicked() {
                    action_study = self.stats_deck_index;
                }
                if ui.button("Back to Dashboard").clicked() {
                    action_back = true;
                }
            });
        });

        if let Some(i) = action_study {
            self.start_study(i);
        }
        if action_back {
            self.stats_deck_index = None;
            self.current_screen = AppScreen::Dashboard;
        }
    }

    /// Creates a deck from the form fields and persists it.
    fn create_deck(&mut self) {
        if self.new_deck_title.trim().is_empty() {
            return;
        }

        let deck = Deck::new(
            Uuid::new_v4().to_string(),
            self.new_deck_title.trim().to_string(),
            self.new_deck_description.trim().to_string(),
            self.new_deck_source_lang.trim().to_string(),
            self.new_deck_target_lang.trim().to_string(),
            scheduler::now_millis(),
        );

        let conn = self.conn.lock().unwrap();
        match db::save_deck(&deck, &conn) {
            Ok(()) => {
                drop(conn);
                self.decks.push(deck);
                self.selected_deck_index = Some(self.decks.len() - 1);
                self.new_deck_title.clear();
                self.new_deck_description.clear();
            }
            Err(e) => log::error!("failed to create deck '{}': {e}", deck.title),
        }
    }

    /// Starts a study session over the deck's due cards.
    fn start_study(&mut self, deck_index: usize) {
        if let Some(deck) = self.decks.get(deck_index) {
            match StudySession::begin(deck, Arc::clone(&self.conn)) {
                Some(session) => {
                    self.study_session = Some(session);
                    self.current_screen = AppScreen::Study;
                }
                None => {
                    self.result_message =
                        format!("No cards are due in '{}' right now.", deck.title);
                    self.show_result_dialog = true;
                }
            }
        }
    }

    fn delete_deck(&mut self, deck_index: usize) {
        if deck_index >= self.decks.len() {
            return;
        }

        let deck = self.decks.remove(deck_index);
        let conn = self.conn.lock().unwrap();
        if let Err(e) = db::delete_deck(&deck.id, &conn) {
            log::error!("failed to delete deck '{}': {e}", deck.title);
        }
        drop(conn);

        // Keep the selection pointing at a real deck
        self.selected_deck_index = match self.selected_deck_index {
            Some(i) if i == deck_index => None,
            Some(i) if i > deck_index => Some(i - 1),
            other => other,
        };
        self.stats_deck_index = None;
    }

    /// Reloads decks and settings from the store.
    fn reload(&mut self) {
        let conn = self.conn.lock().unwrap();
        match db::load_all_decks(&conn) {
            Ok(decks) => self.decks = decks,
            Err(e) => log::error!("failed to reload decks: {e}"),
        }
        match db::load_settings(&conn) {
            Ok(settings) => self.settings = settings,
            Err(e) => log::error!("failed to reload settings: {e}"),
        }
    }

    /// Handles deck export to a JSON file.
    fn handle_export(&mut self, deck_index: usize) {
        if let Some(deck) = self.decks.get(deck_index) {
            // Open file save dialog
            if let Some(path) = rfd::FileDialog::new()
                .set_file_name(format!("{}.json", deck.title))
                .add_filter("JSON files", &["json"])
                .save_file()
            {
                match export_json_to_path(deck, &path) {
                    Ok(()) => {
                        self.result_message =
                            format!("Deck '{}' exported successfully!", deck.title);
                        self.show_result_dialog = true;
                    }
                    Err(e) => {
                        self.result_message = format!("Export failed: {e}");
                        self.show_result_dialog = true;
                    }
                }
            }
        }
        self.show_export_dialog = false;
    }

    /// Handles deck import from a JSON file.
    fn handle_import(&mut self) {
        // Open file selection dialog
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON files", &["json"])
            .pick_file()
        {
            match import_json(&path) {
                Ok(mut deck) => {
                    if self.decks.iter().any(|d| d.title == deck.title) {
                        self.result_message =
                            format!("Import failed: {}", AppError::DuplicateDeck(deck.title));
                        self.show_result_dialog = true;
                        return;
                    }

                    // A re-imported file must not overwrite an existing deck
                    if self.decks.iter().any(|d| d.id == deck.id) {
                        deck.id = Uuid::new_v4().to_string();
                    }

                    let conn = self.conn.lock().unwrap();
                    if let Err(e) = db::save_deck(&deck, &conn) {
                        self.result_message = format!("Import failed: {e}");
                        self.show_result_dialog = true;
                        return;
                    }
                    drop(conn);

                    self.result_message = format!(
                        "Deck '{}' imported successfully with {} cards!",
                        deck.title,
                        deck.cards.len()
                    );
                    self.show_result_dialog = true;
                    self.decks.push(deck);
                }
                Err(e) => {
                    self.result_message = format!("Import failed: {e}");
                    self.show_result_dialog = true;
                }
            }
        }
    }
}
