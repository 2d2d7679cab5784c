pub mod database;
pub mod error;
pub mod export;
pub mod models;

pub use error::AppError;
pub use models::{Card, CardStage, Deck, Difficulty, StudySession, StudyStats, UserSettings};
