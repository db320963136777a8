//! Fehlertypen fuer das Datenbank-Crate

use thiserror::Error;

/// Datenbank-Fehlertypen
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Datensatz nicht gefunden: {0}")]
    NichtGefunden(String),

    /// Verletzung einer Eindeutigkeitsbedingung (Benutzername oder E-Mail)
    #[error("Eindeutigkeitsverletzung: {0}")]
    Eindeutigkeit(String),

    #[error("Ungueltige Daten: {0}")]
    UngueltigeDaten(String),

    #[error("SQLx-Fehler: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration-Fehler: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Interner DB-Fehler: {0}")]
    Intern(String),
}

impl DbError {
    pub fn nicht_gefunden(msg: impl Into<String>) -> Self {
        Self::NichtGefunden(msg.into())
    }

    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Gibt true zurueck wenn es sich um einen Eindeutigkeitsfehler handelt
    pub fn ist_eindeutigkeit(&self) -> bool {
        match self {
            Self::Eindeutigkeit(_) => true,
            Self::Sqlx(e) => ist_unique_verletzung(e),
            _ => false,
        }
    }
}

/// Erkennt UNIQUE-Verletzungen unabhaengig vom Backend
pub(crate) fn ist_unique_verletzung(e: &sqlx::Error) -> bool {
    match e.as_database_error() {
        Some(db) => db.is_unique_violation() || db.message().contains("UNIQUE"),
        None => false,
    }
}

/// Result-Alias fuer das Datenbank-Crate
pub type DbResult<T> = Result<T, DbError>;
