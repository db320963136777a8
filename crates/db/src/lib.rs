//! torwache-db – Datenbank-Abstraktion
//!
//! Dieses Crate stellt das Benutzerverzeichnis (`UserRepository`), einen
//! Schluessel-Wert-Speicher mit Ablaufzeit (`KvRepository`) sowie einen
//! Session-Speicher (`SessionRepository`) bereit.
//! Die mitgelieferte Implementierung nutzt SQLite im WAL-Modus.

pub mod error;
pub mod models;
pub mod repository;
pub mod sqlite;

pub use error::{DbError, DbResult};
pub use repository::{DatabaseConfig, KvRepository, SessionRepository, UserRepository};
pub use sqlite::SqliteDb;
