//! Repository-Trait-Definitionen
//!
//! Das Repository-Pattern entkoppelt die Geschaeftslogik von der konkreten
//! Datenbank-Implementierung. Der Auth-Service kennt nur diese Traits.

use std::time::Duration;

use chrono::{DateTime, Utc};

use torwache_core::UserId;

use crate::error::DbResult;
use crate::models::{BenutzerRecord, BenutzerUpdate, NeuerBenutzer, SessionRecord};

/// Konfiguration fuer die Datenbankverbindung
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Verbindungs-URL (z.B. "sqlite://torwache.db")
    pub url: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
    /// Ob WAL-Modus bei SQLite aktiviert werden soll
    pub sqlite_wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://torwache.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
        }
    }
}

/// Benutzerverzeichnis
///
/// `create` ist atomar: bei einer Eindeutigkeitsverletzung (Benutzername oder
/// E-Mail) wird `DbError::Eindeutigkeit` geliefert und kein Datensatz angelegt.
#[allow(async_fn_in_trait)]
pub trait UserRepository: Send + Sync {
    async fn create(&self, data: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord>;
    async fn get_by_id(&self, id: UserId) -> DbResult<Option<BenutzerRecord>>;
    async fn get_by_email(&self, email: &str) -> DbResult<Option<BenutzerRecord>>;
    async fn get_by_name(&self, username: &str) -> DbResult<Option<BenutzerRecord>>;
    async fn update(&self, id: UserId, data: BenutzerUpdate) -> DbResult<BenutzerRecord>;
    async fn delete(&self, id: UserId) -> DbResult<bool>;
}

/// Schluessel-Wert-Speicher mit Ablaufzeit pro Schluessel
///
/// Abgelaufene Eintraege verhalten sich wie nicht vorhandene.
#[allow(async_fn_in_trait)]
pub trait KvRepository: Send + Sync {
    /// Setzt oder ueberschreibt einen Eintrag
    async fn kv_setzen(&self, schluessel: &str, wert: &str, ttl: Duration) -> DbResult<()>;

    /// Liest einen nicht abgelaufenen Eintrag
    async fn kv_lesen(&self, schluessel: &str) -> DbResult<Option<String>>;

    /// Loescht einen Eintrag; gibt zurueck ob einer existierte
    async fn kv_loeschen(&self, schluessel: &str) -> DbResult<bool>;

    /// Liest und loescht einen Eintrag in einem Schritt
    async fn kv_entnehmen(&self, schluessel: &str) -> DbResult<Option<String>>;

    /// Entfernt alle abgelaufenen Eintraege und gibt deren Anzahl zurueck
    async fn kv_bereinigen(&self) -> DbResult<u64>;
}

/// Speicher fuer angemeldete Sessions
///
/// Abgelaufene Sessions verhalten sich wie nicht vorhandene.
#[allow(async_fn_in_trait)]
pub trait SessionRepository: Send + Sync {
    /// Liest eine Session ohne sie zu verlaengern
    async fn session_lesen(&self, id: &str) -> DbResult<Option<SessionRecord>>;

    /// Setzt eine neue Ablaufzeit und gibt die Session zurueck
    async fn session_verlaengern(
        &self,
        id: &str,
        laeuft_ab_am: DateTime<Utc>,
    ) -> DbResult<Option<SessionRecord>>;

    async fn session_anlegen(&self, session: &SessionRecord) -> DbResult<()>;

    /// Setzt Benutzer und Ablaufzeit einer bestehenden Session
    ///
    /// Gibt `false` zurueck wenn die Session nicht (mehr) existiert.
    async fn session_benutzer_setzen(
        &self,
        id: &str,
        user_id: UserId,
        laeuft_ab_am: DateTime<Utc>,
    ) -> DbResult<bool>;

    async fn session_loeschen(&self, id: &str) -> DbResult<bool>;

    /// Loescht alle Sessions des Benutzers bis auf `ausser`
    async fn sessions_loeschen_ausser(&self, user_id: UserId, ausser: &str) -> DbResult<u64>;

    async fn sessions_bereinigen(&self) -> DbResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_config_standard() {
        let cfg = DatabaseConfig::default();
        assert!(cfg.sqlite_wal);
        assert_eq!(cfg.max_verbindungen, 5);
        assert!(cfg.url.starts_with("sqlite://"));
    }
}
