//! Datenbankmodelle fuer Torwache
//!
//! Diese Typen repraesentieren Datensaetze aus der Datenbank und dienen
//! gleichzeitig als Nutzlast fuer Client-Antworten. Der Passwort-Hash
//! wird dabei nie serialisiert.

use chrono::{DateTime, Utc};
use serde::Serialize;
use torwache_core::UserId;

/// Benutzer-Datensatz aus der Datenbank
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenutzerRecord {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Daten zum Erstellen eines neuen Benutzers
#[derive(Debug, Clone)]
pub struct NeuerBenutzer<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

/// Daten zum Aktualisieren eines Benutzers
///
/// Nur gesetzte Felder werden geaendert; `updated_at` wird immer erneuert.
#[derive(Debug, Clone, Default)]
pub struct BenutzerUpdate {
    pub password_hash: Option<String>,
}

/// Gespeicherte (angemeldete) Session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: UserId,
    pub erstellt_am: DateTime<Utc>,
    pub laeuft_ab_am: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passwort_hash_wird_nicht_serialisiert() {
        let jetzt = Utc::now();
        let record = BenutzerRecord {
            id: UserId(1),
            username: "alice".into(),
            email: "alice@x.com".into(),
            password_hash: "$argon2id$geheim".into(),
            created_at: jetzt,
            updated_at: jetzt,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["username"], "alice");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("passwordHash").is_none());
        assert!(!json.to_string().contains("geheim"));
    }
}
