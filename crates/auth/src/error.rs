//! Fehlertypen fuer den Auth-Service
//!
//! Nur Infrastrukturfehler landen hier. Fachliche Fehler (ungueltige Eingaben,
//! unbekannter Benutzer, abgelaufenes Token) werden als `FieldError`-Liste
//! innerhalb einer erfolgreichen Antwort zurueckgegeben.

use thiserror::Error;

/// Alle moeglichen Infrastrukturfehler im Auth-Service
#[derive(Debug, Error)]
pub enum AuthError {
    // --- Passwort ---
    #[error("Passwort-Hashing fehlgeschlagen: {0}")]
    PasswortHashing(String),

    #[error("Ungueltige Argon2-Parameter: {0}")]
    HasherParameter(String),

    // --- Speicher ---
    #[error("Session-Speicher nicht verfuegbar: {0}")]
    SessionSpeicher(String),

    #[error("Token-Speicher nicht verfuegbar: {0}")]
    TokenSpeicher(String),

    // --- Datenbank ---
    #[error("Datenbankfehler: {0}")]
    Datenbank(#[from] torwache_db::DbError),

    // --- Intern ---
    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl AuthError {
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }
}

/// Result-Alias fuer den Auth-Service
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;
    use torwache_db::DbError;

    #[test]
    fn db_fehler_wird_konvertiert() {
        let e: AuthError = DbError::intern("kaputt").into();
        assert!(matches!(e, AuthError::Datenbank(_)));
        assert_eq!(e.to_string(), "Datenbankfehler: Interner DB-Fehler: kaputt");
    }
}
