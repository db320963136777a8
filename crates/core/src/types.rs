//! Gemeinsame Typen fuer Torwache
//!
//! IDs verwenden das Newtype-Pattern um Verwechslungen mit anderen
//! Ganzzahlen zur Compilezeit auszuschliessen.

use serde::{Deserialize, Serialize};

/// Eindeutige Benutzer-ID (vom Benutzerverzeichnis vergeben)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    /// Gibt den inneren Zahlenwert zurueck
    pub fn inner(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "user:{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = std::num::ParseIntError;

    /// Akzeptiert sowohl `42` als auch `user:42`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let zahl = s.strip_prefix("user:").unwrap_or(s);
        zahl.parse().map(Self)
    }
}

/// Ein fachlicher Fehler, der genau einem Eingabefeld zugeordnet ist
///
/// Wird dem Client als Teil einer erfolgreichen Antwort zurueckgegeben,
/// nie als Transportfehler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn neu(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
