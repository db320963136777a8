//! Validierung von Registrierungsdaten
//!
//! Alle Regeln werden unabhaengig voneinander geprueft und saemtliche
//! Verstoesse zurueckgegeben, damit der Client alle Felder auf einmal
//! markieren kann.

use torwache_core::FieldError;

/// Benutzernamen und Passwoerter muessen laenger als dies sein
pub const MIN_LAENGE_EXKLUSIV: usize = 2;

/// Gibt `true` zurueck wenn der Wert hoechstens [`MIN_LAENGE_EXKLUSIV`] Zeichen hat
pub fn zu_kurz(wert: &str) -> bool {
    wert.chars().count() <= MIN_LAENGE_EXKLUSIV
}

/// Prueft die Form einer Registrierungsanfrage
///
/// Gibt `None` zurueck wenn alle Regeln erfuellt sind, sonst eine nicht
/// leere Liste in fester Reihenfolge (username, email, password).
pub fn registrierung_validieren(
    username: &str,
    email: &str,
    passwort: &str,
) -> Option<Vec<FieldError>> {
    let mut fehler = Vec::new();

    if zu_kurz(username) {
        fehler.push(FieldError::neu("username", "username is too short"));
    }
    // '@' ist E-Mail-Adressen vorbehalten, sonst waere der Login mehrdeutig
    if username.contains('@') {
        fehler.push(FieldError::neu("username", "cannot include an @"));
    }
    if !email.contains('@') {
        fehler.push(FieldError::neu("email", "invalid email"));
    }
    if zu_kurz(passwort) {
        fehler.push(FieldError::neu("password", "password is too short"));
    }

    if fehler.is_empty() {
        None
    } else {
        Some(fehler)
    }
}
