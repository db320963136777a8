//! torwache-auth – Authentifizierungskern
//!
//! Dieses Crate implementiert:
//! - Passwort-Hashing mit Argon2id
//! - Validierung von Registrierungsdaten
//! - Token-Speicher mit Ablaufzeit (Passwort-Reset)
//! - Session-Management (Session-ID im Cookie, Zustand serverseitig)
//! - Mail-Versand fuer Reset-Links
//! - AuthService (Registrierung, Login, Logout, Passwort vergessen/aendern)

pub mod error;
pub mod kontext;
pub mod mailer;
pub mod password;
pub mod service;
pub mod session;
pub mod token_store;
pub mod validierung;

// Bequeme Re-Exporte
pub use error::{AuthError, AuthResult};
pub use kontext::AnfrageKontext;
pub use mailer::{LogMailer, MailConfig, MailError, Mailer, SmtpMailer};
pub use password::PasswortHasher;
pub use service::{AuthKonfiguration, AuthService, BenutzerAntwort};
pub use session::{
    CookieAnweisung, InMemorySessionStore, Session, SessionCookieConfig, SessionStore,
    SqliteSessionStore,
};
pub use token_store::{InMemoryTokenStore, TokenStore};
pub use validierung::registrierung_validieren;
