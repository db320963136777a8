//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use torwache_auth::{
    mailer::STANDARD_SMTP_PORT, session::SESSION_COOKIE_NAME, AuthKonfiguration, MailConfig,
    SessionCookieConfig,
};
use torwache_db::DatabaseConfig;

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ServerEinstellungen,
    pub datenbank: DatenbankEinstellungen,
    pub logging: LoggingEinstellungen,
    pub session: SessionEinstellungen,
    pub passwort_reset: PasswortResetEinstellungen,
    /// Argon2-Parameter
    pub passwort: PasswortEinstellungen,
    pub mail: MailEinstellungen,
}

/// Betriebsumgebung
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Umgebung {
    #[default]
    Development,
    Production,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename fuer Logs
    pub name: String,
    /// In `production` wird das Session-Cookie nur ueber HTTPS gesendet
    pub umgebung: Umgebung,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Torwache".into(),
            umgebung: Umgebung::Development,
        }
    }
}

/// Datenbank-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatenbankEinstellungen {
    /// Verbindungs-URL
    pub url: String,
    /// Maximale Verbindungspool-Groesse
    pub max_verbindungen: u32,
    pub sqlite_wal: bool,
}

impl Default for DatenbankEinstellungen {
    fn default() -> Self {
        let db = DatabaseConfig::default();
        Self {
            url: db.url,
            max_verbindungen: db.max_verbindungen,
            sqlite_wal: db.sqlite_wal,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level oder EnvFilter-Direktive, z.B. "info" oder "torwache_auth=debug"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Session-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionEinstellungen {
    pub cookie_name: String,
    /// Lebensdauer von Cookie und Session, bei jedem Zugriff erneuert
    pub max_alter_tage: u64,
    /// Intervall fuer das Entfernen abgelaufener Sessions und Tokens
    pub cleanup_intervall_sekunden: u64,
}

impl Default for SessionEinstellungen {
    fn default() -> Self {
        Self {
            cookie_name: SESSION_COOKIE_NAME.into(),
            max_alter_tage: 10 * 365,
            cleanup_intervall_sekunden: 300,
        }
    }
}

/// Passwort-Reset-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswortResetEinstellungen {
    /// Gueltigkeit eines Reset-Tokens
    pub ttl_stunden: u64,
    /// Basis-URL fuer den Link in der Reset-Mail
    pub frontend_url: String,
}

impl Default for PasswortResetEinstellungen {
    fn default() -> Self {
        Self {
            ttl_stunden: 72,
            frontend_url: "http://localhost:3000".into(),
        }
    }
}

/// Argon2id-Parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswortEinstellungen {
    /// Speicherkosten in KiB
    pub m_kib: u32,
    /// Iterationen
    pub t: u32,
    /// Parallelitaet
    pub p: u32,
}

impl Default for PasswortEinstellungen {
    fn default() -> Self {
        Self {
            m_kib: 64 * 1024,
            t: 3,
            p: 1,
        }
    }
}

/// Mail-Einstellungen
///
/// Ohne `smtp_host` werden Mails nur ins Log geschrieben.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailEinstellungen {
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub absender: String,
    pub smtp_benutzer: Option<String>,
    pub smtp_passwort: Option<String>,
}

impl Default for MailEinstellungen {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: STANDARD_SMTP_PORT,
            absender: "Torwache <noreply@localhost>".into(),
            smtp_benutzer: None,
            smtp_passwort: None,
        }
    }
}

const SEKUNDEN_PRO_TAG: u64 = 24 * 60 * 60;

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => toml::from_str(&inhalt)
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}")),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    pub fn ist_produktiv(&self) -> bool {
        self.server.umgebung == Umgebung::Production
    }

    pub fn datenbank_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.datenbank.url.clone(),
            max_verbindungen: self.datenbank.max_verbindungen,
            sqlite_wal: self.datenbank.sqlite_wal,
        }
    }

    pub fn session_lebensdauer(&self) -> Duration {
        Duration::from_secs(self.session.max_alter_tage.saturating_mul(SEKUNDEN_PRO_TAG))
    }

    /// Intervall der Bereinigungs-Tasks, mindestens eine Sekunde
    pub fn cleanup_intervall(&self) -> Duration {
        Duration::from_secs(self.session.cleanup_intervall_sekunden.max(1))
    }

    pub fn auth_konfiguration(&self) -> AuthKonfiguration {
        AuthKonfiguration {
            reset_ttl: Duration::from_secs(self.passwort_reset.ttl_stunden.saturating_mul(60 * 60)),
            frontend_url: self.passwort_reset.frontend_url.clone(),
            cookie: SessionCookieConfig {
                name: self.session.cookie_name.clone(),
                max_alter: self.session_lebensdauer(),
                secure: self.ist_produktiv(),
            },
        }
    }

    /// SMTP-Konfiguration, `None` wenn kein Host gesetzt ist
    pub fn mail_config(&self) -> Option<MailConfig> {
        let host = self.mail.smtp_host.as_ref().filter(|h| !h.trim().is_empty())?;
        Some(MailConfig {
            smtp_host: host.clone(),
            smtp_port: self.mail.smtp_port,
            absender: self.mail.absender.clone(),
            smtp_benutzer: self.mail.smtp_benutzer.clone(),
            smtp_passwort: self.mail.smtp_passwort.clone(),
        })
    }
}
