//! Mail-Versand fuer Passwort-Reset-Links
//!
//! [`SmtpMailer`] nutzt den asynchronen SMTP-Transport von `lettre`
//! (STARTTLS). Ist kein SMTP-Host konfiguriert, schreibt [`LogMailer`] die
//! Mail nur ins Log, was fuer die lokale Entwicklung reicht.

use std::future::Future;

use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

// ---------------------------------------------------------------------------
// Fehler
// ---------------------------------------------------------------------------

/// Fehler beim Mail-Versand
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// SMTP-Fehler (Verbindung, Authentifizierung, …)
    #[error("SMTP-Transportfehler: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// Absender- oder Empfaengeradresse ungueltig
    #[error("Ungueltige E-Mail-Adresse: {0}")]
    Adresse(#[from] lettre::address::AddressError),

    #[error("Mail konnte nicht erstellt werden: {0}")]
    Aufbau(String),
}

/// Versendet HTML-Mails
///
/// Der Auth-Service ruft `senden` in einem eigenen Task auf; Fehler werden
/// dort geloggt und erreichen den Aufrufer nie.
pub trait Mailer: Send + Sync + 'static {
    fn senden(&self, an: &str, html: &str) -> impl Future<Output = Result<(), MailError>> + Send;
}

// ---------------------------------------------------------------------------
// SMTP
// ---------------------------------------------------------------------------

/// Standard-SMTP-Port (STARTTLS)
pub const STANDARD_SMTP_PORT: u16 = 587;

/// Betreff aller Reset-Mails
pub const RESET_BETREFF: &str = "Change password";

/// SMTP-Verbindungsdaten
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// RFC-5322-Absenderadresse
    pub absender: String,
    pub smtp_benutzer: Option<String>,
    pub smtp_passwort: Option<String>,
}

/// Versand ueber einen SMTP-Relay
pub struct SmtpMailer {
    absender: lettre::message::Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Baut den Transport einmalig auf; Verbindungen werden gepoolt
    pub fn neu(config: &MailConfig) -> Result<Self, MailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port);

        if let (Some(benutzer), Some(passwort)) = (&config.smtp_benutzer, &config.smtp_passwort) {
            builder = builder.credentials(Credentials::new(benutzer.clone(), passwort.clone()));
        }

        Ok(Self {
            absender: config.absender.parse()?,
            transport: builder.build(),
        })
    }
}

impl Mailer for SmtpMailer {
    async fn senden(&self, an: &str, html: &str) -> Result<(), MailError> {
        let mail = Message::builder()
            .from(self.absender.clone())
            .to(an.parse()?)
            .subject(RESET_BETREFF)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| MailError::Aufbau(e.to_string()))?;

        self.transport.send(mail).await?;
        tracing::info!(an = an, "Mail versendet");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Entwicklung
// ---------------------------------------------------------------------------

/// Schreibt Mails ins Log statt sie zu versenden
///
/// Nur fuer die Entwicklung: der Inhalt (inklusive Reset-Link) landet im Log.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn senden(&self, an: &str, html: &str) -> Result<(), MailError> {
        tracing::info!(an = an, inhalt = html, "Mail (nicht versendet, Entwicklungsmodus)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MailConfig {
        MailConfig {
            smtp_host: "smtp.example.com".into(),
            smtp_port: STANDARD_SMTP_PORT,
            absender: "noreply@example.com".into(),
            smtp_benutzer: None,
            smtp_passwort: None,
        }
    }

    #[tokio::test]
    async fn smtp_mailer_mit_gueltiger_konfiguration() {
        assert!(SmtpMailer::neu(&config()).is_ok());
    }

    #[tokio::test]
    async fn ungueltiger_absender_wird_abgelehnt() {
        let config = MailConfig {
            absender: "kein-absender".into(),
            ..config()
        };
        assert!(matches!(SmtpMailer::neu(&config), Err(MailError::Adresse(_))));
    }

    #[tokio::test]
    async fn ungueltiger_empfaenger_wird_vor_dem_versand_erkannt() {
        let mailer = SmtpMailer::neu(&config()).unwrap();
        let ergebnis = mailer.senden("kein-empfaenger", "<p>x</p>").await;
        assert!(matches!(ergebnis, Err(MailError::Adresse(_))));
    }

    #[tokio::test]
    async fn log_mailer_schlaegt_nie_fehl() {
        assert!(LogMailer.senden("a@b.com", "<a>link</a>").await.is_ok());
    }

    #[test]
    fn fehler_anzeige() {
        let e = MailError::Aufbau("kein Body".into());
        assert_eq!(e.to_string(), "Mail konnte nicht erstellt werden: kein Body");
    }
}
