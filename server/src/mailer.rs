//! Auswahl des Mail-Versands anhand der Konfiguration

use torwache_auth::{LogMailer, MailConfig, MailError, Mailer, SmtpMailer};

/// SMTP wenn ein Host konfiguriert ist, sonst nur Log-Ausgabe
pub enum ServerMailer {
    Smtp(SmtpMailer),
    Log(LogMailer),
}

impl ServerMailer {
    pub fn aus_config(config: Option<&MailConfig>) -> Result<Self, MailError> {
        match config {
            Some(config) => {
                tracing::info!(
                    host = %config.smtp_host,
                    port = config.smtp_port,
                    "Mail-Versand ueber SMTP"
                );
                Ok(Self::Smtp(SmtpMailer::neu(config)?))
            }
            None => {
                tracing::warn!("Kein SMTP-Host konfiguriert, Mails werden nur geloggt");
                Ok(Self::Log(LogMailer))
            }
        }
    }
}

impl Mailer for ServerMailer {
    async fn senden(&self, an: &str, html: &str) -> Result<(), MailError> {
        match self {
            Self::Smtp(m) => m.senden(an, html).await,
            Self::Log(m) => m.senden(an, html).await,
        }
    }
}
