//! torwache-server – Bibliotheks-Root
//!
//! Baut aus der Konfiguration die Auth-Dienste zusammen und stellt sie
//! einer Transportschicht bereit.

pub mod config;
pub mod logging;
pub mod mailer;

use std::sync::Arc;

use anyhow::{Context, Result};
use config::ServerConfig;
use mailer::ServerMailer;
use tokio::task::JoinHandle;
use torwache_auth::{AuthService, PasswortHasher, SqliteSessionStore};
use torwache_db::{KvRepository, SqliteDb};

/// Konkreter Auth-Service des Servers
///
/// Benutzerverzeichnis, Reset-Tokens und angemeldete Sessions liegen in
/// derselben SQLite-Datenbank und ueberleben einen Neustart.
pub type Authentifizierung = AuthService<SqliteDb, SqliteDb, SqliteSessionStore, ServerMailer>;

/// Laufende Dienste samt Hintergrund-Tasks
pub struct Dienste {
    pub auth: Arc<Authentifizierung>,
    pub db: Arc<SqliteDb>,
    pub sessions: Arc<SqliteSessionStore>,
    hintergrund: Vec<JoinHandle<()>>,
}

impl Dienste {
    /// Stoppt die Hintergrund-Tasks und schliesst den Datenbank-Pool
    pub async fn beenden(self) {
        for task in &self.hintergrund {
            task.abort();
        }
        self.db.schliessen().await;
    }
}

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Oeffnet die Datenbank und baut den Auth-Service auf
    pub async fn dienste_aufbauen(&self) -> Result<Dienste> {
        let db = Arc::new(
            SqliteDb::oeffnen(&self.config.datenbank_config())
                .await
                .context("Datenbank konnte nicht geoeffnet werden")?,
        );

        let sessions = Arc::new(SqliteSessionStore::neu(
            Arc::clone(&db),
            self.config.session_lebensdauer(),
        ));

        let mailer = ServerMailer::aus_config(self.config.mail_config().as_ref())
            .context("Mail-Konfiguration ungueltig")?;

        let pw = &self.config.passwort;
        let hasher = PasswortHasher::neu(pw.m_kib, pw.t, pw.p)
            .context("Argon2-Parameter ungueltig")?;

        let auth = Arc::new(AuthService::neu(
            Arc::clone(&db),
            Arc::clone(&db),
            Arc::clone(&sessions),
            Arc::new(mailer),
            hasher,
            self.config.auth_konfiguration(),
        ));

        let intervall = self.config.cleanup_intervall();
        let hintergrund = vec![
            sessions.cleanup_starten(intervall),
            token_cleanup_starten(Arc::clone(&db), intervall),
        ];

        Ok(Dienste {
            auth,
            db,
            sessions,
            hintergrund,
        })
    }

    /// Startet alle Dienste und laeuft bis zum Shutdown-Signal
    pub async fn starten(self) -> Result<()> {
        tracing::info!(
            server_name = %self.config.server.name,
            umgebung = ?self.config.server.umgebung,
            datenbank = %self.config.datenbank.url,
            "Server startet"
        );

        let dienste = self.dienste_aufbauen().await?;

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown-Signal empfangen, Server wird beendet");

        dienste.beenden().await;
        Ok(())
    }
}

/// Entfernt regelmaessig abgelaufene Reset-Tokens aus der Datenbank
fn token_cleanup_starten(db: Arc<SqliteDb>, intervall: std::time::Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut takt = tokio::time::interval(intervall);
        takt.tick().await;
        loop {
            takt.tick().await;
            match db.kv_bereinigen().await {
                Ok(0) => {}
                Ok(anzahl) => tracing::debug!(anzahl, "Abgelaufene Tokens bereinigt"),
                Err(e) => tracing::warn!(fehler = %e, "Token-Bereinigung fehlgeschlagen"),
            }
        }
    })
}
