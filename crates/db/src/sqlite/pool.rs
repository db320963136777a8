//! SQLite Connection Pool mit WAL-Modus

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use tracing::info;

use crate::error::DbResult;
use crate::repository::DatabaseConfig;

/// Wartezeit bei gesperrter Datenbank, bevor SQLITE_BUSY gemeldet wird
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Gemeinsamer Zugriffspunkt auf Benutzerverzeichnis und KV-Speicher
#[derive(Debug, Clone)]
pub struct SqliteDb {
    pub(crate) pool: SqlitePool,
}

impl SqliteDb {
    /// Oeffnet (oder erzeugt) die Datenbankdatei und spielt Migrationen ein
    pub async fn oeffnen(config: &DatabaseConfig) -> DbResult<Self> {
        let journal = if config.sqlite_wal {
            SqliteJournalMode::Wal
        } else {
            SqliteJournalMode::Delete
        };

        let opts = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .journal_mode(journal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_verbindungen)
            .connect_with(opts)
            .await?;

        info!(url = %config.url, wal = config.sqlite_wal, "SQLite-Pool geoeffnet");

        let db = Self { pool };
        db.migrationen_ausfuehren().await?;
        Ok(db)
    }

    /// In-Memory-Datenbank fuer Tests
    ///
    /// Genau eine Verbindung, da jede neue Verbindung eine eigene leere
    /// Datenbank saehe.
    pub async fn in_memory() -> DbResult<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;

        let db = Self { pool };
        db.migrationen_ausfuehren().await?;
        Ok(db)
    }

    async fn migrationen_ausfuehren(&self) -> DbResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Datenbank-Migrationen abgeschlossen");
        Ok(())
    }

    /// Schliesst alle Verbindungen des Pools
    pub async fn schliessen(&self) {
        self.pool.close().await;
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
