//! Torwache Server – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und startet den Server.

use anyhow::Result;
use torwache_server::{
    config::ServerConfig,
    logging::{log_format_gueltig, logging_initialisieren},
    Server,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config_pfad = std::env::var("TORWACHE_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = ServerConfig::laden(&config_pfad)?;

    let log = logging_initialisieren(&config.logging.level, &config.logging.format);

    if !log_format_gueltig(&config.logging.format) {
        tracing::warn!(
            format = %config.logging.format,
            "Unbekanntes Log-Format, verwende text"
        );
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        log_filter = %log.filter,
        log_format = ?log.format,
        "Torwache wird initialisiert"
    );

    Server::neu(config).starten().await
}
