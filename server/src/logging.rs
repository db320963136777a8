//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable, die Werte aus der
//! Konfigurationsdatei ueberschreiben:
//! - `TW_LOG_LEVEL`: Log-Level oder EnvFilter-Direktive
//! - `TW_LOG_FORMAT`: Format (text/json)

use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_LEVEL_ENV: &str = "TW_LOG_LEVEL";
pub const LOG_FORMAT_ENV: &str = "TW_LOG_FORMAT";

const STANDARD_FILTER: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parsen(wert: &str) -> Option<Self> {
        match wert {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Wirksame Logging-Einstellungen nach Anwendung der Umgebungsvariablen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEinstellungen {
    /// Gueltige EnvFilter-Direktive
    pub filter: String,
    pub format: LogFormat,
}

impl LogEinstellungen {
    /// Kombiniert Konfigurationswerte mit Ueberschreibungen aus `umgebung`
    ///
    /// Ungueltige Filter-Direktiven werden uebersprungen, zuletzt gilt `info`.
    /// Unbekannte Formate ergeben `text`.
    pub fn aufloesen(
        level: &str,
        format: &str,
        umgebung: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let filter = umgebung(LOG_LEVEL_ENV)
            .into_iter()
            .chain(std::iter::once(level.to_string()))
            .find(|d| EnvFilter::try_new(d).is_ok())
            .unwrap_or_else(|| STANDARD_FILTER.to_string());

        let format = umgebung(LOG_FORMAT_ENV)
            .and_then(|f| LogFormat::parsen(&f))
            .or_else(|| LogFormat::parsen(format))
            .unwrap_or(LogFormat::Text);

        Self { filter, format }
    }

    /// Wie [`LogEinstellungen::aufloesen`], mit den Prozess-Umgebungsvariablen
    pub fn aus_umgebung(level: &str, format: &str) -> Self {
        Self::aufloesen(level, format, |name| std::env::var(name).ok())
    }
}

/// Initialisiert das Logging-System und gibt die wirksamen Einstellungen zurueck.
pub fn logging_initialisieren(level: &str, format: &str) -> LogEinstellungen {
    let einstellungen = LogEinstellungen::aus_umgebung(level, format);
    let filter = EnvFilter::new(&einstellungen.filter);

    match einstellungen.format {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .with_current_span(true)
                .init();
        }
        LogFormat::Text => {
            fmt().with_env_filter(filter).with_target(true).init();
        }
    }

    einstellungen
}

/// Validiert ob ein Log-Format-String gueltig ist.
pub fn log_format_gueltig(format: &str) -> bool {
    LogFormat::parsen(format).is_some()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn umgebung(paare: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let werte: HashMap<String, String> = paare
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| werte.get(name).cloned()
    }

    #[test]
    fn log_format_werte() {
        assert!(log_format_gueltig("text"));
        assert!(log_format_gueltig("json"));
        assert!(!log_format_gueltig("xml"));
        assert!(!log_format_gueltig("JSON")); // Gross-/Kleinschreibung
    }

    #[test]
    fn ohne_umgebung_gilt_die_konfiguration() {
        let e = LogEinstellungen::aufloesen("debug", "json", umgebung(&[]));
        assert_eq!(e.filter, "debug");
        assert_eq!(e.format, LogFormat::Json);
    }

    #[test]
    fn umgebung_ueberschreibt_die_konfiguration() {
        let env = umgebung(&[
            (LOG_LEVEL_ENV, "warn,torwache_auth=trace"),
            (LOG_FORMAT_ENV, "json"),
        ]);
        let e = LogEinstellungen::aufloesen("debug", "text", env);
        assert_eq!(e.filter, "warn,torwache_auth=trace");
        assert_eq!(e.format, LogFormat::Json);
    }

    #[test]
    fn ungueltige_werte_fallen_zurueck() {
        // Kaputte Umgebung: Konfiguration gilt
        let env = umgebung(&[(LOG_LEVEL_ENV, "torwache=lautlos"), (LOG_FORMAT_ENV, "xml")]);
        let e = LogEinstellungen::aufloesen("error", "json", env);
        assert_eq!(e.filter, "error");
        assert_eq!(e.format, LogFormat::Json);

        // Beides kaputt: info und text
        let env = umgebung(&[(LOG_LEVEL_ENV, "torwache=lautlos")]);
        let e = LogEinstellungen::aufloesen("torwache=laut", "yaml", env);
        assert_eq!(e.filter, STANDARD_FILTER);
        assert_eq!(e.format, LogFormat::Text);
    }

    #[test]
    fn prozess_umgebung_wird_gelesen() {
        std::env::set_var(LOG_FORMAT_ENV, "json");
        let e = LogEinstellungen::aus_umgebung("info", "text");
        std::env::remove_var(LOG_FORMAT_ENV);
        assert_eq!(e.format, LogFormat::Json);
    }
}
