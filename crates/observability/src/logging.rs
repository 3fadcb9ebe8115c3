//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable:
//! - `AFKBOT_LOG_LEVEL`: Filter (z.B. `debug` oder `afkbot_query=trace`), Standard aus der Konfiguration
//! - `AFKBOT_LOG_FORMAT`: Format (text/json), Standard aus der Konfiguration

use tracing_subscriber::{fmt, EnvFilter};

/// Umgebungsvariable fuer den Log-Filter
pub const ENV_LOG_LEVEL: &str = "AFKBOT_LOG_LEVEL";
/// Umgebungsvariable fuer das Log-Format
pub const ENV_LOG_FORMAT: &str = "AFKBOT_LOG_FORMAT";

/// Ausgabeformat der Logzeilen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn aus_str(format: &str) -> Option<Self> {
        match format {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Ermittelt Filter und Format aus Konfiguration und Umgebung
///
/// Gesetzte, nicht-leere Umgebungswerte gewinnen. Ein unbekanntes Format
/// wird zu [`LogFormat::Text`].
pub fn wirksame_einstellungen(
    level: &str,
    format: &str,
    env_level: Option<&str>,
    env_format: Option<&str>,
) -> (String, LogFormat) {
    let filter = env_level
        .filter(|l| !l.trim().is_empty())
        .unwrap_or(level)
        .to_string();
    let format = env_format
        .filter(|f| !f.trim().is_empty())
        .unwrap_or(format);
    (filter, LogFormat::aus_str(format).unwrap_or(LogFormat::Text))
}

/// Initialisiert das Logging-System.
///
/// Umgebungsvariablen haben Vorrang vor den uebergebenen Werten.
/// Ein ungueltiger Filter faellt auf `info` zurueck.
pub fn logging_initialisieren(level: &str, format: &str) {
    let env_level = std::env::var(ENV_LOG_LEVEL).ok();
    let env_format = std::env::var(ENV_LOG_FORMAT).ok();
    let (filter, format) =
        wirksame_einstellungen(level, format, env_level.as_deref(), env_format.as_deref());

    let filter = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        LogFormat::Text => {
            fmt().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Validiert ob ein Log-Level-String gueltig ist.
pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

/// Validiert ob ein Log-Format-String gueltig ist.
pub fn log_format_gueltig(format: &str) -> bool {
    LogFormat::aus_str(format).is_some()
}
