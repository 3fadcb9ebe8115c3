//! Bot-Konfiguration
//!
//! Wird beim Start einmal aus einer TOML-Datei geladen und danach nur noch
//! gelesen. Alle Felder haben Standardwerte, sodass der Bot ohne
//! Konfigurationsdatei gegen einen lokalen Server startet.

use std::time::Duration;

use afkbot_core::{ChannelId, ServerId};
use afkbot_monitor::{AfkKonfig, KULANZ};
use afkbot_query::QueryKonfig;
use serde::{Deserialize, Serialize};

/// Vollstaendige Bot-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Ziel-Server
    pub server: ServerEinstellungen,
    /// Query-Zugang und Anzeigename
    pub query: QueryEinstellungen,
    /// AFK-Pruefung
    pub afk: AfkEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Ziel-Server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Hostname oder IP
    pub host: String,
    /// ServerQuery-Port
    pub query_port: u16,
    /// ID des virtuellen Servers
    pub server_id: u32,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            query_port: 10011,
            server_id: 1,
        }
    }
}

/// Query-Zugangsdaten und Zeitlimits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryEinstellungen {
    pub login: String,
    pub passwort: String,
    /// Anzeigename des Bots
    pub nickname: String,
    pub verbindungs_timeout_secs: u64,
    pub lese_timeout_secs: u64,
}

impl Default for QueryEinstellungen {
    fn default() -> Self {
        Self {
            login: "serveradmin".into(),
            passwort: String::new(),
            nickname: "AFK-Bot".into(),
            verbindungs_timeout_secs: 5,
            lese_timeout_secs: 5,
        }
    }
}

/// AFK-Pruefung
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AfkEinstellungen {
    pub aktiviert: bool,
    /// ID des AFK-Kanals
    pub kanal: u32,
    /// Idle-Zeit in Minuten ab der verschoben wird
    pub schwelle_minuten: u64,
    /// Abstand zwischen zwei Pruefungen
    pub intervall_sekunden: u64,
}

impl Default for AfkEinstellungen {
    fn default() -> Self {
        Self {
            aktiviert: true,
            kanal: 1,
            schwelle_minuten: 30,
            intervall_sekunden: 5,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
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

impl BotConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    ///
    /// `None` wenn die Datei nicht existiert. Geloggt wird hier nichts, das
    /// Logging ist beim Laden noch nicht eingerichtet.
    pub fn laden(pfad: &str) -> anyhow::Result<Option<Self>> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(Some(config))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    pub fn server_id(&self) -> ServerId {
        ServerId(self.server.server_id)
    }

    /// Zeitlimits fuer die Query-Session
    pub fn query_konfig(&self) -> QueryKonfig {
        QueryKonfig {
            verbindungs_timeout: Duration::from_secs(self.query.verbindungs_timeout_secs),
            lese_timeout: Duration::from_secs(self.query.lese_timeout_secs),
        }
    }

    /// Einstellungen fuer den AFK-Waechter
    pub fn afk_konfig(&self) -> AfkKonfig {
        AfkKonfig {
            aktiviert: self.afk.aktiviert,
            ziel_kanal: ChannelId(self.afk.kanal),
            schwelle: Duration::from_secs(self.afk.schwelle_minuten * 60),
            kulanz: KULANZ,
            // Ohne Pause wuerde der Server im Dauerlauf abgefragt
            intervall: Duration::from_secs(self.afk.intervall_sekunden.max(1)),
        }
    }
}
