//! Fehlertypen fuer den ServerQuery-Client

use thiserror::Error;

/// Alle moeglichen Fehler im Query-Crate
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Verbindung zu {adresse} fehlgeschlagen: {grund}")]
    Verbindung { adresse: String, grund: String },

    #[error("Kein ServerQuery-Server: Begruessung war '{erhalten}', erwartet 'TS3'")]
    ProtokollAbweichung { erhalten: String },

    #[error("Keine Statuszeile innerhalb von {millis} ms empfangen")]
    Timeout { millis: u64 },

    #[error("Server-Fehler {id}: {msg}")]
    Server { id: u32, msg: String },

    #[error("Verbindung getrennt: {0}")]
    Getrennt(String),

    #[error("Ungueltige Antwort: {0}")]
    UngueltigeAntwort(String),

    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

pub type QueryResult<T> = Result<T, QueryError>;

impl QueryError {
    /// Gibt true zurueck wenn die Session nach diesem Fehler unbrauchbar ist
    ///
    /// Ein Timeout zaehlt nicht dazu: die verspaetete Antwort verwirft der
    /// Transport vor dem naechsten Befehl.
    pub fn ist_fatal(&self) -> bool {
        matches!(
            self,
            Self::Verbindung { .. }
                | Self::ProtokollAbweichung { .. }
                | Self::Getrennt(_)
                | Self::Io(_)
        )
    }

    /// Status-Code des Servers, falls es ein Server-Fehler war
    pub fn server_code(&self) -> Option<u32> {
        match self {
            Self::Server { id, .. } => Some(*id),
            _ => None,
        }
    }
}
