//! Zeilenbasierter Transport ueber einen beliebigen Byte-Stream
//!
//! Kapselt Lesen und Schreiben auf der einen Verbindung einer Session.
//! Kennt nur Zeilen und die Statuszeile, nicht die Bedeutung der Befehle.
//! ServerQuery-Server trennen Zeilen mit `\n\r`, daher landet das CR am
//! Anfang der Folgezeile und wird beim Lesen abgeschnitten.
//!
//! Jeder gesendete Befehl schuldet genau eine Statuszeile. Der Transport
//! zaehlt die offenen Antworten mit: kommt eine Antwort nach einem Timeout
//! oder einem abgebrochenen Lesevorgang doch noch an, wird sie vor der
//! Antwort auf den naechsten Befehl verworfen. Halbe Zeilen bleiben ueber
//! einen Abbruch hinweg im Puffer.

use std::time::Duration;

use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf, WriteHalf,
};

use crate::error::{QueryError, QueryResult};
use crate::parser::{parse_status_zeile, Status};

/// Erwartete erste Zeile jedes ServerQuery-Servers
pub const BEGRUESSUNG: &str = "TS3";

/// Unverarbeitete Antwort: Nutzlast-Zeilen plus Status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RohAntwort {
    /// Nicht-leere Zeilen vor der Statuszeile, CR entfernt
    pub zeilen: Vec<String>,
    pub status: Status,
}

/// Besitzt beide Haelften des Streams einer Session
pub struct Transport<S> {
    reader: BufReader<ReadHalf<S>>,
    writer: WriteHalf<S>,
    lese_timeout: Duration,
    /// Bereits gelesene Bytes einer noch unvollstaendigen Zeile
    teilzeile: Vec<u8>,
    /// Gesendete Befehle, deren Statuszeile noch nicht gelesen wurde
    offene_antworten: usize,
    /// true solange ein Schreibvorgang laeuft; bleibt nach einem Abbruch stehen
    schreibend: bool,
}

impl<S> Transport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn neu(stream: S, lese_timeout: Duration) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            reader: BufReader::new(reader),
            writer,
            lese_timeout,
            teilzeile: Vec::new(),
            offene_antworten: 0,
            schreibend: false,
        }
    }

    /// Liest die erste Zeile und prueft sie gegen `TS3`
    pub async fn begruessung_pruefen(&mut self) -> QueryResult<()> {
        let frist = self.lese_timeout;
        let zeile = tokio::time::timeout(frist, self.zeile_lesen_inner())
            .await
            .map_err(|_| timeout_fehler(frist))??;
        let bereinigt = zeile.trim();
        if bereinigt != BEGRUESSUNG {
            return Err(QueryError::ProtokollAbweichung {
                erhalten: bereinigt.to_string(),
            });
        }
        tracing::debug!("ServerQuery-Begruessung empfangen");

        // Willkommenstext verwerfen, soweit er schon im Puffer liegt
        while self.reader.buffer().contains(&b'\n') {
            let banner = self.zeile_lesen_inner().await?;
            let banner = banner.trim();
            if !banner.is_empty() {
                tracing::debug!(banner, "Willkommenstext empfangen");
            }
        }
        Ok(())
    }

    /// Schreibt eine fertige Befehlszeile (inklusive `\n`)
    ///
    /// Ab hier gilt die Antwort als offen, auch wenn der Aufrufer sie nie liest.
    pub async fn zeile_senden(&mut self, zeile: &str) -> QueryResult<()> {
        self.schreibend = true;
        self.writer.write_all(zeile.as_bytes()).await?;
        self.writer.flush().await?;
        self.schreibend = false;
        self.offene_antworten += 1;
        Ok(())
    }

    /// Liest bis zur Statuszeile, begrenzt durch das Lese-Timeout
    ///
    /// Verspaetete Antworten auf fruehere Befehle werden dabei uebersprungen.
    pub async fn antwort_lesen(&mut self) -> QueryResult<RohAntwort> {
        let frist = self.lese_timeout;
        tokio::time::timeout(frist, self.antwort_lesen_inner())
            .await
            .map_err(|_| timeout_fehler(frist))?
    }

    /// Liest alle Zeilen, die ohne Warten verfuegbar sind
    ///
    /// Gedacht fuer Server-Benachrichtigungen zwischen zwei Befehlen. Reste
    /// verspaeteter Antworten werden dabei verbraucht und nicht zurueckgegeben.
    pub async fn zeilen_ohne_warten(&mut self) -> QueryResult<Vec<String>> {
        let mut zeilen = Vec::new();
        loop {
            let zeile = match tokio::time::timeout(Duration::ZERO, self.zeile_lesen_inner()).await
            {
                Ok(zeile) => zeile?,
                Err(_) => break,
            };

            if let Some(status) = parse_status_zeile(&zeile) {
                if self.offene_antworten > 0 {
                    self.offene_antworten -= 1;
                    tracing::debug!(id = status.id, "Verspaetete Antwort verworfen");
                } else {
                    tracing::debug!(id = status.id, "Statuszeile ohne Befehl verworfen");
                }
                continue;
            }
            if self.offene_antworten > 0 {
                continue;
            }

            let bereinigt = zeile.trim_matches(|c| c == '\r' || c == '\n');
            if !bereinigt.is_empty() {
                zeilen.push(bereinigt.to_string());
            }
        }
        Ok(zeilen)
    }

    /// Anzahl gesendeter Befehle ohne gelesene Statuszeile
    pub fn offene_antworten(&self) -> usize {
        self.offene_antworten
    }

    /// true wenn ein Schreibvorgang mittendrin abgebrochen wurde
    ///
    /// Der Server hat dann eine halbe Befehlszeile gesehen, die Verbindung
    /// ist nicht mehr synchron zu bekommen.
    pub fn schreiben_abgebrochen(&self) -> bool {
        self.schreibend
    }

    /// Schliesst die Schreibseite; der Stream selbst wird beim Drop freigegeben
    pub async fn schliessen(&mut self) -> QueryResult<()> {
        self.writer.shutdown().await?;
        Ok(())
    }

    async fn zeile_lesen_inner(&mut self) -> QueryResult<String> {
        loop {
            let gelesen = self.reader.read_until(b'\n', &mut self.teilzeile).await?;
            if gelesen == 0 {
                if self.teilzeile.is_empty() {
                    return Err(QueryError::Getrennt(
                        "Server hat die Verbindung geschlossen".into(),
                    ));
                }
                // Letzte Zeile ohne Zeilenende vor EOF
                break;
            }
            if self.teilzeile.ends_with(b"\n") {
                break;
            }
        }
        let roh = std::mem::take(&mut self.teilzeile);
        Ok(String::from_utf8_lossy(&roh).into_owned())
    }

    async fn antwort_lesen_inner(&mut self) -> QueryResult<RohAntwort> {
        let mut zeilen = Vec::new();
        loop {
            let zeile = self.zeile_lesen_inner().await?;
            if let Some(status) = parse_status_zeile(&zeile) {
                self.offene_antworten = self.offene_antworten.saturating_sub(1);
                if self.offene_antworten == 0 {
                    return Ok(RohAntwort { zeilen, status });
                }
                tracing::debug!(
                    id = status.id,
                    verworfen = zeilen.len(),
                    "Verspaetete Antwort verworfen"
                );
                zeilen.clear();
                continue;
            }
            let bereinigt = zeile.trim_matches(|c| c == '\r' || c == '\n');
            if !bereinigt.is_empty() {
                zeilen.push(bereinigt.to_string());
            }
        }
    }
}

fn timeout_fehler(frist: Duration) -> QueryError {
    QueryError::Timeout {
        millis: frist.as_millis() as u64,
    }
}
