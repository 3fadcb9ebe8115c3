//! Query-Session: eine Verbindung zu einem ServerQuery-Server
//!
//! Lebenszyklus:
//! 1. `verbinden` (TCP + Begruessung `TS3`)
//! 2. `login`, `server_waehlen`, beliebige Befehle via `ausfuehren`
//! 3. `trennen` (sendet `quit`, gibt den Socket frei)
//!
//! IO-Fehler und EOF machen die Session unbrauchbar. Danach schlaegt jeder
//! Befehl mit [`QueryError::Getrennt`] fehl. Nach einem Timeout bleibt sie
//! benutzbar, solange der Server ueberhaupt noch antwortet.

use std::time::Duration;

use afkbot_core::{ChannelId, ClientId, ServerId};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use crate::clients::ClientEintrag;
use crate::error::{QueryError, QueryResult};
use crate::parser::{parse_ereignis, Ereignis, Record};
use crate::transport::Transport;

/// Zeitlimits einer Session
#[derive(Debug, Clone)]
pub struct QueryKonfig {
    /// Frist fuer den TCP-Verbindungsaufbau
    pub verbindungs_timeout: Duration,
    /// Frist fuer Begruessung und jede einzelne Antwort
    pub lese_timeout: Duration,
}

impl Default for QueryKonfig {
    fn default() -> Self {
        Self {
            verbindungs_timeout: Duration::from_secs(5),
            lese_timeout: Duration::from_secs(5),
        }
    }
}

/// Eine aktive ServerQuery-Session
pub struct QuerySession<S> {
    pub(crate) transport: Transport<S>,
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) verbunden: bool,
}

impl QuerySession<TcpStream> {
    /// Baut eine TCP-Verbindung auf und prueft die Begruessung
    pub async fn verbinden(host: &str, port: u16, konfig: &QueryKonfig) -> QueryResult<Self> {
        let adresse = format!("{host}:{port}");
        tracing::info!(adresse = %adresse, "Verbinde mit ServerQuery");

        let stream = match tokio::time::timeout(
            konfig.verbindungs_timeout,
            TcpStream::connect(&adresse),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(QueryError::Verbindung {
                    adresse,
                    grund: e.to_string(),
                })
            }
            Err(_) => {
                return Err(QueryError::Verbindung {
                    adresse,
                    grund: format!(
                        "Zeitlimit von {} ms ueberschritten",
                        konfig.verbindungs_timeout.as_millis()
                    ),
                })
            }
        };

        Self::ueber_stream(stream, host, port, konfig).await
    }
}

impl<S> QuerySession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Startet eine Session ueber einen bereits geoeffneten Stream
    ///
    /// Die Begruessung wird auch hier geprueft, bevor irgendein Befehl
    /// gesendet werden kann.
    pub async fn ueber_stream(
        stream: S,
        host: &str,
        port: u16,
        konfig: &QueryKonfig,
    ) -> QueryResult<Self> {
        let mut transport = Transport::neu(stream, konfig.lese_timeout);

        match transport.begruessung_pruefen().await {
            Ok(()) => {}
            Err(e @ QueryError::ProtokollAbweichung { .. }) => return Err(e),
            Err(e) => {
                return Err(QueryError::Verbindung {
                    adresse: format!("{host}:{port}"),
                    grund: format!("Begruessung nicht empfangen: {e}"),
                })
            }
        }

        tracing::info!(host, port, "ServerQuery-Session aufgebaut");
        Ok(Self {
            transport,
            host: host.to_string(),
            port,
            verbunden: true,
        })
    }

    /// Gibt true zurueck solange die Verbindung benutzbar ist
    pub fn ist_verbunden(&self) -> bool {
        self.verbunden
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Meldet die Session mit Query-Zugangsdaten an
    pub async fn login(&mut self, benutzer: &str, passwort: &str) -> QueryResult<()> {
        self.ausfuehren(
            "login",
            &[
                ("client_login_name", benutzer),
                ("client_login_password", passwort),
            ],
            "",
        )
        .await?;
        tracing::info!(benutzer, "Query-Login erfolgreich");
        Ok(())
    }

    /// Waehlt den virtuellen Server aus (`use sid=<id>`)
    pub async fn server_waehlen(&mut self, sid: ServerId) -> QueryResult<()> {
        let sid = sid.to_string();
        self.ausfuehren("use", &[("sid", &sid)], "").await?;
        tracing::debug!(sid = %sid, "Virtueller Server gewaehlt");
        Ok(())
    }

    /// Setzt den Anzeigenamen der eigenen Query-Verbindung
    pub async fn nickname_setzen(&mut self, nickname: &str) -> QueryResult<()> {
        self.ausfuehren("clientupdate", &[("client_nickname", nickname)], "")
            .await?;
        Ok(())
    }

    /// Liste aller verbundenen Clients, z.B. mit `-times` fuer die Idle-Zeit
    pub async fn client_liste(&mut self, options: &str) -> QueryResult<Vec<ClientEintrag>> {
        self.ausfuehren("clientlist", &[], options)
            .await?
            .iter()
            .map(ClientEintrag::aus_record)
            .collect()
    }

    /// Detailinformationen zu einem Client als Roh-Datensatz
    pub async fn client_info(&mut self, clid: ClientId) -> QueryResult<Record> {
        let clid = clid.to_string();
        self.ausfuehren("clientinfo", &[("clid", &clid)], "")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| QueryError::UngueltigeAntwort("clientinfo ohne Datensatz".into()))
    }

    /// Verschiebt einen Client in einen anderen Kanal
    pub async fn client_verschieben(&mut self, clid: ClientId, cid: ChannelId) -> QueryResult<()> {
        let clid_s = clid.to_string();
        let cid_s = cid.to_string();
        self.ausfuehren("clientmove", &[("clid", &clid_s), ("cid", &cid_s)], "")
            .await?;
        Ok(())
    }

    /// Liest Benachrichtigungen, die bereits angekommen sind, ohne zu warten
    ///
    /// Liefert eine leere Liste, wenn nichts vorliegt. Eine angefangene
    /// Zeile bleibt fuer den naechsten Aufruf im Puffer.
    pub async fn ereignisse_lesen(&mut self) -> QueryResult<Vec<Ereignis>> {
        if !self.verbunden {
            return Err(QueryError::Getrennt(format!(
                "Session zu {}:{} ist nicht mehr verbunden",
                self.host, self.port
            )));
        }
        match self.transport.zeilen_ohne_warten().await {
            Ok(zeilen) => Ok(zeilen.iter().map(|z| parse_ereignis(z)).collect()),
            Err(e) => {
                if e.ist_fatal() {
                    self.verbunden = false;
                }
                Err(e)
            }
        }
    }

    /// Sendet `quit` und gibt die Verbindung frei
    ///
    /// Nimmt `self`, der Stream wird also auf jedem Weg freigegeben, auch
    /// wenn `quit` fehlschlaegt oder die Session schon unbrauchbar war.
    pub async fn trennen(mut self) -> QueryResult<()> {
        let quit = if self.verbunden {
            // Auf `quit` antwortet der Server mit einem Status, danach schliesst er
            self.ausfuehren("quit", &[], "").await.map(|_| ())
        } else {
            Ok(())
        };

        self.verbunden = false;
        if let Err(e) = self.transport.schliessen().await {
            tracing::debug!(fehler = %e, "Schliessen der Schreibseite fehlgeschlagen");
        }
        tracing::info!(host = %self.host, port = self.port, "ServerQuery-Session getrennt");
        quit
    }
}
