//! Befehlsausfuehrung: Zeile bauen, senden, Antwort auswerten
//!
//! Format einer Befehlszeile:
//!   befehlsname key1=wert1 key2=wert2 [-optionen]\n
//!
//! Alle Werte laufen durch [`encode_value`]. Das Ergebnis ist
//! alles-oder-nichts: bei einem Status ungleich 0 wird keine Nutzlast
//! zurueckgegeben, auch wenn der Server vorher Daten geschickt hat.

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{QueryError, QueryResult};
use crate::escape::encode_value;
use crate::parser::{parse_records, Record};
use crate::session::QuerySession;
use crate::transport::RohAntwort;

/// Ab so vielen unbeantworteten Befehlen gilt die Verbindung als tot
pub const MAX_OFFENE_ANTWORTEN: usize = 3;

/// Baut die Befehlszeile inklusive abschliessendem `\n`
///
/// Optionen werden nur angehaengt wenn sie nicht leer sind.
pub fn befehl_zeile(name: &str, params: &[(&str, &str)], options: &str) -> String {
    zeile_bauen(name, params, options, false)
}

/// Wie [`befehl_zeile`], aber mit maskierten Passwort-Werten fuers Log
fn protokoll_zeile(name: &str, params: &[(&str, &str)], options: &str) -> String {
    zeile_bauen(name, params, options, true)
}

fn zeile_bauen(name: &str, params: &[(&str, &str)], options: &str, maskieren: bool) -> String {
    let mut zeile = String::from(name);

    for (key, wert) in params {
        zeile.push(' ');
        zeile.push_str(key);
        zeile.push('=');
        if maskieren && key.contains("password") {
            zeile.push_str("***");
        } else {
            zeile.push_str(&encode_value(wert));
        }
    }

    let options = options.trim();
    if !options.is_empty() {
        zeile.push(' ');
        zeile.push_str(options);
    }

    zeile.push('\n');
    zeile
}

/// Wertet eine Rohantwort aus: Status pruefen, Nutzlast zerlegen
pub fn antwort_auswerten(befehl: &str, antwort: RohAntwort) -> QueryResult<Vec<Record>> {
    let RohAntwort { mut zeilen, status } = antwort;

    if !status.ist_erfolg() {
        return Err(QueryError::Server {
            id: status.id,
            msg: status.msg,
        });
    }

    // Nutzlast ist immer eine Zeile, alles davor (z.B. der Willkommenstext
    // nach der Begruessung) gehoert nicht zu diesem Befehl
    let nutzlast = zeilen.pop().unwrap_or_default();
    for verworfen in &zeilen {
        tracing::debug!(befehl, zeile = %verworfen, "Verwerfe Zeile vor der Nutzlast");
    }

    Ok(parse_records(&nutzlast))
}

impl<S> QuerySession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Fuehrt einen Befehl aus und gibt die Datensaetze der Antwort zurueck
    ///
    /// Genau ein Befehl ist gleichzeitig unterwegs; `&mut self` erzwingt das.
    /// Wer die Session teilen will, braucht einen Mutex um sie herum.
    pub async fn ausfuehren(
        &mut self,
        name: &str,
        params: &[(&str, &str)],
        options: &str,
    ) -> QueryResult<Vec<Record>> {
        if !self.verbunden {
            return Err(QueryError::Getrennt(format!(
                "Session zu {}:{} ist nicht mehr verbunden",
                self.host, self.port
            )));
        }
        if let Some(grund) = self.nicht_synchron() {
            tracing::warn!(befehl = name, grund, "Session unbrauchbar, markiere als getrennt");
            self.verbunden = false;
            return Err(QueryError::Getrennt(grund.into()));
        }

        let zeile = befehl_zeile(name, params, options);
        tracing::trace!(zeile = %protokoll_zeile(name, params, options).trim_end(), "Sende Befehl");

        let roh = match self.senden_und_lesen(&zeile).await {
            Ok(roh) => roh,
            Err(e) => {
                if e.ist_fatal() {
                    tracing::warn!(befehl = name, fehler = %e, "Session unbrauchbar, markiere als getrennt");
                    self.verbunden = false;
                }
                return Err(e);
            }
        };

        let ergebnis = antwort_auswerten(name, roh);
        if let Err(QueryError::Server { id, msg }) = &ergebnis {
            tracing::debug!(befehl = name, id, msg = %msg, "Server meldet Fehler");
        }
        ergebnis
    }

    /// Prueft ob Befehl und Antwort noch zueinander passen koennen
    fn nicht_synchron(&self) -> Option<&'static str> {
        if self.transport.schreiben_abgebrochen() {
            return Some("vorheriger Befehl wurde nur teilweise gesendet");
        }
        if self.transport.offene_antworten() >= MAX_OFFENE_ANTWORTEN {
            return Some("Server beantwortet keine Befehle mehr");
        }
        None
    }

    async fn senden_und_lesen(&mut self, zeile: &str) -> QueryResult<RohAntwort> {
        self.transport.zeile_senden(zeile).await?;
        self.transport.antwort_lesen().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Status;

    fn roh(zeilen: &[&str], id: u32, msg: &str) -> RohAntwort {
        RohAntwort {
            zeilen: zeilen.iter().map(|z| z.to_string()).collect(),
            status: Status {
                id,
                msg: msg.into(),
            },
        }
    }

    #[test]
    fn zeile_ohne_params() {
        assert_eq!(befehl_zeile("quit", &[], ""), "quit\n");
    }

    #[test]
    fn zeile_mit_escapten_werten() {
        let zeile = befehl_zeile("clientupdate", &[("client_nickname", "AFK Bot|1")], "");
        assert_eq!(zeile, "clientupdate client_nickname=AFK\\sBot\\p1\n");
    }

    #[test]
    fn zeile_mit_optionen() {
        assert_eq!(befehl_zeile("clientlist", &[], "-times"), "clientlist -times\n");
        assert_eq!(
            befehl_zeile("clientinfo", &[("clid", "5")], " -uid "),
            "clientinfo clid=5 -uid\n"
        );
    }

    #[test]
    fn passwort_wird_im_log_maskiert() {
        let params = [
            ("client_login_name", "serveradmin"),
            ("client_login_password", "geheim"),
        ];
        let log = protokoll_zeile("login", &params, "");
        assert!(log.contains("client_login_name=serveradmin"));
        assert!(log.contains("client_login_password=***"));
        assert!(!log.contains("geheim"));
        assert!(befehl_zeile("login", &params, "").contains("client_login_password=geheim"));
    }

    #[test]
    fn erfolg_gibt_datensaetze() {
        let records = antwort_auswerten("clientlist", roh(&["a=1|a=2"], 0, "ok")).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].wert("a"), Some("2"));
    }

    #[test]
    fn erfolg_ohne_nutzlast() {
        let records = antwort_auswerten("clientmove", roh(&[], 0, "ok")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn fehlerstatus_verwirft_nutzlast() {
        let fehler = antwort_auswerten("login", roh(&["a=1"], 512, "invalid loginname")).unwrap_err();
        match fehler {
            QueryError::Server { id, msg } => {
                assert_eq!(id, 512);
                assert_eq!(msg, "invalid loginname");
            }
            other => panic!("Falscher Fehlertyp: {other:?}"),
        }
    }

    #[test]
    fn willkommenstext_wird_verworfen() {
        let records = antwort_auswerten(
            "use",
            roh(&["Welcome to the TeamSpeak 3 ServerQuery interface", "sid=1"], 0, "ok"),
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].wert("sid"), Some("1"));
    }
}
