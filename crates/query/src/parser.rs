//! Antwort-Parser fuer ServerQuery
//!
//! Eine Antwort besteht aus null oder mehr Datensaetzen, getrennt durch `|`,
//! gefolgt von einer Statuszeile:
//!   clid=1 cid=4 client_nickname=Alice|clid=2 cid=4 client_nickname=Bob
//!   error id=0 msg=ok
//!
//! Jeder Datensatz ist eine Folge von `key=value` bzw. `key` Tokens.

use std::str::FromStr;

use crate::error::{QueryError, QueryResult};
use crate::escape::decode_value;

/// Trennzeichen zwischen Datensaetzen einer Antwort
pub const RECORD_TRENNER: char = '|';

/// Ein geparster Datensatz (eine Entitaet, z.B. ein verbundener Client)
///
/// Ein Key ohne `=` wird mit `None` abgelegt. Die Felder behalten die
/// Reihenfolge der Tokens; bei doppelten Keys gewinnt der zuletzt gelesene
/// Wert an der Position des ersten Vorkommens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    felder: Vec<(String, Option<String>)>,
}

impl Record {
    /// Setzt ein Feld, ein vorhandener Key wird an Ort und Stelle ueberschrieben
    pub fn einfuegen(&mut self, key: impl Into<String>, wert: Option<String>) {
        let key = key.into();
        match self.felder.iter_mut().find(|(k, _)| *k == key) {
            Some((_, alt)) => *alt = wert,
            None => self.felder.push((key, wert)),
        }
    }

    /// Gibt den Roh-Eintrag zurueck (`Some(None)` = Key ohne Wert)
    pub fn get(&self, key: &str) -> Option<&Option<String>> {
        self.felder.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Gibt einen Wert als String zurueck
    pub fn wert(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_deref())
    }

    /// Prueft ob der Key vorkommt, mit oder ohne Wert
    pub fn hat(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Gibt einen Pflicht-Wert zurueck oder einen Fehler
    pub fn pflicht_wert(&self, key: &str) -> QueryResult<&str> {
        self.wert(key).ok_or_else(|| {
            QueryError::UngueltigeAntwort(format!("Pflicht-Feld fehlt: {key}"))
        })
    }

    /// Gibt einen Pflicht-Wert geparst als Zahl (oder ID-Typ) zurueck
    pub fn zahl_wert<T: FromStr>(&self, key: &str) -> QueryResult<T> {
        let s = self.pflicht_wert(key)?;
        s.parse::<T>().map_err(|_| {
            QueryError::UngueltigeAntwort(format!("Ungueltige Zahl fuer '{key}': {s}"))
        })
    }

    pub fn len(&self) -> usize {
        self.felder.len()
    }

    pub fn is_empty(&self) -> bool {
        self.felder.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.felder.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

impl<K, V> FromIterator<(K, Option<V>)> for Record
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        let mut record = Self::default();
        for (k, v) in iter {
            record.einfuegen(k, v.map(Into::into));
        }
        record
    }
}

/// Status am Ende jeder Antwort (`error id=<n> msg=<text>`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// 0 = Erfolg, alles andere = Fehler
    pub id: u32,
    /// Bereits dekodierte Meldung
    pub msg: String,
}

impl Status {
    pub fn ist_erfolg(&self) -> bool {
        self.id == 0
    }
}

/// Parst einen einzelnen Datensatz
///
/// CR-Bytes werden entfernt, leere Tokens (doppelte Leerzeichen)
/// uebersprungen.
pub fn parse_record(segment: &str) -> Record {
    let bereinigt = segment.replace('\r', "");
    let mut record = Record::default();

    for token in bereinigt.split(' ').filter(|t| !t.is_empty()) {
        match token.split_once('=') {
            Some((key, value)) => record.einfuegen(key, Some(decode_value(value))),
            None => record.einfuegen(token, None),
        }
    }

    record
}

/// Zerlegt eine Nutzlast an `|` und parst jedes Segment einzeln
///
/// Auch ein einzelner Datensatz ohne `|` ergibt genau einen Record.
/// Eine leere Nutzlast ergibt keinen Record.
pub fn parse_records(payload: &str) -> Vec<Record> {
    if payload.trim().is_empty() {
        return Vec::new();
    }
    payload.split(RECORD_TRENNER).map(parse_record).collect()
}

/// Unaufgeforderte Meldung des Servers, z.B. `notifycliententerview clid=5`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ereignis {
    /// Erstes Token der Zeile
    pub name: String,
    pub daten: Record,
}

/// Zerlegt eine Benachrichtigungszeile in Name und Datensatz
pub fn parse_ereignis(zeile: &str) -> Ereignis {
    let bereinigt = zeile.trim_matches(|c| c == '\r' || c == '\n' || c == ' ');
    let (name, rest) = bereinigt.split_once(' ').unwrap_or((bereinigt, ""));
    Ereignis {
        name: name.to_string(),
        daten: parse_record(rest),
    }
}

/// Erkennt die abschliessende Statuszeile einer Antwort
///
/// Gibt `None` zurueck wenn die Zeile nicht dem Muster
/// `error id=<ziffern> msg=<text>` entspricht, also zur Nutzlast gehoert.
pub fn parse_status_zeile(zeile: &str) -> Option<Status> {
    let zeile = zeile.trim_matches(|c| c == '\r' || c == '\n');
    let rest = zeile.strip_prefix("error ")?;
    let record = parse_record(rest);

    let id_roh = record.wert("id")?;
    if id_roh.is_empty() || !id_roh.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let id = id_roh.parse::<u32>().ok()?;
    let msg = record.wert("msg")?.to_string();

    Some(Status { id, msg })
}
