//! Entprellte Idle-Erkennung
//!
//! Zustaende pro Client:
//!   Aktiv --(idle >= Schwelle)--> Ausstehend --(Kulanz abgelaufen)--> verschoben
//!                                  |
//!                                  +--(idle < Schwelle)--> Aktiv
//!
//! Der Idle-Zaehler des Servers springt nach neuer Aktivitaet nicht sofort
//! zurueck. Erst wenn ein Client nach Ablauf der Kulanzzeit immer noch ueber
//! der Schwelle liegt, wird er verschoben.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use afkbot_core::{ChannelId, ClientId};
use afkbot_query::ClientEintrag;

use crate::uhr::{SystemUhr, Uhr};

/// Feste Kulanzzeit zwischen erster Erkennung und Verschiebung
pub const KULANZ: Duration = Duration::from_secs(20);

/// Einstellungen des AFK-Waechters
#[derive(Debug, Clone)]
pub struct AfkKonfig {
    /// Schaltet die Pruefung ein oder aus
    pub aktiviert: bool,
    /// Kanal in den abwesende Clients verschoben werden
    pub ziel_kanal: ChannelId,
    /// Idle-Zeit ab der ein Client als abwesend gilt
    pub schwelle: Duration,
    pub kulanz: Duration,
    /// Abstand zwischen zwei Pruefzyklen
    pub intervall: Duration,
}

impl Default for AfkKonfig {
    fn default() -> Self {
        Self {
            aktiviert: true,
            ziel_kanal: ChannelId(1),
            schwelle: Duration::from_secs(30 * 60),
            kulanz: KULANZ,
            intervall: Duration::from_secs(5),
        }
    }
}

/// Zustand eines einzelnen Clients aus Sicht des Waechters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfkZustand {
    /// Nicht vorgemerkt
    Aktiv,
    /// Ueber der Schwelle, wartet auf Ablauf der Kulanzzeit
    Ausstehend { seit: Instant },
}

/// Haelt die vorgemerkten Clients zwischen zwei Zyklen
pub struct AfkWaechter<U: Uhr = SystemUhr> {
    konfig: AfkKonfig,
    uhr: U,
    ausstehend: HashMap<ClientId, Instant>,
}

impl AfkWaechter<SystemUhr> {
    pub fn neu(konfig: AfkKonfig) -> Self {
        Self::mit_uhr(konfig, SystemUhr)
    }
}

impl<U: Uhr> AfkWaechter<U> {
    pub fn mit_uhr(konfig: AfkKonfig, uhr: U) -> Self {
        Self {
            konfig,
            uhr,
            ausstehend: HashMap::new(),
        }
    }

    pub fn konfig(&self) -> &AfkKonfig {
        &self.konfig
    }

    pub fn zustand(&self, clid: ClientId) -> AfkZustand {
        match self.ausstehend.get(&clid) {
            Some(seit) => AfkZustand::Ausstehend { seit: *seit },
            None => AfkZustand::Aktiv,
        }
    }

    pub fn anzahl_ausstehend(&self) -> usize {
        self.ausstehend.len()
    }

    /// Wertet eine Client-Liste aus und gibt die zu verschiebenden Clients zurueck
    ///
    /// Zurueckgegebene Clients sind bereits aus der Vormerkliste entfernt.
    /// Beruecksichtigt werden nur Sprach-Clients ausserhalb des Zielkanals.
    /// Vorgemerkte Clients, die dort nicht mehr auftauchen (getrennt oder
    /// schon im Zielkanal), werden vergessen.
    pub fn auswerten(&mut self, clients: &[ClientEintrag]) -> Vec<ClientId> {
        let jetzt = self.uhr.jetzt();
        let schwelle_secs = self.konfig.schwelle.as_secs();
        let mut verschieben = Vec::new();
        let mut gesehen = HashSet::new();

        for client in clients {
            if !client.ist_sprach_client() || client.cid == self.konfig.ziel_kanal {
                continue;
            }
            gesehen.insert(client.clid);

            // Ohne Idle-Zeit (clientlist ohne -times) gilt der Client als aktiv
            let idle_secs = client.idle_sekunden().unwrap_or(0);
            let ueber_schwelle = idle_secs >= schwelle_secs;

            match (ueber_schwelle, self.ausstehend.get(&client.clid).copied()) {
                (true, None) => {
                    tracing::debug!(clid = %client.clid, idle_secs, "Client ueber Idle-Schwelle, vorgemerkt");
                    self.ausstehend.insert(client.clid, jetzt);
                }
                (true, Some(seit)) => {
                    if jetzt.duration_since(seit) > self.konfig.kulanz {
                        self.ausstehend.remove(&client.clid);
                        verschieben.push(client.clid);
                    }
                }
                (false, Some(_)) => {
                    tracing::debug!(clid = %client.clid, idle_secs, "Idle-Zeit zurueckgesetzt, Vormerkung entfernt");
                    self.ausstehend.remove(&client.clid);
                }
                (false, None) => {}
            }
        }

        self.ausstehend.retain(|clid, _| gesehen.contains(clid));
        verschieben
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uhr::ManuelleUhr;

    const AFK_KANAL: ChannelId = ChannelId(9);

    fn konfig() -> AfkKonfig {
        AfkKonfig {
            aktiviert: true,
            ziel_kanal: AFK_KANAL,
            schwelle: Duration::from_secs(1800),
            kulanz: KULANZ,
            intervall: Duration::from_secs(5),
        }
    }

    fn client(clid: u32, cid: u32, idle_secs: u64) -> ClientEintrag {
        ClientEintrag {
            clid: ClientId(clid),
            cid: ChannelId(cid),
            client_type: 0,
            nickname: None,
            idle_millis: Some(idle_secs * 1000),
        }
    }

    fn waechter() -> (AfkWaechter<ManuelleUhr>, ManuelleUhr) {
        let uhr = ManuelleUhr::neu();
        (AfkWaechter::mit_uhr(konfig(), uhr.clone()), uhr)
    }

    #[test]
    fn verschiebung_erst_nach_kulanz() {
        let (mut w, uhr) = waechter();
        let start = uhr.jetzt();

        // Erster Zyklus: vormerken
        assert!(w.auswerten(&[client(5, 1, 2000)]).is_empty());
        assert_eq!(w.zustand(ClientId(5)), AfkZustand::Ausstehend { seit: start });

        // 10 s spaeter: Kulanz laeuft noch
        uhr.vorstellen(Duration::from_secs(10));
        assert!(w.auswerten(&[client(5, 1, 2010)]).is_empty());
        assert_eq!(w.zustand(ClientId(5)), AfkZustand::Ausstehend { seit: start });

        // 25 s nach der Vormerkung: verschieben, genau einmal
        uhr.vorstellen(Duration::from_secs(15));
        assert_eq!(w.auswerten(&[client(5, 1, 2025)]), vec![ClientId(5)]);
        assert_eq!(w.zustand(ClientId(5)), AfkZustand::Aktiv);
        assert_eq!(w.anzahl_ausstehend(), 0);
    }

    #[test]
    fn genau_kulanzzeit_reicht_nicht() {
        let (mut w, uhr) = waechter();
        w.auswerten(&[client(5, 1, 2000)]);
        uhr.vorstellen(KULANZ);
        assert!(w.auswerten(&[client(5, 1, 2020)]).is_empty());
        uhr.vorstellen(Duration::from_secs(1));
        assert_eq!(w.auswerten(&[client(5, 1, 2021)]), vec![ClientId(5)]);
    }

    #[test]
    fn aktivitaet_hebt_vormerkung_auf() {
        let (mut w, uhr) = waechter();
        w.auswerten(&[client(5, 1, 2000)]);
        assert!(matches!(w.zustand(ClientId(5)), AfkZustand::Ausstehend { .. }));

        uhr.vorstellen(Duration::from_secs(5));
        assert!(w.auswerten(&[client(5, 1, 3)]).is_empty());
        assert_eq!(w.zustand(ClientId(5)), AfkZustand::Aktiv);

        // Auch nach Ablauf der Kulanz keine Verschiebung, sondern neue Vormerkung
        uhr.vorstellen(Duration::from_secs(30));
        assert!(w.auswerten(&[client(5, 1, 2000)]).is_empty());
        assert!(matches!(w.zustand(ClientId(5)), AfkZustand::Ausstehend { .. }));
    }

    #[test]
    fn unter_schwelle_ohne_vormerkung_ist_noop() {
        let (mut w, _uhr) = waechter();
        assert!(w.auswerten(&[client(5, 1, 1799)]).is_empty());
        assert_eq!(w.anzahl_ausstehend(), 0);
    }

    #[test]
    fn schwelle_ist_inklusive_und_abgerundet() {
        let (mut w, _uhr) = waechter();
        let mut knapp = client(5, 1, 0);
        knapp.idle_millis = Some(1_799_999);
        w.auswerten(&[knapp]);
        assert_eq!(w.zustand(ClientId(5)), AfkZustand::Aktiv);

        w.auswerten(&[client(5, 1, 1800)]);
        assert!(matches!(w.zustand(ClientId(5)), AfkZustand::Ausstehend { .. }));
    }

    #[test]
    fn client_im_afk_kanal_wird_ignoriert() {
        let (mut w, uhr) = waechter();
        for _ in 0..5 {
            assert!(w.auswerten(&[client(5, AFK_KANAL.inner(), 100_000)]).is_empty());
            assert_eq!(w.zustand(ClientId(5)), AfkZustand::Aktiv);
            uhr.vorstellen(Duration::from_secs(30));
        }
    }

    #[test]
    fn query_clients_werden_ignoriert() {
        let (mut w, _uhr) = waechter();
        let mut query = client(1, 1, 100_000);
        query.client_type = 1;
        w.auswerten(&[query]);
        assert_eq!(w.anzahl_ausstehend(), 0);
    }

    #[test]
    fn getrennte_clients_werden_vergessen() {
        let (mut w, uhr) = waechter();
        w.auswerten(&[client(5, 1, 2000), client(6, 1, 2000)]);
        assert_eq!(w.anzahl_ausstehend(), 2);

        uhr.vorstellen(Duration::from_secs(5));
        w.auswerten(&[client(6, 1, 2005)]);
        assert_eq!(w.zustand(ClientId(5)), AfkZustand::Aktiv);
        assert!(matches!(w.zustand(ClientId(6)), AfkZustand::Ausstehend { .. }));
    }

    #[test]
    fn ohne_idle_zeit_gilt_client_als_aktiv() {
        let (mut w, _uhr) = waechter();
        let mut ohne = client(5, 1, 0);
        ohne.idle_millis = None;
        w.auswerten(&[ohne]);
        assert_eq!(w.anzahl_ausstehend(), 0);
    }
}
