//! Typisierte Sicht auf einen Eintrag aus `clientlist`

use afkbot_core::{ChannelId, ClientId};

use crate::error::QueryResult;
use crate::parser::Record;

/// `client_type` eines normalen Sprach-Clients (1 = Query-Client)
pub const CLIENT_TYP_SPRACHE: u8 = 0;

/// Ein verbundener Client aus `clientlist [-times]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientEintrag {
    pub clid: ClientId,
    pub cid: ChannelId,
    pub client_type: u8,
    pub nickname: Option<String>,
    /// Nur mit Option `-times` vorhanden
    pub idle_millis: Option<u64>,
}

impl ClientEintrag {
    /// Baut den Eintrag aus einem Datensatz; `clid`, `cid` und
    /// `client_type` sind Pflicht
    pub fn aus_record(record: &Record) -> QueryResult<Self> {
        let idle_millis = match record.wert("client_idle_time") {
            Some(_) => Some(record.zahl_wert("client_idle_time")?),
            None => None,
        };

        Ok(Self {
            clid: record.zahl_wert("clid")?,
            cid: record.zahl_wert("cid")?,
            client_type: record.zahl_wert("client_type")?,
            nickname: record.wert("client_nickname").map(String::from),
            idle_millis,
        })
    }

    pub fn ist_sprach_client(&self) -> bool {
        self.client_type == CLIENT_TYP_SPRACHE
    }

    /// Idle-Zeit in ganzen Sekunden (abgerundet)
    pub fn idle_sekunden(&self) -> Option<u64> {
        self.idle_millis.map(|ms| ms / 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_record;

    #[test]
    fn eintrag_aus_clientlist_times() {
        let record = parse_record(
            r"clid=5 cid=1 client_database_id=3 client_nickname=Max\sMuster client_type=0 client_idle_time=1800999",
        );
        let eintrag = ClientEintrag::aus_record(&record).unwrap();
        assert_eq!(eintrag.clid, ClientId(5));
        assert_eq!(eintrag.cid, ChannelId(1));
        assert_eq!(eintrag.nickname.as_deref(), Some("Max Muster"));
        assert!(eintrag.ist_sprach_client());
        // 1800999 ms -> 1800 s, abgerundet
        assert_eq!(eintrag.idle_sekunden(), Some(1800));
    }

    #[test]
    fn ohne_times_keine_idle_zeit() {
        let record = parse_record("clid=1 cid=1 client_type=1 client_nickname=serveradmin");
        let eintrag = ClientEintrag::aus_record(&record).unwrap();
        assert_eq!(eintrag.idle_millis, None);
        assert!(!eintrag.ist_sprach_client());
    }

    #[test]
    fn fehlende_clid_ist_fehler() {
        let record = parse_record("cid=1 client_type=0");
        assert!(ClientEintrag::aus_record(&record).is_err());
    }

    #[test]
    fn kaputte_idle_zeit_ist_fehler() {
        let record = parse_record("clid=2 cid=1 client_type=0 client_idle_time=viel");
        assert!(ClientEintrag::aus_record(&record).is_err());
    }
}
