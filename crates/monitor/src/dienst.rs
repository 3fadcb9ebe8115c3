//! Pruefschleife des AFK-Waechters
//!
//! Ein Zyklus: Client-Liste holen, auswerten, faellige Clients verschieben.
//! Nach jedem Zyklus pausiert die Schleife das volle Intervall. Ein
//! fehlgeschlagener Zyklus (auch ein Timeout) wird geloggt und uebersprungen;
//! nur wenn die Verbindung selbst unbrauchbar ist, endet die Schleife mit
//! dem Fehler.

use std::time::Duration;

use afkbot_core::ClientId;
use afkbot_query::{QueryError, QueryResult};
use tokio::sync::watch;

use crate::uhr::Uhr;
use crate::verwaltung::ClientVerwaltung;
use crate::waechter::AfkWaechter;

/// Ergebnis eines Pruefzyklus
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ZyklusBericht {
    /// Anzahl der Clients in der abgerufenen Liste
    pub clients: usize,
    /// Nach dem Zyklus noch vorgemerkte Clients
    pub ausstehend: usize,
    pub verschoben: Vec<ClientId>,
    /// Verschiebungen, die der Server abgelehnt hat
    pub abgelehnt: Vec<(ClientId, String)>,
}

/// Fuehrt genau einen Pruefzyklus aus
///
/// Abgelehnte Verschiebungen (z.B. fehlende Rechte) landen im Bericht,
/// der Client ist danach trotzdem nicht mehr vorgemerkt. Fatale Fehler
/// brechen den Zyklus ab.
pub async fn zyklus_ausfuehren<U, V>(
    waechter: &mut AfkWaechter<U>,
    verwaltung: &mut V,
) -> QueryResult<ZyklusBericht>
where
    U: Uhr,
    V: ClientVerwaltung + ?Sized,
{
    let clients = verwaltung.clients_abrufen().await?;
    let faellig = waechter.auswerten(&clients);
    let ziel = waechter.konfig().ziel_kanal;

    let mut bericht = ZyklusBericht {
        clients: clients.len(),
        ..Default::default()
    };

    for clid in faellig {
        match verwaltung.verschieben(clid, ziel).await {
            Ok(()) => {
                tracing::info!(clid = %clid, kanal = %ziel, "Abwesenden Client in AFK-Kanal verschoben");
                bericht.verschoben.push(clid);
            }
            Err(e) if e.ist_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!(clid = %clid, kanal = %ziel, fehler = %e, "Verschieben fehlgeschlagen");
                bericht.abgelehnt.push((clid, e.to_string()));
            }
        }
    }

    bericht.ausstehend = waechter.anzahl_ausstehend();
    Ok(bericht)
}

/// Laeuft bis zum Shutdown-Signal oder bis die Verbindung unbrauchbar ist
///
/// Ein Shutdown bricht auch einen laufenden Zyklus ab, inklusive eines
/// blockierenden Lesevorgangs.
pub async fn laufen<U, V>(
    waechter: &mut AfkWaechter<U>,
    verwaltung: &mut V,
    mut shutdown: watch::Receiver<bool>,
) -> QueryResult<()>
where
    U: Uhr,
    V: ClientVerwaltung + ?Sized,
{
    let konfig = waechter.konfig().clone();
    if !konfig.aktiviert {
        tracing::info!("AFK-Pruefung deaktiviert, warte auf Shutdown");
        warte_auf_shutdown(&mut shutdown).await;
        return Ok(());
    }

    tracing::info!(
        kanal = %konfig.ziel_kanal,
        schwelle_secs = konfig.schwelle.as_secs(),
        intervall_ms = konfig.intervall.as_millis() as u64,
        "AFK-Pruefung gestartet"
    );

    let pause = konfig.intervall.max(Duration::from_millis(1));

    loop {
        if *shutdown.borrow() {
            break;
        }

        let ergebnis = tokio::select! {
            _ = warte_auf_shutdown(&mut shutdown) => None,
            ergebnis = zyklus_ausfuehren(&mut *waechter, &mut *verwaltung) => Some(ergebnis),
        };

        match ergebnis {
            None => break,
            Some(Ok(bericht)) => {
                tracing::debug!(
                    clients = bericht.clients,
                    ausstehend = bericht.ausstehend,
                    verschoben = bericht.verschoben.len(),
                    "AFK-Zyklus abgeschlossen"
                );
            }
            Some(Err(e)) => {
                tracing::warn!(fehler = %e, "AFK-Zyklus fehlgeschlagen");
                if !verwaltung.ist_verbunden() {
                    return Err(QueryError::Getrennt(format!(
                        "AFK-Pruefung beendet: {e}"
                    )));
                }
            }
        }

        tokio::select! {
            _ = warte_auf_shutdown(&mut shutdown) => break,
            _ = tokio::time::sleep(pause) => {}
        }
    }

    tracing::info!("AFK-Pruefung beendet");
    Ok(())
}

/// Wartet bis das Signal `true` ist oder der Sender wegfaellt
async fn warte_auf_shutdown(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
