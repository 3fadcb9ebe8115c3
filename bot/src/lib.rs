//! afkbot – Bibliotheks-Root
//!
//! Verbindet Konfiguration, Query-Session und AFK-Waechter und stellt den
//! Einstiegspunkt fuer Integrationstests bereit.

pub mod config;

use afkbot_monitor::AfkWaechter;
use afkbot_observability::logging::{log_format_gueltig, log_level_gueltig};
use afkbot_query::QuerySession;
use anyhow::{Context, Result};
use config::BotConfig;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;

/// Haelt die Konfiguration des laufenden Bots
pub struct Bot {
    pub config: BotConfig,
}

impl Bot {
    /// Erstellt einen neuen Bot aus der gegebenen Konfiguration
    pub fn neu(config: BotConfig) -> Self {
        Self { config }
    }

    /// Laeuft bis Ctrl-C oder bis die Verbindung abbricht
    pub async fn starten(self) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Ctrl-C empfangen, beende Bot");
                    let _ = shutdown_tx.send(true);
                }
                Err(e) => {
                    tracing::warn!(fehler = %e, "Signal-Handler nicht verfuegbar");
                    // Sender behalten, sonst gilt das als Shutdown
                    std::future::pending::<()>().await;
                    drop(shutdown_tx);
                }
            }
        });

        self.laufen_bis(shutdown_rx).await
    }

    /// Verbinden, einrichten, pruefen bis zum Shutdown, trennen
    ///
    /// Fehler beim Verbinden oder Einrichten brechen ab, bevor die
    /// AFK-Pruefung startet.
    pub async fn laufen_bis(self, shutdown: watch::Receiver<bool>) -> Result<()> {
        let config = self.config;
        konfiguration_pruefen(&config);

        tracing::info!(
            host = %config.server.host,
            port = config.server.query_port,
            sid = config.server.server_id,
            "Bot startet"
        );

        let mut session = QuerySession::verbinden(
            &config.server.host,
            config.server.query_port,
            &config.query_konfig(),
        )
        .await
        .context("ServerQuery-Verbindung fehlgeschlagen")?;

        if let Err(e) = session_einrichten(&mut session, &config).await {
            if let Err(trenn_fehler) = session.trennen().await {
                tracing::debug!(fehler = %trenn_fehler, "quit nach fehlgeschlagenem Start");
            }
            return Err(e);
        }

        let mut waechter = AfkWaechter::neu(config.afk_konfig());
        let ergebnis = afkbot_monitor::laufen(&mut waechter, &mut session, shutdown).await;

        if let Err(e) = session.trennen().await {
            tracing::warn!(fehler = %e, "Trennen fehlgeschlagen");
        }

        ergebnis.context("AFK-Pruefung abgebrochen")
    }
}

/// Login, virtuellen Server waehlen, Anzeigename setzen
pub async fn session_einrichten<S>(session: &mut QuerySession<S>, config: &BotConfig) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    session
        .login(&config.query.login, &config.query.passwort)
        .await
        .context("Query-Login fehlgeschlagen")?;
    session
        .server_waehlen(config.server_id())
        .await
        .with_context(|| format!("Virtueller Server {} nicht waehlbar", config.server.server_id))?;
    session
        .nickname_setzen(&config.query.nickname)
        .await
        .context("Anzeigename konnte nicht gesetzt werden")?;
    Ok(())
}

/// Warnt bei Werten, die still auf Standardverhalten zurueckfallen
fn konfiguration_pruefen(config: &BotConfig) {
    if !log_level_gueltig(&config.logging.level) {
        tracing::warn!(level = %config.logging.level, "Unbekanntes Log-Level, Filter-Syntax wird versucht");
    }
    if !log_format_gueltig(&config.logging.format) {
        tracing::warn!(format = %config.logging.format, "Unbekanntes Log-Format, verwende text");
    }
    if config.afk.intervall_sekunden == 0 {
        tracing::warn!("afk.intervall_sekunden ist 0, verwende 1 Sekunde");
    }
}
