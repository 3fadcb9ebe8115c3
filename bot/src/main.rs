//! afkbot – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und startet den Bot.

use afkbot::{config::BotConfig, Bot};
use afkbot_observability::logging_initialisieren;
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Konfigurationsdatei-Pfad aus Umgebungsvariable oder Standard
    let config_pfad = std::env::var("AFKBOT_CONFIG").unwrap_or_else(|_| "afkbot.toml".into());

    // Konfiguration laden (Standardwerte falls Datei fehlt)
    let geladen = BotConfig::laden(&config_pfad)?;
    let datei_gefunden = geladen.is_some();
    let config = geladen.unwrap_or_default();

    logging_initialisieren(&config.logging.level, &config.logging.format);

    if !datei_gefunden {
        tracing::warn!(
            pfad = %config_pfad,
            "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
        );
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        "AFK-Bot wird initialisiert"
    );

    let bot = Bot::neu(config);
    bot.starten().await?;

    Ok(())
}
