//! afkbot-core – Gemeinsame Typen
//!
//! Dieses Crate stellt die ID-Typen bereit, die der Query-Client und der
//! AFK-Waechter gemeinsam nutzen.

pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use types::{ChannelId, ClientId, ServerId};
