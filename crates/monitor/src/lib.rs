//! afkbot-monitor – AFK-Waechter fuer ServerQuery
//!
//! - [`waechter`]: Zustandsmaschine mit Kulanzzeit, rein und synchron
//! - [`dienst`]: Pruefzyklus und Schleife mit Takt und Shutdown-Signal
//! - [`verwaltung`]: Trait-Grenze zur Query-Session
//! - [`uhr`]: austauschbare Zeitquelle

pub mod dienst;
pub mod uhr;
pub mod verwaltung;
pub mod waechter;

pub use dienst::{laufen, zyklus_ausfuehren, ZyklusBericht};
pub use uhr::{ManuelleUhr, SystemUhr, Uhr};
pub use verwaltung::ClientVerwaltung;
pub use waechter::{AfkKonfig, AfkWaechter, AfkZustand, KULANZ};
