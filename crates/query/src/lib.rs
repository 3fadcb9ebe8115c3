//! afkbot-query – Client fuer das ServerQuery-Textprotokoll
//!
//! Aufbau von unten nach oben:
//! - [`escape`]: Escape-Grammatik fuer Parameterwerte
//! - [`parser`]: `key=value`-Datensaetze und Statuszeile
//! - [`transport`]: Zeilen lesen/schreiben mit Lese-Timeout
//! - [`executor`]: Befehlszeile bauen und Antwort auswerten
//! - [`session`]: Verbindungsaufbau, Login, Komfort-Befehle, Trennen
//!
//! Pro Verbindung ist genau ein Befehl gleichzeitig unterwegs.

pub mod clients;
pub mod error;
pub mod escape;
pub mod executor;
pub mod parser;
pub mod session;
pub mod transport;

pub use clients::ClientEintrag;
pub use error::{QueryError, QueryResult};
pub use parser::{Ereignis, Record, Status};
pub use session::{QueryKonfig, QuerySession};
