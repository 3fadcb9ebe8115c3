//! Gemeinsame Identifikationstypen
//!
//! ServerQuery vergibt numerische IDs fuer Clients, Kanaele und virtuelle
//! Server. Newtypes verhindern Verwechslungen zur Compilezeit, z.B. eine
//! Kanal-ID an Stelle einer Client-ID in `clientmove`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sitzungsbezogene Client-ID (`clid`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(pub u32);

impl ClientId {
    /// Gibt die innere Zahl zurueck
    pub fn inner(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ClientId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Kanal-ID (`cid`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub u32);

impl ChannelId {
    /// Gibt die innere Zahl zurueck
    pub fn inner(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChannelId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// ID eines virtuellen Servers (`sid`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerId(pub u32);

impl ServerId {
    /// Gibt die innere Zahl zurueck
    pub fn inner(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ServerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
