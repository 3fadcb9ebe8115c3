//! Zeitquelle des Waechters
//!
//! Der Waechter fragt die Zeit nur ueber [`Uhr`] ab. Tests stellen eine
//! [`ManuelleUhr`] von Hand vor und pruefen die Kulanzzeit ohne zu schlafen.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Monotone Zeitquelle
pub trait Uhr: Send + Sync {
    fn jetzt(&self) -> Instant;
}

/// Echte Systemzeit
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemUhr;

impl Uhr for SystemUhr {
    fn jetzt(&self) -> Instant {
        Instant::now()
    }
}

/// Von Hand gesteuerte Uhr; Klone teilen sich denselben Zeitpunkt
#[derive(Debug, Clone)]
pub struct ManuelleUhr {
    zeitpunkt: Arc<Mutex<Instant>>,
}

impl ManuelleUhr {
    pub fn neu() -> Self {
        Self {
            zeitpunkt: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Stellt die Uhr um `dauer` vor
    pub fn vorstellen(&self, dauer: Duration) {
        *self.zeitpunkt.lock() += dauer;
    }
}

impl Default for ManuelleUhr {
    fn default() -> Self {
        Self::neu()
    }
}

impl Uhr for ManuelleUhr {
    fn jetzt(&self) -> Instant {
        *self.zeitpunkt.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manuelle_uhr_steht_still() {
        let uhr = ManuelleUhr::neu();
        assert_eq!(uhr.jetzt(), uhr.jetzt());
    }

    #[test]
    fn klone_teilen_die_zeit() {
        let uhr = ManuelleUhr::neu();
        let start = uhr.jetzt();
        let klon = uhr.clone();
        klon.vorstellen(Duration::from_secs(25));
        assert_eq!(uhr.jetzt() - start, Duration::from_secs(25));
    }

    #[test]
    fn system_uhr_ist_monoton() {
        let uhr = SystemUhr;
        let a = uhr.jetzt();
        let b = uhr.jetzt();
        assert!(b >= a);
    }
}
