//! Refresh-Token-Werte und Bereinigung des Ledgers

use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use rand::RngCore as _;
use tokio::task::JoinHandle;

use torwache_db::RefreshTokenRepository;

use crate::frist::mit_frist;

/// Laenge der Zufallsdaten eines Refresh-Tokens in Bytes
const TOKEN_BYTES: usize = 32;

/// Erzeugt einen opaken, URL-sicheren Token-Wert (256 Bit Zufall)
pub fn refresh_token_generieren() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Einstellungen fuer die periodische Bereinigung
#[derive(Debug, Clone, Copy)]
pub struct BereinigungsKonfig {
    pub intervall: Duration,
    /// Widerrufene Tokens werden so lange aufbewahrt (Wiederverwendung erkennen)
    pub aufbewahrung: chrono::Duration,
    /// Obergrenze fuer einen einzelnen Lauf
    pub speicher_frist: Duration,
}

impl Default for BereinigungsKonfig {
    fn default() -> Self {
        Self {
            intervall: Duration::from_secs(60 * 60),
            aufbewahrung: chrono::Duration::days(30),
            speicher_frist: Duration::from_secs(5),
        }
    }
}

/// Startet einen Hintergrund-Task, der abgelaufene und alte widerrufene
/// Tokens loescht. Fehler werden geloggt, der naechste Lauf versucht es erneut.
pub fn bereinigung_starten<R>(ledger: Arc<R>, konfig: BereinigungsKonfig) -> JoinHandle<()>
where
    R: RefreshTokenRepository + 'static,
{
    tokio::spawn(async move {
        let mut takt = tokio::time::interval(konfig.intervall);
        takt.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            takt.tick().await;
            match mit_frist(konfig.speicher_frist, ledger.purge_expired(konfig.aufbewahrung)).await {
                Ok(0) => {}
                Ok(anzahl) => {
                    tracing::info!(anzahl, "Refresh-Token-Ledger bereinigt");
                }
                Err(e) => {
                    tracing::warn!(fehler = %e, "Bereinigung des Refresh-Token-Ledgers fehlgeschlagen");
                }
            }
        }
    })
}
