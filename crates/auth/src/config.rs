//! Konfiguration des Auth-Service
//!
//! Wird einmal beim Start gebaut und danach nur noch gelesen.

use std::time::Duration;

/// Argon2id-Kostenparameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashKosten {
    /// Speicherbedarf in KiB
    pub speicher_kib: u32,
    pub iterationen: u32,
    pub parallelitaet: u32,
}

impl Default for HashKosten {
    /// OWASP-Empfehlung fuer Argon2id: 19 MiB, 2 Iterationen, 1 Lane
    fn default() -> Self {
        Self {
            speicher_kib: 19 * 1024,
            iterationen: 2,
            parallelitaet: 1,
        }
    }
}

impl HashKosten {
    /// Minimale Kosten, nur fuer Tests und lokale Entwicklung
    pub fn niedrig() -> Self {
        Self {
            speicher_kib: 8,
            iterationen: 1,
            parallelitaet: 1,
        }
    }
}

/// Einstellungen fuer Tokens, Hashing und Speicherzugriffe
#[derive(Clone)]
pub struct AuthKonfig {
    /// Geheimnis fuer die HS256-Signatur der Zugriffstokens
    pub zugriffstoken_geheimnis: String,
    pub zugriffstoken_ttl: chrono::Duration,
    pub refresh_token_ttl: chrono::Duration,
    /// Frist fuer jeden einzelnen Speicherzugriff
    pub speicher_frist: Duration,
    pub hash_kosten: HashKosten,
    /// Bei Wiederverwendung eines widerrufenen Refresh-Tokens alle Tokens
    /// des Benutzers widerrufen
    pub familie_bei_wiederverwendung_widerrufen: bool,
}

impl AuthKonfig {
    pub fn neu(zugriffstoken_geheimnis: impl Into<String>) -> Self {
        Self {
            zugriffstoken_geheimnis: zugriffstoken_geheimnis.into(),
            ..Self::default()
        }
    }
}

impl Default for AuthKonfig {
    fn default() -> Self {
        Self {
            zugriffstoken_geheimnis: String::new(),
            zugriffstoken_ttl: chrono::Duration::minutes(15),
            refresh_token_ttl: chrono::Duration::days(7),
            speicher_frist: Duration::from_secs(5),
            hash_kosten: HashKosten::default(),
            familie_bei_wiederverwendung_widerrufen: true,
        }
    }
}

impl std::fmt::Debug for AuthKonfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthKonfig")
            .field("zugriffstoken_geheimnis", &"***")
            .field("zugriffstoken_ttl", &self.zugriffstoken_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("speicher_frist", &self.speicher_frist)
            .field("hash_kosten", &self.hash_kosten)
            .field(
                "familie_bei_wiederverwendung_widerrufen",
                &self.familie_bei_wiederverwendung_widerrufen,
            )
            .finish()
    }
}
