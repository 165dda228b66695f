//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist. Nur das Signatur-Geheimnis muss gesetzt werden.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use torwache_auth::{AuthKonfig, BereinigungsKonfig, HashKosten};
use torwache_db::DatabaseConfig;

/// Umgebungsvariable, die `[auth] jwt_geheimnis` ueberschreibt
pub const GEHEIMNIS_UMGEBUNG: &str = "TORWACHE_JWT_SECRET";

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub netzwerk: NetzwerkEinstellungen,
    pub datenbank: DatenbankEinstellungen,
    pub logging: LoggingEinstellungen,
    pub auth: AuthEinstellungen,
    pub bereinigung: BereinigungsEinstellungen,
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    pub bind_adresse: String,
    /// Port fuer die REST-API
    pub api_port: u16,
    /// CORS-Origins (leer = alle erlaubt, nur fuer Entwicklung)
    pub cors_origins: Vec<String>,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            api_port: 8080,
            cors_origins: vec![],
        }
    }
}

/// Datenbank-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatenbankEinstellungen {
    pub url: String,
    pub max_verbindungen: u32,
    pub sqlite_wal: bool,
    /// Wartezeit auf eine freie Verbindung in Sekunden
    pub verbindungs_timeout_sek: u64,
}

impl Default for DatenbankEinstellungen {
    fn default() -> Self {
        Self {
            url: "sqlite://torwache.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
            verbindungs_timeout_sek: 5,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Auth-Einstellungen
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthEinstellungen {
    /// HS256-Geheimnis (besser per TORWACHE_JWT_SECRET setzen)
    pub jwt_geheimnis: String,
    pub zugriffstoken_ttl_sek: i64,
    pub refresh_token_ttl_sek: i64,
    /// Frist fuer einzelne Speicherzugriffe in Millisekunden
    pub speicher_frist_ms: u64,
    pub hash_speicher_kib: u32,
    pub hash_iterationen: u32,
    pub hash_parallelitaet: u32,
    pub familie_bei_wiederverwendung_widerrufen: bool,
    /// Refresh-Cookie nur ueber HTTPS senden
    pub cookie_secure: bool,
}

impl Default for AuthEinstellungen {
    fn default() -> Self {
        let kosten = HashKosten::default();
        Self {
            jwt_geheimnis: String::new(),
            zugriffstoken_ttl_sek: 15 * 60,
            refresh_token_ttl_sek: 7 * 24 * 60 * 60,
            speicher_frist_ms: 5_000,
            hash_speicher_kib: kosten.speicher_kib,
            hash_iterationen: kosten.iterationen,
            hash_parallelitaet: kosten.parallelitaet,
            familie_bei_wiederverwendung_widerrufen: true,
            cookie_secure: true,
        }
    }
}

impl std::fmt::Debug for AuthEinstellungen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthEinstellungen")
            .field("jwt_geheimnis", &"***")
            .field("zugriffstoken_ttl_sek", &self.zugriffstoken_ttl_sek)
            .field("refresh_token_ttl_sek", &self.refresh_token_ttl_sek)
            .field("speicher_frist_ms", &self.speicher_frist_ms)
            .field("cookie_secure", &self.cookie_secure)
            .finish_non_exhaustive()
    }
}

/// Periodische Bereinigung des Refresh-Token-Ledgers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BereinigungsEinstellungen {
    pub aktiviert: bool,
    pub intervall_sek: u64,
    /// Aufbewahrung widerrufener Tokens in Tagen
    pub aufbewahrung_tage: i64,
}

impl Default for BereinigungsEinstellungen {
    fn default() -> Self {
        Self {
            aktiviert: true,
            intervall_sek: 60 * 60,
            aufbewahrung_tage: 30,
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        let mut config = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => toml::from_str::<Self>(&inhalt)
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Self::default()
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
                ))
            }
        };
        config.geheimnis_uebernehmen(std::env::var(GEHEIMNIS_UMGEBUNG).ok());
        Ok(config)
    }

    /// Ein gesetzter, nicht leerer Wert ersetzt das Geheimnis aus der Datei
    pub fn geheimnis_uebernehmen(&mut self, wert: Option<String>) {
        if let Some(wert) = wert.filter(|w| !w.is_empty()) {
            self.auth.jwt_geheimnis = wert;
        }
    }

    /// Gibt die Bind-Adresse fuer die REST-API zurueck
    pub fn api_bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.api_port)
    }

    pub fn datenbank_konfig(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.datenbank.url.clone(),
            max_verbindungen: self.datenbank.max_verbindungen,
            sqlite_wal: self.datenbank.sqlite_wal,
            verbindungs_timeout: Duration::from_secs(self.datenbank.verbindungs_timeout_sek),
        }
    }

    pub fn auth_konfig(&self) -> anyhow::Result<AuthKonfig> {
        let a = &self.auth;
        if a.jwt_geheimnis.is_empty() {
            anyhow::bail!(
                "Kein Geheimnis fuer Zugriffstokens: [auth] jwt_geheimnis oder {GEHEIMNIS_UMGEBUNG} setzen"
            );
        }
        if a.zugriffstoken_ttl_sek <= 0 || a.refresh_token_ttl_sek <= 0 {
            anyhow::bail!("Token-Gueltigkeiten muessen positiv sein");
        }
        Ok(AuthKonfig {
            zugriffstoken_geheimnis: a.jwt_geheimnis.clone(),
            zugriffstoken_ttl: chrono::Duration::seconds(a.zugriffstoken_ttl_sek),
            refresh_token_ttl: chrono::Duration::seconds(a.refresh_token_ttl_sek),
            speicher_frist: Duration::from_millis(a.speicher_frist_ms),
            hash_kosten: HashKosten {
                speicher_kib: a.hash_speicher_kib,
                iterationen: a.hash_iterationen,
                parallelitaet: a.hash_parallelitaet,
            },
            familie_bei_wiederverwendung_widerrufen: a.familie_bei_wiederverwendung_widerrufen,
        })
    }

    pub fn bereinigungs_konfig(&self) -> BereinigungsKonfig {
        BereinigungsKonfig {
            intervall: Duration::from_secs(self.bereinigung.intervall_sek.max(1)),
            aufbewahrung: chrono::Duration::days(self.bereinigung.aufbewahrung_tage),
            speicher_frist: Duration::from_millis(self.auth.speicher_frist_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.netzwerk.api_port, 8080);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.auth.zugriffstoken_ttl_sek, 900);
        assert_eq!(cfg.auth.refresh_token_ttl_sek, 604_800);
        assert_eq!(cfg.bereinigung.aufbewahrung_tage, 30);
        assert_eq!(cfg.api_bind_adresse(), "0.0.0.0:8080");
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [netzwerk]
            api_port = 9000

            [auth]
            jwt_geheimnis = "aus-der-datei"
            zugriffstoken_ttl_sek = 60
        "#;
        let cfg: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.netzwerk.api_port, 9000);
        assert_eq!(cfg.auth.jwt_geheimnis, "aus-der-datei");
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.auth.refresh_token_ttl_sek, 604_800);
        assert_eq!(cfg.netzwerk.bind_adresse, "0.0.0.0");

        let auth = cfg.auth_konfig().unwrap();
        assert_eq!(auth.zugriffstoken_ttl, chrono::Duration::seconds(60));
    }

    #[test]
    fn ohne_geheimnis_kein_start() {
        assert!(ServerConfig::default().auth_konfig().is_err());
    }

    #[test]
    fn umgebung_ueberschreibt_geheimnis() {
        let mut cfg = ServerConfig::default();
        cfg.auth.jwt_geheimnis = "datei".into();

        cfg.geheimnis_uebernehmen(Some(String::new()));
        assert_eq!(cfg.auth.jwt_geheimnis, "datei");

        cfg.geheimnis_uebernehmen(Some("umgebung".into()));
        assert_eq!(cfg.auth.jwt_geheimnis, "umgebung");
    }

    #[test]
    fn geheimnis_erscheint_nicht_im_debug() {
        let mut cfg = ServerConfig::default();
        cfg.auth.jwt_geheimnis = "streng-geheim".into();
        assert!(!format!("{cfg:?}").contains("streng-geheim"));
    }

    #[test]
    fn datenbank_konfig_uebernimmt_werte() {
        let mut cfg = ServerConfig::default();
        cfg.datenbank.verbindungs_timeout_sek = 2;
        let db = cfg.datenbank_konfig();
        assert_eq!(db.verbindungs_timeout, Duration::from_secs(2));
        assert_eq!(db.url, "sqlite://torwache.db");
    }
}
