//! Fehlertypen fuer den Auth-Service
//!
//! Jede Variante gehoert zu genau einer [`FehlerKategorie`]. Die Transportschicht
//! entscheidet ueber die Kategorie, nie ueber den Meldungstext.

use thiserror::Error;
use torwache_db::DbError;

/// Alle moeglichen Fehler im Auth-Service
#[derive(Debug, Error)]
pub enum AuthError {
    // --- Passwort ---
    #[error("Passwort-Hashing fehlgeschlagen: {0}")]
    PasswortHashing(String),

    // --- Anmeldung ---
    #[error("Benutzer nicht gefunden: {0}")]
    BenutzerNichtGefunden(String),

    #[error("Passwort falsch")]
    PasswortFalsch,

    #[error("Benutzer gesperrt")]
    BenutzerGesperrt,

    // --- Registrierung ---
    #[error("E-Mail bereits vergeben: {0}")]
    EmailVergeben(String),

    // --- Refresh-Token ---
    #[error("Refresh-Token nicht gefunden")]
    TokenNichtGefunden,

    #[error("Refresh-Token abgelaufen")]
    TokenAbgelaufen,

    #[error("Refresh-Token widerrufen")]
    TokenWiderrufen,

    #[error("Refresh-Token bereits widerrufen")]
    TokenBereitsWiderrufen,

    // --- Zugriffstoken ---
    #[error("Zugriffstoken ungueltig: {0}")]
    ZugriffstokenUngueltig(String),

    #[error("Zugriffstoken abgelaufen")]
    ZugriffstokenAbgelaufen,

    // --- Berechtigungen ---
    #[error("Unbekannte Berechtigung: {0}")]
    UngueltigeBerechtigung(String),

    #[error("Zugriff verweigert: Berechtigung '{0}' fehlt")]
    ZugriffVerweigert(String),

    // --- Eingaben / Konfiguration ---
    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    #[error("Ungueltige Konfiguration: {0}")]
    Konfiguration(String),

    // --- Infrastruktur ---
    #[error("Zeitlimit beim Speicherzugriff ueberschritten")]
    Zeitlimit,

    #[error("Datenbankfehler: {0}")]
    Datenbank(#[from] DbError),

    #[error("Interner Fehler: {0}")]
    Intern(String),
}

/// Grobe Fehlerklasse, auf die die Transportschicht abbildet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FehlerKategorie {
    NichtGefunden,
    Konflikt,
    NichtAutorisiert,
    Verboten,
    UngueltigeEingabe,
    Intern,
}

impl AuthError {
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    pub fn kategorie(&self) -> FehlerKategorie {
        match self {
            Self::BenutzerNichtGefunden(_) | Self::TokenNichtGefunden => {
                FehlerKategorie::NichtGefunden
            }
            Self::EmailVergeben(_) | Self::TokenBereitsWiderrufen => FehlerKategorie::Konflikt,
            Self::PasswortFalsch
            | Self::BenutzerGesperrt
            | Self::TokenAbgelaufen
            | Self::TokenWiderrufen
            | Self::ZugriffstokenUngueltig(_)
            | Self::ZugriffstokenAbgelaufen => FehlerKategorie::NichtAutorisiert,
            Self::ZugriffVerweigert(_) => FehlerKategorie::Verboten,
            Self::UngueltigeBerechtigung(_) | Self::UngueltigeEingabe(_) => {
                FehlerKategorie::UngueltigeEingabe
            }
            Self::Datenbank(e) => match e {
                DbError::NichtGefunden(_) => FehlerKategorie::NichtGefunden,
                DbError::Eindeutigkeit(_) => FehlerKategorie::Konflikt,
                DbError::TokenAbgelaufen | DbError::TokenWiderrufen => {
                    FehlerKategorie::NichtAutorisiert
                }
                _ => FehlerKategorie::Intern,
            },
            Self::PasswortHashing(_) | Self::Konfiguration(_) | Self::Zeitlimit | Self::Intern(_) => {
                FehlerKategorie::Intern
            }
        }
    }

    /// Fehlgeschlagene Anmeldung (unbekannter, gesperrter Benutzer oder falsches Passwort).
    ///
    /// Alle Faelle sind nach aussen ununterscheidbar.
    pub fn ist_anmeldefehler(&self) -> bool {
        matches!(
            self,
            Self::BenutzerNichtGefunden(_) | Self::PasswortFalsch | Self::BenutzerGesperrt
        )
    }

    /// HTTP-Statuscode fuer die Transportschicht
    pub fn http_status(&self) -> u16 {
        if self.ist_anmeldefehler() {
            return 401;
        }
        match self {
            // Ein unbekanntes Refresh-Token ist ein Authentifizierungsproblem
            Self::TokenNichtGefunden => 401,
            _ => match self.kategorie() {
                FehlerKategorie::NichtGefunden => 404,
                FehlerKategorie::Konflikt => 409,
                FehlerKategorie::NichtAutorisiert => 401,
                FehlerKategorie::Verboten => 403,
                FehlerKategorie::UngueltigeEingabe => 400,
                FehlerKategorie::Intern => 500,
            },
        }
    }

    /// Maschinenlesbarer Code fuer Fehlerantworten
    pub fn code(&self) -> &'static str {
        if self.ist_anmeldefehler() {
            return "UNGUELTIGE_ANMELDEDATEN";
        }
        match self {
            Self::EmailVergeben(_) => "EMAIL_VERGEBEN",
            Self::TokenNichtGefunden | Self::TokenAbgelaufen | Self::TokenWiderrufen => {
                "REFRESH_TOKEN_UNGUELTIG"
            }
            Self::TokenBereitsWiderrufen => "REFRESH_TOKEN_BEREITS_WIDERRUFEN",
            Self::ZugriffstokenUngueltig(_) | Self::ZugriffstokenAbgelaufen => {
                "ZUGRIFFSTOKEN_UNGUELTIG"
            }
            Self::ZugriffVerweigert(_) => "ZUGRIFF_VERWEIGERT",
            Self::UngueltigeBerechtigung(_) => "UNGUELTIGE_BERECHTIGUNG",
            Self::UngueltigeEingabe(_) => "UNGUELTIGE_EINGABE",
            _ => match self.kategorie() {
                FehlerKategorie::NichtGefunden => "NICHT_GEFUNDEN",
                FehlerKategorie::Konflikt => "KONFLIKT",
                FehlerKategorie::NichtAutorisiert => "NICHT_AUTORISIERT",
                FehlerKategorie::Verboten => "ZUGRIFF_VERWEIGERT",
                FehlerKategorie::UngueltigeEingabe => "UNGUELTIGE_EINGABE",
                FehlerKategorie::Intern => "INTERNER_FEHLER",
            },
        }
    }

    /// Meldungstext fuer Clients.
    ///
    /// Verraet weder ob ein Benutzer existiert noch warum ein Refresh-Token
    /// abgelehnt wurde; interne Details bleiben im Log.
    pub fn oeffentliche_meldung(&self) -> String {
        if self.ist_anmeldefehler() {
            return "Ungueltige Anmeldedaten".into();
        }
        match self {
            Self::TokenNichtGefunden | Self::TokenAbgelaufen | Self::TokenWiderrufen => {
                "Refresh-Token ungueltig oder abgelaufen".into()
            }
            Self::ZugriffstokenUngueltig(_) | Self::ZugriffstokenAbgelaufen => {
                "Zugriffstoken ungueltig oder abgelaufen".into()
            }
            _ if self.kategorie() == FehlerKategorie::Intern => "Interner Fehler".into(),
            _ => self.to_string(),
        }
    }
}

/// Result-Alias fuer den Auth-Service
pub type AuthResult<T> = Result<T, AuthError>;
