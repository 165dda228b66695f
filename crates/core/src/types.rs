//! Gemeinsame Identifikations- und Aufzaehlungstypen fuer Torwache
//!
//! IDs verwenden das Newtype-Pattern, Rollen und Berechtigungen sind
//! geschlossene Aufzaehlungen mit festem String-Format fuer Datenbank und Token.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Eindeutige Benutzer-ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Erstellt eine neue zufaellige UserId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Ungueltige Benutzer-ID '{s}': {e}"))
    }
}

// ---------------------------------------------------------------------------
// Rollen
// ---------------------------------------------------------------------------

/// Rolle eines Benutzers (geschlossene Menge)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rolle {
    Admin,
    Manager,
    Standard,
}

impl Default for Rolle {
    fn default() -> Self {
        Self::Standard
    }
}

impl Rolle {
    /// Alle Rollen-Varianten
    pub const ALLE: [Rolle; 3] = [Rolle::Admin, Rolle::Manager, Rolle::Standard];

    pub fn als_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Manager => "MANAGER",
            Self::Standard => "STANDARD",
        }
    }
}

impl std::fmt::Display for Rolle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.als_str())
    }
}

impl std::str::FromStr for Rolle {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Self::Admin),
            "MANAGER" => Ok(Self::Manager),
            "STANDARD" => Ok(Self::Standard),
            other => Err(format!("Unbekannte Rolle: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Berechtigungen
// ---------------------------------------------------------------------------

/// Eine Berechtigung aus dem festen Katalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Berechtigung {
    CreateUser,
    UpdateUser,
    DeleteUser,
    ViewAllUsers,
    ManageRoles,
    ViewReports,
    ManageSettings,
}

impl Berechtigung {
    /// Der vollstaendige Katalog
    pub const ALLE: [Berechtigung; 7] = [
        Berechtigung::CreateUser,
        Berechtigung::UpdateUser,
        Berechtigung::DeleteUser,
        Berechtigung::ViewAllUsers,
        Berechtigung::ManageRoles,
        Berechtigung::ViewReports,
        Berechtigung::ManageSettings,
    ];

    pub fn als_str(&self) -> &'static str {
        match self {
            Self::CreateUser => "CREATE_USER",
            Self::UpdateUser => "UPDATE_USER",
            Self::DeleteUser => "DELETE_USER",
            Self::ViewAllUsers => "VIEW_ALL_USERS",
            Self::ManageRoles => "MANAGE_ROLES",
            Self::ViewReports => "VIEW_REPORTS",
            Self::ManageSettings => "MANAGE_SETTINGS",
        }
    }

    /// Menschenlesbare Beschreibung
    pub fn beschreibung(&self) -> &'static str {
        match self {
            Self::CreateUser => "Darf neue Benutzer anlegen",
            Self::UpdateUser => "Darf Benutzerdaten aendern",
            Self::DeleteUser => "Darf Benutzer loeschen",
            Self::ViewAllUsers => "Darf alle Benutzer einsehen",
            Self::ManageRoles => "Darf Rollen und Berechtigungen verwalten",
            Self::ViewReports => "Darf Berichte einsehen",
            Self::ManageSettings => "Darf Systemeinstellungen verwalten",
        }
    }
}

impl std::fmt::Display for Berechtigung {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.als_str())
    }
}

impl std::str::FromStr for Berechtigung {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALLE
            .iter()
            .copied()
            .find(|b| b.als_str() == s)
            .ok_or_else(|| format!("Unbekannte Berechtigung: {s}"))
    }
}

// ---------------------------------------------------------------------------
// Benutzer-Status
// ---------------------------------------------------------------------------

/// Lebenszyklus-Status eines Benutzers (weiches Loeschen)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenutzerStatus {
    Aktiv,
    Geloescht,
}

impl BenutzerStatus {
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::Aktiv => "aktiv",
            Self::Geloescht => "geloescht",
        }
    }
}

impl std::str::FromStr for BenutzerStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aktiv" => Ok(Self::Aktiv),
            "geloescht" => Ok(Self::Geloescht),
            other => Err(format!("Unbekannter Benutzer-Status: {other}")),
        }
    }
}
