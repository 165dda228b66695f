//! Datenbankmodelle fuer Torwache
//!
//! Diese Typen repraesentieren Datensaetze aus der Datenbank.
//! Sie dienen als reine Datenuebertragungsobjekte zwischen Store und Services.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use torwache_core::{Berechtigung, BenutzerStatus, Rolle, UserId};

use crate::error::DbError;

// ---------------------------------------------------------------------------
// Benutzer
// ---------------------------------------------------------------------------

/// Benutzer-Datensatz inklusive Berechtigungen und Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenutzerRecord {
    pub id: UserId,
    pub name: String,
    /// Eindeutig, Gross-/Kleinschreibung wie gespeichert
    pub email: String,
    /// Wird nie serialisiert
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub rolle: Rolle,
    pub is_active: bool,
    pub status: BenutzerStatus,
    pub berechtigungen: BTreeSet<Berechtigung>,
    pub einstellungen: Option<EinstellungenRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BenutzerRecord {
    pub fn ist_geloescht(&self) -> bool {
        self.status == BenutzerStatus::Geloescht
    }
}

/// Daten zum Erstellen eines neuen Benutzers
#[derive(Debug, Clone)]
pub struct NeuerBenutzer<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub rolle: Rolle,
    pub berechtigungen: &'a BTreeSet<Berechtigung>,
    pub einstellungen: EinstellungenRecord,
}

/// Daten zum Aktualisieren eines Benutzers
#[derive(Debug, Clone, Default)]
pub struct BenutzerUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub rolle: Option<Rolle>,
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Einstellungen
// ---------------------------------------------------------------------------

/// Benutzer-Einstellungen (1:1 zum Benutzer)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EinstellungenRecord {
    pub theme: String,
    pub language: String,
    pub notifications_enabled: bool,
    pub currency: String,
    pub date_format: String,
}

impl Default for EinstellungenRecord {
    fn default() -> Self {
        Self {
            theme: "light".into(),
            language: "pt-BR".into(),
            notifications_enabled: true,
            currency: "BRL".into(),
            date_format: "DD/MM/YYYY".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Refresh-Tokens
// ---------------------------------------------------------------------------

/// Ein ausgegebenes Refresh-Token wie im Ledger gespeichert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub user_id: UserId,
    /// Opaker, zufaelliger Token-Wert (eindeutig)
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    /// Erstellt einen neuen, nicht widerrufenen Datensatz
    pub fn neu(user_id: UserId, token: String, jetzt: DateTime<Utc>, ttl: chrono::Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            token,
            expires_at: jetzt + ttl,
            revoked: false,
            revoked_at: None,
            created_at: jetzt,
            updated_at: jetzt,
        }
    }

    pub fn ist_abgelaufen(&self, jetzt: DateTime<Utc>) -> bool {
        jetzt >= self.expires_at
    }

    /// Nutzbar nur solange nicht widerrufen und nicht abgelaufen
    pub fn ist_gueltig(&self, jetzt: DateTime<Utc>) -> bool {
        !self.revoked && !self.ist_abgelaufen(jetzt)
    }

    /// Klassifiziert die Ungueltigkeit. Ablauf hat Vorrang vor Widerruf.
    pub fn gueltigkeit_pruefen(&self, jetzt: DateTime<Utc>) -> Result<(), DbError> {
        if self.ist_abgelaufen(jetzt) {
            Err(DbError::TokenAbgelaufen)
        } else if self.revoked {
            Err(DbError::TokenWiderrufen)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(ttl_sek: i64) -> RefreshTokenRecord {
        RefreshTokenRecord::neu(
            UserId::new(),
            "wert".into(),
            Utc::now(),
            chrono::Duration::seconds(ttl_sek),
        )
    }

    #[test]
    fn neues_token_ist_gueltig() {
        let t = token(60);
        assert!(t.ist_gueltig(Utc::now()));
        assert!(t.gueltigkeit_pruefen(Utc::now()).is_ok());
    }

    #[test]
    fn abgelaufen_hat_vorrang_vor_widerrufen() {
        let mut t = token(-60);
        t.revoked = true;
        assert!(matches!(
            t.gueltigkeit_pruefen(Utc::now()),
            Err(DbError::TokenAbgelaufen)
        ));
    }

    #[test]
    fn widerrufenes_token_ungueltig() {
        let mut t = token(60);
        t.revoked = true;
        assert!(!t.ist_gueltig(Utc::now()));
        assert!(matches!(
            t.gueltigkeit_pruefen(Utc::now()),
            Err(DbError::TokenWiderrufen)
        ));
    }

    #[test]
    fn passwort_hash_wird_nicht_serialisiert() {
        let jetzt = Utc::now();
        let b = BenutzerRecord {
            id: UserId::new(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password_hash: "$argon2id$geheim".into(),
            rolle: Rolle::Standard,
            is_active: true,
            status: BenutzerStatus::Aktiv,
            berechtigungen: BTreeSet::new(),
            einstellungen: None,
            created_at: jetzt,
            updated_at: jetzt,
        };
        let json = serde_json::to_string(&b).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("password_hash"));
    }
}
