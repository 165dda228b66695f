//! Zugriffstokens (kurzlebig, zustandslos, HS256)
//!
//! Ein Zugriffstoken wird nur ueber Signatur und Ablaufzeit geprueft,
//! es gibt keinen Speicherzugriff. Widerruf wirkt daher erst nach Ablauf.

use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use torwache_core::{Rolle, UserId};
use torwache_db::models::BenutzerRecord;

use crate::error::{AuthError, AuthResult};

/// Unterhalb dieser Laenge wird beim Start gewarnt
const MIN_GEHEIMNIS_LAENGE: usize = 32;

/// Claims eines Zugriffstokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZugriffsClaims {
    /// Benutzer-ID
    pub sub: String,
    pub email: String,
    pub role: Rolle,
    /// Ausgestellt (Unix-Sekunden)
    pub iat: i64,
    /// Ablauf (Unix-Sekunden)
    pub exp: i64,
}

impl ZugriffsClaims {
    pub fn user_id(&self) -> AuthResult<UserId> {
        self.sub
            .parse()
            .map_err(AuthError::ZugriffstokenUngueltig)
    }
}

/// Stellt Zugriffstokens aus und prueft sie
pub struct ZugriffstokenAussteller {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: chrono::Duration,
}

impl ZugriffstokenAussteller {
    pub fn neu(geheimnis: &str, ttl: chrono::Duration) -> AuthResult<Self> {
        if geheimnis.is_empty() {
            return Err(AuthError::Konfiguration(
                "Geheimnis fuer Zugriffstokens fehlt".into(),
            ));
        }
        if geheimnis.len() < MIN_GEHEIMNIS_LAENGE {
            tracing::warn!(
                laenge = geheimnis.len(),
                minimum = MIN_GEHEIMNIS_LAENGE,
                "Geheimnis fuer Zugriffstokens ist kurz"
            );
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(geheimnis.as_bytes()),
            decoding: DecodingKey::from_secret(geheimnis.as_bytes()),
            validation,
            ttl,
        })
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    pub fn ausstellen(&self, benutzer: &BenutzerRecord) -> AuthResult<String> {
        self.ausstellen_zu(benutzer, Utc::now())
    }

    /// Stellt ein Token mit explizitem Ausstellungszeitpunkt aus
    pub fn ausstellen_zu(
        &self,
        benutzer: &BenutzerRecord,
        jetzt: DateTime<Utc>,
    ) -> AuthResult<String> {
        let claims = ZugriffsClaims {
            sub: benutzer.id.to_string(),
            email: benutzer.email.clone(),
            role: benutzer.rolle,
            iat: jetzt.timestamp(),
            exp: (jetzt + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::intern(format!("Zugriffstoken nicht signierbar: {e}")))
    }

    /// Prueft Signatur und Ablauf und gibt die Claims zurueck
    pub fn pruefen(&self, token: &str) -> AuthResult<ZugriffsClaims> {
        decode::<ZugriffsClaims>(token, &self.decoding, &self.validation)
            .map(|daten| daten.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ZugriffstokenAbgelaufen,
                _ => AuthError::ZugriffstokenUngueltig(e.to_string()),
            })
    }
}

impl std::fmt::Debug for ZugriffstokenAussteller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZugriffstokenAussteller")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
