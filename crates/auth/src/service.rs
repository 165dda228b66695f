//! Auth-Service fuer Torwache
//!
//! Zentraler Service fuer Registrierung, Login, Token-Erneuerung und Logout.
//! Zugriffstokens sind zustandslos, Refresh-Tokens werden im Ledger gefuehrt
//! und bei jeder Erneuerung rotiert.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use torwache_core::{Rolle, UserId};
use torwache_db::{
    models::{BenutzerRecord, BenutzerUpdate, EinstellungenRecord, NeuerBenutzer, RefreshTokenRecord},
    DbError, RefreshTokenRepository, UserRepository,
};

use crate::{
    access_token::{ZugriffsClaims, ZugriffstokenAussteller},
    config::AuthKonfig,
    error::{AuthError, AuthResult},
    frist::{blockierend, mit_frist},
    password::PasswortHasher,
    permission::BerechtigungsKatalog,
    refresh_token::refresh_token_generieren,
};

/// Versuche bei (praktisch unmoeglicher) Kollision eines Token-Werts
const MAX_TOKEN_VERSUCHE: usize = 3;

/// Daten fuer eine Registrierung
///
/// `rolle` ist fuer interne Aufrufer gedacht, ohne Angabe gilt `Rolle::Standard`.
#[derive(Debug, Clone)]
pub struct Registrierung {
    pub name: String,
    pub email: String,
    pub passwort: String,
    pub rolle: Option<Rolle>,
}

/// Ergebnis von Login und Token-Erneuerung
#[derive(Clone, Serialize)]
pub struct TokenPaar {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Gueltigkeit des Zugriffstokens in Sekunden
    pub expires_in: i64,
}

impl std::fmt::Debug for TokenPaar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPaar")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

/// Auth-Service – zentraler Einstiegspunkt fuer alle Authentifizierungsvorgaenge
pub struct AuthService<U: UserRepository, R: RefreshTokenRepository> {
    user_repo: Arc<U>,
    ledger: Arc<R>,
    hasher: PasswortHasher,
    aussteller: ZugriffstokenAussteller,
    katalog: &'static BerechtigungsKatalog,
    /// Gleicht die Laufzeit bei unbekannter E-Mail an die Passwortpruefung an
    attrappen_hash: Arc<str>,
    konfig: AuthKonfig,
}

impl<U: UserRepository, R: RefreshTokenRepository> AuthService<U, R> {
    /// Erstellt einen neuen AuthService.
    ///
    /// Schlaegt fehl wenn das Geheimnis fehlt oder die Hash-Kosten ungueltig sind.
    pub fn neu(user_repo: Arc<U>, ledger: Arc<R>, konfig: AuthKonfig) -> AuthResult<Self> {
        let hasher = PasswortHasher::neu(&konfig.hash_kosten)?;
        let aussteller =
            ZugriffstokenAussteller::neu(&konfig.zugriffstoken_geheimnis, konfig.zugriffstoken_ttl)?;
        let attrappen_hash: Arc<str> = hasher.hashen(&refresh_token_generieren())?.into();

        Ok(Self {
            user_repo,
            ledger,
            hasher,
            aussteller,
            katalog: BerechtigungsKatalog::global(),
            attrappen_hash,
            konfig,
        })
    }

    /// Registriert einen neuen Benutzer mit den Standard-Berechtigungen seiner Rolle.
    ///
    /// Der zurueckgegebene Datensatz enthaelt keinen Passwort-Hash.
    pub async fn registrieren(&self, daten: Registrierung) -> AuthResult<BenutzerRecord> {
        let name = daten.name.trim();
        let email = daten.email.trim();
        if name.is_empty() || email.is_empty() || daten.passwort.is_empty() {
            return Err(AuthError::UngueltigeEingabe(
                "Name, E-Mail und Passwort sind erforderlich".into(),
            ));
        }

        if self.speicher(self.user_repo.get_by_email(email)).await?.is_some() {
            return Err(AuthError::EmailVergeben(email.to_string()));
        }

        let hasher = self.hasher.clone();
        let passwort = daten.passwort;
        let passwort_hash = blockierend(move || hasher.hashen(&passwort)).await??;

        let rolle = daten.rolle.unwrap_or_default();
        let berechtigungen = self.katalog.standard_berechtigungen(rolle);

        let ergebnis = self
            .speicher(self.user_repo.create(NeuerBenutzer {
                name,
                email,
                password_hash: &passwort_hash,
                rolle,
                berechtigungen: &berechtigungen,
                einstellungen: EinstellungenRecord::default(),
            }))
            .await;

        let mut benutzer = match ergebnis {
            Ok(b) => b,
            // Gleichzeitige Registrierung mit derselben E-Mail
            Err(AuthError::Datenbank(DbError::Eindeutigkeit(_))) => {
                return Err(AuthError::EmailVergeben(email.to_string()));
            }
            Err(e) => return Err(e),
        };
        benutzer.password_hash.clear();

        tracing::info!(
            user_id = %benutzer.id,
            rolle = %benutzer.rolle,
            "Neuer Benutzer registriert"
        );

        Ok(benutzer)
    }

    /// Meldet einen Benutzer an.
    ///
    /// Alle bisherigen Refresh-Tokens des Benutzers werden widerrufen,
    /// danach ist genau das neue Token aktiv.
    pub async fn anmelden(&self, email: &str, passwort: &str) -> AuthResult<TokenPaar> {
        // Wie bei der Registrierung gespeichert
        let email = email.trim();
        let benutzer = self.speicher(self.user_repo.get_by_email(email)).await?;

        let Some(benutzer) = benutzer else {
            // Gleiche Arbeit wie bei bekanntem Benutzer
            self.passwort_pruefen(passwort, &self.attrappen_hash).await?;
            tracing::warn!(grund = "benutzer_unbekannt", "Fehlgeschlagener Login-Versuch");
            return Err(AuthError::BenutzerNichtGefunden(email.to_string()));
        };

        if !self.passwort_pruefen(passwort, &benutzer.password_hash).await? {
            tracing::warn!(
                user_id = %benutzer.id,
                grund = "passwort_falsch",
                "Fehlgeschlagener Login-Versuch"
            );
            return Err(AuthError::PasswortFalsch);
        }

        if !benutzer.is_active {
            tracing::warn!(user_id = %benutzer.id, grund = "gesperrt", "Login eines gesperrten Benutzers");
            return Err(AuthError::BenutzerGesperrt);
        }

        let widerrufen = self.alle_widerrufen(benutzer.id).await?;
        let paar = self.token_paar_ausstellen(&benutzer).await?;

        tracing::info!(
            user_id = %benutzer.id,
            alte_tokens_widerrufen = widerrufen,
            "Benutzer angemeldet"
        );

        Ok(paar)
    }

    /// Tauscht ein gueltiges Refresh-Token gegen ein neues Token-Paar.
    ///
    /// Das vorgelegte Token ist danach widerrufen. Wird ein bereits widerrufenes
    /// Token erneut vorgelegt, gilt das als Wiederverwendung.
    pub async fn token_erneuern(&self, refresh_token: &str) -> AuthResult<TokenPaar> {
        let record = self
            .speicher(self.ledger.get_by_token(refresh_token))
            .await?
            .ok_or(AuthError::TokenNichtGefunden)?;

        match record.gueltigkeit_pruefen(Utc::now()) {
            Ok(()) => {}
            Err(DbError::TokenAbgelaufen) => return Err(AuthError::TokenAbgelaufen),
            Err(DbError::TokenWiderrufen) => {
                self.wiederverwendung_behandeln(&record).await;
                return Err(AuthError::TokenWiderrufen);
            }
            Err(e) => return Err(e.into()),
        }

        let benutzer = self.aktiven_benutzer_laden(record.user_id).await?;

        match self.speicher(self.ledger.revoke_token(refresh_token)).await {
            Ok(()) => {}
            Err(AuthError::Datenbank(DbError::NichtGefunden(_))) => {
                // Eine gleichzeitige Erneuerung war schneller
                tracing::debug!(user_id = %record.user_id, "Refresh-Token bereits rotiert");
                return Err(AuthError::TokenWiderrufen);
            }
            Err(e) => return Err(e),
        }

        let paar = self.token_paar_ausstellen(&benutzer).await?;
        tracing::debug!(user_id = %benutzer.id, "Refresh-Token rotiert");
        Ok(paar)
    }

    /// Widerruft genau dieses Refresh-Token
    pub async fn abmelden(&self, refresh_token: &str) -> AuthResult<()> {
        if refresh_token.is_empty() {
            return Err(AuthError::UngueltigeEingabe("Refresh-Token fehlt".into()));
        }

        match self.speicher(self.ledger.revoke_token(refresh_token)).await {
            Ok(()) => {
                tracing::debug!("Refresh-Token abgemeldet");
                Ok(())
            }
            Err(AuthError::Datenbank(DbError::NichtGefunden(_))) => {
                match self.speicher(self.ledger.get_by_token(refresh_token)).await? {
                    Some(record) => {
                        tracing::warn!(
                            user_id = %record.user_id,
                            "Logout mit bereits widerrufenem Refresh-Token"
                        );
                        Err(AuthError::TokenBereitsWiderrufen)
                    }
                    None => Err(AuthError::TokenNichtGefunden),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Widerruft alle Refresh-Tokens eines Benutzers. Gibt die Anzahl zurueck.
    pub async fn ueberall_abmelden(&self, user_id: UserId) -> AuthResult<u64> {
        let benutzer = self
            .speicher(self.user_repo.get_by_id(user_id))
            .await?
            .filter(|b| !b.ist_geloescht())
            .ok_or_else(|| AuthError::BenutzerNichtGefunden(user_id.to_string()))?;

        let anzahl = self.alle_widerrufen(benutzer.id).await?;
        tracing::info!(user_id = %user_id, anzahl, "Benutzer ueberall abgemeldet");
        Ok(anzahl)
    }

    /// Aendert das Passwort und widerruft alle Refresh-Tokens des Benutzers
    pub async fn passwort_aendern(
        &self,
        user_id: UserId,
        altes_passwort: &str,
        neues_passwort: &str,
    ) -> AuthResult<()> {
        if neues_passwort.is_empty() {
            return Err(AuthError::UngueltigeEingabe("Neues Passwort fehlt".into()));
        }

        let benutzer = self.aktiven_benutzer_laden(user_id).await?;
        if !self.passwort_pruefen(altes_passwort, &benutzer.password_hash).await? {
            return Err(AuthError::PasswortFalsch);
        }

        let hasher = self.hasher.clone();
        let neues_passwort = neues_passwort.to_string();
        let neuer_hash = blockierend(move || hasher.hashen(&neues_passwort)).await??;

        self.speicher(self.user_repo.update(
            user_id,
            BenutzerUpdate {
                password_hash: Some(neuer_hash),
                ..Default::default()
            },
        ))
        .await?;

        let widerrufen = self.alle_widerrufen(user_id).await?;
        tracing::info!(user_id = %user_id, widerrufen, "Passwort geaendert");
        Ok(())
    }

    /// Prueft ein Zugriffstoken ohne Speicherzugriff
    pub fn zugriffstoken_pruefen(&self, token: &str) -> AuthResult<ZugriffsClaims> {
        self.aussteller.pruefen(token)
    }

    // --- Interne Hilfsmethoden ---

    async fn speicher<T>(
        &self,
        zugriff: impl std::future::Future<Output = torwache_db::DbResult<T>>,
    ) -> AuthResult<T> {
        mit_frist(self.konfig.speicher_frist, zugriff).await
    }

    async fn passwort_pruefen(&self, passwort: &str, hash: &str) -> AuthResult<bool> {
        let hasher = self.hasher.clone();
        let passwort = passwort.to_string();
        let hash = hash.to_string();
        blockierend(move || hasher.verifizieren(&passwort, &hash)).await
    }

    /// Laedt einen Benutzer, der existiert, nicht geloescht und aktiv ist
    async fn aktiven_benutzer_laden(&self, user_id: UserId) -> AuthResult<BenutzerRecord> {
        let benutzer = self
            .speicher(self.user_repo.get_by_id(user_id))
            .await?
            .filter(|b| !b.ist_geloescht())
            .ok_or_else(|| AuthError::BenutzerNichtGefunden(user_id.to_string()))?;
        if !benutzer.is_active {
            return Err(AuthError::BenutzerGesperrt);
        }
        Ok(benutzer)
    }

    /// Widerruft alle aktiven Tokens; keine aktiven Tokens ist kein Fehler
    async fn alle_widerrufen(&self, user_id: UserId) -> AuthResult<u64> {
        match self.speicher(self.ledger.revoke_by_user(user_id)).await {
            Ok(anzahl) => Ok(anzahl),
            Err(AuthError::Datenbank(DbError::NichtGefunden(_))) => Ok(0),
            Err(e) => Err(e),
        }
    }

    async fn wiederverwendung_behandeln(&self, record: &RefreshTokenRecord) {
        tracing::warn!(
            ereignis = "refresh_token_wiederverwendung",
            user_id = %record.user_id,
            token_id = %record.id,
            "Widerrufenes Refresh-Token erneut vorgelegt"
        );
        if !self.konfig.familie_bei_wiederverwendung_widerrufen {
            return;
        }
        match self.alle_widerrufen(record.user_id).await {
            Ok(anzahl) => {
                tracing::warn!(
                    user_id = %record.user_id,
                    anzahl,
                    "Alle Refresh-Tokens nach Wiederverwendung widerrufen"
                );
            }
            Err(e) => {
                tracing::error!(
                    user_id = %record.user_id,
                    fehler = %e,
                    "Widerruf nach Wiederverwendung fehlgeschlagen"
                );
            }
        }
    }

    async fn token_paar_ausstellen(&self, benutzer: &BenutzerRecord) -> AuthResult<TokenPaar> {
        let access_token = self.aussteller.ausstellen(benutzer)?;

        let mut versuch = 0;
        let refresh_token = loop {
            versuch += 1;
            let record = RefreshTokenRecord::neu(
                benutzer.id,
                refresh_token_generieren(),
                Utc::now(),
                self.konfig.refresh_token_ttl,
            );
            match self.speicher(self.ledger.create(&record)).await {
                Ok(()) => break record.token,
                Err(AuthError::Datenbank(DbError::Eindeutigkeit(_)))
                    if versuch < MAX_TOKEN_VERSUCHE =>
                {
                    tracing::warn!(versuch, "Kollision beim Refresh-Token-Wert, neuer Versuch");
                }
                Err(e) => return Err(e),
            }
        };

        Ok(TokenPaar {
            access_token,
            refresh_token,
            token_type: "Bearer",
            expires_in: self.aussteller.ttl().num_seconds(),
        })
    }
}
