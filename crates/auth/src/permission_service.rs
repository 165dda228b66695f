//! Permission-Service fuer Torwache
//!
//! Vergibt und entzieht Berechtigungen im Credential Store und beantwortet
//! Autorisierungsfragen fuer Benutzer, die nur per ID bekannt sind.

use std::sync::Arc;
use std::time::Duration;

use torwache_core::{Berechtigung, UserId};
use torwache_db::{models::BenutzerRecord, UserRepository};

use crate::error::{AuthError, AuthResult};
use crate::frist::mit_frist;
use crate::permission::{self, BerechtigungsKatalog};

/// Verwaltung der Benutzer-Berechtigungen
pub struct PermissionService<U: UserRepository> {
    user_repo: Arc<U>,
    katalog: &'static BerechtigungsKatalog,
    speicher_frist: Duration,
}

impl<U: UserRepository> PermissionService<U> {
    pub fn neu(user_repo: Arc<U>, speicher_frist: Duration) -> Self {
        Self {
            user_repo,
            katalog: BerechtigungsKatalog::global(),
            speicher_frist,
        }
    }

    /// Vergibt Berechtigungen per Katalogname.
    ///
    /// Ist ein Name unbekannt, wird nichts geaendert.
    pub async fn erteilen<S: AsRef<str>>(
        &self,
        user_id: UserId,
        namen: &[S],
    ) -> AuthResult<BenutzerRecord> {
        let berechtigungen = self.katalog.namen_aufloesen(namen)?;
        self.benutzer_laden(user_id).await?;

        mit_frist(
            self.speicher_frist,
            self.user_repo.add_permissions(user_id, &berechtigungen),
        )
        .await?;

        tracing::info!(
            user_id = %user_id,
            berechtigungen = ?berechtigungen,
            "Berechtigungen erteilt"
        );
        self.benutzer_laden(user_id).await
    }

    /// Entzieht Berechtigungen per Katalogname
    pub async fn entziehen<S: AsRef<str>>(
        &self,
        user_id: UserId,
        namen: &[S],
    ) -> AuthResult<BenutzerRecord> {
        let berechtigungen = self.katalog.namen_aufloesen(namen)?;
        self.benutzer_laden(user_id).await?;

        mit_frist(
            self.speicher_frist,
            self.user_repo.remove_permissions(user_id, &berechtigungen),
        )
        .await?;

        tracing::info!(
            user_id = %user_id,
            berechtigungen = ?berechtigungen,
            "Berechtigungen entzogen"
        );
        self.benutzer_laden(user_id).await
    }

    /// Prueft eine Berechtigung gegen den aktuellen Stand im Store
    pub async fn hat_berechtigung(
        &self,
        user_id: UserId,
        berechtigung: Berechtigung,
    ) -> AuthResult<bool> {
        let benutzer = self.benutzer_laden(user_id).await?;
        Ok(permission::hat_berechtigung(&benutzer, berechtigung))
    }

    /// Erfordert eine Berechtigung – `ZugriffVerweigert` wenn sie fehlt
    pub async fn berechtigung_erfordern(
        &self,
        user_id: UserId,
        berechtigung: Berechtigung,
    ) -> AuthResult<()> {
        let benutzer = self.benutzer_laden(user_id).await?;
        permission::berechtigung_erfordern(&benutzer, berechtigung)
    }

    /// Laedt einen nicht geloeschten Benutzer
    async fn benutzer_laden(&self, user_id: UserId) -> AuthResult<BenutzerRecord> {
        mit_frist(self.speicher_frist, self.user_repo.get_by_id(user_id))
            .await?
            .filter(|b| !b.ist_geloescht())
            .ok_or_else(|| AuthError::BenutzerNichtGefunden(user_id.to_string()))
    }
}
