//! Repository-Trait-Definitionen
//!
//! Das Repository-Pattern entkoppelt die Geschaeftslogik von der konkreten
//! Datenbank-Implementierung. Alle Futures sind `Send`, damit Services die
//! Repositories aus beliebigen Tokio-Tasks heraus nutzen koennen.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;

use torwache_core::{Berechtigung, UserId};

use crate::error::DbError;
use crate::models::{
    BenutzerRecord, BenutzerUpdate, EinstellungenRecord, NeuerBenutzer, RefreshTokenRecord,
};

/// Result-Alias fuer Datenbankoperationen
pub type DbResult<T> = Result<T, DbError>;

/// Konfiguration fuer die Datenbankverbindung
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Verbindungs-URL (z.B. "sqlite://torwache.db")
    pub url: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
    /// Ob WAL-Modus bei SQLite aktiviert werden soll
    pub sqlite_wal: bool,
    /// Maximale Wartezeit auf eine freie Verbindung
    pub verbindungs_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://torwache.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
            verbindungs_timeout: Duration::from_secs(5),
        }
    }
}

/// Repository fuer Benutzer-Datenzugriffe (Credential Store)
///
/// Geladene Benutzer enthalten immer ihre Berechtigungen und Einstellungen.
pub trait UserRepository: Send + Sync {
    /// Legt Benutzer, Berechtigungen und Einstellungen in einer Transaktion an
    fn create(
        &self,
        data: NeuerBenutzer<'_>,
    ) -> impl Future<Output = DbResult<BenutzerRecord>> + Send;

    /// Laedt einen Benutzer anhand seiner ID (auch weich geloeschte)
    fn get_by_id(&self, id: UserId) -> impl Future<Output = DbResult<Option<BenutzerRecord>>> + Send;

    /// Laedt einen nicht geloeschten Benutzer anhand seiner E-Mail
    fn get_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = DbResult<Option<BenutzerRecord>>> + Send;

    /// Aendert die gesetzten Felder
    fn update(
        &self,
        id: UserId,
        data: BenutzerUpdate,
    ) -> impl Future<Output = DbResult<BenutzerRecord>> + Send;

    /// Markiert den Benutzer als geloescht
    fn soft_delete(&self, id: UserId) -> impl Future<Output = DbResult<bool>> + Send;

    /// Fuegt Berechtigungen hinzu (bereits vorhandene werden ignoriert)
    fn add_permissions(
        &self,
        id: UserId,
        berechtigungen: &[Berechtigung],
    ) -> impl Future<Output = DbResult<()>> + Send;

    /// Entfernt Berechtigungen
    fn remove_permissions(
        &self,
        id: UserId,
        berechtigungen: &[Berechtigung],
    ) -> impl Future<Output = DbResult<()>> + Send;

    /// Legt die Einstellungen an oder ueberschreibt sie
    fn update_settings(
        &self,
        id: UserId,
        einstellungen: &EinstellungenRecord,
    ) -> impl Future<Output = DbResult<()>> + Send;
}

/// Persistentes Ledger der ausgegebenen Refresh-Tokens
pub trait RefreshTokenRepository: Send + Sync {
    /// Fuegt einen neuen Datensatz ein.
    ///
    /// Gibt `DbError::Eindeutigkeit` zurueck wenn der Token-Wert bereits existiert.
    fn create(&self, token: &RefreshTokenRecord) -> impl Future<Output = DbResult<()>> + Send;

    /// Laedt einen Datensatz unabhaengig von Ablauf und Widerruf
    fn get_by_token(
        &self,
        token: &str,
    ) -> impl Future<Output = DbResult<Option<RefreshTokenRecord>>> + Send;

    /// Laedt einen Datensatz nur wenn er nutzbar ist.
    ///
    /// Fehler: `NichtGefunden`, `TokenAbgelaufen` (hat Vorrang) oder `TokenWiderrufen`.
    fn get_valid(&self, token: &str) -> impl Future<Output = DbResult<RefreshTokenRecord>> + Send {
        async move {
            let record = self
                .get_by_token(token)
                .await?
                .ok_or_else(|| DbError::nicht_gefunden("Refresh-Token"))?;
            record.gueltigkeit_pruefen(Utc::now())?;
            Ok(record)
        }
    }

    /// Widerruft genau dieses Token mit einem einzigen bedingten UPDATE.
    ///
    /// Gibt `NichtGefunden` zurueck wenn keine nicht-widerrufene Zeile passt.
    /// Bei gleichzeitigen Aufrufen gewinnt hoechstens einer.
    fn revoke_token(&self, token: &str) -> impl Future<Output = DbResult<()>> + Send;

    /// Widerruft alle nicht-widerrufenen Tokens eines Benutzers.
    ///
    /// Gibt die Anzahl zurueck, `NichtGefunden` wenn keine Zeile betroffen war.
    fn revoke_by_user(&self, user_id: UserId) -> impl Future<Output = DbResult<u64>> + Send;

    /// Loescht abgelaufene Tokens und solche, die laenger als `aufbewahrung`
    /// widerrufen sind. Gibt die Anzahl geloeschter Zeilen zurueck.
    fn purge_expired(
        &self,
        aufbewahrung: chrono::Duration,
    ) -> impl Future<Output = DbResult<u64>> + Send;
}
