//! In-Memory-Repositories und Hilfsfunktionen fuer Tests

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;

use torwache_core::{Berechtigung, BenutzerStatus, Rolle, UserId};
use torwache_db::models::{
    BenutzerRecord, BenutzerUpdate, EinstellungenRecord, NeuerBenutzer, RefreshTokenRecord,
};
use torwache_db::{DbError, DbResult, RefreshTokenRepository, UserRepository};

use crate::config::{AuthKonfig, HashKosten};

pub(crate) const TEST_GEHEIMNIS: &str = "test-geheimnis-mit-ausreichender-laenge-0123456789";

pub(crate) fn test_konfig() -> AuthKonfig {
    AuthKonfig {
        hash_kosten: HashKosten::niedrig(),
        ..AuthKonfig::neu(TEST_GEHEIMNIS)
    }
}

pub(crate) fn benutzer_mit(
    berechtigungen: impl IntoIterator<Item = Berechtigung>,
) -> BenutzerRecord {
    let jetzt = Utc::now();
    BenutzerRecord {
        id: UserId::new(),
        name: "Test".into(),
        email: "test@example.com".into(),
        password_hash: String::new(),
        rolle: Rolle::Standard,
        is_active: true,
        status: BenutzerStatus::Aktiv,
        berechtigungen: berechtigungen.into_iter().collect(),
        einstellungen: None,
        created_at: jetzt,
        updated_at: jetzt,
    }
}

// ---------------------------------------------------------------------------
// Benutzer
// ---------------------------------------------------------------------------

#[derive(Default)]
pub(crate) struct TestUserRepo {
    pub benutzer: Mutex<HashMap<UserId, BenutzerRecord>>,
}

impl TestUserRepo {
    fn mit_benutzer<T>(
        &self,
        id: UserId,
        f: impl FnOnce(&mut BenutzerRecord) -> T,
    ) -> DbResult<T> {
        let mut map = self.benutzer.lock().unwrap();
        map.get_mut(&id)
            .map(f)
            .ok_or_else(|| DbError::nicht_gefunden(format!("User {id}")))
    }
}

impl UserRepository for TestUserRepo {
    async fn create(&self, data: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord> {
        let mut map = self.benutzer.lock().unwrap();
        if map.values().any(|b| b.email == data.email) {
            return Err(DbError::Eindeutigkeit(format!(
                "E-Mail '{}' bereits vergeben",
                data.email
            )));
        }
        let jetzt = Utc::now();
        let record = BenutzerRecord {
            id: UserId::new(),
            name: data.name.to_string(),
            email: data.email.to_string(),
            password_hash: data.password_hash.to_string(),
            rolle: data.rolle,
            is_active: true,
            status: BenutzerStatus::Aktiv,
            berechtigungen: data.berechtigungen.clone(),
            einstellungen: Some(data.einstellungen),
            created_at: jetzt,
            updated_at: jetzt,
        };
        map.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_by_id(&self, id: UserId) -> DbResult<Option<BenutzerRecord>> {
        Ok(self.benutzer.lock().unwrap().get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> DbResult<Option<BenutzerRecord>> {
        Ok(self
            .benutzer
            .lock()
            .unwrap()
            .values()
            .find(|b| b.email == email && !b.ist_geloescht())
            .cloned())
    }

    async fn update(&self, id: UserId, data: BenutzerUpdate) -> DbResult<BenutzerRecord> {
        self.mit_benutzer(id, |b| {
            if let Some(v) = data.name {
                b.name = v;
            }
            if let Some(v) = data.email {
                b.email = v;
            }
            if let Some(v) = data.password_hash {
                b.password_hash = v;
            }
            if let Some(v) = data.rolle {
                b.rolle = v;
            }
            if let Some(v) = data.is_active {
                b.is_active = v;
            }
            b.updated_at = Utc::now();
            b.clone()
        })
    }

    async fn soft_delete(&self, id: UserId) -> DbResult<bool> {
        let mut map = self.benutzer.lock().unwrap();
        match map.get_mut(&id) {
            Some(b) if !b.ist_geloescht() => {
                b.status = BenutzerStatus::Geloescht;
                b.is_active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn add_permissions(&self, id: UserId, berechtigungen: &[Berechtigung]) -> DbResult<()> {
        self.mit_benutzer(id, |b| b.berechtigungen.extend(berechtigungen.iter().copied()))
    }

    async fn remove_permissions(&self, id: UserId, berechtigungen: &[Berechtigung]) -> DbResult<()> {
        self.mit_benutzer(id, |b| {
            for p in berechtigungen {
                b.berechtigungen.remove(p);
            }
        })
    }

    async fn update_settings(&self, id: UserId, einstellungen: &EinstellungenRecord) -> DbResult<()> {
        self.mit_benutzer(id, |b| b.einstellungen = Some(einstellungen.clone()))
    }
}

// ---------------------------------------------------------------------------
// Refresh-Token-Ledger
// ---------------------------------------------------------------------------

#[derive(Default)]
pub(crate) struct TestLedger {
    pub tokens: Mutex<HashMap<String, RefreshTokenRecord>>,
    /// Jeder Zugriff wartet vorher so lange
    pub verzoegerung: Mutex<Option<Duration>>,
    pub purge_aufrufe: AtomicU64,
    pub purge_fehlschlagen: AtomicBool,
}

impl TestLedger {
    pub fn einfuegen(&self, record: RefreshTokenRecord) {
        self.tokens
            .lock()
            .unwrap()
            .insert(record.token.clone(), record);
    }

    pub fn aktive_fuer(&self, user_id: UserId) -> Vec<RefreshTokenRecord> {
        self.tokens
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.user_id == user_id && !t.revoked)
            .cloned()
            .collect()
    }

    pub fn alle_fuer(&self, user_id: UserId) -> BTreeSet<String> {
        self.tokens
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.user_id == user_id)
            .map(|t| t.token.clone())
            .collect()
    }

    async fn warten(&self) {
        let verzoegerung = *self.verzoegerung.lock().unwrap();
        if let Some(d) = verzoegerung {
            tokio::time::sleep(d).await;
        }
    }
}

impl RefreshTokenRepository for TestLedger {
    async fn create(&self, token: &RefreshTokenRecord) -> DbResult<()> {
        self.warten().await;
        let mut map = self.tokens.lock().unwrap();
        if map.contains_key(&token.token) {
            return Err(DbError::Eindeutigkeit("Refresh-Token-Wert bereits vorhanden".into()));
        }
        map.insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn get_by_token(&self, token: &str) -> DbResult<Option<RefreshTokenRecord>> {
        self.warten().await;
        Ok(self.tokens.lock().unwrap().get(token).cloned())
    }

    async fn revoke_token(&self, token: &str) -> DbResult<()> {
        self.warten().await;
        let mut map = self.tokens.lock().unwrap();
        match map.get_mut(token) {
            Some(t) if !t.revoked => {
                let jetzt = Utc::now();
                t.revoked = true;
                t.revoked_at = Some(jetzt);
                t.updated_at = jetzt;
                Ok(())
            }
            _ => Err(DbError::nicht_gefunden("Nicht widerrufenes Refresh-Token")),
        }
    }

    async fn revoke_by_user(&self, user_id: UserId) -> DbResult<u64> {
        self.warten().await;
        let jetzt = Utc::now();
        let mut anzahl = 0;
        for t in self.tokens.lock().unwrap().values_mut() {
            if t.user_id == user_id && !t.revoked {
                t.revoked = true;
                t.revoked_at = Some(jetzt);
                anzahl += 1;
            }
        }
        if anzahl == 0 {
            return Err(DbError::nicht_gefunden("Keine aktiven Refresh-Tokens"));
        }
        Ok(anzahl)
    }

    async fn purge_expired(&self, aufbewahrung: chrono::Duration) -> DbResult<u64> {
        self.purge_aufrufe.fetch_add(1, Ordering::SeqCst);
        self.warten().await;
        if self.purge_fehlschlagen.load(Ordering::SeqCst) {
            return Err(DbError::intern("Speicher nicht erreichbar"));
        }
        let jetzt = Utc::now();
        let mut map = self.tokens.lock().unwrap();
        let vorher = map.len();
        map.retain(|_, t| {
            let abgelaufen = t.ist_abgelaufen(jetzt);
            let alt_widerrufen = t
                .revoked_at
                .map(|w| t.revoked && w < jetzt - aufbewahrung)
                .unwrap_or(false);
            !abgelaufen && !alt_widerrufen
        });
        Ok((vorher - map.len()) as u64)
    }
}
