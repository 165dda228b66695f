//! SQLite-Implementierung des UserRepository

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::Utc;
use sqlx::Row as _;

use torwache_core::{Berechtigung, BenutzerStatus, Rolle, UserId};

use crate::error::{ist_unique_verletzung, DbError};
use crate::models::{BenutzerRecord, BenutzerUpdate, EinstellungenRecord, NeuerBenutzer};
use crate::repository::{DbResult, UserRepository};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::{text_zu_zeit, zeit_zu_text};

const BENUTZER_SPALTEN: &str =
    "id, name, email, password_hash, role, is_active, status, created_at, updated_at";

impl UserRepository for SqliteDb {
    async fn create(&self, data: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord> {
        let id = UserId::new();
        let id_str = id.to_string();
        let now = Utc::now();
        let now_str = zeit_zu_text(&now);

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, role, is_active, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, 1, ?, ?, ?)",
        )
        .bind(&id_str)
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.rolle.als_str())
        .bind(BenutzerStatus::Aktiv.als_str())
        .bind(&now_str)
        .bind(&now_str)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if ist_unique_verletzung(&e) {
                DbError::Eindeutigkeit(format!("E-Mail '{}' bereits vergeben", data.email))
            } else {
                DbError::Sqlx(e)
            }
        })?;

        for berechtigung in data.berechtigungen {
            sqlx::query("INSERT INTO user_permissions (user_id, permission) VALUES (?, ?)")
                .bind(&id_str)
                .bind(berechtigung.als_str())
                .execute(&mut *tx)
                .await?;
        }

        einstellungen_schreiben(&mut tx, &id_str, &data.einstellungen, &now_str).await?;

        tx.commit().await?;

        Ok(BenutzerRecord {
            id,
            name: data.name.to_string(),
            email: data.email.to_string(),
            password_hash: data.password_hash.to_string(),
            rolle: data.rolle,
            is_active: true,
            status: BenutzerStatus::Aktiv,
            berechtigungen: data.berechtigungen.clone(),
            einstellungen: Some(data.einstellungen),
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: UserId) -> DbResult<Option<BenutzerRecord>> {
        let sql = format!("SELECT {BENUTZER_SPALTEN} FROM users WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(self.benutzer_vervollstaendigen(&r).await?)),
            None => Ok(None),
        }
    }

    async fn get_by_email(&self, email: &str) -> DbResult<Option<BenutzerRecord>> {
        let sql = format!("SELECT {BENUTZER_SPALTEN} FROM users WHERE email = ? AND status = ?");
        let row = sqlx::query(&sql)
            .bind(email)
            .bind(BenutzerStatus::Aktiv.als_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(self.benutzer_vervollstaendigen(&r).await?)),
            None => Ok(None),
        }
    }

    async fn update(&self, id: UserId, data: BenutzerUpdate) -> DbResult<BenutzerRecord> {
        // Dynamisches UPDATE – nur gesetzte Felder aendern
        let mut sets: Vec<&str> = Vec::new();
        if data.name.is_some() {
            sets.push("name = ?");
        }
        if data.email.is_some() {
            sets.push("email = ?");
        }
        if data.password_hash.is_some() {
            sets.push("password_hash = ?");
        }
        if data.rolle.is_some() {
            sets.push("role = ?");
        }
        if data.is_active.is_some() {
            sets.push("is_active = ?");
        }

        if sets.is_empty() {
            return self
                .get_by_id(id)
                .await?
                .ok_or_else(|| DbError::nicht_gefunden(format!("User {id}")));
        }
        sets.push("updated_at = ?");

        let sql = format!("UPDATE users SET {} WHERE id = ?", sets.join(", "));
        let mut q = sqlx::query(&sql);

        if let Some(ref v) = data.name {
            q = q.bind(v);
        }
        if let Some(ref v) = data.email {
            q = q.bind(v);
        }
        if let Some(ref v) = data.password_hash {
            q = q.bind(v);
        }
        if let Some(v) = data.rolle {
            q = q.bind(v.als_str());
        }
        if let Some(v) = data.is_active {
            q = q.bind(v as i64);
        }
        q = q.bind(zeit_zu_text(&Utc::now()));
        q = q.bind(id.to_string());

        let affected = q
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if ist_unique_verletzung(&e) {
                    DbError::Eindeutigkeit("E-Mail bereits vergeben".into())
                } else {
                    DbError::Sqlx(e)
                }
            })?
            .rows_affected();
        if affected == 0 {
            return Err(DbError::nicht_gefunden(format!("User {id}")));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::intern("User nach Update nicht gefunden"))
    }

    async fn soft_delete(&self, id: UserId) -> DbResult<bool> {
        // Weicher Loeschvorgang: Status-Tag statt Entfernen der Zeile
        let affected = sqlx::query(
            "UPDATE users SET status = ?, is_active = 0, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(BenutzerStatus::Geloescht.als_str())
        .bind(zeit_zu_text(&Utc::now()))
        .bind(id.to_string())
        .bind(BenutzerStatus::Aktiv.als_str())
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(affected > 0)
    }

    async fn add_permissions(&self, id: UserId, berechtigungen: &[Berechtigung]) -> DbResult<()> {
        let id_str = id.to_string();
        let mut tx = self.pool.begin().await?;

        benutzer_muss_existieren(&mut tx, &id_str).await?;

        for berechtigung in berechtigungen {
            sqlx::query("INSERT OR IGNORE INTO user_permissions (user_id, permission) VALUES (?, ?)")
                .bind(&id_str)
                .bind(berechtigung.als_str())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn remove_permissions(&self, id: UserId, berechtigungen: &[Berechtigung]) -> DbResult<()> {
        let id_str = id.to_string();
        let mut tx = self.pool.begin().await?;

        benutzer_muss_existieren(&mut tx, &id_str).await?;

        for berechtigung in berechtigungen {
            sqlx::query("DELETE FROM user_permissions WHERE user_id = ? AND permission = ?")
                .bind(&id_str)
                .bind(berechtigung.als_str())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn update_settings(&self, id: UserId, einstellungen: &EinstellungenRecord) -> DbResult<()> {
        let id_str = id.to_string();
        let now_str = zeit_zu_text(&Utc::now());
        let mut tx = self.pool.begin().await?;

        benutzer_muss_existieren(&mut tx, &id_str).await?;
        einstellungen_schreiben(&mut tx, &id_str, einstellungen, &now_str).await?;

        tx.commit().await?;
        Ok(())
    }
}

impl SqliteDb {
    /// Laedt Berechtigungen und Einstellungen zur Benutzer-Zeile nach
    async fn benutzer_vervollstaendigen(
        &self,
        row: &sqlx::sqlite::SqliteRow,
    ) -> DbResult<BenutzerRecord> {
        let mut benutzer = row_to_benutzer(row)?;
        let id_str = benutzer.id.to_string();

        let perm_rows = sqlx::query("SELECT permission FROM user_permissions WHERE user_id = ?")
            .bind(&id_str)
            .fetch_all(&self.pool)
            .await?;
        for r in &perm_rows {
            let name: String = r.try_get("permission")?;
            let berechtigung = Berechtigung::from_str(&name).map_err(DbError::UngueltigeDaten)?;
            benutzer.berechtigungen.insert(berechtigung);
        }

        let settings_row = sqlx::query(
            "SELECT theme, language, notifications_enabled, currency, date_format
             FROM user_settings WHERE user_id = ?",
        )
        .bind(&id_str)
        .fetch_optional(&self.pool)
        .await?;

        benutzer.einstellungen = settings_row
            .map(|r| -> DbResult<EinstellungenRecord> {
                let notifications: i64 = r.try_get("notifications_enabled")?;
                Ok(EinstellungenRecord {
                    theme: r.try_get("theme")?,
                    language: r.try_get("language")?,
                    notifications_enabled: notifications != 0,
                    currency: r.try_get("currency")?,
                    date_format: r.try_get("date_format")?,
                })
            })
            .transpose()?;

        Ok(benutzer)
    }
}

async fn benutzer_muss_existieren(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    id_str: &str,
) -> DbResult<()> {
    let vorhanden = sqlx::query("SELECT 1 FROM users WHERE id = ?")
        .bind(id_str)
        .fetch_optional(&mut **tx)
        .await?;
    match vorhanden {
        Some(_) => Ok(()),
        None => Err(DbError::nicht_gefunden(format!("User {id_str}"))),
    }
}

async fn einstellungen_schreiben(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    id_str: &str,
    e: &EinstellungenRecord,
    now_str: &str,
) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO user_settings
           (user_id, theme, language, notifications_enabled, currency, date_format, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(user_id) DO UPDATE SET
           theme = excluded.theme,
           language = excluded.language,
           notifications_enabled = excluded.notifications_enabled,
           currency = excluded.currency,
           date_format = excluded.date_format,
           updated_at = excluded.updated_at",
    )
    .bind(id_str)
    .bind(&e.theme)
    .bind(&e.language)
    .bind(e.notifications_enabled as i64)
    .bind(&e.currency)
    .bind(&e.date_format)
    .bind(now_str)
    .bind(now_str)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

fn row_to_benutzer(row: &sqlx::sqlite::SqliteRow) -> DbResult<BenutzerRecord> {
    let id_str: String = row.try_get("id")?;
    let id = UserId::from_str(&id_str).map_err(DbError::intern)?;

    let rolle_str: String = row.try_get("role")?;
    let rolle = Rolle::from_str(&rolle_str).map_err(DbError::UngueltigeDaten)?;

    let status_str: String = row.try_get("status")?;
    let status = BenutzerStatus::from_str(&status_str).map_err(DbError::UngueltigeDaten)?;

    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    let is_active: i64 = row.try_get("is_active")?;

    Ok(BenutzerRecord {
        id,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        rolle,
        is_active: is_active != 0,
        status,
        berechtigungen: BTreeSet::new(),
        einstellungen: None,
        created_at: text_zu_zeit(&created_at, "created_at")?,
        updated_at: text_zu_zeit(&updated_at, "updated_at")?,
    })
}
