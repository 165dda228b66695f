//! SQLite-Implementierung des Refresh-Token-Ledgers
//!
//! Widerruf laeuft immer als einzelnes bedingtes UPDATE (`AND revoked = 0`),
//! damit bei konkurrierenden Aufrufen hoechstens einer die Zeile umschaltet.

use std::str::FromStr;

use chrono::Utc;
use sqlx::Row as _;
use uuid::Uuid;

use torwache_core::UserId;

use crate::error::{ist_unique_verletzung, DbError};
use crate::models::RefreshTokenRecord;
use crate::repository::{DbResult, RefreshTokenRepository};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::{opt_text_zu_zeit, text_zu_zeit, zeit_zu_text};

impl RefreshTokenRepository for SqliteDb {
    async fn create(&self, token: &RefreshTokenRecord) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO refresh_tokens
               (id, user_id, token, expires_at, revoked, revoked_at, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(token.id.to_string())
        .bind(token.user_id.to_string())
        .bind(&token.token)
        .bind(zeit_zu_text(&token.expires_at))
        .bind(token.revoked as i64)
        .bind(token.revoked_at.as_ref().map(zeit_zu_text))
        .bind(zeit_zu_text(&token.created_at))
        .bind(zeit_zu_text(&token.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if ist_unique_verletzung(&e) {
                DbError::Eindeutigkeit("Refresh-Token-Wert bereits vorhanden".into())
            } else {
                DbError::Sqlx(e)
            }
        })?;

        tracing::debug!(user_id = %token.user_id, token_id = %token.id, "Refresh-Token gespeichert");
        Ok(())
    }

    async fn get_by_token(&self, token: &str) -> DbResult<Option<RefreshTokenRecord>> {
        let row = sqlx::query(
            "SELECT id, user_id, token, expires_at, revoked, revoked_at, created_at, updated_at
             FROM refresh_tokens WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_refresh_token(&r)).transpose()
    }

    async fn revoke_token(&self, token: &str) -> DbResult<()> {
        let now_str = zeit_zu_text(&Utc::now());
        let affected = sqlx::query(
            "UPDATE refresh_tokens SET revoked = 1, revoked_at = ?, updated_at = ?
             WHERE token = ? AND revoked = 0",
        )
        .bind(&now_str)
        .bind(&now_str)
        .bind(token)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(DbError::nicht_gefunden("Nicht widerrufenes Refresh-Token"));
        }
        Ok(())
    }

    async fn revoke_by_user(&self, user_id: UserId) -> DbResult<u64> {
        let now_str = zeit_zu_text(&Utc::now());
        let affected = sqlx::query(
            "UPDATE refresh_tokens SET revoked = 1, revoked_at = ?, updated_at = ?
             WHERE user_id = ? AND revoked = 0",
        )
        .bind(&now_str)
        .bind(&now_str)
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(DbError::nicht_gefunden(format!(
                "Keine aktiven Refresh-Tokens fuer User {user_id}"
            )));
        }
        Ok(affected)
    }

    async fn purge_expired(&self, aufbewahrung: chrono::Duration) -> DbResult<u64> {
        let jetzt = Utc::now();
        let grenze = jetzt - aufbewahrung;

        let affected = sqlx::query(
            "DELETE FROM refresh_tokens
             WHERE expires_at <= ? OR (revoked = 1 AND revoked_at < ?)",
        )
        .bind(zeit_zu_text(&jetzt))
        .bind(zeit_zu_text(&grenze))
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(affected)
    }
}

fn row_to_refresh_token(row: &sqlx::sqlite::SqliteRow) -> DbResult<RefreshTokenRecord> {
    let id_str: String = row.try_get("id")?;
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| DbError::intern(format!("Ungueltige UUID '{id_str}': {e}")))?;

    let user_id_str: String = row.try_get("user_id")?;
    let user_id = UserId::from_str(&user_id_str).map_err(DbError::intern)?;

    let expires_at: String = row.try_get("expires_at")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    let revoked: i64 = row.try_get("revoked")?;

    Ok(RefreshTokenRecord {
        id,
        user_id,
        token: row.try_get("token")?,
        expires_at: text_zu_zeit(&expires_at, "expires_at")?,
        revoked: revoked != 0,
        revoked_at: opt_text_zu_zeit(row.try_get("revoked_at")?, "revoked_at")?,
        created_at: text_zu_zeit(&created_at, "created_at")?,
        updated_at: text_zu_zeit(&updated_at, "updated_at")?,
    })
}
