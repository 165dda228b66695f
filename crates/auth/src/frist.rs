//! Fristen fuer Speicherzugriffe

use std::future::Future;
use std::time::Duration;

use torwache_db::DbResult;

use crate::error::{AuthError, AuthResult};

/// Fuehrt einen Speicherzugriff mit Frist aus
pub(crate) async fn mit_frist<T>(
    frist: Duration,
    zugriff: impl Future<Output = DbResult<T>>,
) -> AuthResult<T> {
    match tokio::time::timeout(frist, zugriff).await {
        Ok(ergebnis) => ergebnis.map_err(AuthError::from),
        Err(_) => {
            tracing::warn!(frist_ms = frist.as_millis() as u64, "Speicherzugriff ueberschreitet Frist");
            Err(AuthError::Zeitlimit)
        }
    }
}

/// Fuehrt CPU-lastige Arbeit (Argon2) ausserhalb der Async-Worker aus
pub(crate) async fn blockierend<T, F>(arbeit: F) -> AuthResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(arbeit)
        .await
        .map_err(|e| AuthError::intern(format!("Hintergrund-Task fehlgeschlagen: {e}")))
}
