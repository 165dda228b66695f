//! SQLite-Backend-Implementierungen fuer alle Repository-Traits

pub mod pool;
pub mod refresh_tokens;
pub mod users;

pub use pool::SqliteDb;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::DbError;
use crate::repository::DbResult;

/// Zeitstempel als TEXT mit fester Breite, damit Vergleiche in SQL
/// lexikografisch korrekt sind
pub(crate) fn zeit_zu_text(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn text_zu_zeit(s: &str, feld: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::intern(format!("Ungueltige {feld} '{s}': {e}")))
}

pub(crate) fn opt_text_zu_zeit(s: Option<String>, feld: &str) -> DbResult<Option<DateTime<Utc>>> {
    s.as_deref().map(|s| text_zu_zeit(s, feld)).transpose()
}
