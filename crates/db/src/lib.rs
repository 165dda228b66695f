//! torwache-db – Datenbank-Abstraktion
//!
//! Dieses Crate stellt das Repository-Pattern fuer den Benutzer-Store und das
//! Refresh-Token-Ledger bereit. Die Geschaeftslogik arbeitet nur gegen die
//! Traits in [`repository`], die SQLite-Implementierung liegt in [`sqlite`].

pub mod error;
pub mod models;
pub mod repository;
pub mod sqlite;

pub use error::DbError;
pub use repository::{DatabaseConfig, DbResult, RefreshTokenRepository, UserRepository};
pub use sqlite::SqliteDb;
