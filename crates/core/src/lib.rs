//! torwache-core – Gemeinsame Typen
//!
//! Dieses Crate stellt die geschlossenen Aufzaehlungen bereit, die von
//! Datenbank-, Auth- und Server-Crate gemeinsam genutzt werden.

pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use types::{Berechtigung, BenutzerStatus, Rolle, UserId};
