//! torwache-auth – Auth- und Berechtigungs-Service
//!
//! Dieses Crate implementiert:
//! - Passwort-Hashing mit Argon2id
//! - Zugriffstokens (kurzlebig, HS256-signiert, zustandslos)
//! - Refresh-Tokens (langlebig, rotierend, im Ledger widerrufbar)
//! - AuthService (Registrierung, Login, Token-Erneuerung, Logout)
//! - Berechtigungskatalog und Autorisierungspruefung
//! - Periodische Bereinigung des Refresh-Token-Ledgers

pub mod access_token;
pub mod config;
pub mod error;
mod frist;
pub mod password;
pub mod permission;
pub mod permission_service;
pub mod refresh_token;
pub mod service;

#[cfg(test)]
pub(crate) mod testhilfe;

// Bequeme Re-Exporte
pub use access_token::{ZugriffsClaims, ZugriffstokenAussteller};
pub use config::{AuthKonfig, HashKosten};
pub use error::{AuthError, AuthResult, FehlerKategorie};
pub use password::PasswortHasher;
pub use permission::{berechtigung_erfordern, hat_berechtigung, BerechtigungsKatalog};
pub use permission_service::PermissionService;
pub use refresh_token::{bereinigung_starten, refresh_token_generieren, BereinigungsKonfig};
pub use service::{AuthService, Registrierung, TokenPaar};
