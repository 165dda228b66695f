//! Passwort-Hashing mit Argon2id
//!
//! Gespeichert wird der PHC-String (Algorithmus, Parameter und Salt in einem Wert),
//! daher bleiben alte Hashes auch nach einer Aenderung der Kosten pruefbar.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::config::HashKosten;
use crate::error::{AuthError, AuthResult};

/// Argon2id-Hasher mit festen Kostenparametern
#[derive(Clone)]
pub struct PasswortHasher {
    argon2: Argon2<'static>,
}

impl PasswortHasher {
    pub fn neu(kosten: &HashKosten) -> AuthResult<Self> {
        let params = Params::new(
            kosten.speicher_kib,
            kosten.iterationen,
            kosten.parallelitaet,
            None, // output_len: Standard (32 Bytes)
        )
        .map_err(|e| AuthError::Konfiguration(format!("Argon2-Parameter ungueltig: {e}")))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hasht ein Passwort mit zufaelligem Salt und gibt den PHC-String zurueck
    pub fn hashen(&self, passwort: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(passwort.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::PasswortHashing(e.to_string()))
    }

    /// Prueft ein Passwort gegen einen gespeicherten Hash.
    ///
    /// Ein nicht lesbarer Hash gilt als "passt nicht".
    pub fn verifizieren(&self, passwort: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(e) => {
                tracing::debug!(fehler = %e, "Gespeicherter Passwort-Hash nicht lesbar");
                return false;
            }
        };
        self.argon2
            .verify_password(passwort.as_bytes(), &parsed)
            .is_ok()
    }
}

impl std::fmt::Debug for PasswortHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswortHasher").finish_non_exhaustive()
    }
}
