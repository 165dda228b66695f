//! Berechtigungskatalog und Autorisierungspruefung
//!
//! Der Katalog ist fest und wird einmal beim ersten Zugriff aufgebaut.
//! Danach ist er unveraenderlich und kann ohne Sperren gelesen werden.

use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use std::sync::OnceLock;

use torwache_core::{Berechtigung, Rolle};
use torwache_db::models::BenutzerRecord;

use crate::error::{AuthError, AuthResult};

/// Fester Katalog: gueltige Namen und Standard-Berechtigungen je Rolle
#[derive(Debug)]
pub struct BerechtigungsKatalog {
    standard: HashMap<Rolle, BTreeSet<Berechtigung>>,
}

static KATALOG: OnceLock<BerechtigungsKatalog> = OnceLock::new();

impl BerechtigungsKatalog {
    /// Gemeinsame, einmal aufgebaute Instanz
    pub fn global() -> &'static Self {
        KATALOG.get_or_init(Self::aufbauen)
    }

    fn aufbauen() -> Self {
        let mut standard = HashMap::new();
        standard.insert(Rolle::Admin, Berechtigung::ALLE.into_iter().collect());
        standard.insert(
            Rolle::Manager,
            [
                Berechtigung::ViewAllUsers,
                Berechtigung::ViewReports,
                Berechtigung::ManageSettings,
            ]
            .into_iter()
            .collect(),
        );
        standard.insert(
            Rolle::Standard,
            [Berechtigung::ViewReports].into_iter().collect(),
        );
        Self { standard }
    }

    /// Standard-Berechtigungen fuer eine Rolle (leer fuer unbekannte Rollen)
    pub fn standard_berechtigungen(&self, rolle: Rolle) -> BTreeSet<Berechtigung> {
        self.standard.get(&rolle).cloned().unwrap_or_default()
    }

    /// Prueft ob `name` ein Katalogeintrag ist (exakter Vergleich)
    pub fn ist_gueltiger_name(&self, name: &str) -> bool {
        Berechtigung::from_str(name).is_ok()
    }

    /// Loest Namen in Berechtigungen auf.
    ///
    /// Der erste unbekannte Name fuehrt zu `UngueltigeBerechtigung`.
    pub fn namen_aufloesen<S: AsRef<str>>(&self, namen: &[S]) -> AuthResult<Vec<Berechtigung>> {
        namen
            .iter()
            .map(|n| {
                Berechtigung::from_str(n.as_ref())
                    .map_err(|_| AuthError::UngueltigeBerechtigung(n.as_ref().to_string()))
            })
            .collect()
    }

    /// Alle Eintraege mit Beschreibung, in Katalogreihenfolge
    pub fn eintraege(&self) -> impl Iterator<Item = (Berechtigung, &'static str)> {
        Berechtigung::ALLE.into_iter().map(|b| (b, b.beschreibung()))
    }
}

/// Reine Mengenpruefung auf dem geladenen Benutzer
pub fn hat_berechtigung(benutzer: &BenutzerRecord, berechtigung: Berechtigung) -> bool {
    benutzer.berechtigungen.contains(&berechtigung)
}

/// Wie [`hat_berechtigung`], aber mit `ZugriffVerweigert` bei fehlender Berechtigung
pub fn berechtigung_erfordern(
    benutzer: &BenutzerRecord,
    berechtigung: Berechtigung,
) -> AuthResult<()> {
    if hat_berechtigung(benutzer, berechtigung) {
        Ok(())
    } else {
        tracing::debug!(
            user_id = %benutzer.id,
            berechtigung = %berechtigung,
            "Berechtigung fehlt"
        );
        Err(AuthError::ZugriffVerweigert(berechtigung.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testhilfe::benutzer_mit;

    #[test]
    fn admin_hat_alle_berechtigungen() {
        let k = BerechtigungsKatalog::global();
        let admin = k.standard_berechtigungen(Rolle::Admin);
        assert_eq!(admin.len(), Berechtigung::ALLE.len());
    }

    #[test]
    fn manager_und_standard() {
        let k = BerechtigungsKatalog::global();
        assert_eq!(
            k.standard_berechtigungen(Rolle::Manager),
            BTreeSet::from([
                Berechtigung::ViewAllUsers,
                Berechtigung::ViewReports,
                Berechtigung::ManageSettings,
            ])
        );
        assert_eq!(
            k.standard_berechtigungen(Rolle::Standard),
            BTreeSet::from([Berechtigung::ViewReports])
        );
    }

    #[test]
    fn katalog_ist_teilmenge_fuer_jede_rolle() {
        let k = BerechtigungsKatalog::global();
        for rolle in Rolle::ALLE {
            for b in k.standard_berechtigungen(rolle) {
                assert!(k.ist_gueltiger_name(b.als_str()));
            }
        }
    }

    #[test]
    fn namenspruefung_exakt() {
        let k = BerechtigungsKatalog::global();
        assert!(k.ist_gueltiger_name("MANAGE_ROLES"));
        assert!(!k.ist_gueltiger_name("manage_roles"));
        assert!(!k.ist_gueltiger_name(""));
        assert!(!k.ist_gueltiger_name("FLY"));
    }

    #[test]
    fn namen_aufloesen_meldet_unbekannten_namen() {
        let k = BerechtigungsKatalog::global();
        let ok = k.namen_aufloesen(&["VIEW_REPORTS", "DELETE_USER"]).unwrap();
        assert_eq!(ok, vec![Berechtigung::ViewReports, Berechtigung::DeleteUser]);

        match k.namen_aufloesen(&["VIEW_REPORTS", "FLY"]) {
            Err(AuthError::UngueltigeBerechtigung(name)) => assert_eq!(name, "FLY"),
            other => panic!("unerwartet: {other:?}"),
        }
    }

    #[test]
    fn pruefung_auf_geladenem_benutzer() {
        let b = benutzer_mit([Berechtigung::ViewReports]);
        assert!(hat_berechtigung(&b, Berechtigung::ViewReports));
        assert!(!hat_berechtigung(&b, Berechtigung::DeleteUser));
        assert!(berechtigung_erfordern(&b, Berechtigung::ViewReports).is_ok());
        assert!(matches!(
            berechtigung_erfordern(&b, Berechtigung::DeleteUser),
            Err(AuthError::ZugriffVerweigert(name)) if name == "DELETE_USER"
        ));
    }

    #[test]
    fn katalog_eintraege_haben_beschreibung() {
        let k = BerechtigungsKatalog::global();
        assert_eq!(k.eintraege().count(), 7);
        assert!(k.eintraege().all(|(_, text)| !text.is_empty()));
    }
}
