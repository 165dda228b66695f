//! Integration-Tests fuer UserRepository (In-Memory SQLite)

use std::collections::BTreeSet;

use torwache_core::{Berechtigung, BenutzerStatus, Rolle, UserId};
use torwache_db::{
    models::{BenutzerUpdate, EinstellungenRecord, NeuerBenutzer},
    SqliteDb, UserRepository,
};

async fn db() -> SqliteDb {
    SqliteDb::in_memory()
        .await
        .expect("In-Memory DB konnte nicht erstellt werden")
}

fn neuer<'a>(email: &'a str, berechtigungen: &'a BTreeSet<Berechtigung>) -> NeuerBenutzer<'a> {
    NeuerBenutzer {
        name: "Testperson",
        email,
        password_hash: "hash",
        rolle: Rolle::Standard,
        berechtigungen,
        einstellungen: EinstellungenRecord::default(),
    }
}

#[tokio::test]
async fn benutzer_erstellen_und_laden() {
    let db = db().await;
    let perms = BTreeSet::from([Berechtigung::ViewReports]);

    let user = UserRepository::create(&db, neuer("alice@example.com", &perms))
        .await
        .expect("Benutzer erstellen fehlgeschlagen");

    assert_eq!(user.email, "alice@example.com");
    assert!(user.is_active);
    assert_eq!(user.status, BenutzerStatus::Aktiv);

    let geladen = UserRepository::get_by_id(&db, user.id)
        .await
        .expect("get_by_id fehlgeschlagen")
        .expect("Benutzer sollte gefunden werden");

    assert_eq!(geladen.id, user.id);
    assert_eq!(geladen.rolle, Rolle::Standard);
    assert_eq!(geladen.berechtigungen, perms);
    assert_eq!(geladen.einstellungen, Some(EinstellungenRecord::default()));
}

#[tokio::test]
async fn benutzer_nach_email_laden() {
    let db = db().await;
    let perms = BTreeSet::new();

    UserRepository::create(&db, neuer("bob@example.com", &perms))
        .await
        .unwrap();

    let gefunden = UserRepository::get_by_email(&db, "bob@example.com")
        .await
        .unwrap()
        .expect("Benutzer 'bob' sollte gefunden werden");
    assert_eq!(gefunden.email, "bob@example.com");

    // E-Mail wird exakt verglichen
    let anders = UserRepository::get_by_email(&db, "BOB@example.com").await.unwrap();
    assert!(anders.is_none());

    let unbekannt = UserRepository::get_by_email(&db, "niemand@example.com").await.unwrap();
    assert!(unbekannt.is_none());
}

#[tokio::test]
async fn email_ist_eindeutig() {
    let db = db().await;
    let perms = BTreeSet::new();

    UserRepository::create(&db, neuer("charlie@example.com", &perms))
        .await
        .unwrap();

    let err = UserRepository::create(&db, neuer("charlie@example.com", &perms)).await;
    assert!(err.is_err());
    assert!(err.unwrap_err().ist_eindeutigkeit());
}

#[tokio::test]
async fn benutzer_aktualisieren() {
    let db = db().await;
    let perms = BTreeSet::new();
    let user = UserRepository::create(&db, neuer("dave@example.com", &perms))
        .await
        .unwrap();

    let aktualisiert = UserRepository::update(
        &db,
        user.id,
        BenutzerUpdate {
            password_hash: Some("neues_hash".into()),
            rolle: Some(Rolle::Manager),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(aktualisiert.password_hash, "neues_hash");
    assert_eq!(aktualisiert.rolle, Rolle::Manager);
    assert_eq!(aktualisiert.email, "dave@example.com");
}

#[tokio::test]
async fn unbekannten_benutzer_aktualisieren_schlaegt_fehl() {
    let db = db().await;
    let err = UserRepository::update(
        &db,
        UserId::new(),
        BenutzerUpdate {
            name: Some("x".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(err.ist_nicht_gefunden());
}

#[tokio::test]
async fn benutzer_loeschen_weich() {
    let db = db().await;
    let perms = BTreeSet::new();
    let user = UserRepository::create(&db, neuer("eve@example.com", &perms))
        .await
        .unwrap();

    assert!(UserRepository::soft_delete(&db, user.id).await.unwrap());
    // Zweites Loeschen aendert nichts mehr
    assert!(!UserRepository::soft_delete(&db, user.id).await.unwrap());

    // Per ID noch vorhanden, aber als geloescht markiert
    let geladen = UserRepository::get_by_id(&db, user.id).await.unwrap().unwrap();
    assert_eq!(geladen.status, BenutzerStatus::Geloescht);
    assert!(geladen.ist_geloescht());

    // Per E-Mail nicht mehr auffindbar
    let per_email = UserRepository::get_by_email(&db, "eve@example.com").await.unwrap();
    assert!(per_email.is_none());
}

#[tokio::test]
async fn berechtigungen_hinzufuegen_und_entfernen() {
    let db = db().await;
    let perms = BTreeSet::from([Berechtigung::ViewReports]);
    let user = UserRepository::create(&db, neuer("frank@example.com", &perms))
        .await
        .unwrap();

    UserRepository::add_permissions(
        &db,
        user.id,
        &[Berechtigung::ManageRoles, Berechtigung::ViewReports],
    )
    .await
    .unwrap();

    let geladen = UserRepository::get_by_id(&db, user.id).await.unwrap().unwrap();
    assert_eq!(
        geladen.berechtigungen,
        BTreeSet::from([Berechtigung::ManageRoles, Berechtigung::ViewReports])
    );

    UserRepository::remove_permissions(&db, user.id, &[Berechtigung::ViewReports])
        .await
        .unwrap();

    let geladen = UserRepository::get_by_id(&db, user.id).await.unwrap().unwrap();
    assert_eq!(geladen.berechtigungen, BTreeSet::from([Berechtigung::ManageRoles]));
}

#[tokio::test]
async fn berechtigungen_fuer_unbekannten_benutzer() {
    let db = db().await;
    let err = UserRepository::add_permissions(&db, UserId::new(), &[Berechtigung::ViewReports])
        .await
        .unwrap_err();
    assert!(err.ist_nicht_gefunden());
}

#[tokio::test]
async fn einstellungen_ueberschreiben() {
    let db = db().await;
    let perms = BTreeSet::new();
    let user = UserRepository::create(&db, neuer("grace@example.com", &perms))
        .await
        .unwrap();

    let neu = EinstellungenRecord {
        theme: "dark".into(),
        language: "de-DE".into(),
        notifications_enabled: false,
        currency: "EUR".into(),
        date_format: "DD.MM.YYYY".into(),
    };
    UserRepository::update_settings(&db, user.id, &neu).await.unwrap();

    let geladen = UserRepository::get_by_id(&db, user.id).await.unwrap().unwrap();
    assert_eq!(geladen.einstellungen, Some(neu));
}
