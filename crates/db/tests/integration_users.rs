//! Integration-Tests fuer UserRepository (In-Memory SQLite)

use torwache_core::UserId;
use torwache_db::{
    models::{BenutzerUpdate, NeuerBenutzer},
    DbError, SqliteDb, UserRepository,
};

async fn db() -> SqliteDb {
    SqliteDb::in_memory()
        .await
        .expect("In-Memory DB konnte nicht erstellt werden")
}

async fn erstelle_user(db: &SqliteDb, name: &str) -> UserId {
    let email = format!("{name}@example.com");
    UserRepository::create(
        db,
        NeuerBenutzer {
            username: name,
            email: &email,
            password_hash: "hash",
        },
    )
    .await
    .expect("Benutzer erstellen fehlgeschlagen")
    .id
}

#[tokio::test]
async fn benutzer_erstellen_und_laden() {
    let db = db().await;

    let user = UserRepository::create(
        &db,
        NeuerBenutzer {
            username: "alice",
            email: "alice@x.com",
            password_hash: "hash_alice",
        },
    )
    .await
    .expect("Benutzer erstellen fehlgeschlagen");

    assert_eq!(user.username, "alice");
    assert_eq!(user.email, "alice@x.com");
    assert_eq!(user.created_at, user.updated_at);

    let geladen = UserRepository::get_by_id(&db, user.id)
        .await
        .expect("get_by_id fehlgeschlagen")
        .expect("Benutzer sollte gefunden werden");

    assert_eq!(geladen.id, user.id);
    assert_eq!(geladen.password_hash, "hash_alice");
}

#[tokio::test]
async fn ids_werden_fortlaufend_vergeben() {
    let db = db().await;
    let a = erstelle_user(&db, "anna").await;
    let b = erstelle_user(&db, "bert").await;
    assert!(b > a);
}

#[tokio::test]
async fn benutzer_nach_name_und_email_laden() {
    let db = db().await;
    let id = erstelle_user(&db, "bob").await;

    let per_name = UserRepository::get_by_name(&db, "bob")
        .await
        .unwrap()
        .expect("Benutzer 'bob' sollte gefunden werden");
    assert_eq!(per_name.id, id);

    let per_email = UserRepository::get_by_email(&db, "bob@example.com")
        .await
        .unwrap()
        .expect("Benutzer per E-Mail sollte gefunden werden");
    assert_eq!(per_email.id, id);

    assert!(UserRepository::get_by_name(&db, "unbekannt").await.unwrap().is_none());
    assert!(UserRepository::get_by_email(&db, "bob").await.unwrap().is_none());
}

#[tokio::test]
async fn benutzername_unique() {
    let db = db().await;
    erstelle_user(&db, "charlie").await;

    let err = UserRepository::create(
        &db,
        NeuerBenutzer {
            username: "charlie",
            email: "anders@example.com",
            password_hash: "hash2",
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, DbError::Eindeutigkeit(_)));
    assert!(err.ist_eindeutigkeit());

    // Kein halb angelegter Datensatz
    assert!(UserRepository::get_by_email(&db, "anders@example.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn email_unique() {
    let db = db().await;
    erstelle_user(&db, "dora").await;

    let err = UserRepository::create(
        &db,
        NeuerBenutzer {
            username: "dora2",
            email: "dora@example.com",
            password_hash: "hash",
        },
    )
    .await
    .unwrap_err();

    assert!(err.ist_eindeutigkeit());
    assert!(UserRepository::get_by_name(&db, "dora2").await.unwrap().is_none());
}

#[tokio::test]
async fn passwort_hash_aktualisieren() {
    let db = db().await;
    let id = erstelle_user(&db, "dave").await;
    let vorher = UserRepository::get_by_id(&db, id).await.unwrap().unwrap();

    let aktualisiert = UserRepository::update(
        &db,
        id,
        BenutzerUpdate {
            password_hash: Some("neues_hash".into()),
        },
    )
    .await
    .unwrap();

    assert_eq!(aktualisiert.password_hash, "neues_hash");
    assert_eq!(aktualisiert.username, "dave");
    assert_eq!(aktualisiert.email, "dave@example.com");
    assert!(aktualisiert.updated_at >= vorher.updated_at);
    assert_eq!(aktualisiert.created_at, vorher.created_at);
}

#[tokio::test]
async fn unbekannten_benutzer_aktualisieren_schlaegt_fehl() {
    let db = db().await;

    let err = UserRepository::update(&db, UserId(999), BenutzerUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NichtGefunden(_)));
}

#[tokio::test]
async fn benutzer_loeschen() {
    let db = db().await;
    let id = erstelle_user(&db, "eve").await;

    assert!(UserRepository::delete(&db, id).await.unwrap());
    assert!(UserRepository::get_by_id(&db, id).await.unwrap().is_none());

    // Zweites Loeschen findet nichts mehr
    assert!(!UserRepository::delete(&db, id).await.unwrap());
}
