//! Integration-Tests fuer KvRepository (In-Memory SQLite)

use std::time::Duration;

use torwache_db::{KvRepository, SqliteDb};

async fn db() -> SqliteDb {
    SqliteDb::in_memory()
        .await
        .expect("In-Memory DB konnte nicht erstellt werden")
}

const TAG: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::test]
async fn setzen_und_lesen() {
    let db = db().await;

    db.kv_setzen("reset:abc", "42", TAG).await.unwrap();
    assert_eq!(db.kv_lesen("reset:abc").await.unwrap().as_deref(), Some("42"));

    // Lesen verbraucht nichts
    assert_eq!(db.kv_lesen("reset:abc").await.unwrap().as_deref(), Some("42"));
    assert!(db.kv_lesen("reset:unbekannt").await.unwrap().is_none());
}

#[tokio::test]
async fn setzen_ueberschreibt() {
    let db = db().await;

    db.kv_setzen("k", "alt", TAG).await.unwrap();
    db.kv_setzen("k", "neu", TAG).await.unwrap();
    assert_eq!(db.kv_lesen("k").await.unwrap().as_deref(), Some("neu"));
}

#[tokio::test]
async fn loeschen_ist_idempotent() {
    let db = db().await;

    db.kv_setzen("k", "v", TAG).await.unwrap();
    assert!(db.kv_loeschen("k").await.unwrap());
    assert!(!db.kv_loeschen("k").await.unwrap());
    assert!(db.kv_lesen("k").await.unwrap().is_none());
}

#[tokio::test]
async fn entnehmen_nur_einmal() {
    let db = db().await;

    db.kv_setzen("reset:t1", "7", TAG).await.unwrap();
    assert_eq!(db.kv_entnehmen("reset:t1").await.unwrap().as_deref(), Some("7"));
    assert!(db.kv_entnehmen("reset:t1").await.unwrap().is_none());
    assert!(db.kv_lesen("reset:t1").await.unwrap().is_none());
}

#[tokio::test]
async fn abgelaufene_eintraege_gelten_als_fehlend() {
    let db = db().await;

    db.kv_setzen("kurz", "v", Duration::from_millis(20)).await.unwrap();
    db.kv_setzen("lang", "v", TAG).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(db.kv_lesen("kurz").await.unwrap().is_none());
    assert!(db.kv_entnehmen("kurz").await.unwrap().is_none());

    let entfernt = db.kv_bereinigen().await.unwrap();
    assert_eq!(entfernt, 1);
    assert_eq!(db.kv_lesen("lang").await.unwrap().as_deref(), Some("v"));
}

#[tokio::test]
async fn gleichzeitiges_entnehmen_liefert_hoechstens_einen_wert() {
    let db = db().await;
    db.kv_setzen("reset:race", "1", TAG).await.unwrap();

    let (a, b) = tokio::join!(db.kv_entnehmen("reset:race"), db.kv_entnehmen("reset:race"));
    let treffer = [a.unwrap(), b.unwrap()]
        .into_iter()
        .filter(Option::is_some)
        .count();
    assert_eq!(treffer, 1);
}
