//! Schluessel-Wert-Speicher mit Ablaufzeit fuer kurzlebige Tokens
//!
//! Wird fuer Passwort-Reset-Tokens (`reset:<token> -> user_id`) genutzt.
//! Zwei Implementierungen:
//! - [`InMemoryTokenStore`] fuer Einzelinstanzen und Tests
//! - `SqliteDb` aus `torwache-db`, wenn mehrere Instanzen sich die
//!   Datenbank teilen

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::{task::JoinHandle, time::Instant};
use torwache_db::{KvRepository, SqliteDb};

use crate::error::{AuthError, AuthResult};

/// Speicher fuer Tokens mit Ablaufzeit
///
/// Abgelaufene Schluessel verhalten sich wie nicht vorhandene.
#[allow(async_fn_in_trait)]
pub trait TokenStore: Send + Sync {
    /// Legt einen Eintrag an oder ueberschreibt ihn
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> AuthResult<()>;

    async fn get(&self, key: &str) -> AuthResult<Option<String>>;

    /// Entfernt einen Eintrag; ein fehlender Schluessel ist kein Fehler
    async fn delete(&self, key: &str) -> AuthResult<()>;

    /// Liest und entfernt einen Eintrag atomar
    ///
    /// Konkurrieren mehrere Aufrufer um denselben Schluessel, erhaelt
    /// hoechstens einer den Wert.
    async fn take(&self, key: &str) -> AuthResult<Option<String>>;
}

#[derive(Debug, Clone)]
struct Eintrag {
    wert: String,
    laeuft_ab: Instant,
}

impl Eintrag {
    fn ist_gueltig(&self) -> bool {
        Instant::now() < self.laeuft_ab
    }
}

/// In-Memory Token-Store auf Basis einer nebenlaeufigen HashMap
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    eintraege: DashMap<String, Eintrag>,
}

impl InMemoryTokenStore {
    pub fn neu() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Startet einen Hintergrund-Task, der abgelaufene Eintraege entfernt
    pub fn cleanup_starten(self: &Arc<Self>, intervall: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut takt = tokio::time::interval(intervall);
            takt.tick().await;
            loop {
                takt.tick().await;
                let entfernt = store.bereinigen();
                if entfernt > 0 {
                    tracing::debug!(anzahl = entfernt, "Abgelaufene Tokens bereinigt");
                }
            }
        })
    }

    /// Entfernt abgelaufene Eintraege und gibt deren Anzahl zurueck
    pub fn bereinigen(&self) -> usize {
        let vorher = self.eintraege.len();
        self.eintraege.retain(|_, e| e.ist_gueltig());
        vorher.saturating_sub(self.eintraege.len())
    }

    pub fn len(&self) -> usize {
        self.eintraege.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eintraege.is_empty()
    }
}

impl TokenStore for InMemoryTokenStore {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> AuthResult<()> {
        let laeuft_ab = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| AuthError::TokenSpeicher(format!("TTL zu gross: {ttl:?}")))?;

        self.eintraege.insert(
            key.to_string(),
            Eintrag {
                wert: value.to_string(),
                laeuft_ab,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> AuthResult<Option<String>> {
        Ok(self
            .eintraege
            .get(key)
            .filter(|e| e.ist_gueltig())
            .map(|e| e.wert.clone()))
    }

    async fn delete(&self, key: &str) -> AuthResult<()> {
        self.eintraege.remove(key);
        Ok(())
    }

    async fn take(&self, key: &str) -> AuthResult<Option<String>> {
        // remove() haelt die Shard-Sperre: nur ein Aufrufer bekommt den Eintrag
        Ok(self
            .eintraege
            .remove(key)
            .map(|(_, e)| e)
            .filter(Eintrag::ist_gueltig)
            .map(|e| e.wert))
    }
}

impl TokenStore for SqliteDb {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> AuthResult<()> {
        Ok(self.kv_setzen(key, value, ttl).await?)
    }

    async fn get(&self, key: &str) -> AuthResult<Option<String>> {
        Ok(self.kv_lesen(key).await?)
    }

    async fn delete(&self, key: &str) -> AuthResult<()> {
        self.kv_loeschen(key).await?;
        Ok(())
    }

    async fn take(&self, key: &str) -> AuthResult<Option<String>> {
        Ok(self.kv_entnehmen(key).await?)
    }
}
