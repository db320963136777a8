//! Session-Management fuer Torwache
//!
//! Der Client haelt nur eine undurchsichtige Session-ID im Cookie, der
//! Zustand (angemeldeter Benutzer) liegt ausschliesslich serverseitig.
//! Gespeichert wird eine Session erst, wenn sie einen Benutzer traegt;
//! anonyme Sessions existieren nur fuer die Dauer einer Anfrage.
//! Gespeicherte Sessions werden bei jedem Laden verlaengert.
//!
//! Zwei Implementierungen:
//! - [`InMemorySessionStore`] fuer Tests und Einzelinstanzen ohne Neustart
//! - [`SqliteSessionStore`], ueberlebt Neustarts

use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use rand::RngCore;
use tokio::{sync::RwLock, task::JoinHandle};
use torwache_core::UserId;
use torwache_db::{models::SessionRecord, SessionRepository, SqliteDb};

use crate::error::AuthResult;

/// Standard-Cookie-Name der Session
pub const SESSION_COOKIE_NAME: &str = "qid";

/// Standard-Session-Lebensdauer: 10 Jahre, bei jedem Zugriff erneuert
pub const SESSION_LEBENSDAUER: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

fn lebensdauer_chrono(lebensdauer: Duration) -> chrono::Duration {
    chrono::Duration::from_std(lebensdauer).unwrap_or_else(|_| chrono::Duration::days(10 * 365))
}

/// Serverseitiger Session-Zustand
#[derive(Debug, Clone)]
pub struct Session {
    /// Undurchsichtige ID (URL-sicheres Base64), steht im Cookie
    pub id: String,
    /// Angemeldeter Benutzer, `None` solange anonym
    pub user_id: Option<UserId>,
    pub erstellt_am: DateTime<Utc>,
    pub laeuft_ab_am: DateTime<Utc>,
}

impl Session {
    fn neu(lebensdauer: chrono::Duration) -> Self {
        let jetzt = Utc::now();
        Self {
            id: token_generieren(),
            user_id: None,
            erstellt_am: jetzt,
            laeuft_ab_am: jetzt + lebensdauer,
        }
    }

    /// Gibt `true` zurueck wenn die Session noch nicht abgelaufen ist
    pub fn ist_gueltig(&self) -> bool {
        Utc::now() < self.laeuft_ab_am
    }

    /// Gibt `true` zurueck wenn ein Benutzer angemeldet ist
    pub fn ist_angemeldet(&self) -> bool {
        self.user_id.is_some()
    }
}

impl From<SessionRecord> for Session {
    fn from(r: SessionRecord) -> Self {
        Self {
            id: r.id,
            user_id: Some(r.user_id),
            erstellt_am: r.erstellt_am,
            laeuft_ab_am: r.laeuft_ab_am,
        }
    }
}

/// Speicher fuer Session-Zustaende
#[allow(async_fn_in_trait)]
pub trait SessionStore: Send + Sync {
    /// Laedt die Session zur ID und verlaengert sie
    ///
    /// Fehlt die ID, ist sie unbekannt oder abgelaufen, entsteht eine neue
    /// anonyme Session. Sie wird nicht gespeichert.
    async fn laden(&self, session_id: Option<&str>) -> AuthResult<Session>;

    /// Setzt den angemeldeten Benutzer und speichert die Session
    ///
    /// Existiert die Session im Store nicht (mehr), etwa weil sie anonym war
    /// oder inzwischen zerstoert wurde, wird sie unter einer neuen ID
    /// gespeichert. Eine zerstoerte ID lebt nie wieder auf.
    async fn benutzer_setzen(&self, session: &mut Session, user_id: UserId) -> AuthResult<()>;

    /// Loescht eine Session. Eine unbekannte ID ist kein Fehler.
    async fn zerstoeren(&self, session_id: &str) -> AuthResult<()>;

    /// Loescht alle Sessions eines Benutzers bis auf `ausser`
    async fn alle_zerstoeren_ausser(&self, user_id: UserId, ausser: &str) -> AuthResult<usize>;
}

// ---------------------------------------------------------------------------
// In-Memory
// ---------------------------------------------------------------------------

/// In-Memory Session-Store mit TTL-Unterstuetzung
#[derive(Debug)]
pub struct InMemorySessionStore {
    /// session_id -> Session
    sessions: RwLock<HashMap<String, Session>>,
    lebensdauer: chrono::Duration,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::mit_lebensdauer(SESSION_LEBENSDAUER)
    }
}

impl InMemorySessionStore {
    /// Erstellt einen neuen leeren Session-Store mit Standard-Lebensdauer
    pub fn neu() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn mit_lebensdauer(lebensdauer: Duration) -> Self {
        Self {
            sessions: RwLock::default(),
            lebensdauer: lebensdauer_chrono(lebensdauer),
        }
    }

    /// Startet einen Hintergrund-Task, der abgelaufene Sessions entfernt
    pub fn cleanup_starten(self: &Arc<Self>, intervall: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut takt = tokio::time::interval(intervall);
            // Der erste Tick feuert sofort
            takt.tick().await;
            loop {
                takt.tick().await;
                let entfernt = store.cleanup_abgelaufene().await;
                if entfernt > 0 {
                    tracing::debug!(anzahl = entfernt, "Abgelaufene Sessions bereinigt");
                }
            }
        })
    }

    /// Bereinigt abgelaufene Sessions und gibt die Anzahl der entfernten zurueck
    pub async fn cleanup_abgelaufene(&self) -> usize {
        let jetzt = Utc::now();
        let mut sessions = self.sessions.write().await;
        let vorher = sessions.len();
        sessions.retain(|_, s| s.laeuft_ab_am > jetzt);
        vorher - sessions.len()
    }

    /// Gibt die Anzahl der nicht abgelaufenen Sessions zurueck
    pub async fn anzahl_aktive(&self) -> usize {
        let jetzt = Utc::now();
        let sessions = self.sessions.read().await;
        sessions.values().filter(|s| s.laeuft_ab_am > jetzt).count()
    }

    /// Liest eine Session ohne sie zu verlaengern
    pub async fn abfragen(&self, session_id: &str) -> Option<Session> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).filter(|s| s.ist_gueltig()).cloned()
    }
}

impl SessionStore for InMemorySessionStore {
    async fn laden(&self, session_id: Option<&str>) -> AuthResult<Session> {
        if let Some(id) = session_id {
            let mut sessions = self.sessions.write().await;
            if let Some(session) = sessions.get_mut(id) {
                if session.ist_gueltig() {
                    session.laeuft_ab_am = Utc::now() + self.lebensdauer;
                    return Ok(session.clone());
                }
            }
            if sessions.remove(id).is_some() {
                tracing::debug!("Abgelaufene Session verworfen");
            }
        }

        Ok(Session::neu(self.lebensdauer))
    }

    async fn benutzer_setzen(&self, session: &mut Session, user_id: UserId) -> AuthResult<()> {
        let jetzt = Utc::now();
        let mut sessions = self.sessions.write().await;

        if !sessions.get(&session.id).is_some_and(Session::ist_gueltig) {
            sessions.remove(&session.id);
            session.id = token_generieren();
            session.erstellt_am = jetzt;
        }
        session.user_id = Some(user_id);
        session.laeuft_ab_am = jetzt + self.lebensdauer;

        sessions.insert(session.id.clone(), session.clone());
        tracing::debug!(user_id = %user_id, "Session angemeldet");
        Ok(())
    }

    async fn zerstoeren(&self, session_id: &str) -> AuthResult<()> {
        self.sessions.write().await.remove(session_id);
        tracing::debug!("Session zerstoert");
        Ok(())
    }

    async fn alle_zerstoeren_ausser(&self, user_id: UserId, ausser: &str) -> AuthResult<usize> {
        let mut sessions = self.sessions.write().await;
        let vorher = sessions.len();
        sessions.retain(|id, s| s.user_id != Some(user_id) || id == ausser);
        let entfernt = vorher - sessions.len();
        if entfernt > 0 {
            tracing::debug!(user_id = %user_id, anzahl = entfernt, "Andere Sessions des Benutzers zerstoert");
        }
        Ok(entfernt)
    }
}

// ---------------------------------------------------------------------------
// SQLite
// ---------------------------------------------------------------------------

/// Session-Store in der `sessions`-Tabelle
pub struct SqliteSessionStore {
    db: Arc<SqliteDb>,
    lebensdauer: chrono::Duration,
}

impl SqliteSessionStore {
    pub fn neu(db: Arc<SqliteDb>, lebensdauer: Duration) -> Self {
        Self {
            db,
            lebensdauer: lebensdauer_chrono(lebensdauer),
        }
    }

    /// Startet einen Hintergrund-Task, der abgelaufene Sessions loescht
    pub fn cleanup_starten(self: &Arc<Self>, intervall: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut takt = tokio::time::interval(intervall);
            takt.tick().await;
            loop {
                takt.tick().await;
                if let Err(e) = store.db.sessions_bereinigen().await {
                    tracing::warn!(fehler = %e, "Session-Bereinigung fehlgeschlagen");
                }
            }
        })
    }

    /// Liest eine Session ohne sie zu verlaengern
    pub async fn abfragen(&self, session_id: &str) -> AuthResult<Option<Session>> {
        Ok(self.db.session_lesen(session_id).await?.map(Session::from))
    }
}

impl SessionStore for SqliteSessionStore {
    async fn laden(&self, session_id: Option<&str>) -> AuthResult<Session> {
        if let Some(id) = session_id {
            let laeuft_ab_am = Utc::now() + self.lebensdauer;
            if let Some(record) = self.db.session_verlaengern(id, laeuft_ab_am).await? {
                return Ok(record.into());
            }
        }

        Ok(Session::neu(self.lebensdauer))
    }

    async fn benutzer_setzen(&self, session: &mut Session, user_id: UserId) -> AuthResult<()> {
        let jetzt = Utc::now();
        let laeuft_ab_am = jetzt + self.lebensdauer;

        // Nur bestehende Zeilen werden aktualisiert; sonst neue ID
        if !self
            .db
            .session_benutzer_setzen(&session.id, user_id, laeuft_ab_am)
            .await?
        {
            session.id = token_generieren();
            session.erstellt_am = jetzt;
            self.db
                .session_anlegen(&SessionRecord {
                    id: session.id.clone(),
                    user_id,
                    erstellt_am: jetzt,
                    laeuft_ab_am,
                })
                .await?;
        }
        session.user_id = Some(user_id);
        session.laeuft_ab_am = laeuft_ab_am;

        tracing::debug!(user_id = %user_id, "Session angemeldet");
        Ok(())
    }

    async fn zerstoeren(&self, session_id: &str) -> AuthResult<()> {
        self.db.session_loeschen(session_id).await?;
        tracing::debug!("Session zerstoert");
        Ok(())
    }

    async fn alle_zerstoeren_ausser(&self, user_id: UserId, ausser: &str) -> AuthResult<usize> {
        let entfernt = self.db.sessions_loeschen_ausser(user_id, ausser).await?;
        Ok(usize::try_from(entfernt).unwrap_or(usize::MAX))
    }
}

// ---------------------------------------------------------------------------
// Cookie
// ---------------------------------------------------------------------------

/// Attribute des Session-Cookies
///
/// `HttpOnly` und `SameSite=Lax` sind immer gesetzt, `Secure` nur im
/// Produktivbetrieb (das Cookie wird dann nur ueber HTTPS gesendet).
#[derive(Debug, Clone)]
pub struct SessionCookieConfig {
    pub name: String,
    pub max_alter: Duration,
    pub secure: bool,
}

impl Default for SessionCookieConfig {
    fn default() -> Self {
        Self {
            name: SESSION_COOKIE_NAME.into(),
            max_alter: SESSION_LEBENSDAUER,
            secure: false,
        }
    }
}

impl SessionCookieConfig {
    /// Anweisung, das Cookie auf die gegebene Session zu setzen (bzw. zu erneuern)
    pub fn setzen(&self, session_id: &str) -> CookieAnweisung {
        CookieAnweisung::Setzen {
            name: self.name.clone(),
            wert: session_id.to_string(),
            max_alter_sekunden: self.max_alter.as_secs(),
            secure: self.secure,
        }
    }

    /// Anweisung, das Cookie beim Client zu loeschen
    pub fn loeschen(&self) -> CookieAnweisung {
        CookieAnweisung::Loeschen {
            name: self.name.clone(),
            secure: self.secure,
        }
    }
}

/// Was die Transportschicht mit dem Session-Cookie tun soll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieAnweisung {
    /// Anonyme Anfrage: kein `Set-Cookie`
    Keine,
    Setzen {
        name: String,
        wert: String,
        max_alter_sekunden: u64,
        secure: bool,
    },
    Loeschen {
        name: String,
        secure: bool,
    },
}

impl CookieAnweisung {
    /// Wert fuer einen `Set-Cookie`-Header, `None` bei [`CookieAnweisung::Keine`]
    pub fn header_wert(&self) -> Option<String> {
        let (mut header, secure) = match self {
            Self::Keine => return None,
            Self::Setzen {
                name,
                wert,
                max_alter_sekunden,
                secure,
            } => (
                format!("{name}={wert}; Path=/; Max-Age={max_alter_sekunden}"),
                *secure,
            ),
            Self::Loeschen { name, secure } => (
                format!("{name}=; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT"),
                *secure,
            ),
        };
        header.push_str("; HttpOnly; SameSite=Lax");
        if secure {
            header.push_str("; Secure");
        }
        Some(header)
    }
}

/// Generiert einen kryptografisch sicheren Token (URL-sicheres Base64, 256 Bit)
pub fn token_generieren() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
}
