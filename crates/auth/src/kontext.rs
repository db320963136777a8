//! Anfrage-Kontext
//!
//! Jede Client-Anfrage bindet genau eine Session fuer ihre Dauer. Der
//! Kontext wird vom `AuthService` geoeffnet und explizit an jede Operation
//! uebergeben; es gibt keinen globalen Zustand.

use torwache_core::UserId;

use crate::session::{CookieAnweisung, Session};

/// Zustand einer einzelnen Anfrage: gebundene Session und Cookie-Anweisung
#[derive(Debug, Clone)]
pub struct AnfrageKontext {
    pub(crate) session: Session,
    pub(crate) cookie: CookieAnweisung,
}

impl AnfrageKontext {
    pub(crate) fn neu(session: Session, cookie: CookieAnweisung) -> Self {
        Self { session, cookie }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Angemeldeter Benutzer laut Session
    pub fn user_id(&self) -> Option<UserId> {
        self.session.user_id
    }

    pub fn ist_angemeldet(&self) -> bool {
        self.session.ist_angemeldet()
    }

    /// Was die Antwort mit dem Session-Cookie tun soll
    pub fn cookie(&self) -> &CookieAnweisung {
        &self.cookie
    }

    /// Fertiger `Set-Cookie`-Header fuer die Antwort, `None` wenn kein Cookie gesetzt wird
    pub fn set_cookie_header(&self) -> Option<String> {
        self.cookie.header_wert()
    }
}
