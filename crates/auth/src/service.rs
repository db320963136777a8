//! Auth-Service fuer Torwache
//!
//! Zentraler Einstiegspunkt fuer Registrierung, Login, Logout, `me` und den
//! Passwort-vergessen/aendern-Ablauf. Erwartbare, vom Benutzer korrigierbare
//! Fehler kommen als `FieldError`-Liste in einer erfolgreichen Antwort
//! zurueck; nur Infrastrukturfehler werden als `Err` weitergereicht.
//!
//! Zustandsautomat pro Session: anonym -> angemeldet (register, login,
//! changePassword) -> anonym (logout oder Ablauf im Session-Store).

use std::{sync::Arc, time::Duration};

use serde::Serialize;
use torwache_core::{FieldError, UserId};
use torwache_db::{
    models::{BenutzerRecord, BenutzerUpdate, NeuerBenutzer},
    repository::UserRepository,
    DbError,
};

use crate::{
    error::AuthResult,
    kontext::AnfrageKontext,
    mailer::Mailer,
    password::PasswortHasher,
    session::{token_generieren, CookieAnweisung, SessionCookieConfig, SessionStore},
    token_store::TokenStore,
    validierung::{registrierung_validieren, zu_kurz},
};

/// Schluessel-Praefix fuer Reset-Tokens im Token-Store
pub const RESET_PRAEFIX: &str = "reset:";

/// Gueltigkeit eines Reset-Tokens: 3 Tage
pub const RESET_TTL: Duration = Duration::from_secs(3 * 24 * 60 * 60);

/// Laufzeit-Einstellungen des Auth-Service
#[derive(Debug, Clone)]
pub struct AuthKonfiguration {
    pub reset_ttl: Duration,
    /// Basis-URL des Frontends, auf der die Seite `change-password/<token>` liegt
    pub frontend_url: String,
    pub cookie: SessionCookieConfig,
}

impl Default for AuthKonfiguration {
    fn default() -> Self {
        Self {
            reset_ttl: RESET_TTL,
            frontend_url: "http://localhost:3000".into(),
            cookie: SessionCookieConfig::default(),
        }
    }
}

impl AuthKonfiguration {
    pub fn reset_link(&self, token: &str) -> String {
        format!(
            "{}/change-password/{token}",
            self.frontend_url.trim_end_matches('/')
        )
    }
}

/// HTML-Inhalt der Reset-Mail
pub fn reset_mail_html(link: &str) -> String {
    format!(r#"<a href="{link}">reset password</a>"#)
}

/// Antwort von register, login und changePassword
///
/// Serialisiert als `{"user": {...}}` bzw. `{"errors": [...]}`.
#[derive(Debug, Clone, Serialize)]
pub enum BenutzerAntwort {
    #[serde(rename = "user")]
    Benutzer(BenutzerRecord),
    #[serde(rename = "errors")]
    Fehler(Vec<FieldError>),
}

impl BenutzerAntwort {
    fn fehler(field: &str, message: &str) -> Self {
        Self::Fehler(vec![FieldError::neu(field, message)])
    }

    pub fn benutzer(&self) -> Option<&BenutzerRecord> {
        match self {
            Self::Benutzer(b) => Some(b),
            Self::Fehler(_) => None,
        }
    }

    pub fn fehlerliste(&self) -> &[FieldError] {
        match self {
            Self::Benutzer(_) => &[],
            Self::Fehler(f) => f,
        }
    }

    pub fn ist_erfolg(&self) -> bool {
        matches!(self, Self::Benutzer(_))
    }
}

/// Auth-Service – zentraler Einstiegspunkt fuer alle Authentifizierungsvorgaenge
pub struct AuthService<U, T, S, M>
where
    U: UserRepository,
    T: TokenStore,
    S: SessionStore,
    M: Mailer,
{
    user_repo: Arc<U>,
    token_store: Arc<T>,
    session_store: Arc<S>,
    mailer: Arc<M>,
    hasher: PasswortHasher,
    konfig: AuthKonfiguration,
}

impl<U, T, S, M> AuthService<U, T, S, M>
where
    U: UserRepository,
    T: TokenStore,
    S: SessionStore,
    M: Mailer,
{
    pub fn neu(
        user_repo: Arc<U>,
        token_store: Arc<T>,
        session_store: Arc<S>,
        mailer: Arc<M>,
        hasher: PasswortHasher,
        konfig: AuthKonfiguration,
    ) -> Self {
        Self {
            user_repo,
            token_store,
            session_store,
            mailer,
            hasher,
            konfig,
        }
    }

    pub fn konfiguration(&self) -> &AuthKonfiguration {
        &self.konfig
    }

    /// Bindet eine Anfrage an ihre Session
    ///
    /// `session_id` ist der Wert des Session-Cookies, falls der Client einen
    /// mitgeschickt hat. Ohne (gueltiges) Cookie entsteht eine neue anonyme
    /// Session, die erst mit der Anmeldung gespeichert wird und bis dahin
    /// kein Cookie setzt. Das Cookie einer angemeldeten Session wird erneuert.
    pub async fn kontext_oeffnen(&self, session_id: Option<&str>) -> AuthResult<AnfrageKontext> {
        let session = self.session_store.laden(session_id).await?;
        let cookie = if session.ist_angemeldet() {
            self.konfig.cookie.setzen(&session.id)
        } else {
            CookieAnweisung::Keine
        };
        Ok(AnfrageKontext::neu(session, cookie))
    }

    async fn session_anmelden(&self, ctx: &mut AnfrageKontext, user_id: UserId) -> AuthResult<()> {
        self.session_store
            .benutzer_setzen(&mut ctx.session, user_id)
            .await?;
        ctx.cookie = self.konfig.cookie.setzen(&ctx.session.id);
        Ok(())
    }

    /// Registriert einen neuen Benutzer und meldet ihn an
    pub async fn registrieren(
        &self,
        ctx: &mut AnfrageKontext,
        username: &str,
        email: &str,
        passwort: &str,
    ) -> AuthResult<BenutzerAntwort> {
        if let Some(fehler) = registrierung_validieren(username, email, passwort) {
            return Ok(BenutzerAntwort::Fehler(fehler));
        }

        let password_hash = self.hasher.hashen(passwort).await?;

        // Kein Vorab-Check auf Existenz: die Eindeutigkeit garantiert das
        // Verzeichnis, auch bei gleichzeitigen Registrierungen.
        let ergebnis = self
            .user_repo
            .create(NeuerBenutzer {
                username,
                email,
                password_hash: &password_hash,
            })
            .await;

        let benutzer = match ergebnis {
            Ok(b) => b,
            Err(e) if e.ist_eindeutigkeit() => {
                tracing::info!(username = %username, "Registrierung abgelehnt: bereits vergeben");
                return Ok(BenutzerAntwort::fehler("username", "username already taken"));
            }
            Err(e) => return Err(e.into()),
        };

        self.session_anmelden(ctx, benutzer.id).await?;

        tracing::info!(
            user_id = %benutzer.id,
            username = %benutzer.username,
            "Neuer Benutzer registriert"
        );

        Ok(BenutzerAntwort::Benutzer(benutzer))
    }

    /// Meldet einen Benutzer per Benutzername oder E-Mail an
    ///
    /// Enthaelt die Eingabe ein '@', wird ausschliesslich per E-Mail gesucht,
    /// sonst ausschliesslich per Benutzername.
    pub async fn anmelden(
        &self,
        ctx: &mut AnfrageKontext,
        username_or_email: &str,
        passwort: &str,
    ) -> AuthResult<BenutzerAntwort> {
        let gefunden = if username_or_email.contains('@') {
            self.user_repo.get_by_email(username_or_email).await?
        } else {
            self.user_repo.get_by_name(username_or_email).await?
        };

        let Some(benutzer) = gefunden else {
            tracing::debug!("Login fuer unbekannten Benutzer");
            return Ok(BenutzerAntwort::fehler("usernameOrEmail", "user not found"));
        };

        if !self.hasher.verifizieren(passwort, &benutzer.password_hash).await? {
            tracing::warn!(user_id = %benutzer.id, "Fehlgeschlagener Login-Versuch");
            return Ok(BenutzerAntwort::fehler("password", "password not correct"));
        }

        self.session_anmelden(ctx, benutzer.id).await?;

        tracing::info!(
            user_id = %benutzer.id,
            username = %benutzer.username,
            "Benutzer angemeldet"
        );

        Ok(BenutzerAntwort::Benutzer(benutzer))
    }

    /// Gibt den angemeldeten Benutzer frisch aus dem Verzeichnis zurueck
    ///
    /// `None` fuer anonyme Sessions und fuer Benutzer, die inzwischen
    /// geloescht wurden.
    pub async fn aktueller_benutzer(
        &self,
        ctx: &AnfrageKontext,
    ) -> AuthResult<Option<BenutzerRecord>> {
        let Some(user_id) = ctx.user_id() else {
            return Ok(None);
        };

        let benutzer = self.user_repo.get_by_id(user_id).await?;
        if benutzer.is_none() {
            tracing::debug!(user_id = %user_id, "Session verweist auf geloeschten Benutzer");
        }
        Ok(benutzer)
    }

    /// Meldet ab: zerstoert die Session und loescht das Cookie
    ///
    /// Das Cookie wird unabhaengig vom Ergebnis geloescht. Gibt `true` nur
    /// zurueck wenn der Session-Store die Session zerstoeren konnte.
    pub async fn abmelden(&self, ctx: &mut AnfrageKontext) -> bool {
        let user_id = ctx.session.user_id.take();
        let ergebnis = self.session_store.zerstoeren(&ctx.session.id).await;
        ctx.cookie = self.konfig.cookie.loeschen();

        match ergebnis {
            Ok(()) => {
                if let Some(user_id) = user_id {
                    tracing::info!(user_id = %user_id, "Benutzer abgemeldet");
                }
                true
            }
            Err(e) => {
                tracing::error!(fehler = %e, "Session konnte nicht zerstoert werden");
                false
            }
        }
    }

    /// Startet den Passwort-Reset
    ///
    /// Gibt immer `true` zurueck, damit sich nicht erfragen laesst, welche
    /// Adressen registriert sind. Die Mail wird im Hintergrund versendet.
    pub async fn passwort_vergessen(&self, email: &str) -> AuthResult<bool> {
        let Some(benutzer) = self.user_repo.get_by_email(email).await? else {
            tracing::debug!("Passwort-Reset fuer unbekannte E-Mail angefordert");
            return Ok(true);
        };

        let token = token_generieren();
        self.token_store
            .put(
                &format!("{RESET_PRAEFIX}{token}"),
                &benutzer.id.inner().to_string(),
                self.konfig.reset_ttl,
            )
            .await?;

        let html = reset_mail_html(&self.konfig.reset_link(&token));
        let mailer = Arc::clone(&self.mailer);
        let an = benutzer.email.clone();
        let user_id = benutzer.id;
        tokio::spawn(async move {
            if let Err(e) = mailer.senden(&an, &html).await {
                tracing::warn!(user_id = %user_id, fehler = %e, "Reset-Mail konnte nicht versendet werden");
            }
        });

        tracing::info!(user_id = %benutzer.id, "Passwort-Reset angefordert");
        Ok(true)
    }

    /// Setzt das Passwort mit einem Reset-Token neu und meldet den Benutzer an
    ///
    /// Das Token wird beim Nachschlagen atomar verbraucht und ist danach
    /// ungueltig, auch wenn ein spaeterer Schritt scheitert. Alle anderen
    /// Sessions des Benutzers werden beendet.
    pub async fn passwort_aendern(
        &self,
        ctx: &mut AnfrageKontext,
        token: &str,
        neues_passwort: &str,
    ) -> AuthResult<BenutzerAntwort> {
        if zu_kurz(neues_passwort) {
            return Ok(BenutzerAntwort::fehler("newPassword", "password is too short"));
        }

        let schluessel = format!("{RESET_PRAEFIX}{token}");
        let Some(wert) = self.token_store.take(&schluessel).await? else {
            return Ok(BenutzerAntwort::fehler("token", "token expired"));
        };

        let user_id: UserId = match wert.parse() {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(fehler = %e, "Reset-Token mit ungueltigem Wert verworfen");
                return Ok(BenutzerAntwort::fehler("token", "token expired"));
            }
        };

        if self.user_repo.get_by_id(user_id).await?.is_none() {
            return Ok(BenutzerAntwort::fehler("token", "user not exist"));
        }

        let password_hash = self.hasher.hashen(neues_passwort).await?;
        let benutzer = match self
            .user_repo
            .update(
                user_id,
                BenutzerUpdate {
                    password_hash: Some(password_hash),
                },
            )
            .await
        {
            Ok(b) => b,
            // Zwischen Nachschlagen und Update geloescht
            Err(DbError::NichtGefunden(_)) => {
                return Ok(BenutzerAntwort::fehler("token", "user not exist"));
            }
            Err(e) => return Err(e.into()),
        };

        self.session_anmelden(ctx, benutzer.id).await?;

        match self
            .session_store
            .alle_zerstoeren_ausser(benutzer.id, &ctx.session.id)
            .await
        {
            Ok(anzahl) => tracing::info!(
                user_id = %benutzer.id,
                beendete_sessions = anzahl,
                "Passwort geaendert"
            ),
            Err(e) => tracing::warn!(
                user_id = %benutzer.id,
                fehler = %e,
                "Passwort geaendert, andere Sessions konnten nicht beendet werden"
            ),
        }

        Ok(BenutzerAntwort::Benutzer(benutzer))
    }
}
