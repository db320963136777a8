//! Passwort-Hashing mit Argon2id
//!
//! Argon2id ist der empfohlene Algorithmus gemaess OWASP-Richtlinien.
//! Hashes werden im PHC-Format gespeichert (Algorithmus, Parameter und Salt
//! sind im String enthalten), daher kann die Verifikation auch Hashes mit
//! aelteren Parametern pruefen.
//!
//! Hashen ist absichtlich teuer und laeuft deshalb im Blocking-Pool von tokio.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::error::{AuthError, AuthResult};

/// Argon2id-Hasher mit konfigurierbaren Kostenparametern
#[derive(Debug, Clone)]
pub struct PasswortHasher {
    params: Params,
}

impl Default for PasswortHasher {
    /// Werte gemaess OWASP-Empfehlungen:
    /// - Speicher: 64 MiB
    /// - Iterationen: 3
    /// - Parallelismus: 1
    fn default() -> Self {
        Self {
            params: Params::new(64 * 1024, 3, 1, None).unwrap_or_default(),
        }
    }
}

impl PasswortHasher {
    /// Erstellt einen Hasher mit eigenen Parametern
    ///
    /// - `m_kib`: Speicherbedarf in KiB (mindestens 8 * `p`)
    /// - `t`: Anzahl Iterationen
    /// - `p`: Parallelismus
    pub fn neu(m_kib: u32, t: u32, p: u32) -> AuthResult<Self> {
        let params =
            Params::new(m_kib, t, p, None).map_err(|e| AuthError::HasherParameter(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hasht ein Passwort mit einem zufaelligen Salt und gibt den PHC-String zurueck
    pub fn hashen_blockierend(&self, passwort: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(passwort.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::PasswortHashing(e.to_string()))
    }

    /// Prueft ein Passwort gegen einen gespeicherten PHC-Hash
    ///
    /// Der Vergleich erfolgt in konstanter Zeit. Ein beschaedigter oder
    /// fremder Hash ergibt `false`, nie einen Fehler.
    pub fn verifizieren_blockierend(&self, passwort: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!(fehler = %e, "Gespeicherter Passwort-Hash ist ungueltig");
                return false;
            }
        };

        self.argon2()
            .verify_password(passwort.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Wie [`Self::hashen_blockierend`], aber im Blocking-Pool
    pub async fn hashen(&self, passwort: &str) -> AuthResult<String> {
        let hasher = self.clone();
        let passwort = passwort.to_owned();
        tokio::task::spawn_blocking(move || hasher.hashen_blockierend(&passwort))
            .await
            .map_err(|e| AuthError::intern(format!("Hash-Task abgebrochen: {e}")))?
    }

    /// Wie [`Self::verifizieren_blockierend`], aber im Blocking-Pool
    pub async fn verifizieren(&self, passwort: &str, hash: &str) -> AuthResult<bool> {
        let hasher = self.clone();
        let passwort = passwort.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || hasher.verifizieren_blockierend(&passwort, &hash))
            .await
            .map_err(|e| AuthError::intern(format!("Verifikations-Task abgebrochen: {e}")))
    }
}
