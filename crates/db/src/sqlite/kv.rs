//! SQLite-Implementierung des KvRepository
//!
//! Ablaufzeiten werden als Unix-Millisekunden gespeichert. Abgelaufene Zeilen
//! werden bei jedem Zugriff herausgefiltert und periodisch per
//! `kv_bereinigen` entfernt.

use std::time::Duration;

use chrono::Utc;

use crate::error::{DbError, DbResult};
use crate::repository::KvRepository;
use crate::sqlite::pool::SqliteDb;

fn jetzt_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn ablauf_ms(ttl: Duration) -> DbResult<i64> {
    let ttl_ms = i64::try_from(ttl.as_millis())
        .map_err(|_| DbError::UngueltigeDaten(format!("TTL zu gross: {ttl:?}")))?;
    Ok(jetzt_ms().saturating_add(ttl_ms))
}

impl KvRepository for SqliteDb {
    async fn kv_setzen(&self, schluessel: &str, wert: &str, ttl: Duration) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO kv_eintraege (schluessel, wert, laeuft_ab_ms) VALUES (?, ?, ?)
             ON CONFLICT (schluessel) DO UPDATE
             SET wert = excluded.wert, laeuft_ab_ms = excluded.laeuft_ab_ms",
        )
        .bind(schluessel)
        .bind(wert)
        .bind(ablauf_ms(ttl)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn kv_lesen(&self, schluessel: &str) -> DbResult<Option<String>> {
        let wert = sqlx::query_scalar::<_, String>(
            "SELECT wert FROM kv_eintraege WHERE schluessel = ? AND laeuft_ab_ms > ?",
        )
        .bind(schluessel)
        .bind(jetzt_ms())
        .fetch_optional(&self.pool)
        .await?;
        Ok(wert)
    }

    async fn kv_loeschen(&self, schluessel: &str) -> DbResult<bool> {
        let affected = sqlx::query("DELETE FROM kv_eintraege WHERE schluessel = ?")
            .bind(schluessel)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    async fn kv_entnehmen(&self, schluessel: &str) -> DbResult<Option<String>> {
        // Ein einzelnes DELETE … RETURNING: von zwei gleichzeitigen Aufrufen
        // erhaelt hoechstens einer den Wert.
        let wert = sqlx::query_scalar::<_, String>(
            "DELETE FROM kv_eintraege WHERE schluessel = ? AND laeuft_ab_ms > ? RETURNING wert",
        )
        .bind(schluessel)
        .bind(jetzt_ms())
        .fetch_optional(&self.pool)
        .await?;
        Ok(wert)
    }

    async fn kv_bereinigen(&self) -> DbResult<u64> {
        let entfernt = sqlx::query("DELETE FROM kv_eintraege WHERE laeuft_ab_ms <= ?")
            .bind(jetzt_ms())
            .execute(&self.pool)
            .await?
            .rows_affected();
        if entfernt > 0 {
            tracing::debug!(anzahl = entfernt, "Abgelaufene KV-Eintraege bereinigt");
        }
        Ok(entfernt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ablauf_liegt_in_der_zukunft() {
        let vorher = jetzt_ms();
        let ablauf = ablauf_ms(Duration::from_secs(60)).unwrap();
        assert!(ablauf >= vorher + 60_000);
    }

    #[test]
    fn riesige_ttl_wird_abgelehnt() {
        let ergebnis = ablauf_ms(Duration::MAX);
        assert!(matches!(ergebnis, Err(DbError::UngueltigeDaten(_))));
    }
}
