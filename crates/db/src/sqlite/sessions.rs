//! SQLite-Implementierung des SessionRepository
//!
//! Ablaufzeiten liegen wie bei `kv_eintraege` als Unix-Millisekunden vor.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use torwache_core::UserId;

use crate::error::{DbError, DbResult};
use crate::models::SessionRecord;
use crate::repository::SessionRepository;
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::users::zeitpunkt_parsen;

const SPALTEN: &str = "id, user_id, erstellt_am, laeuft_ab_ms";

fn jetzt_ms() -> i64 {
    Utc::now().timestamp_millis()
}

impl SessionRepository for SqliteDb {
    async fn session_lesen(&self, id: &str) -> DbResult<Option<SessionRecord>> {
        let sql = format!("SELECT {SPALTEN} FROM sessions WHERE id = ? AND laeuft_ab_ms > ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(jetzt_ms())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_session(&r)).transpose()
    }

    async fn session_verlaengern(
        &self,
        id: &str,
        laeuft_ab_am: DateTime<Utc>,
    ) -> DbResult<Option<SessionRecord>> {
        // Abgelaufene Sessions werden nicht wiederbelebt
        let sql = format!(
            "UPDATE sessions SET laeuft_ab_ms = ? WHERE id = ? AND laeuft_ab_ms > ? RETURNING {SPALTEN}"
        );
        let row = sqlx::query(&sql)
            .bind(laeuft_ab_am.timestamp_millis())
            .bind(id)
            .bind(jetzt_ms())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_session(&r)).transpose()
    }

    async fn session_anlegen(&self, session: &SessionRecord) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO sessions (id, user_id, erstellt_am, laeuft_ab_ms) VALUES (?, ?, ?, ?)",
        )
        .bind(&session.id)
        .bind(session.user_id.inner())
        .bind(session.erstellt_am.to_rfc3339())
        .bind(session.laeuft_ab_am.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn session_benutzer_setzen(
        &self,
        id: &str,
        user_id: UserId,
        laeuft_ab_am: DateTime<Utc>,
    ) -> DbResult<bool> {
        let affected = sqlx::query(
            "UPDATE sessions SET user_id = ?, laeuft_ab_ms = ? WHERE id = ? AND laeuft_ab_ms > ?",
        )
        .bind(user_id.inner())
        .bind(laeuft_ab_am.timestamp_millis())
        .bind(id)
        .bind(jetzt_ms())
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(affected > 0)
    }

    async fn session_loeschen(&self, id: &str) -> DbResult<bool> {
        let affected = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    async fn sessions_loeschen_ausser(&self, user_id: UserId, ausser: &str) -> DbResult<u64> {
        let entfernt = sqlx::query("DELETE FROM sessions WHERE user_id = ? AND id <> ?")
            .bind(user_id.inner())
            .bind(ausser)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(entfernt)
    }

    async fn sessions_bereinigen(&self) -> DbResult<u64> {
        let entfernt = sqlx::query("DELETE FROM sessions WHERE laeuft_ab_ms <= ?")
            .bind(jetzt_ms())
            .execute(&self.pool)
            .await?
            .rows_affected();
        if entfernt > 0 {
            tracing::debug!(anzahl = entfernt, "Abgelaufene Sessions bereinigt");
        }
        Ok(entfernt)
    }
}

fn row_to_session(row: &SqliteRow) -> DbResult<SessionRecord> {
    use sqlx::Row as _;

    let erstellt_am: String = row.try_get("erstellt_am")?;
    let laeuft_ab_ms: i64 = row.try_get("laeuft_ab_ms")?;

    Ok(SessionRecord {
        id: row.try_get("id")?,
        user_id: UserId(row.try_get("user_id")?),
        erstellt_am: zeitpunkt_parsen("erstellt_am", &erstellt_am)?,
        laeuft_ab_am: DateTime::from_timestamp_millis(laeuft_ab_ms)
            .ok_or_else(|| DbError::intern(format!("Ungueltiges laeuft_ab_ms {laeuft_ab_ms}")))?,
    })
}
