//! SQLite-Implementierung des UserRepository

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use torwache_core::UserId;

use crate::error::{ist_unique_verletzung, DbError, DbResult};
use crate::models::{BenutzerRecord, BenutzerUpdate, NeuerBenutzer};
use crate::repository::UserRepository;
use crate::sqlite::pool::SqliteDb;

const SPALTEN: &str = "id, username, email, password_hash, created_at, updated_at";

impl UserRepository for SqliteDb {
    async fn create(&self, data: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord> {
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        // Ein einzelnes INSERT ist atomar: entweder existiert danach der
        // vollstaendige Datensatz oder gar keiner.
        let ergebnis = sqlx::query(
            "INSERT INTO users (username, email, password_hash, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(data.username)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(&now_str)
        .bind(&now_str)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if ist_unique_verletzung(&e) {
                DbError::Eindeutigkeit(format!(
                    "Benutzername '{}' oder E-Mail bereits vergeben",
                    data.username
                ))
            } else {
                DbError::Sqlx(e)
            }
        })?;

        Ok(BenutzerRecord {
            id: UserId(ergebnis.last_insert_rowid()),
            username: data.username.to_string(),
            email: data.email.to_string(),
            password_hash: data.password_hash.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: UserId) -> DbResult<Option<BenutzerRecord>> {
        let sql = format!("SELECT {SPALTEN} FROM users WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id.inner())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_benutzer(&r)).transpose()
    }

    async fn get_by_email(&self, email: &str) -> DbResult<Option<BenutzerRecord>> {
        let sql = format!("SELECT {SPALTEN} FROM users WHERE email = ?");
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_benutzer(&r)).transpose()
    }

    async fn get_by_name(&self, username: &str) -> DbResult<Option<BenutzerRecord>> {
        let sql = format!("SELECT {SPALTEN} FROM users WHERE username = ?");
        let row = sqlx::query(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_benutzer(&r)).transpose()
    }

    async fn update(&self, id: UserId, data: BenutzerUpdate) -> DbResult<BenutzerRecord> {
        let now_str = Utc::now().to_rfc3339();

        let affected = match data.password_hash {
            Some(ref hash) => {
                sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
                    .bind(hash)
                    .bind(&now_str)
                    .bind(id.inner())
                    .execute(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("UPDATE users SET updated_at = ? WHERE id = ?")
                    .bind(&now_str)
                    .bind(id.inner())
                    .execute(&self.pool)
                    .await?
            }
        }
        .rows_affected();

        if affected == 0 {
            return Err(DbError::nicht_gefunden(format!("User {id}")));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::intern("User nach Update nicht gefunden"))
    }

    async fn delete(&self, id: UserId) -> DbResult<bool> {
        let affected = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.inner())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }
}

pub(crate) fn zeitpunkt_parsen(feld: &str, wert: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(wert)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::intern(format!("Ungueltiges {feld} '{wert}': {e}")))
}

fn row_to_benutzer(row: &SqliteRow) -> DbResult<BenutzerRecord> {
    use sqlx::Row as _;

    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(BenutzerRecord {
        id: UserId(row.try_get("id")?),
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        created_at: zeitpunkt_parsen("created_at", &created_at)?,
        updated_at: zeitpunkt_parsen("updated_at", &updated_at)?,
    })
}
