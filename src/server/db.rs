use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use super::models::{StoredUser, UserFields};

/// Async-safe handle to the users database.
///
/// Wraps `UsersDb` behind `Arc<Mutex>` and runs all access on tokio's
/// blocking thread pool via `spawn_blocking`, so synchronous SQLite I/O never
/// ties up async worker threads.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<std::sync::Mutex<UsersDb>>,
}

impl DbHandle {
    pub fn new(db: UsersDb) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&UsersDb) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db.lock().map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
            f(&guard)
        })
        .await
        .context("DB task panicked")?
    }
}

pub struct UsersDb {
    conn: Connection,
}

impl UsersDb {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        let db = Self { conn };
        db.run_migrations().context("Failed to run migrations")?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let db = Self { conn };
        db.run_migrations().context("Failed to run migrations")?;
        Ok(db)
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
                    firstname TEXT NOT NULL CHECK (firstname <> ''),
                    lastname TEXT NOT NULL CHECK (lastname <> ''),
                    dob TEXT,
                    zipcode TEXT
                );

                CREATE INDEX IF NOT EXISTS idx_users_created ON users(created_at, id);
                ",
            )
            .context("Failed to create tables")?;
        Ok(())
    }

    // ── User CRUD ─────────────────────────────────────────────────────

    pub fn create_user(&self, fields: &UserFields) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO users (firstname, lastname, dob, zipcode) VALUES (?1, ?2, ?3, ?4)",
                params![fields.firstname, fields.lastname, fields.dob, fields.zipcode],
            )
            .context("Failed to insert user")?;
        Ok(self.conn.last_insert_rowid())
    }

    /// One page of users in creation order.
    pub fn list_users(&self, limit: i64, offset: i64) -> Result<Vec<StoredUser>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, firstname, lastname, COALESCE(dob, ''), COALESCE(zipcode, '')
                 FROM users ORDER BY created_at, id LIMIT ?1 OFFSET ?2",
            )
            .context("Failed to prepare list_users")?;
        let rows = stmt
            .query_map(params![limit, offset], |row| {
                Ok(StoredUser {
                    id: row.get(0)?,
                    firstname: row.get(1)?,
                    lastname: row.get(2)?,
                    dob: row.get(3)?,
                    zipcode: row.get(4)?,
                })
            })
            .context("Failed to query users")?;
        let mut users = Vec::new();
        for row in rows {
            users.push(row.context("Failed to read user row")?);
        }
        Ok(users)
    }

    /// Returns the number of rows changed (0 when the id is unknown).
    pub fn update_user(&self, id: i64, fields: &UserFields) -> Result<usize> {
        self.conn
            .execute(
                "UPDATE users SET firstname = ?1, lastname = ?2, dob = ?3, zipcode = ?4
                 WHERE id = ?5",
                params![fields.firstname, fields.lastname, fields.dob, fields.zipcode, id],
            )
            .context("Failed to update user")
    }

    pub fn delete_user(&self, id: i64) -> Result<bool> {
        let count = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1", params![id])
            .context("Failed to delete user")?;
        Ok(count > 0)
    }

    pub fn count_users(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .context("Failed to count users")
    }
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(firstname: &str) -> UserFields {
        UserFields {
            firstname: firstname.to_string(),
            lastname: "Lee".to_string(),
            dob: "1990-01-02".to_string(),
            zipcode: "01234".to_string(),
        }
    }

    #[test]
    fn test_create_database_and_run_migrations() -> Result<()> {
        let db = UsersDb::new_in_memory()?;
        let table_count: i32 = db.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name = 'users'",
            [],
            |row| row.get(0),
        )?;
        assert_eq!(table_count, 1);
        // Migrations are idempotent.
        db.run_migrations()?;
        Ok(())
    }

    #[test]
    fn test_create_and_list_users() -> Result<()> {
        let db = UsersDb::new_in_memory()?;
        let first = db.create_user(&fields("Ann"))?;
        let second = db.create_user(&fields("Bo"))?;
        assert!(second > first);

        let users = db.list_users(10, 0)?;
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].id, first);
        assert_eq!(users[0].firstname, "Ann");
        assert_eq!(users[0].zipcode, "01234");
        assert_eq!(users[1].firstname, "Bo");
        Ok(())
    }

    #[test]
    fn test_list_users_pages_by_offset() -> Result<()> {
        let db = UsersDb::new_in_memory()?;
        for i in 0..13 {
            db.create_user(&fields(&format!("user{}", i)))?;
        }
        let page = db.list_users(10, 10)?;
        let names: Vec<&str> = page.iter().map(|u| u.firstname.as_str()).collect();
        assert_eq!(names, ["user10", "user11", "user12"]);
        assert!(db.list_users(10, 13)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_empty_firstname_violates_check() -> Result<()> {
        let db = UsersDb::new_in_memory()?;
        assert!(db.create_user(&fields("")).is_err());
        assert_eq!(db.count_users()?, 0);
        Ok(())
    }

    #[test]
    fn test_update_user() -> Result<()> {
        let db = UsersDb::new_in_memory()?;
        let id = db.create_user(&fields("Ann"))?;
        assert_eq!(db.update_user(id, &fields("Anna"))?, 1);
        assert_eq!(db.list_users(10, 0)?[0].firstname, "Anna");
        assert_eq!(db.update_user(id + 100, &fields("Nobody"))?, 0);
        Ok(())
    }

    #[test]
    fn test_delete_user() -> Result<()> {
        let db = UsersDb::new_in_memory()?;
        let id = db.create_user(&fields("Ann"))?;
        assert!(db.delete_user(id)?);
        assert!(!db.delete_user(id)?);
        assert_eq!(db.count_users()?, 0);
        Ok(())
    }

    #[test]
    fn test_on_disk_database_persists() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("users.db");
        {
            let db = UsersDb::new(&path)?;
            db.create_user(&fields("Ann"))?;
        }
        let db = UsersDb::new(&path)?;
        assert_eq!(db.count_users()?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_handle_runs_on_blocking_pool() -> Result<()> {
        let handle = DbHandle::new(UsersDb::new_in_memory()?);
        let id = handle.call(|db| db.create_user(&fields("Ann"))).await?;
        let users = handle.call(|db| db.list_users(10, 0)).await?;
        assert_eq!(users[0].id, id);
        Ok(())
    }
}
