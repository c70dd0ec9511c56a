use crate::{
    error::StorageError,
    models::{NewSubscription, NewUser, Subscription, User},
    storage::traits::{AccountStorage, StorageResult},
};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{ffi, params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

const USER_COLUMNS: &str = "id, first_name, last_name, email, password_hash, created_at";
const SUBSCRIPTION_COLUMNS: &str = "id, user_id, plan_slug, plan_name, card_holder, card_number, \
     expiry_month, expiry_year, cvv, created_at";

/// Accounts kept in a single SQLite file.
///
/// `rusqlite::Connection` blocks, so every query runs on the blocking pool
/// behind one shared connection.
pub struct SqliteAccountStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAccountStorage {
    /// Opens or creates the database at `db_path` and its parent directory.
    pub fn open(db_path: impl AsRef<Path>) -> StorageResult<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Backend(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(db_path).map_err(backend("Failed to open database"))?;
        init_schema(&conn)?;
        log::info!("📁 Account database initialized at: {}", db_path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StorageResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| StorageError::Backend("database connection poisoned".into()))?;
            f(&conn)
        })
        .await
        .map_err(|e| StorageError::Backend(format!("Database task failed: {}", e)))?
    }
}

fn init_schema(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
        CREATE TABLE IF NOT EXISTS users (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name      TEXT NOT NULL,
            last_name       TEXT,
            email           TEXT NOT NULL UNIQUE,
            password_hash   TEXT NOT NULL,
            created_at      TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS subscriptions (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         INTEGER NOT NULL,
            plan_slug       TEXT NOT NULL,
            plan_name       TEXT NOT NULL,
            card_holder     TEXT NOT NULL,
            card_number     TEXT NOT NULL,
            expiry_month    TEXT NOT NULL,
            expiry_year     TEXT NOT NULL,
            cvv             TEXT NOT NULL,
            created_at      TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES users(id)
        );
        CREATE INDEX IF NOT EXISTS idx_subscriptions_user ON subscriptions(user_id);",
    )
    .map_err(backend("Failed to create schema"))
}

fn backend(context: &'static str) -> impl Fn(rusqlite::Error) -> StorageError {
    move |e| StorageError::Backend(format!("{}: {}", context, e))
}

/// Maps constraint failures to the storage error callers branch on.
fn constraint_error(e: rusqlite::Error, what: String) -> StorageError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
            match err.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE => StorageError::Conflict(what),
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => StorageError::NotFound(what),
                _ => StorageError::Backend(e.to_string()),
            }
        }
        _ => StorageError::Backend(e.to_string()),
    }
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        password_hash: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn row_to_subscription(row: &Row<'_>) -> rusqlite::Result<Subscription> {
    Ok(Subscription {
        id: row.get(0)?,
        user_id: row.get(1)?,
        plan_slug: row.get(2)?,
        plan_name: row.get(3)?,
        card_holder: row.get(4)?,
        card_number: row.get(5)?,
        expiry_month: row.get(6)?,
        expiry_year: row.get(7)?,
        cvv: row.get(8)?,
        created_at: row.get(9)?,
    })
}

#[async_trait]
impl AccountStorage for SqliteAccountStorage {
    async fn create_user(&self, user: NewUser) -> StorageResult<User> {
        self.with_conn(move |conn| {
            let created_at = Utc::now();
            conn.execute(
                "INSERT INTO users (first_name, last_name, email, password_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    user.first_name,
                    user.last_name,
                    user.email,
                    user.password_hash,
                    created_at
                ],
            )
            .map_err(|e| {
                constraint_error(e, format!("user with email {} already exists", user.email))
            })?;

            Ok(User {
                id: conn.last_insert_rowid(),
                first_name: user.first_name,
                last_name: user.last_name,
                email: user.email,
                password_hash: user.password_hash,
                created_at,
            })
        })
        .await
    }

    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let email = email.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
                params![email],
                row_to_user,
            )
            .optional()
            .map_err(backend("Failed to find user"))
        })
        .await
    }

    async fn get_user(&self, id: i64) -> StorageResult<Option<User>> {
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                params![id],
                row_to_user,
            )
            .optional()
            .map_err(backend("Failed to get user"))
        })
        .await
    }

    async fn create_subscription(
        &self,
        subscription: NewSubscription,
    ) -> StorageResult<Subscription> {
        self.with_conn(move |conn| {
            let created_at = Utc::now();
            conn.execute(
                "INSERT INTO subscriptions (user_id, plan_slug, plan_name, card_holder,
                     card_number, expiry_month, expiry_year, cvv, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    subscription.user_id,
                    subscription.plan_slug,
                    subscription.plan_name,
                    subscription.card_holder,
                    subscription.card_number,
                    subscription.expiry_month,
                    subscription.expiry_year,
                    subscription.cvv,
                    created_at
                ],
            )
            .map_err(|e| constraint_error(e, format!("user {}", subscription.user_id)))?;

            Ok(Subscription {
                id: conn.last_insert_rowid(),
                user_id: subscription.user_id,
                plan_slug: subscription.plan_slug,
                plan_name: subscription.plan_name,
                card_holder: subscription.card_holder,
                card_number: subscription.card_number,
                expiry_month: subscription.expiry_month,
                expiry_year: subscription.expiry_year,
                cvv: subscription.cvv,
                created_at,
            })
        })
        .await
    }

    async fn list_subscriptions(&self, user_id: i64) -> StorageResult<Vec<Subscription>> {
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {} FROM subscriptions WHERE user_id = ?1 ORDER BY id",
                    SUBSCRIPTION_COLUMNS
                ))
                .map_err(backend("Failed to list subscriptions"))?;
            let rows = stmt
                .query_map(params![user_id], row_to_subscription)
                .map_err(backend("Failed to list subscriptions"))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(backend("Failed to read subscription"))
        })
        .await
    }

    async fn health_check(&self) -> StorageResult<bool> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .map(|one| one == 1)
                .map_err(backend("Health check failed"))
        })
        .await
    }
}
