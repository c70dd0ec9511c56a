#[cfg(feature = "postgres")]
use crate::{
    config::PostgresConfig,
    error::StorageError,
    models::{NewSubscription, NewUser, Subscription, User},
    storage::traits::{AccountStorage, StorageResult},
};

#[cfg(feature = "postgres")]
use async_trait::async_trait;
#[cfg(feature = "postgres")]
use deadpool_postgres::{Config, Object, Pool, Runtime};
#[cfg(feature = "postgres")]
use tokio_postgres::{error::SqlState, NoTls, Row};

#[cfg(feature = "postgres")]
pub struct PostgresAccountStorage {
    pool: Pool,
}

#[cfg(feature = "postgres")]
impl PostgresAccountStorage {
    pub async fn new(config: PostgresConfig) -> StorageResult<Self> {
        let mut cfg = Config::new();
        cfg.host = config.host;
        cfg.port = config.port;
        cfg.user = config.username;
        cfg.password = config.password;
        cfg.dbname = config.database;

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| StorageError::Backend(format!("Failed to create pool: {}", e)))?;

        let storage = Self { pool };
        storage.initialize_schema().await?;

        Ok(storage)
    }

    async fn client(&self) -> StorageResult<Object> {
        self.pool
            .get()
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to get connection: {}", e)))
    }

    async fn initialize_schema(&self) -> StorageResult<()> {
        let client = self.client().await?;

        client
            .batch_execute(
                "CREATE TABLE IF NOT EXISTS users (
                id BIGSERIAL PRIMARY KEY,
                first_name VARCHAR(64) NOT NULL,
                last_name VARCHAR(64),
                email VARCHAR(120) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE TABLE IF NOT EXISTS subscriptions (
                id BIGSERIAL PRIMARY KEY,
                user_id BIGINT NOT NULL REFERENCES users(id),
                plan_slug VARCHAR(32) NOT NULL,
                plan_name VARCHAR(64) NOT NULL,
                card_holder VARCHAR(128) NOT NULL,
                card_number VARCHAR(24) NOT NULL,
                expiry_month VARCHAR(2) NOT NULL,
                expiry_year VARCHAR(4) NOT NULL,
                cvv VARCHAR(4) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE INDEX IF NOT EXISTS idx_subscriptions_user ON subscriptions(user_id);",
            )
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to create schema: {}", e)))?;

        log::info!("PostgreSQL account storage schema initialized");
        Ok(())
    }
}

#[cfg(feature = "postgres")]
fn user_from_row(row: &Row) -> User {
    User {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
    }
}

#[cfg(feature = "postgres")]
fn subscription_from_row(row: &Row) -> Subscription {
    Subscription {
        id: row.get("id"),
        user_id: row.get("user_id"),
        plan_slug: row.get("plan_slug"),
        plan_name: row.get("plan_name"),
        card_holder: row.get("card_holder"),
        card_number: row.get("card_number"),
        expiry_month: row.get("expiry_month"),
        expiry_year: row.get("expiry_year"),
        cvv: row.get("cvv"),
        created_at: row.get("created_at"),
    }
}

#[cfg(feature = "postgres")]
const USER_COLUMNS: &str = "id, first_name, last_name, email, password_hash, created_at";

#[cfg(feature = "postgres")]
const SUBSCRIPTION_COLUMNS: &str = "id, user_id, plan_slug, plan_name, card_holder, card_number, \
expiry_month, expiry_year, cvv, created_at";

#[cfg(feature = "postgres")]
#[async_trait]
impl AccountStorage for PostgresAccountStorage {
    async fn create_user(&self, user: NewUser) -> StorageResult<User> {
        let client = self.client().await?;
        let sql = format!(
            "INSERT INTO users (first_name, last_name, email, password_hash)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            USER_COLUMNS
        );

        let row = client
            .query_one(
                sql.as_str(),
                &[
                    &user.first_name,
                    &user.last_name,
                    &user.email,
                    &user.password_hash,
                ],
            )
            .await
            .map_err(|e| {
                if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                    StorageError::Conflict(format!("user with email {} already exists", user.email))
                } else {
                    StorageError::Backend(format!("Failed to insert user: {}", e))
                }
            })?;

        Ok(user_from_row(&row))
    }

    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let client = self.client().await?;
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

        let row = client
            .query_opt(sql.as_str(), &[&email])
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to query user: {}", e)))?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn get_user(&self, id: i64) -> StorageResult<Option<User>> {
        let client = self.client().await?;
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        let row = client
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to query user: {}", e)))?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn create_subscription(
        &self,
        subscription: NewSubscription,
    ) -> StorageResult<Subscription> {
        let client = self.client().await?;
        let sql = format!(
            "INSERT INTO subscriptions
                (user_id, plan_slug, plan_name, card_holder, card_number, expiry_month, expiry_year, cvv)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {}",
            SUBSCRIPTION_COLUMNS
        );

        let row = client
            .query_one(
                sql.as_str(),
                &[
                    &subscription.user_id,
                    &subscription.plan_slug,
                    &subscription.plan_name,
                    &subscription.card_holder,
                    &subscription.card_number,
                    &subscription.expiry_month,
                    &subscription.expiry_year,
                    &subscription.cvv,
                ],
            )
            .await
            .map_err(|e| {
                if e.code() == Some(&SqlState::FOREIGN_KEY_VIOLATION) {
                    StorageError::NotFound(format!("user {}", subscription.user_id))
                } else {
                    StorageError::Backend(format!("Failed to insert subscription: {}", e))
                }
            })?;

        Ok(subscription_from_row(&row))
    }

    async fn list_subscriptions(&self, user_id: i64) -> StorageResult<Vec<Subscription>> {
        let client = self.client().await?;
        let sql = format!(
            "SELECT {} FROM subscriptions WHERE user_id = $1 ORDER BY id",
            SUBSCRIPTION_COLUMNS
        );

        let rows = client
            .query(sql.as_str(), &[&user_id])
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to list subscriptions: {}", e)))?;

        Ok(rows.iter().map(subscription_from_row).collect())
    }

    async fn health_check(&self) -> StorageResult<bool> {
        let client = self.client().await?;
        match client.query_one("SELECT 1", &[]).await {
            Ok(_) => Ok(true),
            Err(e) => {
                log::warn!("PostgreSQL health check failed: {}", e);
                Ok(false)
            }
        }
    }
}
