use crate::{
    error::StorageError,
    models::{NewSubscription, NewUser, Subscription, User},
};
use async_trait::async_trait;

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Persistence for users and captured subscriptions.
#[async_trait]
pub trait AccountStorage: Send + Sync {
    /// Fails with [`StorageError::Conflict`] when the email is taken.
    async fn create_user(&self, user: NewUser) -> StorageResult<User>;
    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<User>>;
    async fn get_user(&self, id: i64) -> StorageResult<Option<User>>;

    async fn create_subscription(&self, subscription: NewSubscription)
        -> StorageResult<Subscription>;
    async fn list_subscriptions(&self, user_id: i64) -> StorageResult<Vec<Subscription>>;

    async fn health_check(&self) -> StorageResult<bool>;
}
