use crate::{
    error::StorageError,
    models::{NewSubscription, NewUser, Subscription, User},
    storage::traits::{AccountStorage, StorageResult},
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    users: HashMap<i64, User>,
    subscriptions: Vec<Subscription>,
    next_user_id: i64,
    next_subscription_id: i64,
}

/// Process-local storage. Everything is lost on restart.
#[derive(Default)]
pub struct MemoryAccountStorage {
    tables: RwLock<Tables>,
}

impl MemoryAccountStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStorage for MemoryAccountStorage {
    async fn create_user(&self, user: NewUser) -> StorageResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StorageError::Conflict(format!(
                "user with email {} already exists",
                user.email
            )));
        }

        tables.next_user_id += 1;
        let record = User {
            id: tables.next_user_id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        tables.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn get_user(&self, id: i64) -> StorageResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn create_subscription(
        &self,
        subscription: NewSubscription,
    ) -> StorageResult<Subscription> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&subscription.user_id) {
            return Err(StorageError::NotFound(format!(
                "user {}",
                subscription.user_id
            )));
        }

        tables.next_subscription_id += 1;
        let record = Subscription {
            id: tables.next_subscription_id,
            user_id: subscription.user_id,
            plan_slug: subscription.plan_slug,
            plan_name: subscription.plan_name,
            card_holder: subscription.card_holder,
            card_number: subscription.card_number,
            expiry_month: subscription.expiry_month,
            expiry_year: subscription.expiry_year,
            cvv: subscription.cvv,
            created_at: Utc::now(),
        };
        tables.subscriptions.push(record.clone());
        Ok(record)
    }

    async fn list_subscriptions(&self, user_id: i64) -> StorageResult<Vec<Subscription>> {
        let tables = self.tables.read().await;
        Ok(tables
            .subscriptions
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> StorageResult<bool> {
        Ok(true)
    }
}
