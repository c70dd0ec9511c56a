use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session";

/// How long a login stays valid without a logout.
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 31;

#[derive(Debug, Clone, Copy)]
struct Session {
    user_id: i64,
    expires_at: DateTime<Utc>,
}

impl Session {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// In-process login sessions: opaque token to user id.
///
/// Sessions do not survive a restart. Expired tokens resolve to no user and
/// are dropped the next time a session is created.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(Duration::days(DEFAULT_SESSION_TTL_DAYS))
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        SessionStore {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn create(&self, user_id: i64) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, session| session.is_live(now));
        let pruned = before - sessions.len();
        if pruned > 0 {
            log::debug!("Pruned {} expired sessions", pruned);
        }

        sessions.insert(
            token.clone(),
            Session {
                user_id,
                expires_at: now + self.ttl,
            },
        );
        token
    }

    pub async fn user_id(&self, token: &str) -> Option<i64> {
        let now = Utc::now();
        self.sessions
            .read()
            .await
            .get(token)
            .filter(|session| session.is_live(now))
            .map(|session| session.user_id)
    }

    pub async fn remove(&self, token: &str) -> Option<i64> {
        self.sessions
            .write()
            .await
            .remove(token)
            .map(|session| session.user_id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
