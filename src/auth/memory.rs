// In-memory user and session stores, scoped to one process.

use super::{SessionStore, UserStore};
use crate::config::AuthConfig;
use crate::models::{PublicUser, Session, User};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

pub struct MemUserStore {
    users: HashMap<String, User>,
}

impl MemUserStore {
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.username.clone(), u)).collect(),
        }
    }

    /// The single user configured under `[auth]`.
    pub fn seeded(config: &AuthConfig) -> Self {
        Self::new([User {
            id: 1,
            username: config.username.clone(),
            password: config.password.clone(),
        }])
    }
}

#[async_trait]
impl UserStore for MemUserStore {
    async fn find_by_username(&self, username: &str) -> Option<User> {
        self.users.get(username).cloned()
    }

    async fn get(&self, id: u32) -> Option<User> {
        self.users.values().find(|u| u.id == id).cloned()
    }
}

#[derive(Default)]
pub struct MemSessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for MemSessionStore {
    async fn create(&self, user: PublicUser, ttl: Duration) -> Session {
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user,
            expires_at: Instant::now() + ttl,
        };
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        session
    }

    async fn get(&self, id: &str) -> Option<Session> {
        let now = Instant::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                None => return None,
                Some(s) if !s.is_expired_at(now) => return Some(s.clone()),
                Some(_) => {}
            }
        }
        self.sessions.write().await.remove(id);
        None
    }

    async fn destroy(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired_at(now));
        before - sessions.len()
    }
}
