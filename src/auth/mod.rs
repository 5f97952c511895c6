// Session gate: single-user credential store, session store, expired-session purge worker.

mod memory;
mod purge;

pub use memory::{MemSessionStore, MemUserStore};
pub use purge::spawn_session_purger;

use crate::models::{PublicUser, Session, User};
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Option<User>;

    async fn get(&self, id: u32) -> Option<User>;
}

/// Keyed session storage. Expired sessions are never returned.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, user: PublicUser, ttl: Duration) -> Session;

    async fn get(&self, id: &str) -> Option<Session>;

    /// Returns whether a session was removed.
    async fn destroy(&self, id: &str) -> bool;

    /// Drop every expired session; returns how many were dropped.
    async fn purge_expired(&self) -> usize;
}

/// Exact match on username and password. Passwords are compared in plaintext.
pub async fn verify_credentials(
    users: &dyn UserStore,
    username: &str,
    password: &str,
) -> Option<PublicUser> {
    users
        .find_by_username(username)
        .await
        .filter(|u| u.password == password)
        .map(|u| u.public())
}
