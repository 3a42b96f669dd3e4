#![forbid(unsafe_code)]

//! Persisted sign-in: `auth_token` plus the `auth_user` record.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use evalboard_client::{Session, User, token};
use evalboard_runtime::{KeyValueStore, keys};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct SessionStore {
    store: Arc<KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Arc<KeyValueStore>) -> Self {
        Self { store }
    }

    /// The stored session, if one exists and its token has not expired.
    /// An expired or half-written session is removed.
    pub fn restore(&self) -> Option<Session> {
        self.restore_at(now_secs())
    }

    pub fn restore_at(&self, now: u64) -> Option<Session> {
        let token = self.store.get(keys::AUTH_TOKEN)?;
        let Some(user) = self.store.get_json::<User>(keys::AUTH_USER) else {
            warn!(target: "evalboard.session", "token without a readable user record, discarding");
            self.clear();
            return None;
        };
        if token::is_expired(&token, now) {
            info!(target: "evalboard.session", user = %user.email, "stored session expired");
            self.clear();
            return None;
        }
        debug!(target: "evalboard.session", user = %user.email, "session restored");
        Some(Session { token, user })
    }

    pub fn save(&self, session: &Session) {
        self.store.set(keys::AUTH_TOKEN, session.token.clone());
        if let Err(err) = self.store.set_json(keys::AUTH_USER, &session.user) {
            warn!(target: "evalboard.session", error = %err, "could not encode user record");
        }
        self.flush();
    }

    /// Replace the stored user record, keeping the token.
    pub fn update_user(&self, user: &User) {
        if !self.store.contains(keys::AUTH_TOKEN) {
            return;
        }
        if let Err(err) = self.store.set_json(keys::AUTH_USER, user) {
            warn!(target: "evalboard.session", error = %err, "could not encode user record");
        }
        self.flush();
    }

    pub fn clear(&self) {
        let removed_token = self.store.remove(keys::AUTH_TOKEN).is_some();
        let removed_user = self.store.remove(keys::AUTH_USER).is_some();
        if removed_token || removed_user {
            self.flush();
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.store.contains(keys::AUTH_TOKEN)
    }

    fn flush(&self) {
        if let Err(err) = self.store.flush() {
            warn!(target: "evalboard.session", error = %err, "session not persisted");
        }
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}
