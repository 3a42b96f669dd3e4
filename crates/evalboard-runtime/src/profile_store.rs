#![forbid(unsafe_code)]

//! Profile store and completion markers.
//!
//! Wraps the shared [`KeyValueStore`] with the console's persisted keys.
//! Every write is flushed immediately; a failed flush is logged and the
//! in-memory value stays authoritative for the rest of the session.

use std::sync::Arc;

use evalboard_core::profile::{ProfilePatch, UserProfile};

use crate::storage::KeyValueStore;

/// Persisted key names.
pub mod keys {
    pub const ONBOARDING_COMPLETED: &str = "onboarding_completed";
    pub const TOUR_COMPLETED: &str = "tour_completed";
    pub const TENANT_ONBOARDING_COMPLETED: &str = "tenant_onboarding_completed";
    pub const USER_PROFILE: &str = "userProfile";
    pub const AUTH_TOKEN: &str = "auth_token";
    pub const AUTH_USER: &str = "auth_user";
}

const TRUE: &str = "true";

/// A once-only completion marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionFlag {
    /// Welcome survey (or setup wizard) finished.
    Onboarding,
    /// Product tour finished or skipped.
    Tour,
    /// Tenant/workspace wizard finished.
    TenantOnboarding,
}

impl CompletionFlag {
    pub const ALL: [CompletionFlag; 3] = [
        CompletionFlag::Onboarding,
        CompletionFlag::Tour,
        CompletionFlag::TenantOnboarding,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            CompletionFlag::Onboarding => keys::ONBOARDING_COMPLETED,
            CompletionFlag::Tour => keys::TOUR_COMPLETED,
            CompletionFlag::TenantOnboarding => keys::TENANT_ONBOARDING_COMPLETED,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProfileStore {
    store: Arc<KeyValueStore>,
}

impl ProfileStore {
    #[must_use]
    pub fn new(store: Arc<KeyValueStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<KeyValueStore> {
        &self.store
    }

    /// Read the profile, creating and persisting defaults when the key is
    /// missing or holds something unreadable.
    pub fn load_or_default(&self) -> UserProfile {
        if let Some(profile) = self.store.get_json::<UserProfile>(keys::USER_PROFILE) {
            return profile;
        }
        let profile = UserProfile::default();
        tracing::info!(target: "evalboard.profile", "creating default profile");
        self.write(&profile);
        profile
    }

    /// Read, merge `patch`, write back. Returns the merged profile.
    pub fn update(&self, patch: &ProfilePatch) -> UserProfile {
        let profile = self.load_or_default().merged(patch);
        self.write(&profile);
        tracing::debug!(target: "evalboard.profile", ?patch, "profile updated");
        profile
    }

    #[must_use]
    pub fn is_completed(&self, flag: CompletionFlag) -> bool {
        self.store.get(flag.key()).as_deref() == Some(TRUE)
    }

    /// Set a marker. `true` only on the call that actually set it.
    pub fn mark_completed(&self, flag: CompletionFlag) -> bool {
        if self.is_completed(flag) {
            return false;
        }
        self.store.set(flag.key(), TRUE);
        self.persist();
        tracing::info!(target: "evalboard.profile", flag = flag.key(), "completion recorded");
        true
    }

    /// Record the welcome survey outcome: profile patch plus marker, once.
    ///
    /// Returns `None` without writing anything when onboarding was already
    /// completed, otherwise the merged profile.
    pub fn complete_onboarding(&self, patch: &ProfilePatch) -> Option<UserProfile> {
        if self.is_completed(CompletionFlag::Onboarding) {
            tracing::debug!(target: "evalboard.profile", "onboarding already completed, ignoring");
            return None;
        }
        let profile = self.load_or_default().merged(patch);
        self.stage(&profile);
        self.store.set(CompletionFlag::Onboarding.key(), TRUE);
        self.persist();
        tracing::info!(target: "evalboard.profile", role = %profile.role, complexity = profile.complexity.label(), "onboarding completed");
        Some(profile)
    }

    /// Clear every completion marker so first-run flows show again.
    pub fn reset_completion(&self) {
        let mut changed = false;
        for flag in CompletionFlag::ALL {
            changed |= self.store.remove(flag.key()).is_some();
        }
        if changed {
            self.persist();
            tracing::info!(target: "evalboard.profile", "completion markers reset");
        }
    }

    fn write(&self, profile: &UserProfile) {
        self.stage(profile);
        self.persist();
    }

    fn stage(&self, profile: &UserProfile) {
        if let Err(error) = self.store.set_json(keys::USER_PROFILE, profile) {
            tracing::warn!(target: "evalboard.profile", %error, "failed to encode profile");
        }
    }

    fn persist(&self) {
        if let Err(error) = self.store.flush() {
            tracing::warn!(target: "evalboard.profile", %error, "failed to persist state");
        }
    }
}
