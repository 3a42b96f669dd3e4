#![forbid(unsafe_code)]

//! User profile data model.
//!
//! The profile is a singleton record persisted under the `userProfile` key.
//! Its JSON shape uses camelCase field names so it stays readable alongside
//! the other persisted keys. Updates are partial merges through
//! [`ProfilePatch`]; the record is overwritten in place and never deleted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What the user does; drives the default complexity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Manager,
    Developer,
    Student,
    Investor,
    Researcher,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Manager,
        Role::Developer,
        Role::Student,
        Role::Investor,
        Role::Researcher,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Role::Manager => "Manager",
            Role::Developer => "Developer",
            Role::Student => "Student",
            Role::Investor => "Investor",
            Role::Researcher => "Researcher",
        }
    }

    #[must_use]
    pub const fn blurb(self) -> &'static str {
        match self {
            Role::Manager => "Track quality across teams and releases",
            Role::Developer => "Instrument agents and debug failing runs",
            Role::Student => "Learn how agent evaluation works",
            Role::Investor => "See headline metrics at a glance",
            Role::Researcher => "Compare models and metric packs in depth",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Self-reported experience with evaluation tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl ExperienceLevel {
    pub const ALL: [ExperienceLevel; 3] = [
        ExperienceLevel::Beginner,
        ExperienceLevel::Intermediate,
        ExperienceLevel::Advanced,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            ExperienceLevel::Beginner => "Beginner",
            ExperienceLevel::Intermediate => "Intermediate",
            ExperienceLevel::Advanced => "Advanced",
        }
    }
}

/// How much of the console is exposed at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    #[default]
    Balanced,
    Advanced,
}

impl Complexity {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Complexity::Simple => "simple",
            Complexity::Balanced => "balanced",
            Complexity::Advanced => "advanced",
        }
    }
}

/// Map a survey answer pair onto a complexity tier.
///
/// Rules are checked in order and the first hit wins:
///
/// 1. beginner, or a manager at any level: `Simple`
/// 2. advanced, or a developer at any level: `Advanced`
/// 3. everything else: `Balanced`
///
/// A developer who answers "beginner" therefore lands on `Simple`, and a
/// manager who answers "advanced" also lands on `Simple`.
#[must_use]
pub fn derive_complexity(role: Role, level: ExperienceLevel) -> Complexity {
    if level == ExperienceLevel::Beginner || role == Role::Manager {
        Complexity::Simple
    } else if level == ExperienceLevel::Advanced || role == Role::Developer {
        Complexity::Advanced
    } else {
        Complexity::Balanced
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
    #[default]
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

/// Display preferences nested in the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub theme: Theme,
    pub reduced_motion: bool,
    pub font_size: FontSize,
}

/// The persisted user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub role: Role,
    pub complexity: Complexity,
    pub show_gamification: bool,
    pub show_onboarding: bool,
    pub preferences: Preferences,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            role: Role::Developer,
            complexity: Complexity::Balanced,
            show_gamification: true,
            show_onboarding: true,
            preferences: Preferences::default(),
        }
    }
}

impl UserProfile {
    /// Merge a partial update into this profile. Absent fields are untouched.
    pub fn apply(&mut self, patch: &ProfilePatch) {
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(complexity) = patch.complexity {
            self.complexity = complexity;
        }
        if let Some(show) = patch.show_gamification {
            self.show_gamification = show;
        }
        if let Some(show) = patch.show_onboarding {
            self.show_onboarding = show;
        }
        if let Some(prefs) = &patch.preferences {
            if let Some(theme) = prefs.theme {
                self.preferences.theme = theme;
            }
            if let Some(reduced) = prefs.reduced_motion {
                self.preferences.reduced_motion = reduced;
            }
            if let Some(size) = prefs.font_size {
                self.preferences.font_size = size;
            }
        }
    }

    /// Copy with `patch` applied.
    #[must_use]
    pub fn merged(&self, patch: &ProfilePatch) -> Self {
        let mut next = self.clone();
        next.apply(patch);
        next
    }
}

/// Partial update for [`UserProfile`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Complexity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_gamification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_onboarding: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<PreferencesPatch>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduced_motion: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<FontSize>,
}

impl ProfilePatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
