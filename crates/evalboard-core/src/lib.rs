#![forbid(unsafe_code)]

//! Core: terminal lifecycle, input events, geometry and the user profile model.

pub mod event;
pub mod geometry;
pub mod profile;
pub mod terminal_session;

pub use event::{Event, KeyCode, KeyEvent, KeyEventKind, Modifiers};
pub use geometry::{Rect, Sides, Size};
pub use profile::{
    Complexity, ExperienceLevel, FontSize, Preferences, PreferencesPatch, ProfilePatch, Role,
    Theme, UserProfile, derive_complexity,
};
