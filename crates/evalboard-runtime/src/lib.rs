#![forbid(unsafe_code)]

//! Runtime: program loop, rendering, subscriptions, key dispatch and persisted state.

pub mod keymap;
pub mod presenter;
pub mod profile_store;
pub mod program;
pub mod render;
pub mod simulator;
pub mod storage;
pub mod subscription;

pub use keymap::{
    BindingKey, DispatchContext, DispatchRegistry, KeyBinding, ScopeGuard, ScopeId,
    SharedRegistry, ShortcutEntry,
};
pub use profile_store::{CompletionFlag, ProfileStore, keys};
pub use program::{Cmd, Model, Program, ProgramConfig};
pub use render::{Buffer, Cell, Color, Frame, Style};
pub use simulator::ProgramSimulator;
pub use storage::{
    FileStorage, KeyValueStore, MemoryStorage, StorageBackend, StorageError, StorageResult,
};
pub use subscription::{Every, StopSignal, SubId, Subscription};
