//! Engine-facing building blocks shared by the session layer and the addon.
//!
//! - `api`: the capability surface of the conversion engine ([`EngineApi`])
//! - `engine`: [`EngineHandle`], owning the engine and its one-time setup state
//! - `key`: key events and the engine's packed modifier word
//! - `settings`: TOML configuration
//! - `types`: owned value types the engine hands back

pub mod api;
pub mod engine;
pub mod key;
pub mod settings;
pub mod types;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use api::{EngineApi, EngineTraits, NotificationHandler, SessionId, NO_SESSION};
pub use engine::{EngineHandle, SetupToken};
pub use key::{KeyEvent, KeyStates};
pub use settings::{
    PreeditMode, Settings, SettingsError, SharePolicy, SwitchInputMethodBehavior,
};
pub use types::{
    EngineCandidate, EngineComposition, EngineContext, EngineMenu, EngineStatus,
    SchemaListItem, SwitchSpec,
};
