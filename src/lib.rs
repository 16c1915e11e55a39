//! Bridge between an input method host framework and a schema-driven
//! conversion engine.
//!
//! The host implements [`InputContext`] for its text fields and [`Host`] for
//! itself, hands an [`EngineApi`] to [`Bridge::new`], and forwards key events,
//! focus changes and status area clicks. Engine notifications arrive on any
//! thread; the [`Waker`] asks the host to call
//! [`Bridge::dispatch_notifications`] on its main loop.

mod bridge;
mod host;
mod trace_init;

#[cfg(test)]
mod tests;

pub use bridge::{Bridge, StatusEntry, DEPLOY_ACTION, IM_ACTION, SYNC_ACTION};
pub use host::Host;
pub use trace_init::init_tracing;

pub use bridge_core::{
    EngineApi, EngineTraits, KeyEvent, KeyStates, PreeditMode, SessionId, Settings,
    SettingsError, SetupToken, SharePolicy, SwitchInputMethodBehavior, NO_SESSION,
};
pub use bridge_session::{
    CandidateError, CandidateView, CandidateWord, ComposeResult, ContextState, InputContext,
    InputPanel, PoolError, Text, TextFormat, Tip, TipKind, UiComponent, Waker,
    FORGET_WORD_ACTION,
};

pub fn bridge_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// The built-in settings file, as a starting point for user configuration.
pub fn settings_default_config() -> &'static str {
    bridge_core::settings::default_toml()
}
