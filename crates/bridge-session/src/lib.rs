//! Session lifecycle and per-context state for the engine bridge.
//!
//! A [`Runtime`] bundles the engine, the [`SessionPool`], the
//! [`NotificationRouter`] and the schema catalog. Every input context gets a
//! [`ContextState`] holding a shared reference into the pool; key events flow
//! through it into the engine and come back out as preedit text and a
//! [`CandidateView`] on the context's [`InputPanel`].

mod actions;
mod candidates;
mod host;
mod notification;
mod pool;
mod runtime;
mod state;
mod text;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

#[cfg(test)]
mod tests;

pub use actions::{OptionAction, SchemaCatalog};
pub use candidates::{
    CandidateAction, CandidateError, CandidateKind, CandidateView, CandidateWord,
    FORGET_WORD_ACTION,
};
pub use host::{ComposeResult, InputContext, UiComponent};
pub use notification::{
    KeyEventScope, Notification, NotificationRouter, RouterAction, Tip, TipKind, Waker,
};
pub use pool::{session_key, ContextIdentity, PoolError, SessionError, SessionHandle, SessionPool};
pub use runtime::Runtime;
pub use state::ContextState;
pub use text::{InputPanel, Text, TextFormat};
