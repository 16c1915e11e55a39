use bridge_core::key::keysym_from_char;
use bridge_core::{KeyEvent, KeyStates, NO_SESSION};
use tracing::{debug, debug_span};

use super::ContextState;
use crate::host::{ComposeResult, InputContext};
use crate::notification::KeyEventScope;

/// `text` as a single character, if it is exactly one.
fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

impl ContextState {
    /// Feed one host key event to the engine. Returns whether the key was
    /// consumed.
    pub fn key_event(&mut self, ic: &mut dyn InputContext, event: &KeyEvent) -> bool {
        let _span = debug_span!("key_event", sym = event.sym, release = event.is_release).entered();
        self.changed_options.borrow_mut().clear();

        // Release events never compose and go to the engine as they are.
        let mut composed = None;
        if !event.states.test_any(KeyStates::CTRL | KeyStates::SUPER) && !event.is_release {
            match ic.process_compose(event.sym) {
                ComposeResult::Pending => return true,
                ComposeResult::Passthrough => {}
                ComposeResult::Composed(text) if text.is_empty() => {}
                ComposeResult::Composed(text) => composed = Some(text),
            }
        }

        let runtime = self.runtime.clone();
        let api = runtime.api();
        if !runtime.engine().is_available() {
            return false;
        }
        let session = self.session_id(true);
        if session == NO_SESSION {
            return false;
        }
        let _scope = KeyEventScope::enter(session, self.changed_options.clone());

        self.maybe_sync_program_name();
        self.last_mode = self.sub_mode();
        let last_schema = self.current_schema();
        let mask = event.engine_mask();

        let accepted = match composed {
            Some(text) => {
                let handled = single_char(&text)
                    .and_then(keysym_from_char)
                    .is_some_and(|sym| api.process_key(session, sym, mask));
                if !handled {
                    debug!(text = %text, "commit composed text");
                    self.commit_preedit(ic);
                    ic.commit_string(&text);
                    self.clear();
                }
                true
            }
            None => api.process_key(session, event.sym, mask),
        };

        if let Some(commit) = api.get_commit(session) {
            ic.commit_string(&commit);
            ic.reset_compose();
        }

        self.update_ui(ic, event.is_release);
        if !event.is_release
            && !last_schema.is_empty()
            && last_schema == self.current_schema()
            && self.panel.is_empty()
            && !self.changed_options.borrow().is_empty()
        {
            self.show_changed_options(ic);
        }
        accepted
    }
}
