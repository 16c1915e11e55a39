//! Per-input-context state.
//!
//! A `ContextState` starts without a session and requests one from the pool
//! on first use. Dropping the session (`release`) returns it to that state;
//! `snapshot` before the release lets the next fresh session pick up the same
//! schema and options.

mod key_event;
mod ui;

use std::cell::RefCell;
use std::rc::Rc;

use bridge_core::{EngineStatus, SessionId, SharePolicy, NO_SESSION};
use tracing::debug;

use crate::host::InputContext;
use crate::pool::{ContextIdentity, SessionHandle};
use crate::runtime::Runtime;
use crate::text::InputPanel;

const ASCII_MODE: &str = "ascii_mode";

pub struct ContextState {
    runtime: Rc<Runtime>,
    uuid: [u8; 16],
    // Constant for the lifetime of the input context.
    program: String,
    session: Option<Rc<SessionHandle>>,
    last_mode: String,
    saved_schema: String,
    saved_options: Vec<String>,
    changed_options: Rc<RefCell<Vec<String>>>,
    panel: InputPanel,
}

impl ContextState {
    pub fn new(runtime: Rc<Runtime>, uuid: [u8; 16], program: impl Into<String>) -> Self {
        Self {
            runtime,
            uuid,
            program: program.into(),
            session: None,
            last_mode: String::new(),
            saved_schema: String::new(),
            saved_options: Vec::new(),
            changed_options: Rc::new(RefCell::new(Vec::new())),
            panel: InputPanel::default(),
        }
    }

    pub fn for_context(runtime: Rc<Runtime>, ic: &dyn InputContext) -> Self {
        Self::new(runtime, ic.uuid(), ic.program())
    }

    pub fn uuid(&self) -> [u8; 16] {
        self.uuid
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn panel(&self) -> &InputPanel {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut InputPanel {
        &mut self.panel
    }

    pub fn session_handle(&self) -> Option<&Rc<SessionHandle>> {
        self.session.as_ref()
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Options the engine reported as changed during the current key event.
    pub fn changed_options(&self) -> Vec<String> {
        self.changed_options.borrow().clone()
    }

    pub fn saved_schema(&self) -> &str {
        &self.saved_schema
    }

    pub fn saved_options(&self) -> &[String] {
        &self.saved_options
    }

    /// Engine session id, requesting one from the pool when `request` is set.
    /// A fresh session gets the saved snapshot replayed; a shared one makes
    /// the snapshot obsolete.
    pub fn session_id(&mut self, request: bool) -> SessionId {
        if self.session.is_none() && request {
            let runtime = self.runtime.clone();
            let identity = ContextIdentity {
                uuid: self.uuid,
                program: &self.program,
            };
            if let Some((handle, fresh)) = runtime.pool().request(&identity) {
                self.session = Some(handle);
                if fresh {
                    self.restore();
                } else {
                    self.saved_schema.clear();
                    self.saved_options.clear();
                }
            }
        }
        self.session.as_ref().map_or(NO_SESSION, |s| s.id())
    }

    /// Drop this context's reference to its session.
    pub fn release(&mut self) {
        self.session = None;
    }

    pub fn clear(&mut self) {
        let session = self.session_id(true);
        if session != NO_SESSION {
            self.runtime.api().clear_composition(session);
        }
    }

    pub fn activate(&mut self) {
        self.maybe_sync_program_name();
    }

    pub fn status(&mut self) -> Option<EngineStatus> {
        let session = self.session_id(true);
        if session == NO_SESSION {
            return None;
        }
        self.runtime.api().get_status(session)
    }

    /// Display mode string used to detect mode changes.
    pub fn sub_mode(&mut self) -> String {
        match self.status() {
            Some(status) if status.is_disabled => "\u{231b}".to_string(),
            Some(status) if status.is_ascii_mode => "Latin Mode".to_string(),
            Some(EngineStatus {
                schema_name: Some(name),
                ..
            }) if !name.starts_with('.') => name,
            _ => String::new(),
        }
    }

    /// Single-glyph form of [`sub_mode`](Self::sub_mode).
    pub fn sub_mode_label(&mut self) -> String {
        match self.status() {
            Some(status) if status.is_disabled => String::new(),
            Some(status) if status.is_ascii_mode => "A".to_string(),
            Some(EngineStatus {
                schema_name: Some(name),
                ..
            }) if !name.starts_with('.') => name.chars().next().map(String::from).unwrap_or_default(),
            _ => String::new(),
        }
    }

    pub fn current_schema(&mut self) -> String {
        self.status()
            .and_then(|status| status.schema_id)
            .unwrap_or_default()
    }

    pub fn is_ascii_mode(&mut self) -> bool {
        self.status().is_some_and(|status| status.is_ascii_mode)
    }

    pub fn toggle_latin_mode(&mut self) {
        if !self.engine_available() {
            return;
        }
        let session = self.session_id(true);
        let old = self.runtime.api().get_option(session, ASCII_MODE);
        self.runtime.api().set_option(session, ASCII_MODE, !old);
    }

    pub fn set_latin_mode(&mut self, latin: bool) {
        if !self.engine_available() {
            return;
        }
        let session = self.session_id(true);
        self.runtime.api().set_option(session, ASCII_MODE, latin);
    }

    /// Switch schema on the user's behalf; the switch is its own feedback,
    /// so notifications are held back for the silence window.
    pub fn select_schema(&mut self, schema: &str) {
        if !self.engine_available() {
            return;
        }
        self.runtime.router().block();
        let session = self.session_id(true);
        let api = self.runtime.api();
        api.set_option(session, ASCII_MODE, false);
        api.select_schema(session, schema);
    }

    /// Record the current schema and option values of an existing session.
    pub fn snapshot(&mut self) {
        if self.session.is_none() {
            return;
        }
        let Some(schema) = self.status().and_then(|s| s.schema_id) else {
            return;
        };
        self.saved_options.clear();
        self.saved_schema = schema;
        if self.saved_schema.is_empty() {
            return;
        }
        let schema = self.saved_schema.clone();
        self.saved_options = self.snapshot_options(&schema);
        debug!(
            schema = %self.saved_schema,
            options = ?self.saved_options,
            "context snapshot"
        );
    }

    fn snapshot_options(&mut self, schema: &str) -> Vec<String> {
        if schema.is_empty() {
            return Vec::new();
        }
        let session = self.session_id(false);
        let runtime = self.runtime.clone();
        let catalog = runtime.catalog();
        let options = catalog
            .actions(schema)
            .iter()
            .filter_map(|action| action.snapshot_option(runtime.api(), session))
            .collect();
        options
    }

    /// Replay the snapshot onto the current session. Skipped when the saved
    /// schema no longer exists.
    pub fn restore(&mut self) {
        if self.saved_schema.is_empty() {
            return;
        }
        if !self.runtime.catalog().contains(&self.saved_schema) {
            debug!(schema = %self.saved_schema, "saved schema is gone");
            return;
        }
        let schema = std::mem::take(&mut self.saved_schema);
        let options = std::mem::take(&mut self.saved_options);
        self.select_schema(&schema);
        let session = self.session_id(true);
        let api = self.runtime.api();
        for option in &options {
            match option.strip_prefix('!') {
                Some(name) => api.set_option(session, name, false),
                None => api.set_option(session, option, true),
            }
        }
    }

    /// False before the engine starts, after it finalizes and while it
    /// deploys.
    fn engine_available(&self) -> bool {
        self.runtime.engine().is_available()
    }

    /// Under the global policy the shared session follows whichever program
    /// is typing.
    fn maybe_sync_program_name(&self) {
        if self.runtime.pool().policy() != SharePolicy::Global {
            return;
        }
        if let Some(session) = &self.session {
            session.set_program_name(&self.program);
        }
    }

    pub fn select_candidate(&mut self, ic: &mut dyn InputContext, index: usize, global: bool) {
        if !self.engine_available() {
            return;
        }
        let session = self.session_id(true);
        if session == NO_SESSION {
            return;
        }
        let runtime = self.runtime.clone();
        let api = runtime.api();
        if global {
            api.select_candidate(session, index);
        } else {
            api.select_candidate_on_current_page(session, index);
        }
        if let Some(commit) = api.get_commit(session) {
            ic.commit_string(&commit);
        }
        self.update_ui(ic, false);
    }

    pub fn delete_candidate(&mut self, ic: &mut dyn InputContext, index: usize, global: bool) {
        if !self.engine_available() {
            return;
        }
        let session = self.session_id(true);
        if session == NO_SESSION {
            return;
        }
        let api = self.runtime.api();
        if global {
            api.delete_candidate(session, index);
        } else {
            api.delete_candidate_on_current_page(session, index);
        }
        self.update_ui(ic, false);
    }

    pub fn highlight_candidate(&mut self, ic: &mut dyn InputContext, index: usize) {
        if !self.engine_available() {
            return;
        }
        let session = self.session_id(true);
        if session == NO_SESSION {
            return;
        }
        self.runtime.api().highlight_candidate(session, index);
        self.update_ui(ic, false);
    }

    /// Commit what the engine would commit now.
    pub fn commit_preedit(&mut self, ic: &mut dyn InputContext) {
        let session = self.session_id(true);
        let Some(context) = self.runtime.api().get_context(session) else {
            return;
        };
        if context.composition.is_empty() {
            return;
        }
        if let Some(preview) = &context.commit_text_preview {
            ic.commit_string(preview);
        }
    }

    /// Commit the raw keys typed so far.
    pub fn commit_input(&mut self, ic: &mut dyn InputContext) {
        let session = self.session_id(true);
        if session == NO_SESSION {
            return;
        }
        if let Some(input) = self.runtime.api().get_input(session).filter(|i| !i.is_empty()) {
            ic.commit_string(&input);
        }
    }

    /// Commit the composition as displayed.
    pub fn commit_composing(&mut self, ic: &mut dyn InputContext) {
        let session = self.session_id(true);
        let Some(context) = self.runtime.api().get_context(session) else {
            return;
        };
        if !context.composition.is_empty() {
            ic.commit_string(&context.composition.preedit);
        }
    }

    /// Show the abbreviated labels of options changed during this key event
    /// that belong to the current schema.
    pub fn show_changed_options(&mut self, ic: &mut dyn InputContext) {
        let schema = self.current_schema();
        if schema.is_empty() {
            return;
        }
        let session = self.session_id(false);
        let runtime = self.runtime.clone();
        let catalog = runtime.catalog();
        let actions = catalog.actions(&schema);
        if actions.is_empty() {
            return;
        }

        let changed = self.changed_options.borrow().clone();
        let mut picked: Vec<usize> = Vec::new();
        for option in &changed {
            let name = option.strip_prefix('!').unwrap_or(option);
            if name.is_empty() || name.starts_with('_') || name == ASCII_MODE {
                continue;
            }
            if let Some(pos) = actions.iter().position(|a| a.check_option_name(name)) {
                if !picked.contains(&pos) {
                    picked.push(pos);
                }
            }
        }

        let api = runtime.api();
        let mut labels = String::new();
        for pos in picked {
            // Re-read so a select group reports its now-active member.
            let Some(snapshot) = actions[pos].snapshot_option(api, session) else {
                continue;
            };
            let (name, state) = match snapshot.strip_prefix('!') {
                Some(name) => (name, false),
                None => (snapshot.as_str(), true),
            };
            if let Some(label) = api.get_state_label(session, name, state, true) {
                labels.push_str(&label);
            }
        }
        if !labels.is_empty() {
            ic.show_custom_input_method_information(&labels);
        }
    }
}
