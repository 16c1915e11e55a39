//! Scripted in-memory engine for tests.
//!
//! `FakeEngine` models just enough of a schema-driven engine to drive the
//! session layer: lowercase letters compose, `space`/digits/`Return` commit,
//! `Page_Up`/`Page_Down` page through a synthetic candidate list, `F4` toggles
//! `full_shape` and `F5` toggles `ascii_mode`. Every call is counted so tests
//! can assert on engine round trips.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

use crate::api::{EngineApi, EngineTraits, NotificationHandler, SessionId, NO_SESSION};
use crate::key::{keysym, KeyStates};
use crate::types::{
    EngineCandidate, EngineComposition, EngineContext, EngineMenu, EngineStatus,
    SchemaListItem, SwitchSpec,
};

pub const PAGE_SIZE: usize = 5;
pub const DEFAULT_CANDIDATE_TOTAL: usize = 12;

#[derive(Debug, Clone)]
struct FakeSchema {
    item: SchemaListItem,
    switches: Vec<SwitchSpec>,
}

#[derive(Debug, Default)]
struct FakeSession {
    schema_id: String,
    input: String,
    page: usize,
    highlighted: usize,
    commit: Option<String>,
    options: HashMap<String, bool>,
    properties: HashMap<String, String>,
    deleted: Vec<usize>,
}

impl FakeSession {
    fn option(&self, name: &str) -> bool {
        self.options.get(name).copied().unwrap_or(false)
    }

    fn clear_input(&mut self) {
        self.input.clear();
        self.page = 0;
        self.highlighted = 0;
    }
}

struct FakeState {
    sessions: BTreeMap<SessionId, FakeSession>,
    next_id: SessionId,
    schemas: Vec<FakeSchema>,
    maintenance: bool,
    refuse_sessions: bool,
    candidate_total: usize,
    deploy_ok: bool,
}

impl FakeState {
    fn candidate_count(&self, session: &FakeSession) -> usize {
        if session.input.is_empty() {
            0
        } else {
            self.candidate_total
        }
    }

    fn schema(&self, id: &str) -> Option<&FakeSchema> {
        self.schemas.iter().find(|s| s.item.schema_id == id)
    }
}

fn candidate_text(input: &str, index: usize) -> String {
    format!("{}{index}", input.to_uppercase())
}

fn option_message(option: &str, value: bool) -> String {
    if value {
        option.to_string()
    } else {
        format!("!{option}")
    }
}

fn first_char(label: &str) -> String {
    label.chars().next().map(String::from).unwrap_or_default()
}

#[derive(Default)]
struct Counters {
    setup: Cell<usize>,
    initialize: Cell<usize>,
    finalize: Cell<usize>,
    sync: Cell<usize>,
    created: Cell<usize>,
    destroyed: Cell<usize>,
    candidate_lookups: Cell<usize>,
    process_key: Cell<usize>,
}

fn bump(counter: &Cell<usize>) {
    counter.set(counter.get() + 1);
}

pub struct FakeEngine {
    state: RefCell<FakeState>,
    handler: RefCell<Option<NotificationHandler>>,
    counters: Counters,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeEngine {
    /// Engine with two schemas: `luna_pinyin` (default, with a toggle, a
    /// select group and a second toggle) and `cangjie5` (one toggle).
    pub fn new() -> Self {
        let luna = FakeSchema {
            item: SchemaListItem {
                schema_id: "luna_pinyin".to_string(),
                name: "朙月拼音".to_string(),
            },
            switches: vec![
                SwitchSpec::Toggle {
                    option: "full_shape".to_string(),
                    states: ["半角".to_string(), "全角".to_string()],
                },
                SwitchSpec::Select {
                    options: vec!["zh_trad".to_string(), "zh_simp".to_string()],
                    states: vec!["漢字".to_string(), "汉字".to_string()],
                },
                SwitchSpec::Toggle {
                    option: "ascii_punct".to_string(),
                    states: ["。，".to_string(), "．，".to_string()],
                },
            ],
        };
        let cangjie = FakeSchema {
            item: SchemaListItem {
                schema_id: "cangjie5".to_string(),
                name: "倉頡五代".to_string(),
            },
            switches: vec![SwitchSpec::Toggle {
                option: "full_shape".to_string(),
                states: ["半角".to_string(), "全角".to_string()],
            }],
        };
        Self {
            state: RefCell::new(FakeState {
                sessions: BTreeMap::new(),
                next_id: 1,
                schemas: vec![luna, cangjie],
                maintenance: false,
                refuse_sessions: false,
                candidate_total: DEFAULT_CANDIDATE_TOTAL,
                deploy_ok: true,
            }),
            handler: RefCell::new(None),
            counters: Counters::default(),
        }
    }

    // --- scripting ---

    pub fn set_maintenance(&self, maintenance: bool) {
        self.state.borrow_mut().maintenance = maintenance;
    }

    pub fn set_refuse_sessions(&self, refuse: bool) {
        self.state.borrow_mut().refuse_sessions = refuse;
    }

    pub fn set_candidate_total(&self, total: usize) {
        self.state.borrow_mut().candidate_total = total;
    }

    /// Outcome reported by the next full-check maintenance run.
    pub fn set_deploy_result(&self, ok: bool) {
        self.state.borrow_mut().deploy_ok = ok;
    }

    pub fn remove_schema(&self, schema_id: &str) {
        self.state
            .borrow_mut()
            .schemas
            .retain(|s| s.item.schema_id != schema_id);
    }

    pub fn has_handler(&self) -> bool {
        self.handler.borrow().is_some()
    }

    /// Invoke the registered handler on the calling thread.
    pub fn emit(&self, session: SessionId, message_type: &str, message_value: &str) {
        let handler = self.handler.borrow().clone();
        if let Some(handler) = handler {
            handler(session, message_type, message_value);
        }
    }

    /// Invoke the registered handler from a short-lived worker thread and
    /// wait for it, like the engine's maintenance thread would.
    pub fn emit_from_worker(&self, session: SessionId, message_type: &str, message_value: &str) {
        let handler = self.handler.borrow().clone();
        let Some(handler) = handler else {
            return;
        };
        let message_type = message_type.to_string();
        let message_value = message_value.to_string();
        std::thread::spawn(move || handler(session, &message_type, &message_value))
            .join()
            .expect("notification worker panicked");
    }

    // --- inspection ---

    pub fn setup_calls(&self) -> usize {
        self.counters.setup.get()
    }

    pub fn initialize_calls(&self) -> usize {
        self.counters.initialize.get()
    }

    pub fn finalize_calls(&self) -> usize {
        self.counters.finalize.get()
    }

    pub fn sync_calls(&self) -> usize {
        self.counters.sync.get()
    }

    pub fn process_key_calls(&self) -> usize {
        self.counters.process_key.get()
    }

    pub fn created_sessions(&self) -> usize {
        self.counters.created.get()
    }

    pub fn destroyed_sessions(&self) -> usize {
        self.counters.destroyed.get()
    }

    pub fn live_sessions(&self) -> usize {
        self.state.borrow().sessions.len()
    }

    pub fn candidate_lookups(&self) -> usize {
        self.counters.candidate_lookups.get()
    }

    pub fn option(&self, session: SessionId, name: &str) -> bool {
        self.state
            .borrow()
            .sessions
            .get(&session)
            .is_some_and(|s| s.option(name))
    }

    pub fn property(&self, session: SessionId, name: &str) -> Option<String> {
        self.state
            .borrow()
            .sessions
            .get(&session)
            .and_then(|s| s.properties.get(name).cloned())
    }

    pub fn schema_of(&self, session: SessionId) -> Option<String> {
        self.state
            .borrow()
            .sessions
            .get(&session)
            .map(|s| s.schema_id.clone())
    }

    pub fn input_of(&self, session: SessionId) -> Option<String> {
        self.state
            .borrow()
            .sessions
            .get(&session)
            .map(|s| s.input.clone())
    }

    pub fn deleted_candidates(&self, session: SessionId) -> Vec<usize> {
        self.state
            .borrow()
            .sessions
            .get(&session)
            .map(|s| s.deleted.clone())
            .unwrap_or_default()
    }

    fn set_option_quiet(&self, session: SessionId, option: &str, value: bool) -> bool {
        let mut st = self.state.borrow_mut();
        match st.sessions.get_mut(&session) {
            Some(s) => {
                s.options.insert(option.to_string(), value);
                true
            }
            None => false,
        }
    }

    fn commit_candidate(&self, session: SessionId, absolute: usize) -> bool {
        let mut st = self.state.borrow_mut();
        let total = st.candidate_total;
        let Some(s) = st.sessions.get_mut(&session) else {
            return false;
        };
        if s.input.is_empty() || absolute >= total {
            return false;
        }
        s.commit = Some(candidate_text(&s.input, absolute));
        s.clear_input();
        true
    }
}

impl EngineApi for FakeEngine {
    fn setup(&self, _traits: &EngineTraits) {
        bump(&self.counters.setup);
    }

    fn initialize(&self, _traits: &EngineTraits) {
        bump(&self.counters.initialize);
    }

    fn finalize(&self) {
        bump(&self.counters.finalize);
        let mut st = self.state.borrow_mut();
        let count = st.sessions.len();
        st.sessions.clear();
        drop(st);
        for _ in 0..count {
            bump(&self.counters.destroyed);
        }
    }

    fn start_maintenance(&self, full_check: bool) -> bool {
        if !full_check {
            return false;
        }
        let ok = self.state.borrow().deploy_ok;
        self.emit_from_worker(NO_SESSION, "deploy", "start");
        self.emit_from_worker(NO_SESSION, "deploy", if ok { "success" } else { "failure" });
        true
    }

    fn is_maintenance_mode(&self) -> bool {
        self.state.borrow().maintenance
    }

    fn sync_user_data(&self) -> bool {
        bump(&self.counters.sync);
        true
    }

    fn set_notification_handler(&self, handler: Option<NotificationHandler>) {
        *self.handler.borrow_mut() = handler;
    }

    fn create_session(&self) -> SessionId {
        let mut st = self.state.borrow_mut();
        if st.refuse_sessions {
            return NO_SESSION;
        }
        let id = st.next_id;
        st.next_id += 1;
        let schema_id = st
            .schemas
            .first()
            .map(|s| s.item.schema_id.clone())
            .unwrap_or_default();
        st.sessions.insert(
            id,
            FakeSession {
                schema_id,
                ..FakeSession::default()
            },
        );
        drop(st);
        bump(&self.counters.created);
        id
    }

    fn find_session(&self, session: SessionId) -> bool {
        self.state.borrow().sessions.contains_key(&session)
    }

    fn destroy_session(&self, session: SessionId) -> bool {
        let removed = self.state.borrow_mut().sessions.remove(&session).is_some();
        if removed {
            bump(&self.counters.destroyed);
        }
        removed
    }

    fn process_key(&self, session: SessionId, sym: u32, mask: u32) -> bool {
        bump(&self.counters.process_key);
        let mask = KeyStates::from_bits(mask);
        if mask.contains(KeyStates::RELEASE)
            || mask.test_any(KeyStates::CTRL | KeyStates::MOD1 | KeyStates::SUPER)
        {
            return false;
        }

        let mut notify: Option<(&str, String)> = None;
        let handled = {
            let mut st = self.state.borrow_mut();
            let total = st.candidate_total;
            let Some(s) = st.sessions.get_mut(&session) else {
                return false;
            };
            match sym {
                keysym::F4 => {
                    let value = !s.option("full_shape");
                    s.options.insert("full_shape".to_string(), value);
                    notify = Some(("option", option_message("full_shape", value)));
                    true
                }
                keysym::F5 => {
                    let value = !s.option("ascii_mode");
                    s.options.insert("ascii_mode".to_string(), value);
                    if !s.input.is_empty() {
                        s.commit = Some(s.input.clone());
                        s.clear_input();
                    }
                    notify = Some(("option", option_message("ascii_mode", value)));
                    true
                }
                _ if s.option("ascii_mode") => false,
                0x61..=0x7a => {
                    s.input.push(char::from(sym as u8));
                    s.page = 0;
                    s.highlighted = 0;
                    true
                }
                _ if s.input.is_empty() => false,
                keysym::BACKSPACE => {
                    s.input.pop();
                    s.page = 0;
                    s.highlighted = 0;
                    true
                }
                keysym::ESCAPE => {
                    s.clear_input();
                    true
                }
                keysym::SPACE => {
                    let absolute = s.page * PAGE_SIZE + s.highlighted;
                    if absolute < total {
                        s.commit = Some(candidate_text(&s.input, absolute));
                        s.clear_input();
                    }
                    true
                }
                keysym::RETURN => {
                    s.commit = Some(s.input.clone());
                    s.clear_input();
                    true
                }
                0x31..=0x35 => {
                    let absolute = s.page * PAGE_SIZE + (sym - 0x31) as usize;
                    if absolute < total {
                        s.commit = Some(candidate_text(&s.input, absolute));
                        s.clear_input();
                    }
                    true
                }
                keysym::PAGE_UP => {
                    s.page = s.page.saturating_sub(1);
                    s.highlighted = 0;
                    true
                }
                keysym::PAGE_DOWN => {
                    if (s.page + 1) * PAGE_SIZE < total {
                        s.page += 1;
                        s.highlighted = 0;
                    }
                    true
                }
                _ => false,
            }
        };
        if let Some((message_type, value)) = notify {
            self.emit(session, message_type, &value);
        }
        handled
    }

    fn clear_composition(&self, session: SessionId) {
        if let Some(s) = self.state.borrow_mut().sessions.get_mut(&session) {
            s.clear_input();
        }
    }

    fn get_commit(&self, session: SessionId) -> Option<String> {
        self.state
            .borrow_mut()
            .sessions
            .get_mut(&session)
            .and_then(|s| s.commit.take())
    }

    fn get_context(&self, session: SessionId) -> Option<EngineContext> {
        let st = self.state.borrow();
        let s = st.sessions.get(&session)?;
        if s.input.is_empty() {
            return Some(EngineContext::default());
        }
        let total = st.candidate_count(s);
        let start = s.page * PAGE_SIZE;
        let end = total.min(start + PAGE_SIZE);
        let candidates = (start..end)
            .map(|i| EngineCandidate::new(candidate_text(&s.input, i)))
            .collect();
        Some(EngineContext {
            composition: EngineComposition::whole(s.input.clone()),
            menu: EngineMenu {
                page_size: PAGE_SIZE,
                page_no: s.page,
                is_last_page: end >= total,
                highlighted_candidate_index: s.highlighted,
                candidates,
                select_keys: None,
            },
            commit_text_preview: Some(candidate_text(&s.input, start + s.highlighted)),
            select_labels: None,
        })
    }

    fn get_status(&self, session: SessionId) -> Option<EngineStatus> {
        let st = self.state.borrow();
        let s = st.sessions.get(&session)?;
        let schema_name = st.schema(&s.schema_id).map(|schema| schema.item.name.clone());
        Some(EngineStatus {
            schema_id: Some(s.schema_id.clone()),
            schema_name,
            is_disabled: st.maintenance,
            is_composing: !s.input.is_empty(),
            is_ascii_mode: s.option("ascii_mode"),
        })
    }

    fn get_input(&self, session: SessionId) -> Option<String> {
        self.input_of(session)
    }

    fn set_option(&self, session: SessionId, option: &str, value: bool) {
        if self.set_option_quiet(session, option, value) {
            self.emit(session, "option", &option_message(option, value));
        }
    }

    fn get_option(&self, session: SessionId, option: &str) -> bool {
        self.option(session, option)
    }

    fn set_property(&self, session: SessionId, property: &str, value: &str) {
        let stored = match self.state.borrow_mut().sessions.get_mut(&session) {
            Some(s) => {
                s.properties.insert(property.to_string(), value.to_string());
                true
            }
            None => false,
        };
        if stored {
            self.emit(session, "property", &format!("{property}={value}"));
        }
    }

    fn get_state_label(
        &self,
        session: SessionId,
        option: &str,
        state: bool,
        abbreviated: bool,
    ) -> Option<String> {
        let st = self.state.borrow();
        let s = st.sessions.get(&session)?;
        let schema = st.schema(&s.schema_id)?;
        let label = schema.switches.iter().find_map(|switch| match switch {
            SwitchSpec::Toggle { option: name, states } if name == option => {
                Some(states[usize::from(state)].clone())
            }
            SwitchSpec::Select { options, states } if state => options
                .iter()
                .position(|name| name == option)
                .and_then(|i| states.get(i).cloned()),
            _ => None,
        })?;
        Some(if abbreviated { first_char(&label) } else { label })
    }

    fn schema_list(&self) -> Vec<SchemaListItem> {
        self.state
            .borrow()
            .schemas
            .iter()
            .map(|s| s.item.clone())
            .collect()
    }

    fn schema_switches(&self, schema_id: &str) -> Vec<SwitchSpec> {
        self.state
            .borrow()
            .schema(schema_id)
            .map(|s| s.switches.clone())
            .unwrap_or_default()
    }

    fn select_schema(&self, session: SessionId, schema_id: &str) -> bool {
        let message = {
            let mut st = self.state.borrow_mut();
            let Some(name) = st.schema(schema_id).map(|s| s.item.name.clone()) else {
                return false;
            };
            let Some(s) = st.sessions.get_mut(&session) else {
                return false;
            };
            s.schema_id = schema_id.to_string();
            s.clear_input();
            format!("{schema_id}/{name}")
        };
        self.emit(session, "schema", &message);
        true
    }

    fn select_candidate(&self, session: SessionId, index: usize) -> bool {
        self.commit_candidate(session, index)
    }

    fn select_candidate_on_current_page(&self, session: SessionId, index: usize) -> bool {
        let page = match self.state.borrow().sessions.get(&session) {
            Some(s) => s.page,
            None => return false,
        };
        if index >= PAGE_SIZE {
            return false;
        }
        self.commit_candidate(session, page * PAGE_SIZE + index)
    }

    fn delete_candidate(&self, session: SessionId, index: usize) -> bool {
        let mut st = self.state.borrow_mut();
        let total = st.candidate_total;
        match st.sessions.get_mut(&session) {
            Some(s) if !s.input.is_empty() && index < total => {
                s.deleted.push(index);
                true
            }
            _ => false,
        }
    }

    fn delete_candidate_on_current_page(&self, session: SessionId, index: usize) -> bool {
        let page = match self.state.borrow().sessions.get(&session) {
            Some(s) => s.page,
            None => return false,
        };
        if index >= PAGE_SIZE {
            return false;
        }
        self.delete_candidate(session, page * PAGE_SIZE + index)
    }

    fn highlight_candidate(&self, session: SessionId, index: usize) -> bool {
        let mut st = self.state.borrow_mut();
        let total = st.candidate_total;
        match st.sessions.get_mut(&session) {
            Some(s) if !s.input.is_empty() && index < total => {
                s.page = index / PAGE_SIZE;
                s.highlighted = index % PAGE_SIZE;
                true
            }
            _ => false,
        }
    }

    fn candidate_at(&self, session: SessionId, index: usize) -> Option<EngineCandidate> {
        bump(&self.counters.candidate_lookups);
        let st = self.state.borrow();
        let s = st.sessions.get(&session)?;
        if index >= st.candidate_count(s) {
            return None;
        }
        Some(EngineCandidate::new(candidate_text(&s.input, index)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn type_str(fake: &FakeEngine, session: SessionId, text: &str) {
        for c in text.chars() {
            fake.process_key(session, c as u32, 0);
        }
    }

    #[test]
    fn letters_compose_and_space_commits() {
        let fake = FakeEngine::new();
        let session = fake.create_session();
        type_str(&fake, session, "ni");
        let ctx = fake.get_context(session).unwrap();
        assert_eq!(ctx.composition.preedit, "ni");
        assert_eq!(ctx.menu.candidates.len(), PAGE_SIZE);
        assert!(fake.process_key(session, keysym::SPACE, 0));
        assert_eq!(fake.get_commit(session).as_deref(), Some("NI0"));
        assert_eq!(fake.get_commit(session), None);
    }

    #[test]
    fn paging_reaches_last_page() {
        let fake = FakeEngine::new();
        let session = fake.create_session();
        type_str(&fake, session, "a");
        fake.process_key(session, keysym::PAGE_DOWN, 0);
        fake.process_key(session, keysym::PAGE_DOWN, 0);
        let menu = fake.get_context(session).unwrap().menu;
        assert_eq!(menu.page_no, 2);
        assert!(menu.is_last_page);
        assert_eq!(menu.candidates.len(), DEFAULT_CANDIDATE_TOTAL - 2 * PAGE_SIZE);
    }

    #[test]
    fn toggles_emit_option_notifications() {
        let fake = FakeEngine::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        fake.set_notification_handler(Some(Arc::new(
            move |_: SessionId, t: &str, v: &str| {
                sink.lock().unwrap().push(format!("{t}:{v}"));
            },
        )));
        let session = fake.create_session();
        fake.process_key(session, keysym::F4, 0);
        fake.set_option(session, "full_shape", false);
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["option:full_shape".to_string(), "option:!full_shape".to_string()]
        );
    }

    #[test]
    fn state_labels_follow_switches() {
        let fake = FakeEngine::new();
        let session = fake.create_session();
        assert_eq!(
            fake.get_state_label(session, "full_shape", true, false).as_deref(),
            Some("全角")
        );
        assert_eq!(
            fake.get_state_label(session, "zh_simp", true, true).as_deref(),
            Some("汉")
        );
        assert_eq!(fake.get_state_label(session, "zh_simp", false, true), None);
        assert_eq!(fake.get_state_label(session, "unknown", true, true), None);
    }

    #[test]
    fn candidate_at_counts_lookups() {
        let fake = FakeEngine::new();
        let session = fake.create_session();
        type_str(&fake, session, "a");
        assert!(fake.candidate_at(session, 11).is_some());
        assert!(fake.candidate_at(session, 12).is_none());
        assert_eq!(fake.candidate_lookups(), 2);
    }
}
