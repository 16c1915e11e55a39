//! The input method addon.
//!
//! A [`Bridge`] owns the [`Runtime`] and one [`ContextState`] per input
//! context, created the first time the host hands that context in. Engine
//! lifecycle actions (deploy, sync, config reload) release every session and
//! restart the engine; the snapshot taken on the way down is replayed when
//! each context asks for a session again.

mod service;
mod status;

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use bridge_core::{
    EngineApi, EngineHandle, EngineTraits, KeyEvent, SessionId, Settings, SetupToken,
    SwitchInputMethodBehavior,
};
use bridge_session::{
    CandidateView, CandidateWord, ContextState, InputContext, PoolError, RouterAction, Runtime,
    UiComponent, Waker,
};
use tracing::{debug, debug_span};

use crate::host::Host;

pub use status::{StatusEntry, DEPLOY_ACTION, IM_ACTION, SYNC_ACTION};

type Uuid = [u8; 16];

pub struct Bridge {
    // Declared before `runtime` so sessions are destroyed before the engine
    // finalizes.
    states: HashMap<Uuid, ContextState>,
    active: HashSet<Uuid>,
    runtime: Rc<Runtime>,
}

impl Bridge {
    /// Start the engine and return an addon with no contexts yet.
    pub fn new(
        api: Rc<dyn EngineApi>,
        settings: Settings,
        setup: SetupToken,
        waker: Option<Waker>,
    ) -> Self {
        let traits = EngineTraits::from_settings(&settings.engine);
        let engine = Rc::new(EngineHandle::new(api, traits, setup));
        let runtime = Rc::new(Runtime::new(engine, settings, waker));
        runtime.start_engine(false);
        Self {
            states: HashMap::new(),
            active: HashSet::new(),
            runtime,
        }
    }

    pub fn runtime(&self) -> &Rc<Runtime> {
        &self.runtime
    }

    /// State of `ic`, created on first use.
    pub fn state(&mut self, ic: &dyn InputContext) -> &mut ContextState {
        let runtime = &self.runtime;
        self.states
            .entry(ic.uuid())
            .or_insert_with(|| ContextState::for_context(runtime.clone(), ic))
    }

    pub fn existing_state(&self, uuid: &Uuid) -> Option<&ContextState> {
        self.states.get(uuid)
    }

    /// Forget a destroyed input context; its session goes with it unless
    /// another context shares it.
    pub fn remove_context(&mut self, uuid: &Uuid) {
        self.active.remove(uuid);
        self.states.remove(uuid);
    }

    pub fn is_active(&self, uuid: &Uuid) -> bool {
        self.active.contains(uuid)
    }

    // --- input ---

    pub fn key_event(&mut self, ic: &mut dyn InputContext, event: &KeyEvent) -> bool {
        self.state(ic).key_event(ic, event)
    }

    pub fn activate(&mut self, ic: &mut dyn InputContext) {
        self.active.insert(ic.uuid());
        self.state(ic).activate();
        ic.update_user_interface(UiComponent::StatusArea);
    }

    /// `switching` is set when the user moves to another input method rather
    /// than the context losing focus; pending input is then handled per
    /// `behavior.switch_input_method`.
    pub fn deactivate(&mut self, ic: &mut dyn InputContext, switching: bool) {
        if switching {
            let behavior = self.runtime.settings().behavior.switch_input_method;
            debug!(?behavior, "switching input method");
            let state = self.state(ic);
            match behavior {
                SwitchInputMethodBehavior::Clear => {}
                SwitchInputMethodBehavior::CommitRawInput => state.commit_input(ic),
                SwitchInputMethodBehavior::CommitComposingText => state.commit_composing(ic),
                SwitchInputMethodBehavior::CommitCommitPreview => state.commit_preedit(ic),
            }
        }
        self.active.remove(&ic.uuid());
        ic.update_user_interface(UiComponent::StatusArea);
        self.reset(ic);
    }

    pub fn reset(&mut self, ic: &mut dyn InputContext) {
        let state = self.state(ic);
        state.clear();
        state.panel_mut().reset();
        ic.update_preedit(state.panel());
        ic.update_user_interface(UiComponent::InputPanel);
    }

    // --- candidates ---

    /// Candidate list currently shown for `uuid`.
    pub fn candidate_list(&self, uuid: &Uuid) -> Option<Rc<CandidateView>> {
        self.states.get(uuid)?.panel().candidate_list().cloned()
    }

    pub fn select_candidate(&mut self, ic: &mut dyn InputContext, word: &CandidateWord) {
        let Some(view) = self.candidate_list(&ic.uuid()) else {
            return;
        };
        view.select(word, self.state(ic), ic);
    }

    pub fn trigger_candidate_action(
        &mut self,
        ic: &mut dyn InputContext,
        word: &CandidateWord,
        action: u32,
    ) {
        let Some(view) = self.candidate_list(&ic.uuid()) else {
            return;
        };
        view.trigger_action(word, action, self.state(ic), ic);
    }

    // --- engine lifecycle ---

    /// Drop every context's session. With `snapshot`, each context first
    /// records its schema and options for the next session to pick up.
    pub fn release_all_sessions(&mut self, snapshot: bool) {
        for state in self.states.values_mut() {
            if snapshot {
                state.snapshot();
            }
            state.release();
        }
        debug!(
            live = self.runtime.pool().live_sessions(),
            "released all sessions"
        );
    }

    /// Redeploy engine data. `ic` is the context that asked for it.
    pub fn deploy(&mut self, ic: &mut dyn InputContext) {
        let _span = debug_span!("deploy").entered();
        self.release_all_sessions(true);
        self.runtime.api().sync_user_data();
        self.runtime.engine().finalize();
        self.runtime.start_engine(true);
        if ic.has_focus() {
            self.state(ic).update_ui(ic, false);
        }
    }

    pub fn sync(&mut self, ic: &mut dyn InputContext) {
        self.runtime.api().sync_user_data();
        if ic.has_focus() {
            self.state(ic).update_ui(ic, false);
        }
    }

    /// Apply new settings. Every session is released first, so the share
    /// policy can change; the engine restarts even if that fails.
    pub fn reload_config(
        &mut self,
        settings: Settings,
        host: &mut dyn Host,
    ) -> Result<(), PoolError> {
        let _span = debug_span!("reload_config").entered();
        self.release_all_sessions(true);
        self.runtime.engine().finalize();

        let policy = settings.session.share_policy;
        self.runtime
            .engine()
            .set_traits(EngineTraits::from_settings(&settings.engine));
        self.runtime.set_settings(settings);
        let applied = self.runtime.pool().set_policy(policy);

        self.runtime.start_engine(false);
        self.refresh_status_areas(host);
        applied
    }

    // --- notifications ---

    /// Drain and apply engine notifications. Call from the main loop after
    /// the waker fired.
    pub fn dispatch_notifications(&mut self, host: &mut dyn Host) {
        let in_maintenance = self.runtime.api().is_maintenance_mode();
        for action in self.runtime.router().dispatch(in_maintenance) {
            match action {
                RouterAction::ShowTip(tip) => host.show_tip(&tip),
                RouterAction::RefreshSchemaMenu => {
                    self.runtime.reload_catalog();
                    self.refresh_status_areas(host);
                }
                // Entries are built on demand, so a rebuild is a refresh.
                RouterAction::UpdateStatusArea(session)
                | RouterAction::RebuildStatusArea(session) => {
                    self.refresh_status_areas_of(host, session);
                }
            }
        }
    }

    fn refresh_status_areas(&self, host: &mut dyn Host) {
        let active = &self.active;
        host.for_each_input_context(&mut |ic| {
            if active.contains(&ic.uuid()) {
                ic.update_user_interface(UiComponent::StatusArea);
            }
        });
    }

    fn refresh_status_areas_of(&self, host: &mut dyn Host, session: SessionId) {
        let active = &self.active;
        let states = &self.states;
        host.for_each_input_context(&mut |ic| {
            let uuid = ic.uuid();
            let uses_session = states
                .get(&uuid)
                .and_then(ContextState::session_handle)
                .is_some_and(|handle| handle.id() == session);
            if uses_session && active.contains(&uuid) {
                ic.update_user_interface(UiComponent::StatusArea);
            }
        });
    }
}
