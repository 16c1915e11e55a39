mod candidates;
mod notification;

use std::rc::Rc;

use bridge_core::key::keysym;
use bridge_core::testutil::FakeEngine;
use bridge_core::{KeyEvent, Settings, SharePolicy};

use crate::testutil::{started_runtime, FakeInputContext};
use crate::{ContextState, Runtime};

pub(super) struct Harness {
    pub fake: Rc<FakeEngine>,
    pub runtime: Rc<Runtime>,
}

impl Harness {
    pub fn new(policy: SharePolicy) -> Self {
        Self::with_settings(settings_with_policy(policy))
    }

    pub fn with_settings(settings: Settings) -> Self {
        let fake = Rc::new(FakeEngine::new());
        let runtime = started_runtime(fake.clone(), settings);
        Self { fake, runtime }
    }

    pub fn state(&self, ic: &FakeInputContext) -> ContextState {
        ContextState::for_context(self.runtime.clone(), ic)
    }
}

pub(super) fn settings_with_policy(policy: SharePolicy) -> Settings {
    let mut settings = Settings::default();
    settings.session.share_policy = policy;
    settings
}

pub(super) fn press(state: &mut ContextState, ic: &mut FakeInputContext, sym: u32) -> bool {
    state.key_event(ic, &KeyEvent::press(sym))
}

pub(super) fn type_text(state: &mut ContextState, ic: &mut FakeInputContext, text: &str) {
    for c in text.chars() {
        let event = KeyEvent::from_char(c).expect("printable test input");
        state.key_event(ic, &event);
    }
}

pub(super) fn commit_with_space(state: &mut ContextState, ic: &mut FakeInputContext) -> bool {
    press(state, ic, keysym::SPACE)
}
