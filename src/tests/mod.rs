mod status;

use std::path::Path;
use std::rc::Rc;

use bridge_core::testutil::FakeEngine;
use bridge_session::testutil::FakeInputContext;
use tempfile::TempDir;

use crate::{Bridge, Host, InputContext, KeyEvent, Settings, SetupToken, SharePolicy, Tip};

#[derive(Default)]
pub(super) struct FakeHost {
    pub contexts: Vec<FakeInputContext>,
    pub tips: Vec<Tip>,
    pub recent: Option<usize>,
}

impl Host for FakeHost {
    fn show_tip(&mut self, tip: &Tip) {
        self.tips.push(tip.clone());
    }

    fn for_each_input_context(&mut self, f: &mut dyn FnMut(&mut dyn InputContext)) {
        for ic in &mut self.contexts {
            f(ic);
        }
    }

    fn most_recent_input_context(&mut self) -> Option<&mut dyn InputContext> {
        let index = self.recent?;
        self.contexts
            .get_mut(index)
            .map(|ic| ic as &mut dyn InputContext)
    }
}

pub(super) struct Harness {
    pub fake: Rc<FakeEngine>,
    pub bridge: Bridge,
    pub host: FakeHost,
    pub dir: TempDir,
}

impl Harness {
    pub fn new(policy: SharePolicy) -> Self {
        let dir = tempfile::tempdir().unwrap();
        Self::with_settings(test_settings(dir.path(), policy), dir)
    }

    pub fn with_settings(settings: Settings, dir: TempDir) -> Self {
        let fake = Rc::new(FakeEngine::new());
        let bridge = Bridge::new(fake.clone(), settings, SetupToken::FirstRun, None);
        let host = FakeHost {
            contexts: vec![
                FakeInputContext::new(1, "kate"),
                FakeInputContext::new(2, "kate"),
                FakeInputContext::new(3, "firefox"),
            ],
            tips: Vec::new(),
            recent: Some(0),
        };
        Self {
            fake,
            bridge,
            host,
            dir,
        }
    }

    pub fn settings(&self, policy: SharePolicy) -> Settings {
        test_settings(self.dir.path(), policy)
    }

    pub fn type_text(&mut self, index: usize, text: &str) {
        for c in text.chars() {
            let event = KeyEvent::from_char(c).expect("printable test input");
            self.bridge.key_event(&mut self.host.contexts[index], &event);
        }
    }

    pub fn press(&mut self, index: usize, sym: u32) -> bool {
        self.bridge
            .key_event(&mut self.host.contexts[index], &KeyEvent::press(sym))
    }

    pub fn activate(&mut self, index: usize) {
        self.bridge.activate(&mut self.host.contexts[index]);
    }

    pub fn session_of(&self, index: usize) -> Option<bridge_core::SessionId> {
        let uuid = self.host.contexts[index].uuid;
        self.bridge
            .existing_state(&uuid)
            .and_then(|state| state.session_handle())
            .map(|handle| handle.id())
    }
}

pub(super) fn test_settings(dir: &Path, policy: SharePolicy) -> Settings {
    let mut settings = Settings::default();
    settings.engine.shared_data_dir = dir.join("shared");
    settings.engine.user_data_dir = dir.join("user");
    settings.session.share_policy = policy;
    settings
}
