//! Recording input context and runtime wiring for tests.

use std::collections::HashMap;
use std::rc::Rc;

use bridge_core::testutil::FakeEngine;
use bridge_core::{EngineHandle, EngineTraits, Settings, SetupToken};

use crate::host::{ComposeResult, InputContext, UiComponent};
use crate::runtime::Runtime;
use crate::text::InputPanel;

/// Input context that records everything the bridge asks of it.
#[derive(Debug, Default)]
pub struct FakeInputContext {
    pub uuid: [u8; 16],
    pub program: String,
    pub preedit_capable: bool,
    pub focused: bool,
    /// Scripted compose results by keysym; anything else passes through.
    pub compose: HashMap<u32, ComposeResult>,
    pub commits: Vec<String>,
    pub compose_resets: usize,
    /// Client preedit text after each push.
    pub preedits: Vec<String>,
    pub ui_updates: Vec<UiComponent>,
    pub info_shown: usize,
    pub custom_info: Vec<String>,
}

impl FakeInputContext {
    pub fn new(id: u8, program: &str) -> Self {
        let mut uuid = [0u8; 16];
        uuid[0] = id;
        uuid[15] = id;
        Self {
            uuid,
            program: program.to_string(),
            preedit_capable: true,
            focused: true,
            ..Self::default()
        }
    }

    pub fn with_compose(mut self, sym: u32, result: ComposeResult) -> Self {
        self.compose.insert(sym, result);
        self
    }

    pub fn ui_update_count(&self, component: UiComponent) -> usize {
        self.ui_updates.iter().filter(|c| **c == component).count()
    }

    pub fn last_preedit(&self) -> Option<&str> {
        self.preedits.last().map(String::as_str)
    }
}

impl InputContext for FakeInputContext {
    fn uuid(&self) -> [u8; 16] {
        self.uuid
    }

    fn program(&self) -> &str {
        &self.program
    }

    fn supports_preedit(&self) -> bool {
        self.preedit_capable
    }

    fn has_focus(&self) -> bool {
        self.focused
    }

    fn commit_string(&mut self, text: &str) {
        self.commits.push(text.to_string());
    }

    fn process_compose(&mut self, sym: u32) -> ComposeResult {
        self.compose
            .get(&sym)
            .cloned()
            .unwrap_or(ComposeResult::Passthrough)
    }

    fn reset_compose(&mut self) {
        self.compose_resets += 1;
    }

    fn update_preedit(&mut self, panel: &InputPanel) {
        self.preedits.push(panel.client_preedit().to_string());
    }

    fn update_user_interface(&mut self, component: UiComponent) {
        self.ui_updates.push(component);
    }

    fn show_input_method_information(&mut self) {
        self.info_shown += 1;
    }

    fn show_custom_input_method_information(&mut self, text: &str) {
        self.custom_info.push(text.to_string());
    }
}

/// Engine traits pointing at a per-process scratch directory.
pub fn test_traits() -> EngineTraits {
    let root = std::env::temp_dir().join(format!("rime-bridge-tests-{}", std::process::id()));
    EngineTraits {
        shared_data_dir: root.join("shared"),
        user_data_dir: root.join("user"),
        app_name: "rime.test".to_string(),
        distribution_name: "Rime".to_string(),
        distribution_code_name: "rime-bridge".to_string(),
        distribution_version: "0.1.0".to_string(),
    }
}

/// Runtime over `fake`, already started without a full check.
pub fn started_runtime(fake: Rc<FakeEngine>, settings: Settings) -> Rc<Runtime> {
    let engine = Rc::new(EngineHandle::new(fake, test_traits(), SetupToken::FirstRun));
    let runtime = Rc::new(Runtime::new(engine, settings, None));
    runtime.start_engine(false);
    runtime
}
