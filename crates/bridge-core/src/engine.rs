use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, error};

use crate::api::{EngineApi, EngineTraits, NotificationHandler};

/// Whether the engine's one-time `setup` call is still owed.
///
/// The engine only tolerates a single `setup` per process, while
/// `initialize`/`finalize` may cycle any number of times. The caller that
/// creates the first [`EngineHandle`] passes [`SetupToken::FirstRun`]; a handle
/// rebuilt later in the same process passes [`SetupToken::AlreadySetUp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupToken {
    FirstRun,
    AlreadySetUp,
}

/// Thin wrapper that owns the engine capability and its lifecycle state.
pub struct EngineHandle {
    api: Rc<dyn EngineApi>,
    traits: RefCell<EngineTraits>,
    setup: Cell<SetupToken>,
    running: Cell<bool>,
}

impl EngineHandle {
    pub fn new(api: Rc<dyn EngineApi>, traits: EngineTraits, setup: SetupToken) -> Self {
        Self {
            api,
            traits: RefCell::new(traits),
            setup: Cell::new(setup),
            running: Cell::new(false),
        }
    }

    pub fn api(&self) -> &dyn EngineApi {
        &*self.api
    }

    pub fn setup_token(&self) -> SetupToken {
        self.setup.get()
    }

    pub fn traits(&self) -> EngineTraits {
        self.traits.borrow().clone()
    }

    /// Replace the traits used by the next [`start`](Self::start).
    pub fn set_traits(&self, traits: EngineTraits) {
        *self.traits.borrow_mut() = traits;
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// False while the engine is deploying; callers treat that as "no engine".
    pub fn is_available(&self) -> bool {
        self.running.get() && !self.api.is_maintenance_mode()
    }

    /// Initialize the engine and kick off maintenance.
    ///
    /// Maintenance runs on the engine's own thread; its outcome is reported
    /// later through `handler`. A running engine is finalized first.
    pub fn start(&self, full_check: bool, handler: NotificationHandler) {
        if self.is_running() {
            debug!("restarting running engine");
            self.finalize();
        }
        let traits = self.traits.borrow().clone();
        if let Err(e) = std::fs::create_dir_all(&traits.user_data_dir) {
            if !traits.user_data_dir.is_dir() {
                error!(
                    dir = %traits.user_data_dir.display(),
                    "failed to create user directory: {e}"
                );
            }
        }

        if self.setup.get() == SetupToken::FirstRun {
            debug!(app = %traits.app_name, "engine setup");
            self.api.setup(&traits);
            self.setup.set(SetupToken::AlreadySetUp);
        }
        self.api.initialize(&traits);
        self.api.set_notification_handler(Some(handler));
        let started = self.api.start_maintenance(full_check);
        debug!(full_check, started, "engine started");
        self.running.set(true);
    }

    pub fn finalize(&self) {
        if !self.running.replace(false) {
            return;
        }
        self.api.set_notification_handler(None);
        self.api.finalize();
        debug!("engine finalized");
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.finalize();
    }
}
