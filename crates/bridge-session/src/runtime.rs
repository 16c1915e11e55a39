use std::cell::{Ref, RefCell};
use std::rc::Rc;

use bridge_core::{EngineApi, EngineHandle, Settings};

use crate::actions::SchemaCatalog;
use crate::notification::{NotificationRouter, Waker};
use crate::pool::SessionPool;

/// Main-thread state shared by every context.
pub struct Runtime {
    engine: Rc<EngineHandle>,
    pool: SessionPool,
    router: NotificationRouter,
    catalog: RefCell<SchemaCatalog>,
    settings: RefCell<Settings>,
}

impl Runtime {
    pub fn new(engine: Rc<EngineHandle>, settings: Settings, waker: Option<Waker>) -> Self {
        let pool = SessionPool::new(
            engine.clone(),
            settings.session.share_policy,
            settings.app_options.clone(),
        );
        let router = NotificationRouter::new(settings.silence_window(), waker);
        Self {
            engine,
            pool,
            router,
            catalog: RefCell::new(SchemaCatalog::default()),
            settings: RefCell::new(settings),
        }
    }

    pub fn engine(&self) -> &Rc<EngineHandle> {
        &self.engine
    }

    pub fn api(&self) -> &dyn EngineApi {
        self.engine.api()
    }

    pub fn pool(&self) -> &SessionPool {
        &self.pool
    }

    pub fn router(&self) -> &NotificationRouter {
        &self.router
    }

    pub fn settings(&self) -> Ref<'_, Settings> {
        self.settings.borrow()
    }

    /// Replace the settings. The share policy is left to the caller, which
    /// has to release every session first.
    pub fn set_settings(&self, settings: Settings) {
        self.router.set_silence_window(settings.silence_window());
        self.pool.set_app_options(settings.app_options.clone());
        *self.settings.borrow_mut() = settings;
    }

    pub fn catalog(&self) -> Ref<'_, SchemaCatalog> {
        self.catalog.borrow()
    }

    /// Re-read schemas and their switches from the engine.
    pub fn reload_catalog(&self) {
        let catalog = SchemaCatalog::load(self.engine.api());
        *self.catalog.borrow_mut() = catalog;
    }

    /// Start (or restart) the engine with this runtime's notification
    /// handler.
    pub fn start_engine(&self, full_check: bool) {
        self.engine.start(full_check, self.router.handler());
        self.reload_catalog();
    }
}
