use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::rc::{Rc, Weak};

use bridge_core::settings::AppOptions;
use bridge_core::{EngineHandle, SessionId, SharePolicy, NO_SESSION};
use tracing::{debug, warn};

use crate::host::InputContext;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("engine refused to create a session")]
    CreateFailed,
}

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("cannot change share policy while {live} sessions are live")]
    SessionsLive { live: usize },
}

type SessionIndex = RefCell<HashMap<String, Weak<SessionHandle>>>;

/// What the pool needs to know about an input context to derive its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextIdentity<'a> {
    pub uuid: [u8; 16],
    pub program: &'a str,
}

impl<'a> ContextIdentity<'a> {
    pub fn of(ic: &'a dyn InputContext) -> Self {
        Self {
            uuid: ic.uuid(),
            program: ic.program(),
        }
    }
}

fn uuid_key(uuid: &[u8; 16]) -> String {
    let mut key = String::with_capacity(2 + 32);
    key.push_str("u:");
    for b in uuid {
        let _ = write!(key, "{b:02x}");
    }
    key
}

/// Registration key of the session an input context maps to.
pub fn session_key(policy: SharePolicy, identity: &ContextIdentity<'_>) -> String {
    match policy {
        SharePolicy::PerContext => uuid_key(&identity.uuid),
        SharePolicy::PerProgram if identity.program.is_empty() => uuid_key(&identity.uuid),
        SharePolicy::PerProgram => format!("p:{}", identity.program),
        SharePolicy::Global => "g:".to_string(),
    }
}

/// One live engine session, shared by every context whose key maps to it.
///
/// Dropping the last `Rc` destroys the engine session and removes the key
/// from the pool.
pub struct SessionHandle {
    id: SessionId,
    key: String,
    program: RefCell<String>,
    engine: Rc<EngineHandle>,
    index: Weak<SessionIndex>,
}

impl SessionHandle {
    fn create(
        engine: Rc<EngineHandle>,
        key: String,
        program: &str,
        app_options: &AppOptions,
        index: Weak<SessionIndex>,
    ) -> Result<Rc<Self>, SessionError> {
        let id = engine.api().create_session();
        if id == NO_SESSION {
            return Err(SessionError::CreateFailed);
        }
        let handle = Rc::new(Self {
            id,
            key,
            program: RefCell::new(String::new()),
            engine,
            index,
        });
        handle.set_program_name(program);

        if let Some(options) = app_options.get(program).filter(|_| !program.is_empty()) {
            debug!(program, ?options, "apply app options");
            for (option, value) in options {
                handle.engine.api().set_option(id, option, *value);
            }
        }
        Ok(handle)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn program(&self) -> String {
        self.program.borrow().clone()
    }

    /// Push `program` as the engine's `client_app` property. Writes trigger
    /// engine notifications, so an unchanged name is skipped.
    pub fn set_program_name(&self, program: &str) {
        if *self.program.borrow() == program {
            return;
        }
        *self.program.borrow_mut() = program.to_string();
        self.engine.api().set_property(self.id, "client_app", program);
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("key", &self.key)
            .finish()
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.engine.api().destroy_session(self.id);
        if let Some(index) = self.index.upgrade() {
            let mut index = index.borrow_mut();
            // The key may already point at a newer handle.
            if index.get(&self.key).is_some_and(|w| w.strong_count() == 0) {
                index.remove(&self.key);
            }
        }
        debug!(session = self.id, key = %self.key, "session destroyed");
    }
}

/// Keyed index of live sessions under one share policy.
pub struct SessionPool {
    engine: Rc<EngineHandle>,
    policy: Cell<SharePolicy>,
    sessions: Rc<SessionIndex>,
    app_options: RefCell<AppOptions>,
}

impl SessionPool {
    pub fn new(engine: Rc<EngineHandle>, policy: SharePolicy, app_options: AppOptions) -> Self {
        Self {
            engine,
            policy: Cell::new(policy),
            sessions: Rc::new(RefCell::new(HashMap::new())),
            app_options: RefCell::new(app_options),
        }
    }

    pub fn policy(&self) -> SharePolicy {
        self.policy.get()
    }

    /// Switch key derivation. Only legal while no session is live.
    pub fn set_policy(&self, policy: SharePolicy) -> Result<(), PoolError> {
        if self.policy.get() == policy {
            return Ok(());
        }
        let live = self.live_sessions();
        debug_assert!(live == 0, "share policy changed with {live} live sessions");
        if live != 0 {
            return Err(PoolError::SessionsLive { live });
        }
        self.sessions.borrow_mut().clear();
        self.policy.set(policy);
        Ok(())
    }

    pub fn set_app_options(&self, app_options: AppOptions) {
        *self.app_options.borrow_mut() = app_options;
    }

    pub fn live_sessions(&self) -> usize {
        self.sessions
            .borrow()
            .values()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    pub fn is_registered(&self, key: &str) -> bool {
        self.sessions
            .borrow()
            .get(key)
            .is_some_and(|w| w.strong_count() > 0)
    }

    /// Live handle for `identity`'s key, creating one if needed. The flag is
    /// true for a freshly created session.
    pub fn request(&self, identity: &ContextIdentity<'_>) -> Option<(Rc<SessionHandle>, bool)> {
        let key = session_key(self.policy.get(), identity);
        let existing = self.sessions.borrow().get(&key).and_then(Weak::upgrade);
        if let Some(handle) = existing {
            return Some((handle, false));
        }
        if !self.engine.is_available() {
            debug!(%key, "engine unavailable, no session");
            return None;
        }

        let created = SessionHandle::create(
            self.engine.clone(),
            key.clone(),
            identity.program,
            &self.app_options.borrow(),
            Rc::downgrade(&self.sessions),
        );
        match created {
            Ok(handle) => {
                debug!(session = handle.id(), %key, "session created");
                self.sessions
                    .borrow_mut()
                    .insert(key, Rc::downgrade(&handle));
                Some((handle, true))
            }
            Err(e) => {
                warn!(%key, "{e}");
                None
            }
        }
    }
}
