//! Engine notifications, from whichever thread the engine calls us on, to
//! actions on the main loop.
//!
//! The handler returned by [`NotificationRouter::handler`] never touches
//! main-thread state. It records option changes into the key event currently
//! running on the main thread (if any, and only when called on that thread),
//! then sends a copy of the notification down an `mpsc` channel and pokes the
//! host's waker. The main loop drains the channel with
//! [`NotificationRouter::dispatch`].

use std::cell::{Cell, RefCell};
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::{mpsc, Arc};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use bridge_core::{NotificationHandler, SessionId};
use tracing::{debug, debug_span};

/// Host callback that schedules a main-loop iteration.
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// One engine notification, captured by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub session: SessionId,
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TipKind {
    DeployStart,
    DeploySuccess,
    DeployFailure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tip {
    pub kind: TipKind,
    pub id: &'static str,
    pub icon: &'static str,
    pub title: &'static str,
    pub message: &'static str,
}

impl Tip {
    fn deploy(kind: TipKind) -> Self {
        let message = match kind {
            TipKind::DeployStart => {
                "Rime is under maintenance. It may take a few seconds. \
                 Please wait until it is finished..."
            }
            TipKind::DeploySuccess => "Rime is ready.",
            TipKind::DeployFailure => "Rime has encountered an error. See log for details.",
        };
        Self {
            kind,
            id: "fcitx-rime-deploy",
            icon: "fcitx_rime_deploy",
            title: "Rime",
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterAction {
    ShowTip(Tip),
    /// The schema list may have changed.
    RefreshSchemaMenu,
    /// Option texts of contexts using this session are stale.
    UpdateStatusArea(SessionId),
    /// The session switched schema; its option actions must be rebuilt.
    RebuildStatusArea(SessionId),
}

struct KeyEventCapture {
    session: SessionId,
    changed: Rc<RefCell<Vec<String>>>,
}

thread_local! {
    static KEY_EVENT: RefCell<Option<KeyEventCapture>> = const { RefCell::new(None) };
}

/// Marks `session` as processing a key event on this thread until dropped.
pub struct KeyEventScope {
    previous: Option<KeyEventCapture>,
    _not_send: PhantomData<Rc<()>>,
}

impl KeyEventScope {
    pub fn enter(session: SessionId, changed: Rc<RefCell<Vec<String>>>) -> Self {
        let previous =
            KEY_EVENT.with(|slot| slot.replace(Some(KeyEventCapture { session, changed })));
        Self {
            previous,
            _not_send: PhantomData,
        }
    }
}

impl Drop for KeyEventScope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        KEY_EVENT.with(|slot| *slot.borrow_mut() = previous);
    }
}

fn capture_immediate(session: SessionId, kind: &str, value: &str) {
    if kind != "option" {
        return;
    }
    KEY_EVENT.with(|slot| {
        if let Some(capture) = slot.borrow().as_ref() {
            if capture.session == session {
                capture.changed.borrow_mut().push(value.to_string());
            }
        }
    });
}

pub struct NotificationRouter {
    sender: mpsc::Sender<Notification>,
    receiver: mpsc::Receiver<Notification>,
    main_thread: ThreadId,
    waker: Option<Waker>,
    silence: Cell<Duration>,
    silenced_until: Cell<Option<Instant>>,
}

impl NotificationRouter {
    /// Must be created on the main thread.
    pub fn new(silence: Duration, waker: Option<Waker>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            main_thread: thread::current().id(),
            waker,
            silence: Cell::new(silence),
            silenced_until: Cell::new(None),
        }
    }

    /// Handler to register with the engine.
    pub fn handler(&self) -> NotificationHandler {
        let sender = self.sender.clone();
        let main_thread = self.main_thread;
        let waker = self.waker.clone();
        Arc::new(move |session: SessionId, kind: &str, value: &str| {
            debug!(session, kind, value, "engine notification");
            if thread::current().id() == main_thread {
                capture_immediate(session, kind, value);
            }
            let notification = Notification {
                session,
                kind: kind.to_string(),
                value: value.to_string(),
            };
            if sender.send(notification).is_err() {
                return;
            }
            if let Some(waker) = &waker {
                waker();
            }
        })
    }

    pub fn set_silence_window(&self, silence: Duration) {
        self.silence.set(silence);
    }

    pub fn silence_window(&self) -> Duration {
        self.silence.get()
    }

    /// Suppress tips for `duration` from now.
    pub fn block_for(&self, duration: Duration) {
        self.silenced_until.set(Some(Instant::now() + duration));
    }

    /// Suppress tips for the configured window.
    pub fn block(&self) {
        self.block_for(self.silence.get());
    }

    pub fn is_silenced(&self) -> bool {
        self.silenced_until
            .get()
            .is_some_and(|deadline| Instant::now() < deadline)
    }

    /// Notifications queued so far, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        self.receiver.try_iter().collect()
    }

    /// Actions for one notification. `in_maintenance` is the engine's state
    /// at dispatch time.
    pub fn route(&self, notification: &Notification, in_maintenance: bool) -> Vec<RouterAction> {
        let mut actions = Vec::new();
        let mut tip = None;
        let mut block_after = false;
        match notification.kind.as_str() {
            "deploy" => match notification.value.as_str() {
                "start" => tip = Some(TipKind::DeployStart),
                "success" => {
                    tip = Some(TipKind::DeploySuccess);
                    if !in_maintenance {
                        actions.push(RouterAction::RefreshSchemaMenu);
                    }
                    block_after = true;
                }
                "failure" => {
                    tip = Some(TipKind::DeployFailure);
                    block_after = true;
                }
                _ => {}
            },
            "option" => actions.push(RouterAction::UpdateStatusArea(notification.session)),
            "schema" => actions.push(RouterAction::RebuildStatusArea(notification.session)),
            _ => {}
        }

        if let Some(kind) = tip {
            if self.is_silenced() {
                debug!(?kind, "tip suppressed");
            } else {
                actions.push(RouterAction::ShowTip(Tip::deploy(kind)));
            }
        }
        if block_after {
            self.block();
        }
        actions
    }

    /// Drain the channel and route everything in arrival order.
    pub fn dispatch(&self, in_maintenance: bool) -> Vec<RouterAction> {
        let _span = debug_span!("dispatch_notifications").entered();
        self.drain()
            .iter()
            .flat_map(|n| self.route(n, in_maintenance))
            .collect()
    }
}
