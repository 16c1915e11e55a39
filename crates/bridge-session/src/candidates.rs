use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use bridge_core::key::keysym;
use bridge_core::{EngineCandidate, EngineContext, EngineHandle, KeyEvent};
use tracing::debug;

use crate::host::InputContext;
use crate::pool::SessionHandle;
use crate::state::ContextState;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CandidateError {
    #[error("invalid candidate index {0}")]
    InvalidIndex(usize),
    #[error("no engine session")]
    NoSession,
}

/// Where a candidate came from, which decides the engine call used to act
/// on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    /// Index within the current page, and the key that selects it.
    Page { index: usize, sym: u32 },
    /// Absolute index in the whole candidate list.
    Global { index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateWord {
    pub text: String,
    pub comment: Option<String>,
    pub kind: CandidateKind,
}

impl CandidateWord {
    fn new(candidate: &EngineCandidate, kind: CandidateKind) -> Self {
        Self {
            text: candidate.text.clone(),
            comment: candidate.comment.clone().filter(|c| !c.is_empty()),
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateAction {
    pub id: u32,
    pub text: &'static str,
}

pub const FORGET_WORD_ACTION: CandidateAction = CandidateAction {
    id: 0,
    text: "Forget word",
};

/// One page of the engine menu plus lazy access to the full list.
pub struct CandidateView {
    engine: Rc<EngineHandle>,
    session: Weak<SessionHandle>,
    labels: Vec<String>,
    words: Vec<CandidateWord>,
    cursor: Option<usize>,
    has_prev: bool,
    has_next: bool,
    global: RefCell<Vec<Option<CandidateWord>>>,
    // Smallest index the engine reported as missing.
    max_size: Cell<usize>,
}

impl CandidateView {
    pub fn new(engine: Rc<EngineHandle>, session: &Rc<SessionHandle>, context: &EngineContext) -> Self {
        let menu = &context.menu;
        let select_keys: Vec<char> = menu
            .select_keys
            .as_deref()
            .map(|k| k.chars().collect())
            .unwrap_or_default();
        let select_labels = context.select_labels.as_deref();

        let mut labels = Vec::with_capacity(menu.candidates.len());
        let mut words = Vec::with_capacity(menu.candidates.len());
        let mut cursor = None;
        for (i, candidate) in menu.candidates.iter().enumerate() {
            let digit = char::from(b'0' + ((i + 1) % 10) as u8);
            let mut label = match (select_labels.and_then(|l| l.get(i)), select_keys.get(i)) {
                (Some(label), _) if i < menu.page_size => label.clone(),
                (_, Some(key)) => key.to_string(),
                _ => digit.to_string(),
            };
            label.push(' ');
            labels.push(label);

            let sym = select_keys.get(i).copied().unwrap_or(digit) as u32;
            words.push(CandidateWord::new(candidate, CandidateKind::Page { index: i, sym }));
            if i == menu.highlighted_candidate_index {
                cursor = Some(i);
            }
        }

        Self {
            engine,
            session: Rc::downgrade(session),
            labels,
            words,
            cursor,
            has_prev: menu.page_no != 0,
            has_next: !menu.is_last_page,
            global: RefCell::new(Vec::new()),
            max_size: Cell::new(usize::MAX),
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn candidate(&self, index: usize) -> Option<&CandidateWord> {
        self.words.get(index)
    }

    pub fn cursor_index(&self) -> Option<usize> {
        self.cursor
    }

    pub fn has_prev(&self) -> bool {
        self.has_prev
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }

    /// Paging is a composing-state change, so it goes through a key event.
    pub fn prev(&self, state: &mut ContextState, ic: &mut dyn InputContext) {
        state.key_event(ic, &KeyEvent::press(keysym::PAGE_UP));
    }

    pub fn next(&self, state: &mut ContextState, ic: &mut dyn InputContext) {
        state.key_event(ic, &KeyEvent::press(keysym::PAGE_DOWN));
    }

    pub fn select(&self, word: &CandidateWord, state: &mut ContextState, ic: &mut dyn InputContext) {
        match word.kind {
            CandidateKind::Page { index, .. } => state.select_candidate(ic, index, false),
            CandidateKind::Global { index } => state.select_candidate(ic, index, true),
        }
    }

    /// Candidate at absolute `index`, looked up through the engine on a
    /// cache miss.
    pub fn candidate_from_all(&self, index: usize) -> Result<CandidateWord, CandidateError> {
        if self.is_empty() {
            return Err(CandidateError::InvalidIndex(index));
        }
        let session = self.session.upgrade().ok_or(CandidateError::NoSession)?;

        if let Some(Some(word)) = self.global.borrow().get(index) {
            return Ok(word.clone());
        }
        if index >= self.max_size.get() {
            return Err(CandidateError::InvalidIndex(index));
        }

        let Some(candidate) = self.engine.api().candidate_at(session.id(), index) else {
            self.max_size.set(self.max_size.get().min(index));
            debug!(index, "candidate list ends");
            return Err(CandidateError::InvalidIndex(index));
        };
        let word = CandidateWord::new(&candidate, CandidateKind::Global { index });
        let mut global = self.global.borrow_mut();
        if global.len() <= index {
            global.resize(index + 1, None);
        }
        global[index] = Some(word.clone());
        Ok(word)
    }

    /// Unknown until the engine runs out of candidates.
    pub fn total_size(&self) -> Option<usize> {
        None
    }

    pub fn has_action(&self, _word: &CandidateWord) -> bool {
        true
    }

    pub fn candidate_actions(&self, _word: &CandidateWord) -> Vec<CandidateAction> {
        vec![FORGET_WORD_ACTION]
    }

    pub fn trigger_action(
        &self,
        word: &CandidateWord,
        id: u32,
        state: &mut ContextState,
        ic: &mut dyn InputContext,
    ) {
        if id != FORGET_WORD_ACTION.id {
            return;
        }
        match word.kind {
            CandidateKind::Page { index, .. } => state.delete_candidate(ic, index, false),
            CandidateKind::Global { index } => state.delete_candidate(ic, index, true),
        }
    }

    /// The engine cannot report its absolute highlight.
    pub fn global_cursor_index(&self) -> Option<usize> {
        None
    }

    pub fn set_global_cursor_index(&self, index: usize) {
        if let Some(session) = self.session.upgrade() {
            self.engine.api().highlight_candidate(session.id(), index);
        }
    }
}
