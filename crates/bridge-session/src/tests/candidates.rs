use std::rc::Rc;

use bridge_core::testutil::PAGE_SIZE;
use bridge_core::{EngineApi, EngineCandidate, EngineContext, EngineMenu, SharePolicy};

use super::*;
use crate::{CandidateError, CandidateKind, CandidateView, FORGET_WORD_ACTION};

fn typed(h: &Harness, text: &str) -> (ContextState, FakeInputContext) {
    let mut ic = FakeInputContext::new(1, "kate");
    let mut state = h.state(&ic);
    type_text(&mut state, &mut ic, text);
    (state, ic)
}

fn view_of(state: &ContextState) -> Rc<CandidateView> {
    state
        .panel()
        .candidate_list()
        .cloned()
        .expect("candidate list shown")
}

fn manual_view(h: &Harness, context: &EngineContext) -> (ContextState, CandidateView) {
    let ic = FakeInputContext::new(9, "kate");
    let mut state = h.state(&ic);
    state.session_id(true);
    let handle = state.session_handle().cloned().expect("session");
    let view = CandidateView::new(h.runtime.engine().clone(), &handle, context);
    (state, view)
}

fn menu_context(count: usize, page_size: usize) -> EngineContext {
    EngineContext {
        menu: EngineMenu {
            page_size,
            page_no: 2,
            is_last_page: true,
            highlighted_candidate_index: 1,
            candidates: (0..count).map(|i| EngineCandidate::new(format!("c{i}"))).collect(),
            select_keys: None,
        },
        ..EngineContext::default()
    }
}

// --- Page ---

#[test]
fn first_page_layout() {
    let h = Harness::new(SharePolicy::PerContext);
    let (state, _ic) = typed(&h, "ni");
    let view = view_of(&state);
    assert_eq!(view.len(), PAGE_SIZE);
    let labels: Vec<_> = (0..PAGE_SIZE).filter_map(|i| view.label(i)).collect();
    assert_eq!(labels, vec!["1 ", "2 ", "3 ", "4 ", "5 "]);
    assert_eq!(view.cursor_index(), Some(0));
    assert!(!view.has_prev());
    assert!(view.has_next());
    assert_eq!(
        view.candidate(2).unwrap().kind,
        CandidateKind::Page {
            index: 2,
            sym: '3' as u32
        }
    );
}

#[test]
fn paging_goes_through_key_events() {
    let h = Harness::new(SharePolicy::PerContext);
    let (mut state, mut ic) = typed(&h, "a");
    view_of(&state).next(&mut state, &mut ic);
    let view = view_of(&state);
    assert_eq!(view.candidate(0).unwrap().text, "A5");
    assert!(view.has_prev());

    view.prev(&mut state, &mut ic);
    let view = view_of(&state);
    assert_eq!(view.candidate(0).unwrap().text, "A0");
    assert!(!view.has_prev());
}

#[test]
fn last_page_has_no_next() {
    let h = Harness::new(SharePolicy::PerContext);
    let (mut state, mut ic) = typed(&h, "a");
    for _ in 0..2 {
        view_of(&state).next(&mut state, &mut ic);
    }
    let view = view_of(&state);
    assert!(!view.has_next());
    assert_eq!(view.len(), 2);
}

#[test]
fn select_keys_and_labels() {
    let h = Harness::new(SharePolicy::PerContext);
    let mut context = menu_context(3, 3);
    context.menu.select_keys = Some("asdf".to_string());
    context.select_labels = Some(vec!["①".to_string(), "②".to_string()]);
    let (_state, view) = manual_view(&h, &context);

    let labels: Vec<_> = (0..3).filter_map(|i| view.label(i)).collect();
    assert_eq!(labels, vec!["① ", "② ", "d "]);
    let syms: Vec<_> = (0..3)
        .filter_map(|i| match view.candidate(i)?.kind {
            CandidateKind::Page { sym, .. } => Some(sym),
            CandidateKind::Global { .. } => None,
        })
        .collect();
    assert_eq!(syms, vec!['a' as u32, 's' as u32, 'd' as u32]);
}

#[test]
fn tenth_label_wraps_to_zero() {
    let h = Harness::new(SharePolicy::PerContext);
    let (_state, view) = manual_view(&h, &menu_context(10, 10));
    assert_eq!(view.label(9), Some("0 "));
    assert_eq!(view.cursor_index(), Some(1));
    assert!(view.has_prev());
    assert!(!view.has_next());
}

// --- Bulk access ---

#[test]
fn global_lookups_are_cached_and_bounded() {
    let h = Harness::new(SharePolicy::PerContext);
    let (state, _ic) = typed(&h, "ni");
    let view = view_of(&state);
    let base = h.fake.candidate_lookups();

    let word = view.candidate_from_all(3).unwrap();
    assert_eq!(word.text, "NI3");
    assert_eq!(word.kind, CandidateKind::Global { index: 3 });
    assert_eq!(h.fake.candidate_lookups() - base, 1);
    view.candidate_from_all(3).unwrap();
    assert_eq!(h.fake.candidate_lookups() - base, 1);

    assert_eq!(view.candidate_from_all(20), Err(CandidateError::InvalidIndex(20)));
    assert_eq!(h.fake.candidate_lookups() - base, 2);
    assert_eq!(view.candidate_from_all(25), Err(CandidateError::InvalidIndex(25)));
    assert_eq!(h.fake.candidate_lookups() - base, 2);

    // The list really ends at 12, below the first miss.
    assert!(view.candidate_from_all(12).is_err());
    assert_eq!(h.fake.candidate_lookups() - base, 3);
    assert!(view.candidate_from_all(15).is_err());
    assert_eq!(h.fake.candidate_lookups() - base, 3);

    assert_eq!(view.candidate_from_all(11).unwrap().text, "NI11");
    assert_eq!(view.total_size(), None);
}

#[test]
fn short_list_fits_one_page() {
    let h = Harness::new(SharePolicy::PerContext);
    h.fake.set_candidate_total(3);
    let (state, _ic) = typed(&h, "ni");
    let view = view_of(&state);
    assert_eq!(view.len(), 3);
    assert!(!view.has_prev());
    assert!(!view.has_next());
    assert_eq!(view.candidate_from_all(2).unwrap().text, "NI2");
    assert_eq!(view.candidate_from_all(3), Err(CandidateError::InvalidIndex(3)));
}

#[test]
fn empty_view_rejects_every_index() {
    let h = Harness::new(SharePolicy::PerContext);
    let (_state, view) = manual_view(&h, &EngineContext::default());
    assert!(view.is_empty());
    assert_eq!(view.candidate_from_all(0), Err(CandidateError::InvalidIndex(0)));
    assert_eq!(h.fake.candidate_lookups(), 0);
}

#[test]
fn released_session_leaves_view_inert() {
    let h = Harness::new(SharePolicy::PerContext);
    let (mut state, _ic) = typed(&h, "ni");
    let view = view_of(&state);
    state.release();
    assert_eq!(view.candidate_from_all(0), Err(CandidateError::NoSession));
    view.set_global_cursor_index(3);
    assert_eq!(h.fake.live_sessions(), 0);
}

#[test]
fn global_select_commits() {
    let h = Harness::new(SharePolicy::PerContext);
    let (mut state, mut ic) = typed(&h, "a");
    let view = view_of(&state);
    let word = view.candidate_from_all(7).unwrap();
    view.select(&word, &mut state, &mut ic);
    assert_eq!(ic.commits, vec!["A7".to_string()]);
    assert!(state.panel().candidate_list().is_none());
}

#[test]
fn page_select_commits() {
    let h = Harness::new(SharePolicy::PerContext);
    let (mut state, mut ic) = typed(&h, "a");
    let view = view_of(&state);
    let word = view.candidate(1).cloned().unwrap();
    view.select(&word, &mut state, &mut ic);
    assert_eq!(ic.commits, vec!["A1".to_string()]);
}

#[test]
fn global_cursor_moves_highlight() {
    let h = Harness::new(SharePolicy::PerContext);
    let (mut state, _ic) = typed(&h, "a");
    let view = view_of(&state);
    assert_eq!(view.global_cursor_index(), None);
    view.set_global_cursor_index(7);
    let menu = h
        .fake
        .get_context(state.session_id(false))
        .unwrap()
        .menu;
    assert_eq!(menu.page_no, 1);
    assert_eq!(menu.highlighted_candidate_index, 2);
}

// --- Actions ---

#[test]
fn forget_word_targets_the_right_index() {
    let h = Harness::new(SharePolicy::PerContext);
    let (mut state, mut ic) = typed(&h, "a");
    view_of(&state).next(&mut state, &mut ic);
    let view = view_of(&state);
    let word = view.candidate(2).cloned().unwrap();
    assert!(view.has_action(&word));
    assert_eq!(view.candidate_actions(&word), vec![FORGET_WORD_ACTION]);
    view.trigger_action(&word, FORGET_WORD_ACTION.id, &mut state, &mut ic);

    let view = view_of(&state);
    let global = view.candidate_from_all(9).unwrap();
    view.trigger_action(&global, FORGET_WORD_ACTION.id, &mut state, &mut ic);
    // Unknown actions do nothing.
    view.trigger_action(&global, 7, &mut state, &mut ic);

    let session = state.session_id(false);
    assert_eq!(h.fake.deleted_candidates(session), vec![PAGE_SIZE + 2, 9]);
}
