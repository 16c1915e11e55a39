use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bridge_core::{EngineHandle, SetupToken, SharePolicy};

use super::*;
use crate::testutil::test_traits;
use crate::{RouterAction, TipKind, Waker};

fn tips(actions: &[RouterAction]) -> Vec<TipKind> {
    actions
        .iter()
        .filter_map(|a| match a {
            RouterAction::ShowTip(tip) => Some(tip.kind),
            _ => None,
        })
        .collect()
}

// --- Key events ---

#[test]
fn option_change_is_captured_during_key_event() {
    let h = Harness::new(SharePolicy::PerContext);
    let mut ic = FakeInputContext::new(1, "kate");
    let mut state = h.state(&ic);
    assert!(press(&mut state, &mut ic, keysym::F4));
    assert_eq!(state.changed_options(), vec!["full_shape".to_string()]);
    assert_eq!(ic.custom_info, vec!["全".to_string()]);

    let session = state.session_id(false);
    let actions = h.runtime.router().dispatch(false);
    assert_eq!(actions, vec![RouterAction::UpdateStatusArea(session)]);
}

#[test]
fn each_key_event_starts_a_fresh_change_list() {
    let h = Harness::new(SharePolicy::PerContext);
    let mut ic = FakeInputContext::new(1, "kate");
    let mut state = h.state(&ic);
    press(&mut state, &mut ic, keysym::F4);
    press(&mut state, &mut ic, 'n' as u32);
    assert!(state.changed_options().is_empty());
    assert_eq!(ic.custom_info.len(), 1);
}

#[test]
fn option_set_outside_key_event_is_only_queued() {
    let h = Harness::new(SharePolicy::PerContext);
    let ic = FakeInputContext::new(1, "kate");
    let mut state = h.state(&ic);
    state.toggle_latin_mode();
    assert!(state.changed_options().is_empty());
    let session = state.session_id(false);
    assert!(h
        .runtime
        .router()
        .dispatch(false)
        .contains(&RouterAction::UpdateStatusArea(session)));
}

#[test]
fn schema_switch_requests_status_rebuild() {
    let h = Harness::new(SharePolicy::PerContext);
    let ic = FakeInputContext::new(1, "kate");
    let mut state = h.state(&ic);
    state.select_schema("cangjie5");
    let session = state.session_id(false);
    let actions = h.runtime.router().dispatch(false);
    assert!(actions.contains(&RouterAction::RebuildStatusArea(session)));
    assert!(tips(&actions).is_empty());
}

// --- Deploy ---

#[test]
fn deploy_failure_reports_start_and_failure() {
    let h = Harness::new(SharePolicy::PerContext);
    h.fake.set_deploy_result(false);
    h.runtime.start_engine(true);
    let actions = h.runtime.router().dispatch(false);
    assert_eq!(tips(&actions), vec![TipKind::DeployStart, TipKind::DeployFailure]);
    assert!(!actions.contains(&RouterAction::RefreshSchemaMenu));
    assert!(h.runtime.router().is_silenced());
}

#[test]
fn deploy_success_refreshes_menu_then_silences() {
    let h = Harness::new(SharePolicy::PerContext);
    h.runtime.start_engine(true);
    let first = h.runtime.router().dispatch(false);
    assert_eq!(tips(&first), vec![TipKind::DeployStart, TipKind::DeploySuccess]);
    assert!(first.contains(&RouterAction::RefreshSchemaMenu));

    h.runtime.start_engine(true);
    let second = h.runtime.router().dispatch(false);
    assert!(tips(&second).is_empty());
    assert!(second.contains(&RouterAction::RefreshSchemaMenu));
}

#[test]
fn user_schema_switch_hides_deploy_tips() {
    let h = Harness::new(SharePolicy::PerContext);
    let ic = FakeInputContext::new(1, "kate");
    let mut state = h.state(&ic);
    state.select_schema("cangjie5");
    h.runtime.start_engine(true);
    assert!(tips(&h.runtime.router().dispatch(false)).is_empty());
}

#[test]
fn zero_silence_window_never_suppresses() {
    let mut settings = settings_with_policy(SharePolicy::PerContext);
    settings.notification.silence_ms = 0;
    let h = Harness::with_settings(settings);
    h.runtime.start_engine(true);
    h.runtime.router().dispatch(false);
    h.runtime.start_engine(true);
    assert_eq!(tips(&h.runtime.router().dispatch(false)).len(), 2);
}

#[test]
fn new_settings_change_the_window() {
    let h = Harness::new(SharePolicy::PerContext);
    let mut settings = settings_with_policy(SharePolicy::PerContext);
    settings.notification.silence_ms = 500;
    h.runtime.set_settings(settings);
    assert_eq!(
        h.runtime.router().silence_window(),
        std::time::Duration::from_millis(500)
    );
}

#[test]
fn worker_notifications_wake_the_host() {
    let woken = Arc::new(AtomicUsize::new(0));
    let counter = woken.clone();
    let waker: Waker = Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let fake = Rc::new(FakeEngine::new());
    let engine = Rc::new(EngineHandle::new(fake, test_traits(), SetupToken::FirstRun));
    let runtime = Runtime::new(engine, Settings::default(), Some(waker));
    runtime.start_engine(true);
    assert_eq!(woken.load(Ordering::SeqCst), 2);
    assert_eq!(runtime.router().dispatch(false).len(), 3);
}
