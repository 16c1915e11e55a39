use bridge_core::EngineApi;

use super::*;
use crate::{StatusEntry, UiComponent, DEPLOY_ACTION, IM_ACTION, SYNC_ACTION};

const FULL_SHAPE: &str = "fcitx-rime-luna_pinyin-full_shape";
const ZH_SELECT: &str = "fcitx-rime-luna_pinyin-select-zh_trad";
const ZH_SIMP: &str = "fcitx-rime-luna_pinyin-zh_simp";

fn ids(entries: &[StatusEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.id.as_str()).collect()
}

fn entry<'a>(entries: &'a [StatusEntry], id: &str) -> &'a StatusEntry {
    entries.iter().find(|e| e.id == id).unwrap()
}

fn active_harness() -> Harness {
    let mut h = Harness::new(SharePolicy::PerContext);
    h.activate(0);
    h.bridge.state(&h.host.contexts[0]).session_id(true);
    h
}

#[test]
fn layout_follows_the_current_schema() {
    let mut h = active_harness();
    let entries = h.bridge.status_area(&h.host.contexts[0]);
    assert_eq!(
        ids(&entries),
        vec![
            IM_ACTION,
            FULL_SHAPE,
            ZH_SELECT,
            "fcitx-rime-luna_pinyin-ascii_punct",
            DEPLOY_ACTION,
            SYNC_ACTION,
        ]
    );
}

#[test]
fn im_entry_lists_schemas() {
    let mut h = active_harness();
    let entries = h.bridge.status_area(&h.host.contexts[0]);
    let im = entry(&entries, IM_ACTION);
    assert_eq!(im.short_text, "朙月拼音");
    assert_eq!(im.long_text, "朙月拼音");
    assert_eq!(im.icon, "rime-im-luna_pinyin");

    let menu: Vec<_> = im
        .children
        .iter()
        .map(|c| (c.id.as_str(), c.short_text.as_str(), c.checked))
        .collect();
    assert_eq!(
        menu,
        vec![
            ("rime-schema-luna_pinyin", "朙月拼音", Some(true)),
            ("rime-schema-cangjie5", "倉頡五代", Some(false)),
        ]
    );
}

#[test]
fn select_entry_checks_the_active_item() {
    let mut h = active_harness();
    let session = h.session_of(0).unwrap();
    h.fake.set_option(session, "zh_simp", true);

    let entries = h.bridge.status_area(&h.host.contexts[0]);
    let select = entry(&entries, ZH_SELECT);
    assert_eq!(select.short_text, "汉字");
    let checked: Vec<_> = select.children.iter().map(|c| c.checked).collect();
    assert_eq!(checked, vec![Some(false), Some(true)]);
    assert_eq!(select.children[1].id, ZH_SIMP);
}

#[test]
fn toggle_entry_flips_its_option() {
    let mut h = active_harness();
    assert!(h
        .bridge
        .trigger_status_action(&mut h.host.contexts[0], FULL_SHAPE));
    let session = h.session_of(0).unwrap();
    assert!(h.fake.option(session, "full_shape"));
    assert!(h.bridge.runtime().router().is_silenced());

    let entries = h.bridge.status_area(&h.host.contexts[0]);
    assert_eq!(entry(&entries, FULL_SHAPE).short_text, "全角 → 半角");
    assert_eq!(h.host.contexts[0].ui_update_count(UiComponent::StatusArea), 2);
}

#[test]
fn select_item_switches_and_root_only_opens_menu() {
    let mut h = active_harness();
    assert!(!h.bridge.trigger_status_action(&mut h.host.contexts[0], ZH_SELECT));
    assert!(h.bridge.trigger_status_action(&mut h.host.contexts[0], ZH_SIMP));
    let session = h.session_of(0).unwrap();
    assert!(h.fake.option(session, "zh_simp"));
    assert!(!h.fake.option(session, "zh_trad"));
}

#[test]
fn im_entry_toggles_latin_mode() {
    let mut h = active_harness();
    assert!(h.bridge.trigger_status_action(&mut h.host.contexts[0], IM_ACTION));
    let entries = h.bridge.status_area(&h.host.contexts[0]);
    let im = entry(&entries, IM_ACTION);
    assert_eq!(im.short_text, "A");
    assert_eq!(im.icon, "rime-latin");

    assert!(h.bridge.trigger_status_action(&mut h.host.contexts[0], IM_ACTION));
    let entries = h.bridge.status_area(&h.host.contexts[0]);
    assert_eq!(entry(&entries, IM_ACTION).short_text, "朙月拼音");
}

#[test]
fn schema_menu_switches_schema() {
    let mut h = active_harness();
    assert!(h
        .bridge
        .trigger_status_action(&mut h.host.contexts[0], "rime-schema-cangjie5"));
    let entries = h.bridge.status_area(&h.host.contexts[0]);
    assert_eq!(
        ids(&entries),
        vec![
            IM_ACTION,
            "fcitx-rime-cangjie5-full_shape",
            DEPLOY_ACTION,
            SYNC_ACTION
        ]
    );
    assert_eq!(entry(&entries, IM_ACTION).icon, "rime-im-cangjie5");

    assert!(!h
        .bridge
        .trigger_status_action(&mut h.host.contexts[0], "rime-schema-wubi86"));
}

#[test]
fn maintenance_hides_option_entries() {
    let mut h = active_harness();
    h.fake.set_maintenance(true);
    let entries = h.bridge.status_area(&h.host.contexts[0]);
    assert_eq!(ids(&entries), vec![IM_ACTION, DEPLOY_ACTION, SYNC_ACTION]);
    let im = entry(&entries, IM_ACTION);
    assert_eq!(im.short_text, "\u{231b}");
    assert_eq!(im.icon, "rime-disable");
}

#[test]
fn inactive_context_has_no_entries() {
    let mut h = Harness::new(SharePolicy::PerContext);
    assert!(h.bridge.status_area(&h.host.contexts[0]).is_empty());
}

#[test]
fn unknown_action_is_not_handled() {
    let mut h = active_harness();
    assert!(!h
        .bridge
        .trigger_status_action(&mut h.host.contexts[0], "fcitx-rime-luna_pinyin-nope"));
    assert!(!h.bridge.trigger_status_action(&mut h.host.contexts[0], "rime-bogus"));
    assert_eq!(h.host.contexts[0].ui_update_count(UiComponent::StatusArea), 1);
}

#[test]
fn deploy_entry_redeploys() {
    let mut h = active_harness();
    assert!(h
        .bridge
        .trigger_status_action(&mut h.host.contexts[0], DEPLOY_ACTION));
    assert_eq!(h.fake.setup_calls(), 1);
    assert_eq!(h.fake.initialize_calls(), 2);
}
