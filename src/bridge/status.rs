//! Status area: the mode indicator with its schema menu, the option actions
//! of the current schema, and the deploy/sync entries.

use bridge_core::{EngineApi, EngineStatus, SessionId, NO_SESSION};
use bridge_session::{InputContext, OptionAction, SchemaCatalog, UiComponent};

use super::Bridge;

pub const IM_ACTION: &str = "rime-im";
pub const DEPLOY_ACTION: &str = "rime-deploy";
pub const SYNC_ACTION: &str = "rime-sync";
const SCHEMA_ACTION_PREFIX: &str = "rime-schema-";

const BUSY: &str = "\u{231b}";

/// One status area entry as the host should render it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusEntry {
    pub id: String,
    pub short_text: String,
    pub long_text: String,
    pub icon: String,
    /// `Some` for checkable menu items.
    pub checked: Option<bool>,
    pub children: Vec<StatusEntry>,
}

impl StatusEntry {
    fn new(id: impl Into<String>, short_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            short_text: short_text.into(),
            ..Self::default()
        }
    }

    fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }
}

fn im_short_text(status: Option<&EngineStatus>) -> String {
    match status {
        None => BUSY.to_string(),
        Some(s) if s.is_disabled => BUSY.to_string(),
        Some(s) if s.is_ascii_mode => "A".to_string(),
        Some(s) => match s.schema_name.as_deref() {
            Some(name) if !name.starts_with('.') => name.to_string(),
            _ => "中".to_string(),
        },
    }
}

fn im_icon(status: Option<&EngineStatus>) -> String {
    match status {
        None => "rime-disable".to_string(),
        Some(s) if s.is_disabled => "rime-disable".to_string(),
        Some(s) if s.is_ascii_mode => "rime-latin".to_string(),
        Some(s) => match s.schema_id.as_deref() {
            Some(id) => format!("rime-im-{id}"),
            None => "rime-im".to_string(),
        },
    }
}

fn im_entry(status: Option<&EngineStatus>, catalog: &SchemaCatalog) -> StatusEntry {
    let current = status.and_then(|s| s.schema_id.as_deref());
    let mut entry = StatusEntry::new(IM_ACTION, im_short_text(status)).with_icon(im_icon(status));
    entry.long_text = status
        .and_then(|s| s.schema_name.clone())
        .unwrap_or_default();
    entry.children = catalog
        .schemas()
        .iter()
        .map(|schema| StatusEntry {
            checked: Some(current == Some(schema.schema_id.as_str())),
            ..StatusEntry::new(
                format!("{SCHEMA_ACTION_PREFIX}{}", schema.schema_id),
                schema.name.clone(),
            )
        })
        .collect();
    entry
}

fn option_entry(
    action: &OptionAction,
    schema: &str,
    api: &dyn EngineApi,
    session: SessionId,
) -> StatusEntry {
    let mut entry = StatusEntry::new(action.action_id(schema), action.short_text(api, session));
    entry.long_text = action.option_label(api, session);
    if let OptionAction::Select { options, texts } = action {
        entry.children = action
            .item_ids(schema)
            .into_iter()
            .zip(options.iter().zip(texts))
            .map(|(id, (option, text))| StatusEntry {
                checked: Some(session != NO_SESSION && api.get_option(session, option)),
                ..StatusEntry::new(id, text.clone())
            })
            .collect();
    }
    entry
}

impl Bridge {
    /// Entries for `ic`; empty while the input method is not active there.
    pub fn status_area(&mut self, ic: &dyn InputContext) -> Vec<StatusEntry> {
        if !self.is_active(&ic.uuid()) {
            return Vec::new();
        }
        let runtime = self.runtime.clone();
        let catalog = runtime.catalog();
        let state = self.state(ic);
        let status = state.status();

        let mut entries = vec![im_entry(status.as_ref(), &catalog)];
        let schema = status
            .as_ref()
            .filter(|s| !s.is_disabled)
            .and_then(|s| s.schema_id.clone())
            .unwrap_or_default();
        if !schema.is_empty() {
            let session = state.session_id(false);
            entries.extend(
                catalog
                    .actions(&schema)
                    .iter()
                    .map(|action| option_entry(action, &schema, runtime.api(), session)),
            );
        }
        entries.push(StatusEntry::new(DEPLOY_ACTION, "Deploy").with_icon("rime-deploy"));
        entries.push(StatusEntry::new(SYNC_ACTION, "Synchronize").with_icon("rime-sync"));
        entries
    }

    /// Run the status area entry `id` for `ic`. Returns false for unknown ids
    /// and for entries that only open a menu.
    pub fn trigger_status_action(&mut self, ic: &mut dyn InputContext, id: &str) -> bool {
        match id {
            IM_ACTION => self.state(ic).toggle_latin_mode(),
            DEPLOY_ACTION => {
                self.deploy(ic);
                return true;
            }
            SYNC_ACTION => {
                self.sync(ic);
                return true;
            }
            _ => {
                if let Some(schema) = id.strip_prefix(SCHEMA_ACTION_PREFIX) {
                    if !self.runtime.catalog().contains(schema) {
                        return false;
                    }
                    self.state(ic).select_schema(schema);
                } else if !self.trigger_option_action(ic, id) {
                    return false;
                }
            }
        }
        ic.update_user_interface(UiComponent::StatusArea);
        true
    }

    fn trigger_option_action(&mut self, ic: &dyn InputContext, id: &str) -> bool {
        let runtime = self.runtime.clone();
        let state = self.state(ic);
        let schema = state.current_schema();
        let catalog = runtime.catalog();
        for action in catalog.actions(&schema) {
            if action.action_id(&schema) == id {
                if !matches!(action, OptionAction::Toggle { .. }) {
                    return false;
                }
                // Explicitly chosen; no tip should follow.
                runtime.router().block();
                action.toggle(runtime.api(), state.session_id(true));
                return true;
            }
            if let Some(index) = action.item_ids(&schema).iter().position(|item| item == id) {
                action.select(runtime.api(), state.session_id(true), index);
                return true;
            }
        }
        false
    }
}
