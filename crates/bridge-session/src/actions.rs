use std::collections::HashMap;

use bridge_core::{EngineApi, SchemaListItem, SessionId, SwitchSpec, NO_SESSION};
use tracing::debug;

/// A schema switch exposed as a user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionAction {
    Toggle {
        option: String,
        disabled_text: String,
        enabled_text: String,
    },
    /// Exclusive group; `texts[i]` labels `options[i]`.
    Select {
        options: Vec<String>,
        texts: Vec<String>,
    },
}

impl OptionAction {
    pub fn from_switch(switch: &SwitchSpec) -> Option<Self> {
        match switch {
            SwitchSpec::Toggle { option, states } if !option.is_empty() => Some(Self::Toggle {
                option: option.clone(),
                disabled_text: states[0].clone(),
                enabled_text: states[1].clone(),
            }),
            SwitchSpec::Select { options, states }
                if !options.is_empty() && options.len() == states.len() =>
            {
                Some(Self::Select {
                    options: options.clone(),
                    texts: states.clone(),
                })
            }
            _ => None,
        }
    }

    /// Status area id of this action within `schema`.
    pub fn action_id(&self, schema: &str) -> String {
        match self {
            Self::Toggle { option, .. } => format!("fcitx-rime-{schema}-{option}"),
            Self::Select { options, .. } => {
                format!("fcitx-rime-{schema}-select-{}", options[0])
            }
        }
    }

    /// Status area ids of the members of a select group.
    pub fn item_ids(&self, schema: &str) -> Vec<String> {
        match self {
            Self::Toggle { .. } => Vec::new(),
            Self::Select { options, .. } => options
                .iter()
                .map(|option| format!("fcitx-rime-{schema}-{option}"))
                .collect(),
        }
    }

    pub fn check_option_name(&self, name: &str) -> bool {
        match self {
            Self::Toggle { option, .. } => option == name,
            Self::Select { options, .. } => options.iter().any(|o| o == name),
        }
    }

    /// Current value as `"name"` or `"!name"`; a select group reports its
    /// active member. `None` without a session or when no member is set.
    pub fn snapshot_option(&self, api: &dyn EngineApi, session: SessionId) -> Option<String> {
        if session == NO_SESSION {
            return None;
        }
        match self {
            Self::Toggle { option, .. } => Some(if api.get_option(session, option) {
                option.clone()
            } else {
                format!("!{option}")
            }),
            Self::Select { options, .. } => options
                .iter()
                .find(|o| api.get_option(session, o))
                .cloned(),
        }
    }

    /// Label of the current value.
    pub fn option_label(&self, api: &dyn EngineApi, session: SessionId) -> String {
        match self {
            Self::Toggle {
                option,
                disabled_text,
                enabled_text,
            } => {
                if session == NO_SESSION {
                    String::new()
                } else if api.get_option(session, option) {
                    enabled_text.clone()
                } else {
                    disabled_text.clone()
                }
            }
            Self::Select { options, texts } => {
                if session == NO_SESSION {
                    return String::new();
                }
                options
                    .iter()
                    .zip(texts)
                    .find(|(o, _)| api.get_option(session, o))
                    .map(|(_, t)| t.clone())
                    .unwrap_or_default()
            }
        }
    }

    /// Status area text: a toggle shows `current → next`.
    pub fn short_text(&self, api: &dyn EngineApi, session: SessionId) -> String {
        match self {
            Self::Toggle {
                option,
                disabled_text,
                enabled_text,
            } => {
                if session == NO_SESSION {
                    String::new()
                } else if api.get_option(session, option) {
                    format!("{enabled_text} → {disabled_text}")
                } else {
                    format!("{disabled_text} → {enabled_text}")
                }
            }
            Self::Select { .. } => self.option_label(api, session),
        }
    }

    /// Flip a toggle. Select groups are driven through [`select`](Self::select).
    pub fn toggle(&self, api: &dyn EngineApi, session: SessionId) {
        if let Self::Toggle { option, .. } = self {
            let old = api.get_option(session, option);
            api.set_option(session, option, !old);
        }
    }

    /// Make `options[index]` the only active member of a select group.
    pub fn select(&self, api: &dyn EngineApi, session: SessionId, index: usize) {
        if let Self::Select { options, .. } = self {
            if index >= options.len() {
                return;
            }
            for (i, option) in options.iter().enumerate() {
                api.set_option(session, option, i == index);
            }
        }
    }
}

/// Known schemas and the option actions each one declares.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    schemas: Vec<SchemaListItem>,
    actions: HashMap<String, Vec<OptionAction>>,
}

impl SchemaCatalog {
    pub fn load(api: &dyn EngineApi) -> Self {
        let schemas = api.schema_list();
        let actions = schemas
            .iter()
            .map(|schema| {
                let actions: Vec<_> = api
                    .schema_switches(&schema.schema_id)
                    .iter()
                    .filter_map(OptionAction::from_switch)
                    .collect();
                (schema.schema_id.clone(), actions)
            })
            .collect();
        debug!(schemas = schemas.len(), "schema catalog loaded");
        Self { schemas, actions }
    }

    pub fn schemas(&self) -> &[SchemaListItem] {
        &self.schemas
    }

    pub fn contains(&self, schema_id: &str) -> bool {
        self.schemas.iter().any(|s| s.schema_id == schema_id)
    }

    pub fn actions(&self, schema_id: &str) -> &[OptionAction] {
        self.actions.get(schema_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
