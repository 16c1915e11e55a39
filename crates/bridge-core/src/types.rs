/// Composition span of the engine context. Offsets are byte offsets into
/// `preedit`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineComposition {
    pub preedit: String,
    pub length: usize,
    pub cursor_pos: usize,
    pub sel_start: usize,
    pub sel_end: usize,
}

impl EngineComposition {
    /// Build a composition whose whole text is the converting span.
    pub fn whole(preedit: impl Into<String>) -> Self {
        let preedit = preedit.into();
        let length = preedit.len();
        Self {
            preedit,
            length,
            cursor_pos: length,
            sel_start: 0,
            sel_end: length,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Selection offsets are consistent with the reported length.
    pub fn is_valid(&self) -> bool {
        self.sel_start <= self.sel_end
            && self.sel_end <= self.length
            && self.length <= self.preedit.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineCandidate {
    pub text: String,
    pub comment: Option<String>,
}

impl EngineCandidate {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            comment: None,
        }
    }
}

/// One page of the engine's candidate menu.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineMenu {
    pub page_size: usize,
    pub page_no: usize,
    pub is_last_page: bool,
    pub highlighted_candidate_index: usize,
    pub candidates: Vec<EngineCandidate>,
    pub select_keys: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineContext {
    pub composition: EngineComposition,
    pub menu: EngineMenu,
    pub commit_text_preview: Option<String>,
    pub select_labels: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStatus {
    pub schema_id: Option<String>,
    pub schema_name: Option<String>,
    pub is_disabled: bool,
    pub is_composing: bool,
    pub is_ascii_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaListItem {
    pub schema_id: String,
    pub name: String,
}

/// A switch declared by a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchSpec {
    /// Boolean option; `states` are the labels for `[off, on]`.
    Toggle { option: String, states: [String; 2] },
    /// Mutually exclusive group; `states[i]` labels `options[i]`.
    Select {
        options: Vec<String>,
        states: Vec<String>,
    },
}
