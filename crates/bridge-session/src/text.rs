use std::fmt;
use std::rc::Rc;

use crate::candidates::CandidateView;

/// Formatting of one text segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextFormat {
    pub underline: bool,
    pub highlight: bool,
}

impl TextFormat {
    pub const PLAIN: Self = Self {
        underline: false,
        highlight: false,
    };
    pub const UNDERLINE: Self = Self {
        underline: true,
        highlight: false,
    };
    pub const HIGHLIGHT: Self = Self {
        underline: false,
        highlight: true,
    };

    pub fn union(self, other: Self) -> Self {
        Self {
            underline: self.underline || other.underline,
            highlight: self.highlight || other.highlight,
        }
    }
}

/// Formatted text with an optional byte cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Text {
    segments: Vec<(String, TextFormat)>,
    cursor: Option<usize>,
}

impl Text {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plain(text: impl Into<String>) -> Self {
        let mut t = Self::new();
        t.append(text, TextFormat::PLAIN);
        t
    }

    pub fn append(&mut self, text: impl Into<String>, format: TextFormat) {
        let text = text.into();
        if !text.is_empty() {
            self.segments.push((text, format));
        }
    }

    pub fn segments(&self) -> &[(String, TextFormat)] {
        &self.segments
    }

    pub fn set_cursor(&mut self, cursor: Option<usize>) {
        self.cursor = cursor;
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Length in bytes of all segments.
    pub fn text_len(&self) -> usize {
        self.segments.iter().map(|(s, _)| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (s, _) in &self.segments {
            f.write_str(s)?;
        }
        Ok(())
    }
}

/// What the host renders for one input context: preedit in the popup, the
/// inline (client) preedit, two aux lines and the candidate list.
#[derive(Default)]
pub struct InputPanel {
    preedit: Text,
    client_preedit: Text,
    aux_up: Text,
    aux_down: Text,
    candidates: Option<Rc<CandidateView>>,
}

impl InputPanel {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn preedit(&self) -> &Text {
        &self.preedit
    }

    pub fn set_preedit(&mut self, text: Text) {
        self.preedit = text;
    }

    pub fn client_preedit(&self) -> &Text {
        &self.client_preedit
    }

    pub fn set_client_preedit(&mut self, text: Text) {
        self.client_preedit = text;
    }

    pub fn aux_up(&self) -> &Text {
        &self.aux_up
    }

    pub fn set_aux_up(&mut self, text: Text) {
        self.aux_up = text;
    }

    pub fn aux_down(&self) -> &Text {
        &self.aux_down
    }

    pub fn set_aux_down(&mut self, text: Text) {
        self.aux_down = text;
    }

    pub fn candidate_list(&self) -> Option<&Rc<CandidateView>> {
        self.candidates.as_ref()
    }

    pub fn set_candidate_list(&mut self, list: Option<Rc<CandidateView>>) {
        self.candidates = list;
    }

    /// Nothing visible apart from the aux lines.
    pub fn is_empty_except_aux(&self) -> bool {
        self.preedit.is_empty()
            && self.client_preedit.is_empty()
            && self.candidates.as_ref().map_or(true, |c| c.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.is_empty_except_aux() && self.aux_up.is_empty() && self.aux_down.is_empty()
    }
}

impl fmt::Debug for InputPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputPanel")
            .field("preedit", &self.preedit.to_string())
            .field("client_preedit", &self.client_preedit.to_string())
            .field("aux_up", &self.aux_up.to_string())
            .field("aux_down", &self.aux_down.to_string())
            .field("candidates", &self.candidates.as_ref().map(|c| c.len()))
            .finish()
    }
}
