use std::rc::Rc;

use bridge_core::{EngineContext, PreeditMode};

use super::ContextState;
use crate::candidates::CandidateView;
use crate::host::{InputContext, UiComponent};
use crate::text::{Text, TextFormat};

/// Preedit split into converted, converting and remaining spans. Empty when
/// the engine's selection offsets are inconsistent.
pub(crate) fn preedit_from_context(
    context: &EngineContext,
    format: TextFormat,
    highlight: TextFormat,
) -> Text {
    let mut preedit = Text::new();
    let composition = &context.composition;
    if composition.is_empty() || !composition.is_valid() {
        return preedit;
    }
    let text = &composition.preedit;
    let spans = (
        text.get(..composition.sel_start),
        text.get(composition.sel_start..composition.sel_end),
        text.get(composition.sel_end..composition.length),
    );
    let (Some(converted), Some(converting), Some(remaining)) = spans else {
        return preedit;
    };
    preedit.append(converted, format);
    preedit.append(converting, format.union(highlight));
    preedit.append(remaining, format);
    preedit.set_cursor(Some(composition.cursor_pos));
    preedit
}

impl ContextState {
    fn update_preedit(&mut self, ic: &dyn InputContext, context: &EngineContext) {
        let (mode, at_beginning) = {
            let settings = self.runtime.settings();
            let mode = if ic.supports_preedit() {
                settings.preedit.mode
            } else {
                PreeditMode::No
            };
            (mode, settings.preedit.cursor_at_beginning)
        };

        match mode {
            PreeditMode::No => {
                self.panel
                    .set_preedit(preedit_from_context(context, TextFormat::PLAIN, TextFormat::PLAIN));
                self.panel.set_client_preedit(Text::new());
            }
            PreeditMode::CommitPreview => {
                self.panel
                    .set_preedit(preedit_from_context(context, TextFormat::PLAIN, TextFormat::PLAIN));
                let mut client = Text::new();
                if let Some(preview) = context
                    .commit_text_preview
                    .as_deref()
                    .filter(|_| !context.composition.is_empty())
                {
                    client.append(preview, TextFormat::UNDERLINE);
                    let cursor = if at_beginning { 0 } else { client.text_len() };
                    client.set_cursor(Some(cursor));
                }
                self.panel.set_client_preedit(client);
            }
            PreeditMode::ComposingText => {
                let highlight = if at_beginning {
                    TextFormat::HIGHLIGHT
                } else {
                    TextFormat::PLAIN
                };
                let mut client = preedit_from_context(context, TextFormat::UNDERLINE, highlight);
                if at_beginning {
                    client.set_cursor(Some(0));
                }
                self.panel.set_client_preedit(client);
            }
        }
    }

    /// Rebuild the panel from the engine context and push it to the host.
    pub fn update_ui(&mut self, ic: &mut dyn InputContext, is_release: bool) {
        // A release must not wipe a panel that was just shown.
        if !is_release {
            self.panel.reset();
        }
        let old_empty = self.panel.is_empty_except_aux();

        let runtime = self.runtime.clone();
        let api = runtime.api();
        if !runtime.engine().is_available() {
            return;
        }
        let session = self.session_id(true);
        if !api.find_session(session) {
            return;
        }
        if let Some(context) = api.get_context(session) {
            self.update_preedit(ic, &context);
            let view = match &self.session {
                Some(handle) if !context.menu.candidates.is_empty() => Some(Rc::new(
                    CandidateView::new(runtime.engine().clone(), handle, &context),
                )),
                _ => None,
            };
            self.panel.set_candidate_list(view);
        }

        ic.update_preedit(&self.panel);
        let new_empty = self.panel.is_empty_except_aux();
        if is_release && !new_empty {
            self.panel.set_aux_up(Text::new());
            self.panel.set_aux_down(Text::new());
        }
        if new_empty && {
            let mode = self.sub_mode();
            self.last_mode != mode
        } {
            runtime.router().block();
            ic.show_input_method_information();
            ic.update_user_interface(UiComponent::StatusArea);
        }
        if !is_release || !old_empty || !new_empty {
            ic.update_user_interface(UiComponent::InputPanel);
        }
    }
}
