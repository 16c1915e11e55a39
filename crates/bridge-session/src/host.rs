use crate::text::InputPanel;

/// Outcome of feeding a key through the host's compose (dead key) table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeResult {
    /// The key was consumed by a sequence still in progress.
    Pending,
    /// No composition involved; the key goes to the engine as-is.
    Passthrough,
    /// A sequence completed with this text.
    Composed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiComponent {
    InputPanel,
    StatusArea,
}

/// One text field as seen from the host framework.
pub trait InputContext {
    fn uuid(&self) -> [u8; 16];
    fn program(&self) -> &str;
    /// The client can render inline preedit.
    fn supports_preedit(&self) -> bool;
    fn has_focus(&self) -> bool;

    fn commit_string(&mut self, text: &str);
    fn process_compose(&mut self, sym: u32) -> ComposeResult;
    fn reset_compose(&mut self);

    /// Push the panel's inline preedit to the client.
    fn update_preedit(&mut self, panel: &InputPanel);
    fn update_user_interface(&mut self, component: UiComponent);
    /// Brief toast with the current input method and mode.
    fn show_input_method_information(&mut self);
    fn show_custom_input_method_information(&mut self, text: &str);
}
