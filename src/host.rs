use bridge_session::{InputContext, Tip};

/// The host framework as seen by the bridge: notifications and the set of
/// live input contexts.
pub trait Host {
    fn show_tip(&mut self, tip: &Tip);

    /// Call `f` on every live input context.
    fn for_each_input_context(&mut self, f: &mut dyn FnMut(&mut dyn InputContext));

    /// The context that most recently had focus, if any.
    fn most_recent_input_context(&mut self) -> Option<&mut dyn InputContext>;
}
