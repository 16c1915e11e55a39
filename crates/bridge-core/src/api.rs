use std::path::PathBuf;
use std::sync::Arc;

use crate::settings::EngineSettings;
use crate::types::{
    EngineCandidate, EngineContext, EngineStatus, SchemaListItem, SwitchSpec,
};

/// Opaque engine session id. Zero is never a live session.
pub type SessionId = u64;

/// The "no session" sentinel.
pub const NO_SESSION: SessionId = 0;

/// Callback the engine invokes with `(session, message_type, message_value)`.
///
/// The engine may call it from its maintenance thread, so it has to be
/// `Send + Sync` and must not touch main-thread state directly.
pub type NotificationHandler = Arc<dyn Fn(SessionId, &str, &str) + Send + Sync>;

/// Directories and distribution identity handed to the engine on setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineTraits {
    pub shared_data_dir: PathBuf,
    pub user_data_dir: PathBuf,
    pub app_name: String,
    pub distribution_name: String,
    pub distribution_code_name: String,
    pub distribution_version: String,
}

impl EngineTraits {
    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self {
            shared_data_dir: settings.shared_data_dir.clone(),
            user_data_dir: settings.resolved_user_data_dir(),
            app_name: settings.app_name.clone(),
            distribution_name: settings.distribution_name.clone(),
            distribution_code_name: settings.distribution_code_name.clone(),
            distribution_version: settings.distribution_version.clone(),
        }
    }
}

/// Capability surface of the conversion engine.
///
/// Mirrors the engine's C entry points one to one, except that every buffer the
/// engine allocates (commit text, context, status, schema list, candidate
/// iterator) is returned as an owned value, so there are no `free_*` calls.
///
/// All methods except the notification handler are called from the host's main
/// thread only.
pub trait EngineApi {
    // --- lifecycle ---
    fn setup(&self, traits: &EngineTraits);
    fn initialize(&self, traits: &EngineTraits);
    fn finalize(&self);
    fn start_maintenance(&self, full_check: bool) -> bool;
    fn is_maintenance_mode(&self) -> bool;
    fn sync_user_data(&self) -> bool;
    fn set_notification_handler(&self, handler: Option<NotificationHandler>);

    // --- sessions ---
    fn create_session(&self) -> SessionId;
    fn find_session(&self, session: SessionId) -> bool;
    fn destroy_session(&self, session: SessionId) -> bool;

    // --- input ---
    fn process_key(&self, session: SessionId, keysym: u32, mask: u32) -> bool;
    fn clear_composition(&self, session: SessionId);
    fn get_commit(&self, session: SessionId) -> Option<String>;
    fn get_context(&self, session: SessionId) -> Option<EngineContext>;
    fn get_status(&self, session: SessionId) -> Option<EngineStatus>;
    fn get_input(&self, session: SessionId) -> Option<String>;

    // --- options and properties ---
    fn set_option(&self, session: SessionId, option: &str, value: bool);
    fn get_option(&self, session: SessionId, option: &str) -> bool;
    fn set_property(&self, session: SessionId, property: &str, value: &str);
    fn get_state_label(
        &self,
        session: SessionId,
        option: &str,
        state: bool,
        abbreviated: bool,
    ) -> Option<String>;

    // --- schemas ---
    fn schema_list(&self) -> Vec<SchemaListItem>;
    fn schema_switches(&self, schema_id: &str) -> Vec<SwitchSpec>;
    fn select_schema(&self, session: SessionId, schema_id: &str) -> bool;

    // --- candidates ---
    fn select_candidate(&self, session: SessionId, index: usize) -> bool;
    fn select_candidate_on_current_page(&self, session: SessionId, index: usize) -> bool;
    fn delete_candidate(&self, session: SessionId, index: usize) -> bool;
    fn delete_candidate_on_current_page(&self, session: SessionId, index: usize) -> bool;
    fn highlight_candidate(&self, session: SessionId, index: usize) -> bool;
    /// Position a candidate iterator at the absolute `index` and read one item.
    fn candidate_at(&self, session: SessionId, index: usize) -> Option<EngineCandidate>;
}
