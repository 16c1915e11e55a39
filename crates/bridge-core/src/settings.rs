//! Bridge settings loaded from TOML.
//!
//! - `Settings::default()` parses the embedded `default_settings.toml`
//! - `Settings::load(path)` reads a user file replacing the defaults
//! - `parse_settings_toml` validates after deserializing

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Program name → option name → value.
pub type AppOptions = BTreeMap<String, BTreeMap<String, bool>>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub preedit: PreeditSettings,
    pub session: SessionSettings,
    pub behavior: BehaviorSettings,
    pub notification: NotificationSettings,
    pub engine: EngineSettings,
    #[serde(default)]
    pub app_options: AppOptions,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse_settings_toml(&content)
    }

    pub fn silence_window(&self) -> Duration {
        Duration::from_millis(self.notification.silence_ms)
    }
}

impl Default for Settings {
    fn default() -> Self {
        parse_settings_toml(DEFAULT_SETTINGS_TOML).expect("embedded settings TOML must be valid")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PreeditMode {
    /// Preedit only in the input panel.
    No,
    /// The client shows what would be committed now.
    CommitPreview,
    /// The client shows the full composing text.
    ComposingText,
}

/// How input contexts are mapped onto engine sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SharePolicy {
    PerContext,
    PerProgram,
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SwitchInputMethodBehavior {
    Clear,
    CommitRawInput,
    CommitComposingText,
    CommitCommitPreview,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PreeditSettings {
    pub mode: PreeditMode,
    #[serde(default)]
    pub cursor_at_beginning: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionSettings {
    pub share_policy: SharePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BehaviorSettings {
    pub switch_input_method: SwitchInputMethodBehavior,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NotificationSettings {
    pub silence_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineSettings {
    pub shared_data_dir: PathBuf,
    pub user_data_dir: PathBuf,
    pub app_name: String,
    pub distribution_name: String,
    pub distribution_code_name: String,
    pub distribution_version: String,
}

impl EngineSettings {
    /// `user_data_dir` with a leading `~` expanded from `$HOME`.
    pub fn resolved_user_data_dir(&self) -> PathBuf {
        match self.user_data_dir.strip_prefix("~") {
            Ok(rest) => match std::env::var_os("HOME") {
                Some(home) => PathBuf::from(home).join(rest),
                None => self.user_data_dir.clone(),
            },
            Err(_) => self.user_data_dir.clone(),
        }
    }
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings = toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    macro_rules! check_non_empty {
        ($section:ident . $field:ident) => {
            if s.$section.$field.as_os_str().is_empty() {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
        };
    }

    check_non_empty!(engine.shared_data_dir);
    check_non_empty!(engine.user_data_dir);
    if s.engine.app_name.is_empty() {
        return Err(SettingsError::InvalidValue {
            field: "engine.app_name".to_string(),
            reason: "must not be empty".to_string(),
        });
    }

    for (program, options) in &s.app_options {
        if program.is_empty() {
            return Err(SettingsError::InvalidValue {
                field: "app_options".to_string(),
                reason: "program name must not be empty".to_string(),
            });
        }
        if options.keys().any(|k| k.is_empty()) {
            return Err(SettingsError::InvalidValue {
                field: format!("app_options.{program}"),
                reason: "option name must not be empty".to_string(),
            });
        }
    }

    Ok(())
}
