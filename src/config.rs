use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Environment variables read for the hosted backend, in priority order
const HOSTED_URL_VARS: &[&str] = &["TASKBOARD_HOSTED_URL", "SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL"];
const HOSTED_KEY_VARS: &[&str] = &[
    "TASKBOARD_HOSTED_KEY",
    "SUPABASE_ANON_KEY",
    "NEXT_PUBLIC_SUPABASE_PUBLISHABLE_KEY",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// In-process only, nothing survives exit
    Memory,
    /// One JSON document on disk
    Local,
    /// Local SQLite database with the hosted schema
    Sqlite,
    /// Hosted PostgREST data service
    Hosted,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Backend::Memory => "memory",
            Backend::Local => "local",
            Backend::Sqlite => "sqlite",
            Backend::Hosted => "hosted",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_backend")]
    pub backend: Backend,
    #[serde(default = "default_local_path")]
    pub local_path: String,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_session_path")]
    pub session_path: String,
    #[serde(default)]
    pub hosted: HostedConfig,
    #[serde(default)]
    pub key_bindings: KeyBindings,
    #[serde(default = "default_current_theme")]
    pub current_theme: String,
    #[serde(default)]
    pub themes: HashMap<String, Theme>,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostedConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(default = "default_quit")]
    pub quit: String,
    #[serde(default = "default_help")]
    pub help: String,
    #[serde(default = "default_new")]
    pub new: String,
    #[serde(default = "default_toggle")]
    pub toggle: String,
    #[serde(default = "default_delete")]
    pub delete: String,
    #[serde(default = "default_comments")]
    pub comments: String,
    #[serde(default = "default_grab")]
    pub grab: String,
    #[serde(default = "default_refresh")]
    pub refresh: String,
    #[serde(default = "default_logout")]
    pub logout: String,
    #[serde(default = "default_list_up")]
    pub list_up: String,
    #[serde(default = "default_list_down")]
    pub list_down: String,
    #[serde(default = "default_column_left")]
    pub column_left: String,
    #[serde(default = "default_column_right")]
    pub column_right: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default = "default_fg")]
    pub fg: String,
    #[serde(default = "default_bg")]
    pub bg: String,
    #[serde(default = "default_highlight_bg")]
    pub highlight_bg: String,
    #[serde(default = "default_highlight_fg")]
    pub highlight_fg: String,
    #[serde(default = "default_accent")]
    pub accent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            local_path: default_local_path(),
            database_path: default_database_path(),
            session_path: default_session_path(),
            hosted: HostedConfig::default(),
            key_bindings: KeyBindings::default(),
            current_theme: default_current_theme(),
            themes: HashMap::new(),
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

impl Default for HostedConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: default_quit(),
            help: default_help(),
            new: default_new(),
            toggle: default_toggle(),
            delete: default_delete(),
            comments: default_comments(),
            grab: default_grab(),
            refresh: default_refresh(),
            logout: default_logout(),
            list_up: default_list_up(),
            list_down: default_list_down(),
            column_left: default_column_left(),
            column_right: default_column_right(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: default_fg(),
            bg: default_bg(),
            highlight_bg: default_highlight_bg(),
            highlight_fg: default_highlight_fg(),
            accent: default_accent(),
        }
    }
}

impl Theme {
    /// Get preset themes that are always available
    pub fn get_preset_themes() -> HashMap<String, Theme> {
        let mut themes = HashMap::new();

        themes.insert("default".to_string(), Theme::default());

        themes.insert("light".to_string(), Theme {
            fg: "black".to_string(),
            bg: "white".to_string(),
            highlight_bg: "blue".to_string(),
            highlight_fg: "white".to_string(),
            accent: "magenta".to_string(),
        });

        themes.insert("indigo".to_string(), Theme {
            fg: "white".to_string(),
            bg: "#1e1b4b".to_string(),
            highlight_bg: "#4f46e5".to_string(),
            highlight_fg: String::new(),
            accent: "#a5b4fc".to_string(),
        });

        themes
    }
}

// Default value functions
fn default_backend() -> Backend {
    Backend::Local
}

fn default_local_path() -> String {
    utils::data_file(utils::Profile::Prod, "board.json")
}

fn default_database_path() -> String {
    utils::data_file(utils::Profile::Prod, "board.db")
}

fn default_session_path() -> String {
    utils::data_file(utils::Profile::Prod, "session.json")
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_quit() -> String {
    "q".to_string()
}

fn default_help() -> String {
    "F1".to_string()
}

fn default_new() -> String {
    "n".to_string()
}

fn default_toggle() -> String {
    "Space".to_string()
}

fn default_delete() -> String {
    "d".to_string()
}

fn default_comments() -> String {
    "c".to_string()
}

fn default_grab() -> String {
    "m".to_string()
}

fn default_refresh() -> String {
    "r".to_string()
}

fn default_logout() -> String {
    "Ctrl+o".to_string()
}

fn default_list_up() -> String {
    "k".to_string()
}

fn default_list_down() -> String {
    "j".to_string()
}

fn default_column_left() -> String {
    "h".to_string()
}

fn default_column_right() -> String {
    "l".to_string()
}

fn default_current_theme() -> String {
    "default".to_string()
}

fn default_fg() -> String {
    "white".to_string()
}

fn default_bg() -> String {
    "black".to_string()
}

fn default_highlight_bg() -> String {
    "blue".to_string()
}

fn default_highlight_fg() -> String {
    "white".to_string()
}

fn default_accent() -> String {
    "cyan".to_string()
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
}

impl Config {
    /// Load configuration from file, or create default if missing.
    /// `path` overrides the profile's config location. Storage paths that
    /// were never customised follow the profile.
    pub fn load_with_profile(profile: utils::Profile, path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::get_config_path(profile)?,
        };

        let mut config = if config_path.exists() {
            let contents = fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::ReadError(e.to_string()))?;
            toml::from_str::<Config>(&contents)?
        } else {
            let mut config = Config::default();
            config.apply_profile_paths(profile);
            if let Err(e) = config.save_to(&config_path) {
                tracing::error!(path = %config_path.display(), error = %e, "Failed to save config file");
                return Err(e);
            }
            config
        };

        if profile == utils::Profile::Dev {
            config.apply_profile_paths(profile);
        }
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Point the storage paths at the profile's data directory
    fn apply_profile_paths(&mut self, profile: utils::Profile) {
        self.local_path = utils::data_file(profile, "board.json");
        self.database_path = utils::data_file(profile, "board.db");
        self.session_path = utils::data_file(profile, "session.json");
    }

    /// Let the environment supply the hosted endpoint and key; environment wins
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| lookup(name))
                .find(|v| !v.trim().is_empty())
        };
        if let Some(url) = first(HOSTED_URL_VARS) {
            self.hosted.url = Some(url);
        }
        if let Some(key) = first(HOSTED_KEY_VARS) {
            self.hosted.api_key = Some(key);
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&mut self, path: &Path) -> Result<(), ConfigError> {
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile)
            .ok_or_else(|| ConfigError::ConfigDirError("Could not determine config directory".to_string()))?;
        Ok(config_dir.join("config.toml"))
    }

    pub fn get_local_path(&self) -> PathBuf {
        utils::expand_path(&self.local_path)
    }

    pub fn get_database_path(&self) -> PathBuf {
        utils::expand_path(&self.database_path)
    }

    pub fn get_session_path(&self) -> PathBuf {
        utils::expand_path(&self.session_path)
    }

    /// Get the currently active theme
    /// If highlight_fg is not set (empty string), it will be calculated from highlight_bg
    pub fn get_active_theme(&self) -> Theme {
        use crate::tui::widgets::color::{format_color_for_display, get_contrast_text_color, parse_color};

        let mut theme = if let Some(theme) = self.themes.get(&self.current_theme) {
            theme.clone()
        } else if let Some(theme) = Theme::get_preset_themes().get(&self.current_theme) {
            theme.clone()
        } else {
            Theme::default()
        };

        if theme.highlight_fg.is_empty() {
            let highlight_bg_color = parse_color(&theme.highlight_bg);
            let calculated_fg = get_contrast_text_color(highlight_bg_color);
            theme.highlight_fg = format_color_for_display(&calculated_fg);
        }

        theme
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: Config = toml::from_str("backend = \"sqlite\"").unwrap();
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.key_bindings.toggle, "Space");
        assert_eq!(config.hosted.timeout_secs, 10);
    }

    #[test]
    fn test_env_overrides_hosted_settings() {
        let mut config = Config::default();
        config.hosted.url = Some("https://from-file".to_string());
        config.apply_env_overrides(|name| match name {
            "SUPABASE_URL" => Some("https://from-env.supabase.co".to_string()),
            "TASKBOARD_HOSTED_KEY" => Some("anon-key".to_string()),
            _ => None,
        });
        assert_eq!(config.hosted.url.as_deref(), Some("https://from-env.supabase.co"));
        assert_eq!(config.hosted.api_key.as_deref(), Some("anon-key"));
    }

    #[test]
    fn test_next_public_env_names_are_accepted() {
        let mut config = Config::default();
        config.apply_env_overrides(|name| match name {
            "NEXT_PUBLIC_SUPABASE_URL" => Some("https://web.supabase.co".to_string()),
            "NEXT_PUBLIC_SUPABASE_PUBLISHABLE_KEY" => Some("publishable".to_string()),
            _ => None,
        });
        assert_eq!(config.hosted.url.as_deref(), Some("https://web.supabase.co"));
        assert_eq!(config.hosted.api_key.as_deref(), Some("publishable"));
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut config = Config::default();
        config.hosted.url = Some("https://from-file".to_string());
        config.apply_env_overrides(|name| match name {
            "TASKBOARD_HOSTED_URL" => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.hosted.url.as_deref(), Some("https://from-file"));
    }

    #[test]
    fn test_load_creates_file_at_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = Config::load_with_profile(utils::Profile::Prod, Some(&path)).unwrap();
        assert!(path.exists());
        assert_eq!(config.backend, Backend::Local);

        let reloaded = Config::load_with_profile(utils::Profile::Prod, Some(&path)).unwrap();
        assert_eq!(reloaded.local_path, config.local_path);
    }

    #[test]
    fn test_empty_highlight_fg_is_derived() {
        let config = Config {
            current_theme: "indigo".to_string(),
            ..Config::default()
        };
        assert!(!config.get_active_theme().highlight_fg.is_empty());
    }
}
