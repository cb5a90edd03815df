use crate::cell::Tool;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub visual: VisualConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Where this config came from, reported once logging is set up
    #[serde(skip)]
    pub source: ConfigSource,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ConfigSource {
    File(String),
    #[default]
    Missing,
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize)]
pub struct EditorConfig {
    #[serde(default = "default_tool")]
    pub default_tool: Tool,
    #[serde(default = "default_zoom")]
    pub zoom: f32,
}

#[derive(Debug, Deserialize)]
pub struct VisualConfig {
    #[serde(default = "default_window_title")]
    pub window_title: String,
    #[serde(default = "default_bg_r")]
    pub background_r: u8,
    #[serde(default = "default_bg_g")]
    pub background_g: u8,
    #[serde(default = "default_bg_b")]
    pub background_b: u8,
    #[serde(default = "default_show_legend")]
    pub show_legend: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default = "default_enable_action_log")]
    pub enable_action_log: bool,
    #[serde(default = "default_action_log_path")]
    pub action_log_path: String,
}

// Default values
fn default_base_url() -> String { "http://127.0.0.1:8000".to_string() }
fn default_timeout_secs() -> u64 { 15 }
fn default_tool() -> Tool { Tool::RoadPath }
fn default_zoom() -> f32 { 1.0 }
fn default_window_title() -> String { "Parking Map Editor".to_string() }
fn default_bg_r() -> u8 { 243 }
fn default_bg_g() -> u8 { 244 }
fn default_bg_b() -> u8 { 246 }
fn default_show_legend() -> bool { true }
fn default_filter() -> String { "info".to_string() }
fn default_enable_action_log() -> bool { false }
fn default_action_log_path() -> String { "editor_actions.json".to_string() }

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            token: None,
            include_inactive: false,
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_tool: default_tool(),
            zoom: default_zoom(),
        }
    }
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            window_title: default_window_title(),
            background_r: default_bg_r(),
            background_g: default_bg_g(),
            background_b: default_bg_b(),
            show_legend: default_show_legend(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            enable_action_log: default_enable_action_log(),
            action_log_path: default_action_log_path(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            editor: EditorConfig::default(),
            visual: VisualConfig::default(),
            logging: LoggingConfig::default(),
            source: ConfigSource::Missing,
        }
    }
}

impl Config {
    /// Load `config.toml` from the working directory, or use defaults
    pub fn load() -> Self {
        Self::load_from(Path::new(CONFIG_PATH))
    }

    /// Load configuration from a file, or use defaults if it is missing or invalid
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => {
                let mut config = Self::parse(&contents);
                if config.source == ConfigSource::Missing {
                    config.source = ConfigSource::File(path.display().to_string());
                }
                config
            }
            Err(_) => Config::default(),
        }
    }

    /// Parse TOML text; invalid text falls back to defaults with the reason kept
    pub fn parse(contents: &str) -> Self {
        match toml::from_str::<Config>(contents) {
            Ok(config) => config,
            Err(e) => Config {
                source: ConfigSource::Invalid(e.to_string()),
                ..Config::default()
            },
        }
    }

    /// Log where the configuration came from
    pub fn report(&self) {
        match &self.source {
            ConfigSource::File(path) => tracing::info!("Loaded configuration from {}", path),
            ConfigSource::Missing => tracing::info!("No {} found, using default configuration", CONFIG_PATH),
            ConfigSource::Invalid(e) => {
                tracing::warn!("Failed to parse {}: {}", CONFIG_PATH, e);
                tracing::warn!("Using default configuration");
            }
        }
    }
}
