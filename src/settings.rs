use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");
const HISTORY_LIMIT_RANGE: std::ops::RangeInclusive<usize> = 50..=100;

#[derive(Debug, Clone)]
pub struct Settings {
    pub history_limit: usize,
    pub history_retention_days: u32,
    pub preferences: Preferences,
    pub providers: ProviderSettings,
    pub gemini: GeminiSettings,
}

/// The persisted settings object a front end toggles at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub auto_translate_on_selection: bool,
    pub translation_enabled: bool,
    pub tooltip_position: TooltipPosition,
    pub speech_rate: f32,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            auto_translate_on_selection: false,
            translation_enabled: true,
            tooltip_position: TooltipPosition::Below,
            speech_rate: 0.9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TooltipPosition {
    Below,
    Above,
}

impl TooltipPosition {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "below" => Some(TooltipPosition::Below),
            "above" => Some(TooltipPosition::Above),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub timeout_seconds: u64,
    pub lingva_url: String,
    pub mymemory_url: String,
    pub libretranslate_urls: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_url: String,
    pub model: String,
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub max_output_tokens: u32,
    pub safety_threshold: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_limit: 50,
            history_retention_days: 30,
            preferences: Preferences::default(),
            providers: ProviderSettings {
                timeout_seconds: 10,
                lingva_url: "https://lingva.ml".to_string(),
                mymemory_url: "https://api.mymemory.translated.net".to_string(),
                libretranslate_urls: vec![
                    "https://libretranslate.de/translate".to_string(),
                    "https://translate.argosopentech.com/translate".to_string(),
                ],
            },
            gemini: GeminiSettings {
                api_url: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
                model: "gemini-2.0-flash-exp".to_string(),
                temperature: 0.2,
                top_k: 40,
                top_p: 0.95,
                max_output_tokens: 1024,
                safety_threshold: "BLOCK_MEDIUM_AND_ABOVE".to_string(),
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    system: Option<SystemSection>,
    preferences: Option<PreferencesSection>,
    providers: Option<ProvidersSection>,
    gemini: Option<GeminiSection>,
}

#[derive(Debug, Default, Deserialize)]
struct SystemSection {
    histories: Option<usize>,
    history_retention_days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct PreferencesSection {
    auto_translate_on_selection: Option<bool>,
    translation_enabled: Option<bool>,
    tooltip_position: Option<String>,
    speech_rate: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct ProvidersSection {
    timeout_seconds: Option<u64>,
    lingva_url: Option<String>,
    mymemory_url: Option<String>,
    libretranslate_urls: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiSection {
    api_url: Option<String>,
    model: Option<String>,
    temperature: Option<f64>,
    top_k: Option<u32>,
    top_p: Option<f64>,
    max_output_tokens: Option<u32>,
    safety_threshold: Option<String>,
}

/// Loads the layered settings, seeding `<base>/settings.toml` on first use.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let home = paths::settings_dir();
    if let Some(home) = home.as_deref() {
        ensure_home_settings_file(home)?;
    }
    load_settings_from(home.as_deref(), extra_path)
}

pub fn load_settings_from(home: Option<&Path>, extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();

    let mut ordered_paths = vec![
        PathBuf::from("settings.toml"),
        PathBuf::from("settings.local.toml"),
    ];
    if let Some(home) = home {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            settings
                .merge_toml(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
        }
    }

    Ok(settings)
}

impl Settings {
    pub fn merge_toml(&mut self, content: &str) -> Result<()> {
        let parsed: SettingsFile = toml::from_str(content)?;
        self.merge(parsed);
        Ok(())
    }

    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(system) = incoming.system {
            if let Some(limit) = system.histories
                && limit > 0
            {
                self.history_limit =
                    limit.clamp(*HISTORY_LIMIT_RANGE.start(), *HISTORY_LIMIT_RANGE.end());
            }
            if let Some(days) = system.history_retention_days
                && days > 0
            {
                self.history_retention_days = days;
            }
        }
        if let Some(prefs) = incoming.preferences {
            if let Some(value) = prefs.auto_translate_on_selection {
                self.preferences.auto_translate_on_selection = value;
            }
            if let Some(value) = prefs.translation_enabled {
                self.preferences.translation_enabled = value;
            }
            if let Some(position) = prefs
                .tooltip_position
                .as_deref()
                .and_then(TooltipPosition::parse)
            {
                self.preferences.tooltip_position = position;
            }
            if let Some(rate) = prefs.speech_rate
                && rate > 0.0
            {
                self.preferences.speech_rate = rate;
            }
        }
        if let Some(providers) = incoming.providers {
            if let Some(timeout) = providers.timeout_seconds
                && timeout > 0
            {
                self.providers.timeout_seconds = timeout;
            }
            merge_string(&mut self.providers.lingva_url, providers.lingva_url);
            merge_string(&mut self.providers.mymemory_url, providers.mymemory_url);
            if let Some(urls) = providers.libretranslate_urls {
                self.providers.libretranslate_urls = urls
                    .into_iter()
                    .map(|url| url.trim().to_string())
                    .filter(|url| !url.is_empty())
                    .collect();
            }
        }
        if let Some(gemini) = incoming.gemini {
            merge_string(&mut self.gemini.api_url, gemini.api_url);
            merge_string(&mut self.gemini.model, gemini.model);
            merge_string(&mut self.gemini.safety_threshold, gemini.safety_threshold);
            if let Some(value) = gemini.temperature
                && value >= 0.0
            {
                self.gemini.temperature = value;
            }
            if let Some(value) = gemini.top_k
                && value > 0
            {
                self.gemini.top_k = value;
            }
            if let Some(value) = gemini.top_p
                && value > 0.0
            {
                self.gemini.top_p = value;
            }
            if let Some(value) = gemini.max_output_tokens
                && value > 0
            {
                self.gemini.max_output_tokens = value;
            }
        }
    }
}

fn merge_string(slot: &mut String, incoming: Option<String>) {
    if let Some(value) = incoming {
        let value = value.trim();
        if !value.is_empty() {
            *slot = value.to_string();
        }
    }
}

fn ensure_home_settings_file(home: &Path) -> Result<()> {
    fs::create_dir_all(home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}
