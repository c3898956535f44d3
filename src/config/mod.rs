use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ClockFormat {
    #[default]
    Hour24,      // "14:30"
    Hour12,      // "2:30pm"
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ViewMode {
    #[default]
    Week,        // Whole family, one column per day
    Person,      // One family member's week
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_base_url: String,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_font_scale")]
    pub font_scale: f32,
    #[serde(default)]
    pub clock_format: ClockFormat,
    #[serde(default)]
    pub view_mode: ViewMode,
    /// Member shown in the person week view
    #[serde(default)]
    pub selected_member: Option<String>,
    #[serde(default = "default_schedule_start_hour")]
    pub schedule_start_hour: u8,
    #[serde(default = "default_schedule_end_hour")]
    pub schedule_end_hour: u8,
    #[serde(default = "default_spond_stale_after_minutes")]
    pub spond_stale_after_minutes: i64,
    /// Family member id -> "#rrggbb"
    #[serde(default)]
    pub member_colors: HashMap<String, String>,
}

fn default_schedule_start_hour() -> u8 {
    8
}

fn default_schedule_end_hour() -> u8 {
    20
}

fn default_spond_stale_after_minutes() -> i64 {
    30
}

fn default_font_scale() -> f32 {
    1.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            api_token: None,
            font_scale: 1.0,
            clock_format: ClockFormat::Hour24,
            view_mode: ViewMode::Week,
            selected_member: None,
            schedule_start_hour: default_schedule_start_hour(),
            schedule_end_hour: default_schedule_end_hour(),
            spond_stale_after_minutes: default_spond_stale_after_minutes(),
            member_colors: HashMap::new(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            let config: Config = serde_json::from_str(&contents)
                .context("Failed to parse config file")?;
            tracing::debug!(path = %config_path.display(), "loaded config");
            Ok(config.sanitized())
        } else {
            tracing::info!(path = %config_path.display(), "no config file; using defaults");
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;

        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        !self.api_base_url.trim().is_empty() && self.api_token.is_some()
    }

    fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "homedash", "homedash")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.json"))
    }

    /// Base URL without trailing slashes, with a scheme
    pub fn base_url(&self) -> String {
        let url = self.api_base_url.trim().trim_end_matches('/');
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("https://{}", url)
        }
    }

    /// Keep the visible hour window usable: within a day and at least one hour
    fn sanitized(mut self) -> Self {
        self.schedule_end_hour = self.schedule_end_hour.clamp(1, 24);
        if self.schedule_start_hour >= self.schedule_end_hour {
            self.schedule_start_hour = self.schedule_end_hour - 1;
        }
        if self.spond_stale_after_minutes < 0 {
            self.spond_stale_after_minutes = default_spond_stale_after_minutes();
        }
        self
    }

    pub fn spond_stale_after(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.spond_stale_after_minutes)
    }

    pub fn member_color(&self, member_id: &str) -> Option<&str> {
        self.member_colors.get(member_id).map(String::as_str)
    }

    pub fn set_member_color(&mut self, member_id: &str, hex: &str) {
        self.member_colors.insert(member_id.to_string(), hex.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config: Config = serde_json::from_str(r#"{"api_base_url": "home.local"}"#).unwrap();
        assert_eq!(config.schedule_start_hour, 8);
        assert_eq!(config.schedule_end_hour, 20);
        assert_eq!(config.spond_stale_after_minutes, 30);
        assert_eq!(config.view_mode, ViewMode::Week);
        assert!(config.member_colors.is_empty());
        assert!(!config.is_configured());
    }

    #[test]
    fn base_url_adds_scheme_and_trims() {
        let mut config = Config::default();
        config.api_base_url = " home.local:8080/api/ ".to_string();
        assert_eq!(config.base_url(), "https://home.local:8080/api");

        config.api_base_url = "http://localhost:3001/".to_string();
        assert_eq!(config.base_url(), "http://localhost:3001");
    }

    #[test]
    fn sanitize_repairs_hour_window() {
        let config = Config {
            schedule_start_hour: 22,
            schedule_end_hour: 30,
            ..Config::default()
        }
        .sanitized();
        assert_eq!(config.schedule_end_hour, 24);
        assert_eq!(config.schedule_start_hour, 22);

        let config = Config {
            schedule_start_hour: 12,
            schedule_end_hour: 9,
            ..Config::default()
        }
        .sanitized();
        assert_eq!(config.schedule_start_hour, 8);
    }

    #[test]
    fn member_colors_round_trip_through_json() {
        let mut config = Config::default();
        config.set_member_color("m1", "#ff8800");
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.member_color("m1"), Some("#ff8800"));
        assert_eq!(back.member_color("m2"), None);
    }
}
