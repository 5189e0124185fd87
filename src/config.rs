/// Configuration module for the Menu500 taskbar overlay.
///
/// This module provides functionality for managing overlay configuration,
/// including:
/// - Icon glyph and size, slot margin
/// - Tooltip show delay and fade animation speed
/// - Menu source URL and refresh interval
/// - Run-at-login and debug logging switches
///
/// The configuration is loaded from a `config.json` file located in the
/// platform-specific application data directory
/// (%APPDATA%/Menu500Tracker/ on Windows). Missing fields fall back to
/// their defaults, so a partial file is valid.
///
/// # Example
///
/// ```rust,no_run
/// use menu500_tracker::config::{load_config, save_config};
///
/// let mut config = load_config();
/// config.show_delay_ms = 250;
/// save_config(&config).expect("Failed to save config");
/// ```
use anyhow::{anyhow, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::interaction::InteractionSettings;

pub const APP_NAME: &str = "Menu500Tracker";
pub const DEFAULT_MENU_URL: &str = "https://www.500restaurant.cz/denni-menu/";

/// Overlay configuration
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct OverlayConfig {
    /// Text painted on the taskbar icon
    pub glyph: String,
    /// Icon width in device independent pixels
    pub icon_width_dip: i32,
    /// Gap left between the icon and its neighbours in the tray
    pub slot_margin_dip: i32,
    /// Hover time before the tooltip appears
    pub show_delay_ms: u32,
    /// Fade timer interval
    pub fade_tick_ms: u32,
    /// Alpha added per tick while appearing
    pub fade_in_step: u8,
    /// Alpha removed per tick while disappearing
    pub fade_out_step: u8,
    pub menu_url: String,
    pub refresh_minutes: u64,
    /// Register the executable under the per-user Run key on startup
    pub start_with_windows: bool,
    pub debug_logging: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        OverlayConfig {
            glyph: "500".to_string(),
            icon_width_dip: 40,
            slot_margin_dip: 4,
            show_delay_ms: 400,
            fade_tick_ms: 16,
            fade_in_step: 24,
            fade_out_step: 48,
            menu_url: DEFAULT_MENU_URL.to_string(),
            refresh_minutes: 60,
            start_with_windows: true,
            debug_logging: false,
        }
    }
}

impl OverlayConfig {
    /// Replace degenerate values with the defaults
    pub fn validate(mut self) -> Self {
        let defaults = OverlayConfig::default();
        if self.glyph.trim().is_empty() {
            self.glyph = defaults.glyph;
        }
        if self.icon_width_dip <= 0 {
            self.icon_width_dip = defaults.icon_width_dip;
        }
        if self.slot_margin_dip < 0 {
            self.slot_margin_dip = 0;
        }
        if self.fade_tick_ms == 0 {
            self.fade_tick_ms = defaults.fade_tick_ms;
        }
        if self.fade_in_step == 0 {
            self.fade_in_step = defaults.fade_in_step;
        }
        if self.fade_out_step == 0 {
            self.fade_out_step = defaults.fade_out_step;
        }
        if self.refresh_minutes == 0 {
            self.refresh_minutes = defaults.refresh_minutes;
        }
        if self.menu_url.trim().is_empty() {
            self.menu_url = defaults.menu_url;
        }
        self
    }

    /// Timer settings for the interaction state machine
    pub fn interaction(&self) -> InteractionSettings {
        InteractionSettings {
            show_delay: Duration::from_millis(self.show_delay_ms as u64),
            fade_tick: Duration::from_millis(self.fade_tick_ms as u64),
            fade_in_step: self.fade_in_step,
            fade_out_step: self.fade_out_step,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_minutes * 60)
    }
}

/// Get the application's data directory
/// Returns %APPDATA%/Menu500Tracker/ on Windows
/// Creates directory if it doesn't exist
pub fn get_data_directory() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", APP_NAME)
        .ok_or_else(|| anyhow!("Failed to determine user data directory"))?;

    let data_dir = project_dirs.data_dir();

    fs::create_dir_all(data_dir)
        .map_err(|e| anyhow!("Failed to create data directory: {}", e))?;

    Ok(data_dir.to_path_buf())
}

/// Parse config JSON, falling back to defaults for anything unreadable
pub fn parse_config(contents: &str) -> OverlayConfig {
    serde_json::from_str::<OverlayConfig>(contents)
        .unwrap_or_default()
        .validate()
}

/// Load overlay configuration from config.json
/// Returns default config if file doesn't exist or on error
pub fn load_config() -> OverlayConfig {
    let Ok(data_dir) = get_data_directory() else {
        return OverlayConfig::default();
    };

    let config_path = data_dir.join("config.json");

    if !config_path.exists() {
        return OverlayConfig::default();
    }

    let Ok(contents) = fs::read_to_string(&config_path) else {
        return OverlayConfig::default();
    };

    parse_config(&contents)
}

/// Save overlay configuration to config.json
pub fn save_config(config: &OverlayConfig) -> Result<()> {
    let data_dir = get_data_directory()?;
    let config_path = data_dir.join("config.json");

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;

    fs::write(&config_path, json)
        .map_err(|e| anyhow!("Failed to write config.json: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OverlayConfig::default();
        assert_eq!(config.icon_width_dip, 40);
        assert_eq!(config.slot_margin_dip, 4);
        assert!(config.fade_in_step < config.fade_out_step);
        assert_eq!(config.menu_url, DEFAULT_MENU_URL);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = parse_config(r#"{ "show_delay_ms": 250, "glyph": "M" }"#);
        assert_eq!(config.show_delay_ms, 250);
        assert_eq!(config.glyph, "M");
        assert_eq!(config.fade_tick_ms, 16);
        assert_eq!(config.refresh_minutes, 60);
    }

    #[test]
    fn test_invalid_json_falls_back() {
        assert_eq!(parse_config("not json"), OverlayConfig::default());
    }

    #[test]
    fn test_validate_replaces_degenerate_values() {
        let config = parse_config(
            r#"{ "fade_in_step": 0, "fade_tick_ms": 0, "glyph": "  ", "slot_margin_dip": -3 }"#,
        );
        assert_eq!(config.fade_in_step, 24);
        assert_eq!(config.fade_tick_ms, 16);
        assert_eq!(config.glyph, "500");
        assert_eq!(config.slot_margin_dip, 0);
    }

    #[test]
    fn test_interaction_settings() {
        let settings = OverlayConfig::default().interaction();
        assert_eq!(settings.show_delay, Duration::from_millis(400));
        assert_eq!(settings.fade_tick, Duration::from_millis(16));
        assert_eq!(settings.fade_in_step, 24);
        assert_eq!(settings.fade_out_step, 48);
    }
}
