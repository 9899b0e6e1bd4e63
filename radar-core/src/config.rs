//! Configuration file management for skyradar.
//!
//! Reads/writes `~/.skyradar/config.yaml` with the feed endpoint, startup
//! viewport, hit-test threshold, map style, and dashboard address.

use std::path::{Path, PathBuf};

use crate::bbox::{BoundingBox, BoundsInput};
use crate::hittest::DEFAULT_HIT_THRESHOLD;
use crate::ingest::DEFAULT_FEED_BASE;
use crate::render::MapStyle;
use crate::types::{RadarError, Result};

/// Full configuration structure.
#[derive(Debug, Clone)]
pub struct Config {
    pub feed: FeedConfig,
    pub bounds: BoundsInput,
    pub radar: RadarConfig,
    pub map: MapStyle,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct RadarConfig {
    pub hit_threshold: f64,
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            feed: FeedConfig {
                base_url: DEFAULT_FEED_BASE.into(),
                timeout_secs: 10,
            },
            bounds: BoundingBox::default().to_input(),
            radar: RadarConfig {
                hit_threshold: DEFAULT_HIT_THRESHOLD,
            },
            map: MapStyle::default(),
            dashboard: DashboardConfig {
                host: "127.0.0.1".into(),
                port: 8080,
            },
        }
    }
}

impl Config {
    /// The configured startup viewport, or the default one if invalid.
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::try_from(self.bounds).unwrap_or_else(|e| {
            log::warn!("configured bounds invalid ({e}), using default viewport");
            BoundingBox::default()
        })
    }

    /// The configured threshold, or the default if not a positive number.
    pub fn hit_threshold(&self) -> f64 {
        let t = self.radar.hit_threshold;
        if t.is_finite() && t > 0.0 {
            t
        } else {
            DEFAULT_HIT_THRESHOLD
        }
    }
}

/// Get the config directory path (`~/.skyradar/`).
pub fn config_dir() -> PathBuf {
    home_dir().join(".skyradar")
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.yaml")
}

fn home_dir() -> PathBuf {
    ["HOME", "USERPROFILE"]
        .into_iter()
        .find_map(std::env::var_os)
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
}

/// Load config from `~/.skyradar/config.yaml`.
///
/// Returns default config if file doesn't exist.
pub fn load_config() -> Config {
    load_config_from(&config_file())
}

/// Load config from an explicit path, falling back to defaults.
pub fn load_config_from(path: &Path) -> Config {
    if !path.exists() {
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(text) => parse_config(&text),
        Err(e) => {
            log::warn!("cannot read {}: {e}", path.display());
            Config::default()
        }
    }
}

/// Save config to `~/.skyradar/config.yaml`.
pub fn save_config(config: &Config) -> Result<PathBuf> {
    let path = config_file();
    save_config_to(config, &path)?;
    Ok(path)
}

pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .map_err(|e| RadarError::Config(format!("{}: {e}", dir.display())))?;
    }
    std::fs::write(path, serialize_config(config))?;
    Ok(())
}

/// Parse simple YAML-like config text. Unknown keys are ignored.
pub fn parse_config(text: &str) -> Config {
    let mut config = Config::default();
    let mut current_section: Option<String> = None;

    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }

        let is_indented = line.starts_with("  ") || line.starts_with('\t');

        let Some((key, val)) = stripped.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let val = val.trim();

        if !is_indented {
            current_section = val.is_empty().then(|| key.to_string());
            continue;
        }

        let Some(section) = current_section.as_deref() else {
            continue;
        };

        match (section, key) {
            ("feed", "base_url") => set_string(&mut config.feed.base_url, val),
            ("feed", "timeout_secs") => {
                if let Ok(v) = val.parse() {
                    config.feed.timeout_secs = v;
                }
            }
            ("bounds", "lon_min") => set_float(&mut config.bounds.lon_min, val),
            ("bounds", "lon_max") => set_float(&mut config.bounds.lon_max, val),
            ("bounds", "lat_min") => set_float(&mut config.bounds.lat_min, val),
            ("bounds", "lat_max") => set_float(&mut config.bounds.lat_max, val),
            ("radar", "hit_threshold") => set_float(&mut config.radar.hit_threshold, val),
            ("map", "land_color") => set_string(&mut config.map.land_color, val),
            ("map", "ocean_color") => set_string(&mut config.map.ocean_color, val),
            ("map", "grid_spacing") => set_float(&mut config.map.grid_spacing, val),
            ("map", "icon_scale") => set_float(&mut config.map.icon_scale, val),
            ("dashboard", "host") => set_string(&mut config.dashboard.host, val),
            ("dashboard", "port") => {
                if let Ok(v) = val.parse::<u16>() {
                    config.dashboard.port = v;
                }
            }
            _ => log::debug!("ignoring config key {section}.{key}"),
        }
    }

    config
}

fn set_float(slot: &mut f64, val: &str) {
    if let Some(v) = scalar(val).and_then(|v| v.parse().ok()) {
        *slot = v;
    }
}

fn set_string(slot: &mut String, val: &str) {
    if let Some(v) = scalar(val) {
        *slot = v.to_string();
    }
}

/// A scalar with the YAML null spellings mapped to `None` and one pair of
/// matching quotes removed.
fn scalar(val: &str) -> Option<&str> {
    if matches!(val, "" | "~" | "null") {
        return None;
    }
    let unquoted = ['"', '\'']
        .into_iter()
        .find_map(|q| val.strip_prefix(q)?.strip_suffix(q));
    Some(unquoted.unwrap_or(val))
}

/// Serialize config to YAML-like text.
pub fn serialize_config(config: &Config) -> String {
    let mut lines = vec!["# skyradar configuration".to_string(), String::new()];

    lines.push("feed:".into());
    lines.push(format!("  base_url: \"{}\"", config.feed.base_url));
    lines.push(format!("  timeout_secs: {}", config.feed.timeout_secs));
    lines.push(String::new());

    lines.push("bounds:".into());
    lines.push(format!("  lon_min: {}", config.bounds.lon_min));
    lines.push(format!("  lon_max: {}", config.bounds.lon_max));
    lines.push(format!("  lat_min: {}", config.bounds.lat_min));
    lines.push(format!("  lat_max: {}", config.bounds.lat_max));
    lines.push(String::new());

    lines.push("radar:".into());
    lines.push(format!("  hit_threshold: {}", config.radar.hit_threshold));
    lines.push(String::new());

    lines.push("map:".into());
    lines.push(format!("  land_color: \"{}\"", config.map.land_color));
    lines.push(format!("  ocean_color: \"{}\"", config.map.ocean_color));
    lines.push(format!("  grid_spacing: {}", config.map.grid_spacing));
    lines.push(format!("  icon_scale: {}", config.map.icon_scale));
    lines.push(String::new());

    lines.push("dashboard:".into());
    lines.push(format!("  host: \"{}\"", config.dashboard.host));
    lines.push(format!("  port: {}", config.dashboard.port));

    lines.join("\n") + "\n"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
