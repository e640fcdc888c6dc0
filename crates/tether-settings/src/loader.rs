//! Settings loading.
//!
//! Layers, lowest first: compiled [`TetherSettings::default()`], the JSON
//! settings file merged key by key, then `TETHER_*` environment variables.
//! Out-of-range values from either source are dropped in favour of the layer
//! below and reported as [`SettingsWarning`]s, which the caller logs once a
//! subscriber exists.

use std::fmt;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::{SessionSettings, TetherSettings};

const SWEEP_INTERVAL_SECS: RangeInclusive<u64> = 1..=86_400;
const CLEANUP_AFTER_SECS: RangeInclusive<u64> = 1..=30 * 86_400;

/// A rejected setting value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettingsWarning {
    pub key: String,
    pub value: String,
}

impl SettingsWarning {
    fn new(key: &str, value: impl ToString) -> Self {
        Self {
            key: key.to_owned(),
            value: value.to_string(),
        }
    }
}

impl fmt::Display for SettingsWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ignoring invalid {} = {:?}", self.key, self.value)
    }
}

/// Settings plus whatever was rejected while building them.
#[derive(Clone, Debug, Default)]
pub struct LoadedSettings {
    pub settings: TetherSettings,
    pub warnings: Vec<SettingsWarning>,
}

/// `~/.tether`, falling back to `/tmp/.tether` when `HOME` is unset.
pub fn tether_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
        .join(".tether")
}

/// `~/.tether/settings.json`.
pub fn settings_path() -> PathBuf {
    tether_home().join("settings.json")
}

pub fn load_settings() -> Result<LoadedSettings> {
    load_settings_from_path(&settings_path())
}

/// A missing file yields defaults; invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<LoadedSettings> {
    let mut loaded = load_file(path)?;
    let env_warnings = apply_env_overrides(&mut loaded.settings);
    loaded.warnings.extend(env_warnings);
    Ok(loaded)
}

fn load_file(path: &Path) -> Result<LoadedSettings> {
    let defaults = serde_json::to_value(TetherSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        deep_merge(defaults, serde_json::from_str(&content)?)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: TetherSettings = serde_json::from_value(merged)?;
    let warnings = check_session_ranges(&mut settings.sessions);
    Ok(LoadedSettings { settings, warnings })
}

/// Reset out-of-range session timings from the file to their defaults.
fn check_session_ranges(sessions: &mut SessionSettings) -> Vec<SettingsWarning> {
    let defaults = SessionSettings::default();
    let mut warnings = Vec::new();
    if !SWEEP_INTERVAL_SECS.contains(&sessions.sweep_interval_secs) {
        warnings.push(SettingsWarning::new(
            "sessions.sweepIntervalSecs",
            sessions.sweep_interval_secs,
        ));
        sessions.sweep_interval_secs = defaults.sweep_interval_secs;
    }
    if !CLEANUP_AFTER_SECS.contains(&sessions.cleanup_after_secs) {
        warnings.push(SettingsWarning::new(
            "sessions.cleanupAfterSecs",
            sessions.cleanup_after_secs,
        ));
        sessions.cleanup_after_secs = defaults.cleanup_after_secs;
    }
    warnings
}

/// Overlay `overlay` onto `base`. Objects merge per key, a `null` in the
/// overlay keeps the base value, anything else replaces it.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (key, value) in overlay.into_iter().filter(|(_, v)| !v.is_null()) {
                let merged = match base.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            Value::Object(base)
        }
        (_, overlay) => overlay,
    }
}

pub fn apply_env_overrides(settings: &mut TetherSettings) -> Vec<SettingsWarning> {
    apply_overrides(settings, |name| std::env::var(name).ok())
}

/// Apply `TETHER_*` overrides read through `lookup`. Empty values are
/// treated as unset; unparsable or out-of-range ones are returned as warnings.
pub fn apply_overrides(
    settings: &mut TetherSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Vec<SettingsWarning> {
    let mut warnings = Vec::new();
    let mut var = |name: &str, apply: &mut dyn FnMut(&str) -> bool| {
        if let Some(value) = lookup(name).filter(|v| !v.is_empty()) {
            if !apply(&value) {
                warnings.push(SettingsWarning::new(name, value));
            }
        }
    };

    var("TETHER_HOST", &mut |v: &str| {
        settings.server.host = v.to_owned();
        true
    });
    var("TETHER_PORT", &mut |v: &str| {
        set_parsed(&mut settings.server.port, v, 0..=u16::MAX)
    });
    var("TETHER_SESSIONS_DIR", &mut |v: &str| {
        settings.sessions.root_dir = v.to_owned();
        true
    });
    var("TETHER_SWEEP_INTERVAL_SECS", &mut |v: &str| {
        set_parsed(&mut settings.sessions.sweep_interval_secs, v, SWEEP_INTERVAL_SECS)
    });
    var("TETHER_CLEANUP_AFTER_SECS", &mut |v: &str| {
        set_parsed(&mut settings.sessions.cleanup_after_secs, v, CLEANUP_AFTER_SECS)
    });
    var("TETHER_LOG_LEVEL", &mut |v: &str| {
        settings.logging.level = v.to_owned();
        true
    });
    var("TETHER_LOG_JSON", &mut |v: &str| match parse_flag(v) {
        Some(json) => {
            settings.logging.json = json;
            true
        }
        None => false,
    });
    warnings
}

/// Store `raw` into `slot` if it parses and lies in `range`.
fn set_parsed<T: FromStr + PartialOrd>(slot: &mut T, raw: &str, range: RangeInclusive<T>) -> bool {
    match raw.parse::<T>() {
        Ok(n) if range.contains(&n) => {
            *slot = n;
            true
        }
        _ => false,
    }
}

/// `1/true/yes/on` and `0/false/no/off`, any case.
fn parse_flag(raw: &str) -> Option<bool> {
    let lower = raw.to_ascii_lowercase();
    if ["1", "true", "yes", "on"].contains(&lower.as_str()) {
        Some(true)
    } else if ["0", "false", "no", "off"].contains(&lower.as_str()) {
        Some(false)
    } else {
        None
    }
}
