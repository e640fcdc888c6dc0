//! Settings shape. Every struct fills missing keys from its `Default`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TetherSettings {
    pub server: ServerSettings,
    pub sessions: SessionSettings,
    pub logging: LoggingSettings,
}

/// HTTP transport settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Listen port (`0` picks a free port).
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9191,
        }
    }
}

/// Session lifecycle settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSettings {
    /// Root directory for per-session artifact trees. Relative paths resolve
    /// against `~/.tether`.
    pub root_dir: String,
    /// Seconds between cleanup sweeps.
    pub sweep_interval_secs: u64,
    /// Idle seconds before an auto-cleanup session is swept.
    pub cleanup_after_secs: u64,
    /// Whether development sessions are swept when idle.
    pub development_auto_cleanup: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            root_dir: "sessions".to_string(),
            sweep_interval_secs: 300,
            cleanup_after_secs: 7200,
            development_auto_cleanup: false,
        }
    }
}

impl SessionSettings {
    pub fn resolved_root(&self, home: &std::path::Path) -> PathBuf {
        let root = PathBuf::from(&self.root_dir);
        if root.is_absolute() {
            root
        } else {
            home.join(root)
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = TetherSettings::default();
        assert_eq!(s.server.port, 9191);
        assert_eq!(s.sessions.sweep_interval_secs, 300);
        assert_eq!(s.sessions.cleanup_after_secs, 7200);
        assert!(!s.sessions.development_auto_cleanup);
        assert_eq!(s.logging.level, "info");
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(TetherSettings::default()).unwrap();
        assert_eq!(json["sessions"]["sweepIntervalSecs"], 300);
        assert_eq!(json["sessions"]["rootDir"], "sessions");
    }

    #[test]
    fn relative_root_resolves_under_home() {
        let s = SessionSettings::default();
        let home = std::path::Path::new("/home/u/.tether");
        assert_eq!(s.resolved_root(home), PathBuf::from("/home/u/.tether/sessions"));

        let abs = SessionSettings {
            root_dir: "/var/tether".into(),
            ..SessionSettings::default()
        };
        assert_eq!(abs.resolved_root(home), PathBuf::from("/var/tether"));
    }
}
