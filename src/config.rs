use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const MIN_BEAMS: u32 = 1;
pub const MAX_BEAMS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend_url: String,
    pub num_beams: u32,
    pub preserve_numbers: bool,
    pub font_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:8000".to_string(),
            num_beams: 4,
            preserve_numbers: true,
            font_path: None,
        }
    }
}

impl Config {
    pub fn path() -> PathBuf {
        let exe = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("."));
        let dir = exe.parent().unwrap_or(Path::new("."));
        dir.join("config.json")
    }

    /// Loads `config.json` next to the executable, then applies `TRANSLATOR_*` env overrides.
    pub fn load() -> Self {
        Self::load_from(&Self::path()).with_env_overrides(|key| std::env::var(key).ok())
    }

    pub fn load_from(path: &Path) -> Self {
        let cfg = match fs::read_to_string(path) {
            Ok(s) => serde_json::from_str::<Config>(&s).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => {
                tracing::info!("No config at {}; using defaults", path.display());
                Self::default()
            }
        };
        cfg.normalized()
    }

    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        if let Some(v) = get("TRANSLATOR_BACKEND_URL") {
            self.backend_url = v;
        }
        if let Some(v) = get("TRANSLATOR_NUM_BEAMS").and_then(|v| v.parse().ok()) {
            self.num_beams = v;
        }
        if let Some(v) = get("TRANSLATOR_PRESERVE_NUMBERS").and_then(|v| parse_flag(&v)) {
            self.preserve_numbers = v;
        }
        if let Some(v) = get("TRANSLATOR_FONT") {
            self.font_path = Some(v);
        }
        self.normalized()
    }

    fn normalized(mut self) -> Self {
        self.num_beams = self.num_beams.clamp(MIN_BEAMS, MAX_BEAMS);
        self
    }
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("config.json"));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "backend_url": "http://10.0.0.2:9000", "num_beams": 42 }"#).unwrap();

        let cfg = Config::load_from(&path);
        assert_eq!(cfg.backend_url, "http://10.0.0.2:9000");
        assert_eq!(cfg.num_beams, MAX_BEAMS);
        assert!(cfg.preserve_numbers);
        assert_eq!(cfg.font_path, None);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn env_overrides_apply_and_ignore_garbage() {
        let env: HashMap<&str, &str> = [
            ("TRANSLATOR_BACKEND_URL", "http://backend:8000/"),
            ("TRANSLATOR_NUM_BEAMS", "not-a-number"),
            ("TRANSLATOR_PRESERVE_NUMBERS", "off"),
            ("TRANSLATOR_FONT", "  "),
        ]
        .into_iter()
        .collect();

        let cfg = Config::default().with_env_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.backend_url, "http://backend:8000/");
        assert_eq!(cfg.num_beams, 4);
        assert!(!cfg.preserve_numbers);
        assert_eq!(cfg.font_path, None);
    }

    #[test]
    fn env_beam_width_is_clamped() {
        let cfg = Config::default().with_env_overrides(|k| {
            (k == "TRANSLATOR_NUM_BEAMS").then(|| "0".to_string())
        });
        assert_eq!(cfg.num_beams, MIN_BEAMS);
    }
}
