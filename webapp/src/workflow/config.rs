use anyhow::Context;
use medviscore::prelude::StageConfig;
use medviscore::narrative::Language;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_display_width() -> u32 {
    600
}

fn default_true() -> bool {
    true
}

fn default_port() -> u16 {
    8080
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_key: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Optional custom classifier weight bundle; the bundled backbone is
    /// used when absent.
    #[serde(default)]
    pub model_path: Option<PathBuf>,
    #[serde(default = "default_display_width")]
    pub display_width: u32,
    #[serde(default = "default_true")]
    pub enhance_contrast: bool,
    #[serde(default = "default_true")]
    pub denoise: bool,
    #[serde(default)]
    pub default_language: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading app config {}", path_ref.display()))?;
        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing app config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(api_key: String, port: u16) -> Self {
        Self {
            api_key,
            model: None,
            model_path: None,
            display_width: default_display_width(),
            enhance_contrast: true,
            denoise: true,
            default_language: None,
            port,
        }
    }

    pub fn to_stage_config(&self) -> StageConfig {
        StageConfig {
            enhance_contrast: self.enhance_contrast,
            denoise: self.denoise,
            ..StageConfig::default()
        }
    }

    pub fn default_language(&self) -> Language {
        self.default_language
            .as_deref()
            .and_then(|code| code.parse().ok())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_produces_stage_config() {
        let cfg = AppConfig::from_args("key".into(), 8080);
        let stage = cfg.to_stage_config();
        assert_eq!(stage.max_edge, 1024);
        assert!(stage.enhance_contrast);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"api_key: abc\ndenoise: false\ndefault_language: hi\n")
            .unwrap();
        let path = temp.into_temp_path();
        let cfg = AppConfig::load(&path).unwrap();
        assert_eq!(cfg.api_key, "abc");
        assert!(!cfg.denoise);
        assert_eq!(cfg.default_language(), Language::Hindi);
        assert_eq!(cfg.port, 8080);
    }
}
