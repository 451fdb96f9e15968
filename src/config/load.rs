use crate::component::poster_generator::RenderOptions;
use crate::config::types::{Config, DATA_DIR_ENV, UserSettings};
use crate::error::PosterResult;
use anyhow::{Context, Result};
use log::warn;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SETTINGS_FILE: &str = "settings.json";

impl Config {
    /// 讀取工作目錄下的 settings.json；不存在或格式錯誤時使用預設值
    #[must_use]
    pub fn new() -> Self {
        let settings = match load_settings(Path::new(SETTINGS_FILE)) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("{e:#}，改用預設設定");
                UserSettings::default()
            }
        };
        Self { settings }
    }

    /// 快取目錄：設定檔覆寫 > 環境變數指定的資料目錄 > 系統資料目錄
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        if let Some(dir) = &self.settings.cache_dir {
            return dir.clone();
        }
        data_dir().join("cache")
    }

    pub fn render_options(&self) -> PosterResult<RenderOptions> {
        RenderOptions::new(self.settings.poster_height, self.settings.poster_quality)
    }

    #[must_use]
    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.render_timeout_secs.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings: UserSettings::default(),
        }
    }
}

pub fn load_settings(path: &Path) -> Result<UserSettings> {
    if !path.exists() {
        return Ok(UserSettings::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("無法讀取設定檔 {}", path.display()))?;

    serde_json::from_str(&content).with_context(|| format!("無法解析設定檔 {}", path.display()))
}

fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }

    directories::ProjectDirs::from("", "", "auto_video_poster")
        .map_or_else(|| PathBuf::from(".auto_video_poster"), |dirs| dirs.data_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, UserSettings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"poster_height": 720, "language": "zh-TW"}"#).unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.poster_height, 720);
        assert_eq!(settings.language.as_str(), "zh-TW");
        assert_eq!(settings.poster_quality, UserSettings::default().poster_quality);
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();

        assert!(load_settings(&path).is_err());
    }

    #[test]
    fn test_cache_dir_override() {
        let mut config = Config::default();
        config.settings.cache_dir = Some(PathBuf::from("/srv/posters"));
        assert_eq!(config.cache_dir(), PathBuf::from("/srv/posters"));
    }

    #[test]
    fn test_invalid_settings_rejected_by_options() {
        let mut config = Config::default();
        assert!(config.render_options().is_ok());

        config.settings.poster_quality = 40;
        assert!(config.render_options().is_err());
    }
}
