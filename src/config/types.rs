use crate::component::poster_generator::{
    DEFAULT_POSTER_HEIGHT, DEFAULT_POSTER_QUALITY, ScoringWeights,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub const MAX_RECENT_PATHS: usize = 5;

/// 會被掃描的影片副檔名（不含點、小寫）
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "m4v", "wmv"];

/// 指定資料目錄的環境變數，快取放在其下的 `cache/`
pub const DATA_DIR_ENV: &str = "AUTO_VIDEO_POSTER_DATA_DIR";

pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "zh-TW")]
    ZhTw,
}

impl Language {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::ZhTw => "zh-TW",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnUs => write!(f, "English"),
            Self::ZhTw => write!(f, "繁體中文"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub language: Language,
    /// 覆寫快取目錄；未設定時使用資料目錄下的 `cache/`
    pub cache_dir: Option<PathBuf>,
    pub poster_height: u32,
    /// ffmpeg `-q:v`，2 最好、31 最差
    pub poster_quality: u8,
    pub render_timeout_secs: u64,
    pub concurrency: usize,
    pub scoring: ScoringWeights,
    pub recent_paths: Vec<String>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            language: Language::default(),
            cache_dir: None,
            poster_height: DEFAULT_POSTER_HEIGHT,
            poster_quality: DEFAULT_POSTER_QUALITY,
            render_timeout_secs: DEFAULT_RENDER_TIMEOUT_SECS,
            concurrency: default_concurrency(),
            scoring: ScoringWeights::default(),
            recent_paths: Vec::new(),
        }
    }
}

#[must_use]
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(2)
        .max(2)
}

#[derive(Debug, Clone)]
pub struct Config {
    pub settings: UserSettings,
}
