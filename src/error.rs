use std::path::PathBuf;
use thiserror::Error;

/// 海報產生流程的錯誤類型
///
/// 參數驗證錯誤（`Invalid*`）一律立即回傳；解碼相關錯誤（`DecodeFailed`、`Timeout`）
/// 只在候選時間點之間流轉，最終由 placeholder 吸收；快取寫入失敗則回報給呼叫端。
#[derive(Error, Debug)]
pub enum PosterError {
    #[error("無效的輸入檔案: {}", .0.display())]
    InvalidInput(PathBuf),

    #[error("無效的時間點: {0}s（允許 0 ~ 86400 秒）")]
    InvalidTimestamp(f64),

    #[error("無效的輸出高度: {0}px（允許 50 ~ 2160）")]
    InvalidDimensions(u32),

    #[error("無效的品質參數: {0}（允許 2 ~ 31）")]
    InvalidQuality(u8),

    #[error("解碼失敗 @ {timestamp:.3}s: {reason}")]
    DecodeFailed { timestamp: f64, reason: String },

    #[error("解碼逾時 @ {timestamp:.3}s（{seconds} 秒）")]
    Timeout { timestamp: f64, seconds: u64 },

    #[error("所有候選時間點都無法解碼")]
    NoUsableCandidate,

    #[error("快取寫入失敗 {}: {source}", path.display())]
    CacheWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PosterError {
    /// 參數驗證錯誤屬於呼叫端錯誤，不應重試
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::InvalidTimestamp(_)
                | Self::InvalidDimensions(_)
                | Self::InvalidQuality(_)
        )
    }

    pub(crate) fn cache_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CacheWriteFailed {
            path: path.into(),
            source,
        }
    }
}

pub type PosterResult<T> = Result<T, PosterError>;
