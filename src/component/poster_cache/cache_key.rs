use crate::component::poster_generator::RenderOptions;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// 來源影片的穩定識別
///
/// 由呼叫端提供；快取本身不計算指紋，也不檢查檔案是否變動。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceIdentity {
    /// 內容指紋（十六進位字串）
    Fingerprint(String),
    /// 路徑、大小與修改時間組成的識別
    FileStat {
        path: PathBuf,
        size: u64,
        modified_ns: u128,
    },
}

impl SourceIdentity {
    /// 以檔案系統資訊建立識別，不讀取檔案內容
    pub fn from_metadata(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let modified_ns = metadata
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();

        Ok(Self::FileStat {
            path: path.to_path_buf(),
            size: metadata.len(),
            modified_ns,
        })
    }

    fn key_material(&self) -> String {
        match self {
            Self::Fingerprint(hex) => format!("fp:{}", hex.to_ascii_lowercase()),
            Self::FileStat {
                path,
                size,
                modified_ns,
            } => format!("stat:{}:{size}:{modified_ns}", path.to_string_lossy()),
        }
    }
}

/// 快取鍵：64 字元的 BLAKE3 十六進位字串
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    #[must_use]
    pub fn new(identity: &SourceIdentity, options: &RenderOptions) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"poster|");
        hasher.update(identity.key_material().as_bytes());
        hasher.update(b"|");
        hasher.update(options.variant().as_bytes());
        Self(hasher.finalize().to_hex().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 分層後的相對路徑：`ab/cd/abcd....jpg`
    ///
    /// 兩層各 256 個目錄，讓單一目錄的檔案數維持在可控範圍。
    #[must_use]
    pub fn shard_path(&self, extension: &str) -> PathBuf {
        PathBuf::from(&self.0[0..2])
            .join(&self.0[2..4])
            .join(format!("{}.{extension}", self.0))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
