use super::cache_key::CacheKey;
use crate::component::poster_generator::OutputFormat;
use crate::error::{PosterError, PosterResult};
use crate::tools::ensure_directory_exists;
use crate::tools::file_tools::{is_non_empty_file, temp_sibling};
use log::{debug, error};
use std::fs;
use std::path::{Path, PathBuf};

const PLACEHOLDER_FILE_NAME: &str = "placeholder.jpg";

/// 以內容定址的海報快取
///
/// 每個項目寫入後不再修改，也不會被刪除；
/// 寫入一律經過同目錄暫存檔加 rename，所以不需要鎖。
#[derive(Debug, Clone)]
pub struct PosterCache {
    root: PathBuf,
    format: OutputFormat,
}

impl PosterCache {
    pub fn new(root: impl Into<PathBuf>) -> PosterResult<Self> {
        let root = root.into();
        ensure_directory_exists(&root).map_err(|e| PosterError::cache_write(&root, e))?;
        Ok(Self {
            root,
            format: OutputFormat::Jpeg,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.shard_path(self.format.extension()))
    }

    /// 共用的替代圖片位置，不屬於任何快取鍵
    #[must_use]
    pub fn placeholder_path(&self) -> PathBuf {
        self.root.join(PLACEHOLDER_FILE_NAME)
    }

    /// 只做一次 stat，不讀取內容
    #[must_use]
    pub fn lookup(&self, key: &CacheKey) -> Option<PathBuf> {
        let path = self.entry_path(key);
        is_non_empty_file(&path).then_some(path)
    }

    /// 把已產生的檔案複製進快取
    pub fn store(&self, key: &CacheKey, source: &Path) -> PosterResult<PathBuf> {
        let destination = self.entry_path(key);
        let temp_path = self.prepare_temp(&destination)?;

        let copied = fs::copy(source, &temp_path)
            .map(|_| ())
            .map_err(|e| PosterError::cache_write(&destination, e));
        if let Err(e) = copied {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        self.commit(&temp_path, &destination)
    }

    /// 快取命中就直接回傳路徑，否則呼叫 `producer` 產生內容
    ///
    /// `producer` 收到的是與最終位置同目錄的暫存路徑；
    /// 它回傳錯誤時暫存檔會被清掉，錯誤原樣傳回，不留下任何項目。
    pub fn get_or_create<F>(&self, key: &CacheKey, producer: F) -> PosterResult<PathBuf>
    where
        F: FnOnce(&Path) -> PosterResult<()>,
    {
        if let Some(path) = self.lookup(key) {
            debug!("快取命中: {key}");
            return Ok(path);
        }

        let destination = self.entry_path(key);
        let temp_path = self.prepare_temp(&destination)?;

        if let Err(e) = producer(&temp_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        if !is_non_empty_file(&temp_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(PosterError::cache_write(
                &destination,
                std::io::Error::other("產生的檔案不存在或是空的"),
            ));
        }

        self.commit(&temp_path, &destination)
    }

    fn prepare_temp(&self, destination: &Path) -> PosterResult<PathBuf> {
        if let Some(shard_dir) = destination.parent() {
            ensure_directory_exists(shard_dir)
                .map_err(|e| PosterError::cache_write(shard_dir, e))?;
        }
        Ok(temp_sibling(destination))
    }

    fn commit(&self, temp_path: &Path, destination: &Path) -> PosterResult<PathBuf> {
        match fs::rename(temp_path, destination) {
            Ok(()) => {
                debug!("快取寫入: {}", destination.display());
                Ok(destination.to_path_buf())
            }
            // 另一個 worker 已經放好同一個項目
            Err(_) if is_non_empty_file(destination) => {
                let _ = fs::remove_file(temp_path);
                Ok(destination.to_path_buf())
            }
            Err(e) => {
                let _ = fs::remove_file(temp_path);
                error!("快取寫入失敗 {}: {e}", destination.display());
                Err(PosterError::cache_write(destination, e))
            }
        }
    }
}
