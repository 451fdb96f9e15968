use super::cache_key::{CacheKey, SourceIdentity};
use super::store::PosterCache;
use crate::component::poster_generator::{
    FfmpegCommand, PosterRenderer, RenderOptions, RenderStatus, ToolStatus,
};
use crate::error::{PosterError, PosterResult};
use crate::tools::file_tools::is_non_empty_file;
use log::debug;
use std::path::{Path, PathBuf};

/// 一次海報查詢的結果
#[derive(Debug, Clone, PartialEq)]
pub struct PosterOutcome {
    pub image_path: PathBuf,
    pub status: RenderStatus,
    pub from_cache: bool,
    /// 快取命中時不知道當初選了哪個時間點
    pub source_timestamp: Option<f64>,
}

/// 快取與產生器的組合，批次流程對每個影片呼叫一次
pub struct PosterService {
    cache: PosterCache,
    renderer: PosterRenderer,
}

impl PosterService {
    #[must_use]
    pub const fn new(cache: PosterCache, renderer: PosterRenderer) -> Self {
        Self { cache, renderer }
    }

    #[must_use]
    pub const fn cache(&self) -> &PosterCache {
        &self.cache
    }

    pub fn tool_status(&self) -> &ToolStatus {
        self.renderer.tool_status()
    }

    /// 取得影片的海報路徑
    ///
    /// 快取命中時不會呼叫產生器；無法產生真正的海報時回傳共用的替代圖片，
    /// 替代圖片不會寫進快取，下次查詢仍會重新嘗試。
    pub fn poster_for(
        &self,
        input: &Path,
        identity: &SourceIdentity,
        duration_sec: Option<f64>,
        options: &RenderOptions,
    ) -> PosterResult<PosterOutcome> {
        let key = CacheKey::new(identity, options);

        if let Some(image_path) = self.cache.lookup(&key) {
            debug!("使用快取海報: {}", input.display());
            return Ok(PosterOutcome {
                image_path,
                status: RenderStatus::Rendered,
                from_cache: true,
                source_timestamp: None,
            });
        }

        let mut source_timestamp = None;
        let created = self.cache.get_or_create(&key, |temp_path| {
            let result = self.renderer.render(input, duration_sec, options, temp_path)?;
            if result.status() != RenderStatus::Rendered {
                return Err(PosterError::NoUsableCandidate);
            }
            source_timestamp = result.source_timestamp();
            Ok(())
        });

        match created {
            Ok(image_path) => Ok(PosterOutcome {
                image_path,
                status: RenderStatus::Rendered,
                from_cache: false,
                source_timestamp,
            }),
            Err(PosterError::NoUsableCandidate) => self.shared_placeholder(),
            Err(e) => Err(e),
        }
    }

    /// 只計算快取位置與第一個候選點的指令，不執行任何東西
    pub fn dry_run(
        &self,
        input: &Path,
        identity: &SourceIdentity,
        duration_sec: Option<f64>,
        options: &RenderOptions,
    ) -> PosterResult<(PathBuf, FfmpegCommand)> {
        let destination = self.cache.entry_path(&CacheKey::new(identity, options));
        let command = self
            .renderer
            .dry_run(input, duration_sec, options, &destination)?;
        Ok((destination, command))
    }

    fn shared_placeholder(&self) -> PosterResult<PosterOutcome> {
        let image_path = self.cache.placeholder_path();
        if !is_non_empty_file(&image_path) {
            self.renderer.write_placeholder(&image_path)?;
        }
        Ok(PosterOutcome {
            image_path,
            status: RenderStatus::Placeholder,
            from_cache: false,
            source_timestamp: None,
        })
    }
}
