use super::frame_decoder::ToolCapability;
use super::render_options::RenderOptions;
use super::renderer::{PosterRenderer, RenderStatus};
use crate::component::poster_cache::{PosterCache, PosterOutcome, PosterService, SourceIdentity};
use crate::config::Config;
use crate::config::save::{add_recent_path, save_settings};
use crate::signal::is_shutdown_requested;
use crate::tools::{
    VideoFileInfo, calculate_partial_fingerprint, get_video_info, scan_video_files,
    validate_directory_exists,
};
use anyhow::{Context, Result};
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use rayon::prelude::*;
use rust_i18n::t;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// 批次產生結果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerationSummary {
    pub total_videos: usize,
    pub rendered: usize,
    pub cached: usize,
    pub placeholder: usize,
    pub failed: usize,
    /// 收到中斷信號後沒有處理的檔案
    pub skipped: usize,
}

#[derive(Default)]
struct Counters {
    rendered: AtomicUsize,
    cached: AtomicUsize,
    placeholder: AtomicUsize,
    failed: AtomicUsize,
}

impl Counters {
    fn record(&self, outcome: &Result<PosterOutcome>) {
        let counter = match outcome {
            Ok(o) if o.from_cache => &self.cached,
            Ok(o) => match o.status {
                RenderStatus::Rendered => &self.rendered,
                RenderStatus::Placeholder => &self.placeholder,
                RenderStatus::Failed => &self.failed,
            },
            // 連替代圖片都寫不進快取
            Err(_) => &self.failed,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    fn summary(&self, total_videos: usize) -> GenerationSummary {
        let rendered = self.rendered.load(Ordering::SeqCst);
        let cached = self.cached.load(Ordering::SeqCst);
        let placeholder = self.placeholder.load(Ordering::SeqCst);
        let failed = self.failed.load(Ordering::SeqCst);
        GenerationSummary {
            total_videos,
            rendered,
            cached,
            placeholder,
            failed,
            skipped: total_videos.saturating_sub(rendered + cached + placeholder + failed),
        }
    }
}

/// 電影海報批次產生器
///
/// 流程：選擇資料夾 → 掃描影片 → 平行取得長度、指紋並產生海報 → 顯示統計
pub struct PosterGenerator {
    config: Config,
    shutdown_signal: Arc<AtomicBool>,
}

impl PosterGenerator {
    pub const fn new(config: Config, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            config,
            shutdown_signal,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub fn run(&mut self) -> Result<()> {
        println!("{}", style(t!("poster.title")).cyan().bold());

        let input_dir = self.prompt_input_path()?;
        validate_directory_exists(&input_dir)?;
        self.remember_path(&input_dir);

        println!("{}", style(t!("poster.scanning")).dim());
        let videos = scan_video_files(&input_dir)?;
        if videos.is_empty() {
            println!("{}", style(t!("poster.no_videos")).yellow());
            return Ok(());
        }
        println!(
            "{}",
            style(t!("poster.found", count = videos.len())).green()
        );

        let service = self.build_service()?;
        let options = self.config.render_options()?;

        if !service.tool_status().is_available() {
            println!("{}", style(t!("poster.tool_missing")).yellow());
        }

        let modes = [t!("poster.mode_generate"), t!("poster.mode_dry_run")];
        let mode = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(t!("poster.mode_prompt"))
            .items(&modes)
            .default(0)
            .interact_opt()?;

        match mode {
            Some(0) => {
                let summary = self.generate_all(&service, &videos, &options)?;
                print_summary(&summary);
            }
            Some(1) => print_dry_run(&service, &videos, &options),
            _ => {}
        }

        Ok(())
    }

    fn prompt_input_path(&self) -> Result<PathBuf> {
        let theme = ColorfulTheme::default();
        let mut input = Input::<String>::with_theme(&theme).with_prompt(t!("poster.input_prompt"));
        if let Some(recent) = self.config.settings.recent_paths.first() {
            input = input.default(recent.clone());
        }
        let path = input.interact_text()?;
        Ok(PathBuf::from(path.trim()))
    }

    fn remember_path(&mut self, path: &Path) {
        add_recent_path(&mut self.config.settings, &path.to_string_lossy());
        if let Err(e) = save_settings(&self.config.settings) {
            warn!("無法儲存最近使用的路徑: {e:#}");
        }
    }

    fn build_service(&self) -> Result<PosterService> {
        let cache_dir = self.config.cache_dir();
        let cache = PosterCache::new(&cache_dir)
            .with_context(|| format!("無法建立快取目錄 {}", cache_dir.display()))?;
        info!("海報快取目錄: {}", cache_dir.display());

        let capability = Arc::new(ToolCapability::ffmpeg(self.config.render_timeout()));
        let renderer = PosterRenderer::new(capability).with_weights(self.config.settings.scoring);
        Ok(PosterService::new(cache, renderer))
    }

    /// 以 rayon 執行緒池平行處理，收到中斷信號後不再派發新的檔案
    pub fn generate_all(
        &self,
        service: &PosterService,
        videos: &[VideoFileInfo],
        options: &RenderOptions,
    ) -> Result<GenerationSummary> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.settings.concurrency.max(1))
            .build()
            .context("無法建立執行緒池")?;

        let progress_bar = ProgressBar::new(videos.len() as u64);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        progress_bar.set_message(t!("poster.progress").to_string());

        let counters = Counters::default();
        pool.install(|| {
            videos.par_iter().for_each(|video| {
                if is_shutdown_requested(&self.shutdown_signal) {
                    return;
                }

                let outcome = poster_for_video(service, &video.path, options);
                match &outcome {
                    Ok(_) => progress_bar.set_message(file_label(&video.path)),
                    Err(e) => {
                        error!("海報產生失敗 {}: {e:#}", video.path.display());
                    }
                }
                counters.record(&outcome);
                progress_bar.inc(1);
            });
        });
        progress_bar.finish_and_clear();

        if is_shutdown_requested(&self.shutdown_signal) {
            warn!("收到中斷信號，已停止派發新的檔案");
        }
        Ok(counters.summary(videos.len()))
    }
}

/// 取得長度與來源識別後向服務要一張海報
///
/// 長度未知時交給候選點產生器處理；指紋失敗時退回檔案大小與修改時間。
pub fn poster_for_video(
    service: &PosterService,
    path: &Path,
    options: &RenderOptions,
) -> Result<PosterOutcome> {
    let duration = match get_video_info(path) {
        Ok(info) => info.duration_seconds,
        Err(e) => {
            warn!("無法取得影片長度 {}: {e:#}", path.display());
            None
        }
    };

    let identity = resolve_identity(path)?;
    Ok(service.poster_for(path, &identity, duration, options)?)
}

/// 決定快取鍵使用的來源識別：先算部分指紋，失敗時退回檔案大小與修改時間
///
/// 產生與預覽都必須走這裡，兩者才會指向同一個快取項目。
pub fn resolve_identity(path: &Path) -> Result<SourceIdentity> {
    match calculate_partial_fingerprint(path) {
        Ok(hex) => Ok(SourceIdentity::Fingerprint(hex)),
        Err(e) => {
            warn!("無法計算指紋 {}，改用檔案資訊: {e:#}", path.display());
            SourceIdentity::from_metadata(path)
                .with_context(|| format!("無法讀取檔案資訊 {}", path.display()))
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().to_string())
}

fn print_dry_run(service: &PosterService, videos: &[VideoFileInfo], options: &RenderOptions) {
    for video in videos {
        let duration = get_video_info(&video.path)
            .ok()
            .and_then(|info| info.duration_seconds);
        let identity = match resolve_identity(&video.path) {
            Ok(identity) => identity,
            Err(e) => {
                warn!("{e:#}");
                continue;
            }
        };

        match service.dry_run(&video.path, &identity, duration, options) {
            Ok((destination, command)) => {
                println!("\n{}", style(file_label(&video.path)).bold());
                println!("  {} {}", style("→").dim(), destination.display());
                println!("  {}", command.display_line());
            }
            Err(e) => println!("  {} {}: {e}", style("✗").red(), video.path.display()),
        }
    }
}

fn print_summary(summary: &GenerationSummary) {
    println!();
    println!("{}", style(t!("poster.summary_title")).cyan().bold());
    println!("  {}: {}", t!("poster.summary_total"), summary.total_videos);
    println!(
        "  {}: {}",
        style(t!("poster.summary_rendered")).green(),
        summary.rendered
    );
    println!("  {}: {}", t!("poster.summary_cached"), summary.cached);
    println!(
        "  {}: {}",
        style(t!("poster.summary_placeholder")).yellow(),
        summary.placeholder
    );
    println!(
        "  {}: {}",
        style(t!("poster.summary_failed")).red(),
        summary.failed
    );
    if summary.skipped > 0 {
        println!("  {}: {}", t!("poster.summary_skipped"), summary.skipped);
    }
}
