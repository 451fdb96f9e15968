use super::ffmpeg_command::{
    FfmpegCommand, StatsProbe, build_command, build_stats_command, build_thumbnail_command,
};
use super::render_options::RenderOptions;
use crate::error::{PosterError, PosterResult};
use crate::tools::{RunError, file_tools, run_with_timeout, tool_locator};
use log::{debug, info, warn};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, OnceLock};
use std::time::Duration;

/// 單次解碼的預設時限
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(30);

/// 版本查詢只是確認工具能執行，不需要等太久
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// `thumbnail` 濾鏡從開頭讀取，錯誤訊息裡以 0 秒表示
pub const HEURISTIC_TIMESTAMP: f64 = 0.0;

static REGEX_SIGNALSTATS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:lavfi\.signalstats\.)?\b(YAVG|YMIN|YMAX)[=:]\s*(-?\d+(?:\.\d+)?)")
        .expect("Invalid regex")
});

/// 外部解碼工具的可用狀態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolStatus {
    Available { program: PathBuf, version: String },
    Unavailable,
}

impl ToolStatus {
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }
}

/// 單一畫面的訊號統計（0 ~ 255 的亮度值）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub luma_avg: f64,
    pub luma_min: f64,
    pub luma_max: f64,
    /// 邊緣偵測後畫面的平均亮度
    pub edge_avg: f64,
}

/// 外部解碼能力
///
/// 正式環境由 [`FfmpegDecoder`] 以子程序實作，測試時換成記憶體中的假實作。
pub trait FrameDecoder: Send + Sync {
    /// 檢查工具是否可以執行
    fn probe(&self) -> ToolStatus;

    /// 擷取 `timestamp` 處的畫面並寫入 `output`
    fn extract(
        &self,
        input: &Path,
        output: &Path,
        timestamp: f64,
        options: &RenderOptions,
    ) -> PosterResult<()>;

    /// 取得 `timestamp` 處畫面的統計值，不輸出圖片
    fn stats(&self, input: &Path, timestamp: f64) -> PosterResult<FrameStats>;

    /// 不指定時間點，讓工具自己挑一張代表畫面
    ///
    /// 所有候選點都失敗後的最後一次嘗試；不支援的實作直接回報失敗。
    fn extract_heuristic(
        &self,
        _input: &Path,
        _output: &Path,
        _options: &RenderOptions,
    ) -> PosterResult<()> {
        Err(PosterError::DecodeFailed {
            timestamp: HEURISTIC_TIMESTAMP,
            reason: "解碼器不支援自動挑選畫面".to_string(),
        })
    }
}

/// 以 ffmpeg 子程序實作的解碼器
#[derive(Debug, Clone)]
pub struct FfmpegDecoder {
    program: Option<PathBuf>,
    timeout: Duration,
}

impl FfmpegDecoder {
    #[must_use]
    pub const fn new(program: Option<PathBuf>, timeout: Duration) -> Self {
        Self { program, timeout }
    }

    /// 依環境變數、PATH、執行檔旁的順序尋找 ffmpeg
    #[must_use]
    pub fn from_env(timeout: Duration) -> Self {
        Self::new(tool_locator::ffmpeg_path(), timeout)
    }

    fn run(&self, command: &FfmpegCommand, timestamp: f64) -> PosterResult<Vec<u8>> {
        let program = self.program.as_deref().ok_or_else(|| PosterError::DecodeFailed {
            timestamp,
            reason: "找不到 ffmpeg".to_string(),
        })?;
        let command = command.clone().with_program(program);
        debug!("執行: {}", command.display_line());

        let output = run_with_timeout(&mut command.build_command(), self.timeout).map_err(
            |e| match e {
                RunError::TimedOut(limit) => PosterError::Timeout {
                    timestamp,
                    seconds: limit.as_secs(),
                },
                other => PosterError::DecodeFailed {
                    timestamp,
                    reason: other.to_string(),
                },
            },
        )?;

        if !output.success() {
            return Err(PosterError::DecodeFailed {
                timestamp,
                reason: output.stderr_text(),
            });
        }
        Ok(output.stderr)
    }

    fn write_frame(&self, command: &FfmpegCommand, output: &Path, timestamp: f64) -> PosterResult<()> {
        self.run(command, timestamp)?;

        if !file_tools::is_non_empty_file(output) {
            return Err(PosterError::DecodeFailed {
                timestamp,
                reason: format!("輸出檔案未建立: {}", output.display()),
            });
        }
        Ok(())
    }

    fn luma_stats(&self, input: &Path, timestamp: f64, probe: StatsProbe) -> PosterResult<LumaStats> {
        let command = build_stats_command(input, timestamp, probe)?;
        let stderr = self.run(&command, timestamp)?;
        parse_signalstats(&String::from_utf8_lossy(&stderr)).ok_or_else(|| {
            PosterError::DecodeFailed {
                timestamp,
                reason: "ffmpeg 未輸出 signalstats 統計值".to_string(),
            }
        })
    }
}

impl FrameDecoder for FfmpegDecoder {
    fn probe(&self) -> ToolStatus {
        let Some(program) = &self.program else {
            return ToolStatus::Unavailable;
        };

        match tool_locator::version_line(program, PROBE_TIMEOUT) {
            Ok(version) => ToolStatus::Available {
                program: program.clone(),
                version,
            },
            Err(e) => {
                warn!("無法執行 ffmpeg {}: {e}", program.display());
                ToolStatus::Unavailable
            }
        }
    }

    fn extract(
        &self,
        input: &Path,
        output: &Path,
        timestamp: f64,
        options: &RenderOptions,
    ) -> PosterResult<()> {
        let command = build_command(
            input,
            output,
            timestamp,
            options.target_height(),
            options.quality(),
        )?;
        self.write_frame(&command, output, timestamp)
    }

    fn stats(&self, input: &Path, timestamp: f64) -> PosterResult<FrameStats> {
        let luma = self.luma_stats(input, timestamp, StatsProbe::Luma)?;
        let edges = self.luma_stats(input, timestamp, StatsProbe::Edges)?;

        Ok(FrameStats {
            luma_avg: luma.avg,
            luma_min: luma.min.unwrap_or(luma.avg),
            luma_max: luma.max.unwrap_or(luma.avg),
            edge_avg: edges.avg,
        })
    }

    fn extract_heuristic(
        &self,
        input: &Path,
        output: &Path,
        options: &RenderOptions,
    ) -> PosterResult<()> {
        let command =
            build_thumbnail_command(input, output, options.target_height(), options.quality())?;
        self.write_frame(&command, output, HEURISTIC_TIMESTAMP)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct LumaStats {
    avg: f64,
    min: Option<f64>,
    max: Option<f64>,
}

/// 解析 signalstats 輸出
///
/// 接受 `lavfi.signalstats.YAVG=123.4`（metadata=print）
/// 以及 `YAVG:123.4` 兩種格式；多個畫面時以最後一筆為準。
fn parse_signalstats(text: &str) -> Option<LumaStats> {
    let (mut avg, mut min, mut max) = (None, None, None);
    for caps in REGEX_SIGNALSTATS.captures_iter(text) {
        let Some(value) = caps.get(2).and_then(|m| m.as_str().parse::<f64>().ok()) else {
            continue;
        };
        match caps.get(1).map(|m| m.as_str()) {
            Some("YAVG") => avg = Some(value),
            Some("YMIN") => min = Some(value),
            Some("YMAX") => max = Some(value),
            _ => {}
        }
    }

    avg.map(|avg| LumaStats { avg, min, max })
}

/// 解碼工具的能力檢查結果持有者
///
/// 第一次查詢時才執行 probe，之後整個 session 都重用同一個結果；
/// 工具在執行期間不會突然出現或消失。
pub struct ToolCapability {
    decoder: Arc<dyn FrameDecoder>,
    status: OnceLock<ToolStatus>,
}

impl ToolCapability {
    #[must_use]
    pub fn new(decoder: Arc<dyn FrameDecoder>) -> Self {
        Self {
            decoder,
            status: OnceLock::new(),
        }
    }

    /// 使用系統上的 ffmpeg
    #[must_use]
    pub fn ffmpeg(timeout: Duration) -> Self {
        Self::new(Arc::new(FfmpegDecoder::from_env(timeout)))
    }

    pub fn status(&self) -> &ToolStatus {
        self.status.get_or_init(|| {
            let status = self.decoder.probe();
            match &status {
                ToolStatus::Available { program, version } => {
                    info!("偵測到解碼工具: {} ({version})", program.display());
                }
                ToolStatus::Unavailable => {
                    warn!("未偵測到解碼工具，海報將使用替代圖片");
                }
            }
            status
        })
    }

    pub fn is_available(&self) -> bool {
        self.status().is_available()
    }

    #[must_use]
    pub fn decoder(&self) -> &dyn FrameDecoder {
        self.decoder.as_ref()
    }
}
