use crate::tools::file_tools::file_url;
use crate::tools::{run_with_timeout, tool_locator};
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// ffprobe 最長執行時間
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoInfo {
    /// 無法取得時為 `None`，交由候選時間點產生器處理
    pub duration_seconds: Option<f64>,
}

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FormatInfo>,
    streams: Option<Vec<StreamInfo>>,
}

#[derive(Deserialize)]
struct FormatInfo {
    duration: Option<String>,
}

#[derive(Deserialize)]
struct StreamInfo {
    codec_type: Option<String>,
    duration: Option<String>,
}

fn probe_command(ffprobe: &Path, path: &Path) -> Command {
    let mut command = Command::new(ffprobe);
    command
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(file_url(path));
    command
}

/// 使用 ffprobe 取得影片長度
pub fn get_video_info(path: &Path) -> Result<VideoInfo> {
    let ffprobe = tool_locator::ffprobe_path().context("找不到 ffprobe")?;

    let mut command = probe_command(&ffprobe, path);

    let output = run_with_timeout(&mut command, PROBE_TIMEOUT)
        .with_context(|| format!("無法執行 ffprobe: {}", path.display()))?;

    if !output.success() {
        bail!("ffprobe 執行失敗: {}", output.stderr_text());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_ffprobe_json(&stdout)
}

fn parse_ffprobe_json(json: &str) -> Result<VideoInfo> {
    let probe: FfprobeOutput =
        serde_json::from_str(json).with_context(|| "無法解析 ffprobe 輸出")?;

    let video_stream = probe.streams.as_ref().and_then(|streams| {
        streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
    });

    // 影片長度：優先從 format，其次從視訊串流
    let duration_seconds = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(parse_duration)
        .or_else(|| {
            video_stream
                .and_then(|s| s.duration.as_deref())
                .and_then(parse_duration)
        });

    Ok(VideoInfo { duration_seconds })
}

fn parse_duration(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d > 0.0)
}
