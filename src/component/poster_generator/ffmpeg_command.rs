use crate::error::{PosterError, PosterResult};
use crate::tools::file_tools::file_url;
use crate::tools::is_regular_file;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const MIN_TARGET_HEIGHT: u32 = 50;
pub const MAX_TARGET_HEIGHT: u32 = 2160;
/// mjpeg 編碼器的 `-q:v` 範圍，數字越小品質越高
pub const MIN_QUALITY: u8 = 2;
pub const MAX_QUALITY: u8 = 31;
/// 時間點上限（24 小時）
pub const MAX_TIMESTAMP_SEC: f64 = 86_400.0;

/// 分析用的縮小高度，統計值不需要原始解析度
const ANALYZE_HEIGHT: u32 = 240;

/// 統計畫面時要套用的濾鏡
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsProbe {
    /// 亮度分布（YAVG/YMIN/YMAX）
    Luma,
    /// 邊緣偵測後的平均亮度，近似邊緣密度
    Edges,
}

impl StatsProbe {
    #[must_use]
    pub fn filter_chain(self) -> String {
        match self {
            Self::Luma => format!("scale=-2:{ANALYZE_HEIGHT},signalstats,metadata=mode=print"),
            Self::Edges => format!(
                "scale=-2:{ANALYZE_HEIGHT},edgedetect,signalstats,metadata=mode=print"
            ),
        }
    }
}

/// 一次 ffmpeg 呼叫：執行檔與逐一分開的參數
///
/// 參數永遠以獨立 token 傳給子程序，不經過 shell，
/// 路徑裡的 `;`、反引號等字元不會被解讀。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl FfmpegCommand {
    fn new(args: Vec<OsString>) -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            args,
        }
    }

    #[must_use]
    pub fn with_program(mut self, program: &Path) -> Self {
        self.program = program.to_path_buf();
        self
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    #[must_use]
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// 參數的顯示用字串（僅供 log，不可拿去執行）
    #[must_use]
    pub fn display_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[must_use]
    pub fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

/// 建立擷取單張畫面的命令
pub fn build_command(
    input_path: &Path,
    output_path: &Path,
    timestamp_sec: f64,
    target_height: u32,
    quality: u8,
) -> PosterResult<FfmpegCommand> {
    validate_input(input_path)?;
    validate_timestamp(timestamp_sec)?;
    validate_height(target_height)?;
    validate_quality(quality)?;

    let mut args = common_args("error", input_path, Some(timestamp_sec));
    args.extend(jpeg_output_args(
        &format!("scale=-2:{target_height}"),
        quality,
        output_path,
    ));

    Ok(FfmpegCommand::new(args))
}

/// 建立以 `thumbnail` 濾鏡自行挑選畫面的命令
///
/// 不指定時間點，由 ffmpeg 從開頭一批畫面中選出最具代表性的一張。
pub fn build_thumbnail_command(
    input_path: &Path,
    output_path: &Path,
    target_height: u32,
    quality: u8,
) -> PosterResult<FfmpegCommand> {
    validate_input(input_path)?;
    validate_height(target_height)?;
    validate_quality(quality)?;

    let mut args = common_args("error", input_path, None);
    args.extend(jpeg_output_args(
        &format!("thumbnail,scale=-2:{target_height}"),
        quality,
        output_path,
    ));

    Ok(FfmpegCommand::new(args))
}

/// 建立畫面統計命令，結果以 `lavfi.signalstats.*` 形式印在 stderr
pub fn build_stats_command(
    input_path: &Path,
    timestamp_sec: f64,
    probe: StatsProbe,
) -> PosterResult<FfmpegCommand> {
    validate_input(input_path)?;
    validate_timestamp(timestamp_sec)?;

    let mut args = common_args("info", input_path, Some(timestamp_sec));
    args.extend(
        [
            "-vf".to_string(),
            probe.filter_chain(),
            "-f".to_string(),
            "null".to_string(),
            "-".to_string(),
        ]
        .map(OsString::from),
    );

    Ok(FfmpegCommand::new(args))
}

fn common_args(log_level: &str, input_path: &Path, timestamp_sec: Option<f64>) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-hide_banner", "-nostdin", "-loglevel", log_level]
        .map(OsString::from)
        .to_vec();

    // -ss 放在 -i 前：直接跳到最近的關鍵幀
    if let Some(timestamp_sec) = timestamp_sec {
        args.push("-ss".into());
        args.push(format!("{timestamp_sec:.3}").into());
    }
    args.push("-i".into());
    args.push(file_url(input_path));
    args.extend(
        ["-map", "0:v:0", "-frames:v", "1", "-an", "-sn", "-dn"].map(OsString::from),
    );
    args
}

fn jpeg_output_args(filter: &str, quality: u8, output_path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-vf".to_string(),
        filter.to_string(),
        "-c:v".to_string(),
        "mjpeg".to_string(),
        "-q:v".to_string(),
        quality.to_string(),
        "-f".to_string(),
        "image2".to_string(),
        "-update".to_string(),
        "1".to_string(),
        "-y".to_string(),
    ]
    .map(OsString::from)
    .to_vec();
    args.push(file_url(output_path));
    args
}

pub(crate) fn validate_input(path: &Path) -> PosterResult<()> {
    if is_regular_file(path) {
        Ok(())
    } else {
        Err(PosterError::InvalidInput(path.to_path_buf()))
    }
}

pub(crate) fn validate_timestamp(timestamp_sec: f64) -> PosterResult<()> {
    if timestamp_sec.is_finite() && (0.0..=MAX_TIMESTAMP_SEC).contains(&timestamp_sec) {
        Ok(())
    } else {
        Err(PosterError::InvalidTimestamp(timestamp_sec))
    }
}

pub(crate) fn validate_height(target_height: u32) -> PosterResult<()> {
    if (MIN_TARGET_HEIGHT..=MAX_TARGET_HEIGHT).contains(&target_height) {
        Ok(())
    } else {
        Err(PosterError::InvalidDimensions(target_height))
    }
}

pub(crate) fn validate_quality(quality: u8) -> PosterResult<()> {
    if (MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
        Ok(())
    } else {
        Err(PosterError::InvalidQuality(quality))
    }
}
