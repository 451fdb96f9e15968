use super::candidate_selector::{Candidate, FALLBACK_TIMESTAMP, candidates};
use super::ffmpeg_command::{FfmpegCommand, build_command, validate_input};
use super::frame_decoder::{HEURISTIC_TIMESTAMP, ToolCapability, ToolStatus};
use super::frame_scorer::{FrameScorer, ScoringWeights};
use super::placeholder::{PLACEHOLDER_HEIGHT, PLACEHOLDER_WIDTH, write_placeholder};
use super::render_options::RenderOptions;
use crate::error::{PosterError, PosterResult};
use image::ImageReader;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    Rendered,
    Placeholder,
    Failed,
}

/// 單次產生海報的結果
#[derive(Debug, Clone, PartialEq)]
pub struct RenderResult {
    status: RenderStatus,
    image_path: Option<PathBuf>,
    source_timestamp: Option<f64>,
    width: u32,
    height: u32,
}

impl RenderResult {
    /// `timestamp` 為 `None` 表示畫面由工具自動挑選
    fn rendered(image_path: PathBuf, timestamp: Option<f64>, (width, height): (u32, u32)) -> Self {
        Self {
            status: RenderStatus::Rendered,
            image_path: Some(image_path),
            source_timestamp: timestamp,
            width,
            height,
        }
    }

    fn placeholder(image_path: PathBuf) -> Self {
        Self {
            status: RenderStatus::Placeholder,
            image_path: Some(image_path),
            source_timestamp: None,
            width: PLACEHOLDER_WIDTH,
            height: PLACEHOLDER_HEIGHT,
        }
    }

    #[must_use]
    pub const fn status(&self) -> RenderStatus {
        self.status
    }

    #[must_use]
    pub fn image_path(&self) -> Option<&Path> {
        self.image_path.as_deref()
    }

    #[must_use]
    pub const fn source_timestamp(&self) -> Option<f64> {
        self.source_timestamp
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }
}

/// 海報產生器
///
/// 流程：
/// 1. 確認解碼工具可用，不可用就直接輸出替代圖片
/// 2. 依影片長度產生候選時間點
/// 3. 以畫面統計值評分排序
/// 4. 由最佳候選點開始擷取，失敗就換下一個
/// 5. 全部失敗時改用 `thumbnail` 濾鏡讓工具自己挑一張
/// 6. 仍然失敗就輸出替代圖片
pub struct PosterRenderer {
    capability: Arc<ToolCapability>,
    weights: ScoringWeights,
}

impl PosterRenderer {
    #[must_use]
    pub fn new(capability: Arc<ToolCapability>) -> Self {
        Self {
            capability,
            weights: ScoringWeights::default(),
        }
    }

    #[must_use]
    pub const fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn tool_status(&self) -> &ToolStatus {
        self.capability.status()
    }

    /// 產生一張海報並寫入 `output`
    ///
    /// 只有參數驗證錯誤與替代圖片寫入失敗會回傳 `Err`，
    /// 解碼相關的失敗都在內部吸收。
    pub fn render(
        &self,
        input: &Path,
        duration_sec: Option<f64>,
        options: &RenderOptions,
        output: &Path,
    ) -> PosterResult<RenderResult> {
        validate_input(input)?;

        if !self.capability.is_available() {
            return self.write_placeholder(output);
        }

        let decoder = self.capability.decoder();
        let ranked = match FrameScorer::new(decoder, self.weights).rank(input, &candidates(duration_sec)) {
            Ok(ranked) => ranked,
            Err(PosterError::NoUsableCandidate) => {
                warn!("無法分析任何候選畫面: {}", input.display());
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        for candidate in &ranked {
            match self.try_candidate(input, output, candidate, options) {
                Ok(dimensions) => {
                    info!(
                        "海報已產生: {} @ {:.3}s ({}x{})",
                        input.display(),
                        candidate.timestamp,
                        dimensions.0,
                        dimensions.1
                    );
                    return Ok(RenderResult::rendered(
                        output.to_path_buf(),
                        Some(candidate.timestamp),
                        dimensions,
                    ));
                }
                Err(e) if e.is_validation() => return Err(e),
                Err(e) => {
                    warn!("候選點 {:.3}s 擷取失敗，嘗試下一個: {e}", candidate.timestamp);
                    let _ = fs::remove_file(output);
                }
            }
        }

        self.render_heuristic(input, output, options)
    }

    fn render_heuristic(
        &self,
        input: &Path,
        output: &Path,
        options: &RenderOptions,
    ) -> PosterResult<RenderResult> {
        info!("候選點都無法使用，改由 thumbnail 濾鏡挑選: {}", input.display());

        let attempt = self
            .capability
            .decoder()
            .extract_heuristic(input, output, options)
            .and_then(|()| {
                read_dimensions(output).map_err(|reason| PosterError::DecodeFailed {
                    timestamp: HEURISTIC_TIMESTAMP,
                    reason,
                })
            });

        match attempt {
            Ok(dimensions) => {
                info!(
                    "海報已產生: {} @ thumbnail ({}x{})",
                    input.display(),
                    dimensions.0,
                    dimensions.1
                );
                Ok(RenderResult::rendered(output.to_path_buf(), None, dimensions))
            }
            Err(e) if e.is_validation() => Err(e),
            Err(e) => {
                warn!("自動挑選畫面失敗，使用替代圖片 {}: {e}", input.display());
                let _ = fs::remove_file(output);
                self.write_placeholder(output)
            }
        }
    }

    fn try_candidate(
        &self,
        input: &Path,
        output: &Path,
        candidate: &Candidate,
        options: &RenderOptions,
    ) -> PosterResult<(u32, u32)> {
        self.capability
            .decoder()
            .extract(input, output, candidate.timestamp, options)?;

        read_dimensions(output).map_err(|reason| PosterError::DecodeFailed {
            timestamp: candidate.timestamp,
            reason,
        })
    }

    /// 只建立第一個候選點的指令，不執行
    pub fn dry_run(
        &self,
        input: &Path,
        duration_sec: Option<f64>,
        options: &RenderOptions,
        output: &Path,
    ) -> PosterResult<FfmpegCommand> {
        validate_input(input)?;
        let timestamp = candidates(duration_sec)
            .first()
            .map_or(FALLBACK_TIMESTAMP, |c| c.timestamp);

        let command = build_command(
            input,
            output,
            timestamp,
            options.target_height(),
            options.quality(),
        )?;
        Ok(match self.capability.status() {
            ToolStatus::Available { program, .. } => command.with_program(program),
            ToolStatus::Unavailable => command,
        })
    }

    pub fn write_placeholder(&self, output: &Path) -> PosterResult<RenderResult> {
        write_placeholder(output)?;
        debug!("已寫入替代圖片: {}", output.display());
        Ok(RenderResult::placeholder(output.to_path_buf()))
    }
}

/// 讀取圖片尺寸；暫存檔沒有副檔名，所以由內容判斷格式
fn read_dimensions(path: &Path) -> Result<(u32, u32), String> {
    ImageReader::open(path)
        .map_err(|e| e.to_string())?
        .with_guessed_format()
        .map_err(|e| e.to_string())?
        .into_dimensions()
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::poster_generator::frame_decoder::{FrameDecoder, FrameStats};
    use image::{Rgb, RgbImage};
    use std::sync::Mutex;

    /// 可設定哪些時間點能成功擷取的假解碼器
    struct FakeDecoder {
        available: bool,
        extract_ok_at: Vec<f64>,
        extract_calls: Mutex<Vec<f64>>,
        stats_fail: bool,
        heuristic_ok: bool,
        heuristic_calls: Mutex<usize>,
    }

    impl FakeDecoder {
        fn new(available: bool, extract_ok_at: &[f64]) -> Self {
            Self {
                available,
                extract_ok_at: extract_ok_at.to_vec(),
                extract_calls: Mutex::new(Vec::new()),
                stats_fail: false,
                heuristic_ok: false,
                heuristic_calls: Mutex::new(0),
            }
        }

        fn with_heuristic(mut self) -> Self {
            self.heuristic_ok = true;
            self
        }

        fn with_failing_stats(mut self) -> Self {
            self.stats_fail = true;
            self
        }

        fn heuristic_calls(&self) -> usize {
            *self.heuristic_calls.lock().unwrap()
        }
    }

    fn write_jpeg(output: &Path, height: u32) {
        RgbImage::from_pixel(height * 2 / 3, height, Rgb([90, 120, 150]))
            .save_with_format(output, image::ImageFormat::Jpeg)
            .unwrap();
    }

    impl FrameDecoder for FakeDecoder {
        fn probe(&self) -> ToolStatus {
            if self.available {
                ToolStatus::Available {
                    program: PathBuf::from("fake-ffmpeg"),
                    version: "fake 1.0".to_string(),
                }
            } else {
                ToolStatus::Unavailable
            }
        }

        fn extract(
            &self,
            _: &Path,
            output: &Path,
            timestamp: f64,
            options: &RenderOptions,
        ) -> PosterResult<()> {
            self.extract_calls.lock().unwrap().push(timestamp);
            if !self.extract_ok_at.iter().any(|t| (t - timestamp).abs() < 1e-9) {
                return Err(PosterError::DecodeFailed {
                    timestamp,
                    reason: "scripted".to_string(),
                });
            }
            write_jpeg(output, options.target_height());
            Ok(())
        }

        fn stats(&self, _: &Path, timestamp: f64) -> PosterResult<FrameStats> {
            if self.stats_fail {
                return Err(PosterError::DecodeFailed {
                    timestamp,
                    reason: "scripted".to_string(),
                });
            }
            // 越早的時間點分數越高，排序結果與時間先後一致
            Ok(FrameStats {
                luma_avg: 128.0,
                luma_min: 0.0,
                luma_max: 255.0,
                edge_avg: (64.0 - timestamp / 10.0).max(0.0),
            })
        }

        fn extract_heuristic(
            &self,
            _: &Path,
            output: &Path,
            options: &RenderOptions,
        ) -> PosterResult<()> {
            *self.heuristic_calls.lock().unwrap() += 1;
            if !self.heuristic_ok {
                return Err(PosterError::DecodeFailed {
                    timestamp: HEURISTIC_TIMESTAMP,
                    reason: "scripted".to_string(),
                });
            }
            write_jpeg(output, options.target_height());
            Ok(())
        }
    }

    fn renderer(decoder: Arc<FakeDecoder>) -> PosterRenderer {
        PosterRenderer::new(Arc::new(ToolCapability::new(decoder)))
    }

    fn input_file(dir: &Path) -> PathBuf {
        let input = dir.join("movie.mkv");
        fs::write(&input, b"not really a movie").unwrap();
        input
    }

    #[test]
    fn test_unavailable_tool_yields_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(dir.path());
        let output = dir.path().join("poster.jpg");
        let decoder = Arc::new(FakeDecoder::new(false, &[]));

        let result = renderer(decoder.clone())
            .render(&input, Some(7200.0), &RenderOptions::default(), &output)
            .unwrap();

        assert_eq!(result.status(), RenderStatus::Placeholder);
        assert_eq!(result.source_timestamp(), None);
        assert!(image::open(&output).is_ok());
        assert!(decoder.extract_calls.lock().unwrap().is_empty());
        assert_eq!(decoder.heuristic_calls(), 0);
    }

    #[test]
    fn test_falls_through_to_working_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(dir.path());
        let output = dir.path().join("poster.jpg");
        // 100 秒影片依分數排序為 15, 25, 40, ...；只有第三個能擷取
        let decoder = Arc::new(FakeDecoder::new(true, &[40.0]));

        let options = RenderOptions::new(300, 2).unwrap();
        let result = renderer(decoder.clone())
            .render(&input, Some(100.0), &options, &output)
            .unwrap();

        assert_eq!(result.status(), RenderStatus::Rendered);
        assert_eq!(result.source_timestamp(), Some(40.0));
        assert_eq!(result.height(), 300);
        assert_eq!(*decoder.extract_calls.lock().unwrap(), vec![15.0, 25.0, 40.0]);
    }

    #[test]
    fn test_all_candidates_fail_yields_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(dir.path());
        let output = dir.path().join("poster.jpg");
        let decoder = Arc::new(FakeDecoder::new(true, &[]));

        let result = renderer(decoder.clone())
            .render(&input, Some(100.0), &RenderOptions::default(), &output)
            .unwrap();

        assert_eq!(result.status(), RenderStatus::Placeholder);
        assert_eq!(decoder.extract_calls.lock().unwrap().len(), 6);
        assert_eq!(decoder.heuristic_calls(), 1);
        assert!(image::open(&output).is_ok());
    }

    #[test]
    fn test_heuristic_pass_after_candidates_fail() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(dir.path());
        let output = dir.path().join("poster.jpg");
        let decoder = Arc::new(FakeDecoder::new(true, &[]).with_heuristic());

        let options = RenderOptions::new(300, 2).unwrap();
        let result = renderer(decoder.clone())
            .render(&input, Some(100.0), &options, &output)
            .unwrap();

        assert_eq!(result.status(), RenderStatus::Rendered);
        assert_eq!(result.source_timestamp(), None);
        assert_eq!(result.height(), 300);
        assert_eq!(decoder.extract_calls.lock().unwrap().len(), 6);
        assert_eq!(decoder.heuristic_calls(), 1);
    }

    #[test]
    fn test_heuristic_pass_when_nothing_scores() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(dir.path());
        let output = dir.path().join("poster.jpg");
        let decoder = Arc::new(
            FakeDecoder::new(true, &[25.0])
                .with_failing_stats()
                .with_heuristic(),
        );

        let result = renderer(decoder.clone())
            .render(&input, Some(100.0), &RenderOptions::default(), &output)
            .unwrap();

        assert_eq!(result.status(), RenderStatus::Rendered);
        assert_eq!(result.source_timestamp(), None);
        assert!(decoder.extract_calls.lock().unwrap().is_empty());
        assert_eq!(decoder.heuristic_calls(), 1);
    }

    #[test]
    fn test_heuristic_not_tried_when_candidate_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(dir.path());
        let decoder = Arc::new(FakeDecoder::new(true, &[15.0]).with_heuristic());

        renderer(decoder.clone())
            .render(
                &input,
                Some(100.0),
                &RenderOptions::default(),
                &dir.path().join("poster.jpg"),
            )
            .unwrap();

        assert_eq!(decoder.heuristic_calls(), 0);
    }

    #[test]
    fn test_missing_input_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let decoder = Arc::new(FakeDecoder::new(true, &[25.0]));

        let result = renderer(decoder).render(
            &dir.path().join("missing.mkv"),
            Some(100.0),
            &RenderOptions::default(),
            &dir.path().join("poster.jpg"),
        );
        assert!(matches!(result, Err(PosterError::InvalidInput(_))));
    }

    #[test]
    fn test_dry_run_uses_first_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(dir.path());
        let decoder = Arc::new(FakeDecoder::new(true, &[]));

        let command = renderer(decoder.clone())
            .dry_run(&input, Some(100.0), &RenderOptions::default(), &dir.path().join("p.jpg"))
            .unwrap();

        let args: Vec<String> = command
            .args()
            .iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        let ss = args.iter().position(|a| a == "-ss").unwrap();
        assert_eq!(args[ss + 1], "25.000");
        assert!(args.iter().any(|a| a == "-vf"));
        assert_eq!(command.program(), Path::new("fake-ffmpeg"));
        assert!(decoder.extract_calls.lock().unwrap().is_empty());
    }
}
