use super::candidate_selector::Candidate;
use super::frame_decoder::{FrameDecoder, FrameStats};
use crate::error::{PosterError, PosterResult};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 邊緣偵測平均亮度達到此值即視為細節飽和
const EDGE_SATURATION: f64 = 64.0;
const LUMA_RANGE: f64 = 255.0;

/// 畫面評分權重
///
/// 係數是經驗值，可以在設定檔中調整；
/// 只要維持「獎勵細節、懲罰過暗或過亮」的形狀即可。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub edge: f64,
    pub brightness: f64,
    pub contrast: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            edge: 0.5,
            brightness: 0.3,
            contrast: 0.2,
        }
    }
}

/// 計算單一畫面的分數，越高越好
///
/// - 邊緣密度：細節越多越好，超過飽和值不再加分
/// - 亮度：中間亮度得 1 分，全黑或全白得 0 分
/// - 對比：亮度範圍越寬越好
#[must_use]
pub fn score_frame(stats: &FrameStats, weights: &ScoringWeights) -> f64 {
    let edge_density = (stats.edge_avg / EDGE_SATURATION).clamp(0.0, 1.0);
    let brightness = (stats.luma_avg / LUMA_RANGE).clamp(0.0, 1.0);
    let mid_brightness = 1.0 - (brightness - 0.5).abs() * 2.0;
    let dynamic_range = ((stats.luma_max - stats.luma_min) / LUMA_RANGE).clamp(0.0, 1.0);

    weights.edge * edge_density + weights.brightness * mid_brightness + weights.contrast * dynamic_range
}

/// 以解碼工具統計值替候選時間點評分並排序
pub struct FrameScorer<'a> {
    decoder: &'a dyn FrameDecoder,
    weights: ScoringWeights,
}

impl<'a> FrameScorer<'a> {
    #[must_use]
    pub fn new(decoder: &'a dyn FrameDecoder, weights: ScoringWeights) -> Self {
        Self { decoder, weights }
    }

    /// 回傳由好到壞排序的候選點
    ///
    /// 無法解碼的候選點直接排除，不會以 0 分參與排名；
    /// 同分時優先度較高（較早列出）的候選點勝出。
    pub fn rank(&self, input: &Path, candidates: &[Candidate]) -> PosterResult<Vec<Candidate>> {
        let mut scored = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            match self.decoder.stats(input, candidate.timestamp) {
                Ok(stats) => {
                    let score = score_frame(&stats, &self.weights);
                    debug!(
                        "候選點 {:.3}s: 分數 {score:.4} (YAVG={:.1}, 範圍={:.0}~{:.0}, 邊緣={:.2})",
                        candidate.timestamp, stats.luma_avg, stats.luma_min, stats.luma_max, stats.edge_avg
                    );
                    scored.push(Candidate {
                        score: Some(score),
                        ..*candidate
                    });
                }
                Err(e) if e.is_validation() => return Err(e),
                Err(e) => debug!("候選點 {:.3}s 無法評分: {e}", candidate.timestamp),
            }
        }

        if scored.is_empty() {
            return Err(PosterError::NoUsableCandidate);
        }

        scored.sort_by(|a, b| {
            let (sa, sb) = (a.score.unwrap_or(f64::MIN), b.score.unwrap_or(f64::MIN));
            sb.total_cmp(&sa).then_with(|| a.priority.cmp(&b.priority))
        });
        Ok(scored)
    }
}
