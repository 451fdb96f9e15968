//! 候選時間點產生器
//!
//! 只依影片長度決定候選點，不使用亂數也不看時鐘，
//! 同樣的長度永遠得到同樣的序列。

use super::ffmpeg_command::MAX_TIMESTAMP_SEC;

/// 候選點在影片中的位置比例，依優先順序排列
///
/// 第一個落在 25%（多半已過片頭），其餘分布在中段；
/// 全部位於 15% ~ 85% 之間，避開開頭與結尾各 5% 的黑畫面和字幕。
const CANDIDATE_FRACTIONS: [f64; 6] = [0.25, 0.40, 0.55, 0.15, 0.70, 0.85];

/// 長度未知時使用的時間點
pub const FALLBACK_TIMESTAMP: f64 = 1.0;

/// 一個候選時間點；`score` 在評分前為 `None`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub timestamp: f64,
    /// 在候選序列中的位置，數字越小優先度越高，也用來打破同分
    pub priority: usize,
    pub score: Option<f64>,
}

/// 產生依優先順序排列的候選時間點（秒）
#[must_use]
pub fn candidate_timestamps(duration_sec: Option<f64>) -> Vec<f64> {
    let Some(duration) = duration_sec.filter(|d| d.is_finite() && *d > 0.0) else {
        return vec![FALLBACK_TIMESTAMP];
    };

    let mut timestamps: Vec<f64> = Vec::with_capacity(CANDIDATE_FRACTIONS.len());
    for fraction in CANDIDATE_FRACTIONS {
        let timestamp = round_millis((duration * fraction).min(MAX_TIMESTAMP_SEC));
        // 極短的影片四捨五入後可能重複
        if !timestamps.iter().any(|t| (t - timestamp).abs() < f64::EPSILON) {
            timestamps.push(timestamp);
        }
    }
    timestamps
}

#[must_use]
pub fn candidates(duration_sec: Option<f64>) -> Vec<Candidate> {
    candidate_timestamps(duration_sec)
        .into_iter()
        .enumerate()
        .map(|(priority, timestamp)| Candidate {
            timestamp,
            priority,
            score: None,
        })
        .collect()
}

fn round_millis(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_hour_movie() {
        let timestamps = candidate_timestamps(Some(7200.0));

        assert_eq!(timestamps.len(), 6);
        assert!((1440.0..=2160.0).contains(&timestamps[0]));
        for t in &timestamps {
            assert!(*t > 360.0 && *t < 6840.0, "{t} 超出 5% 邊界");
        }
    }

    #[test]
    fn test_deterministic() {
        for duration in [0.5, 42.0, 5400.0, 7200.0, 123_456.7] {
            assert_eq!(
                candidate_timestamps(Some(duration)),
                candidate_timestamps(Some(duration))
            );
        }
    }

    #[test]
    fn test_exact_golden_values() {
        assert_eq!(
            candidate_timestamps(Some(100.0)),
            vec![25.0, 40.0, 55.0, 15.0, 70.0, 85.0]
        );
    }

    #[test]
    fn test_unknown_duration_fallback() {
        for duration in [None, Some(0.0), Some(-12.0), Some(f64::NAN)] {
            assert_eq!(candidate_timestamps(duration), vec![FALLBACK_TIMESTAMP]);
        }
    }

    #[test]
    fn test_tiny_duration_deduplicates() {
        let timestamps = candidate_timestamps(Some(0.002));
        assert!(!timestamps.is_empty());
        for (i, a) in timestamps.iter().enumerate() {
            for b in &timestamps[i + 1..] {
                assert!((a - b).abs() > f64::EPSILON);
            }
        }
    }

    #[test]
    fn test_long_source_clamped_to_command_ceiling() {
        let timestamps = candidate_timestamps(Some(200_000.0));
        assert!(timestamps.iter().all(|t| *t <= MAX_TIMESTAMP_SEC));
    }

    #[test]
    fn test_candidates_carry_priority() {
        let list = candidates(Some(600.0));
        assert_eq!(list.len(), 6);
        for (i, c) in list.iter().enumerate() {
            assert_eq!(c.priority, i);
            assert!(c.score.is_none());
        }
    }
}
