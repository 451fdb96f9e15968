use super::ffmpeg_command::{validate_height, validate_quality};
use crate::error::PosterResult;
use std::fmt;

pub const DEFAULT_POSTER_HEIGHT: u32 = 1000;
pub const DEFAULT_POSTER_QUALITY: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Jpeg,
}

impl OutputFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// 海報輸出參數，建立時即驗證，之後不可變
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderOptions {
    target_height: u32,
    quality: u8,
    output_format: OutputFormat,
}

impl RenderOptions {
    pub fn new(target_height: u32, quality: u8) -> PosterResult<Self> {
        validate_height(target_height)?;
        validate_quality(quality)?;
        Ok(Self {
            target_height,
            quality,
            output_format: OutputFormat::Jpeg,
        })
    }

    #[must_use]
    pub const fn target_height(&self) -> u32 {
        self.target_height
    }

    #[must_use]
    pub const fn quality(&self) -> u8 {
        self.quality
    }

    #[must_use]
    pub const fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    /// 快取鍵使用的變體字串，任一欄位不同都會得到不同的字串
    #[must_use]
    pub fn variant(&self) -> String {
        format!(
            "h{}-q{}-{}",
            self.target_height, self.quality, self.output_format
        )
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            target_height: DEFAULT_POSTER_HEIGHT,
            quality: DEFAULT_POSTER_QUALITY,
            output_format: OutputFormat::Jpeg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PosterError;

    #[test]
    fn test_new_validates() {
        assert!(RenderOptions::new(720, 2).is_ok());
        assert!(matches!(
            RenderOptions::new(10, 2),
            Err(PosterError::InvalidDimensions(10))
        ));
        assert!(matches!(
            RenderOptions::new(720, 0),
            Err(PosterError::InvalidQuality(0))
        ));
    }

    #[test]
    fn test_default_is_valid() {
        let default = RenderOptions::default();
        let rebuilt = RenderOptions::new(default.target_height(), default.quality()).unwrap();
        assert_eq!(default, rebuilt);
    }

    #[test]
    fn test_variant_distinguishes_fields() {
        let a = RenderOptions::new(720, 2).unwrap();
        let b = RenderOptions::new(1080, 2).unwrap();
        let c = RenderOptions::new(720, 5).unwrap();
        assert_eq!(a.variant(), "h720-q2-jpg");
        assert_ne!(a.variant(), b.variant());
        assert_ne!(a.variant(), c.variant());
    }
}
