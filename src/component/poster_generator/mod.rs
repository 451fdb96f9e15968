//! 海報產生器：從影片中挑一個代表畫面輸出成 JPEG

pub mod candidate_selector;
pub mod ffmpeg_command;
pub mod frame_decoder;
pub mod frame_scorer;
mod main;
mod placeholder;
mod render_options;
mod renderer;

pub use candidate_selector::{Candidate, candidate_timestamps, candidates};
pub use ffmpeg_command::{FfmpegCommand, build_command, build_thumbnail_command};
pub use frame_decoder::{
    DEFAULT_RENDER_TIMEOUT, FfmpegDecoder, FrameDecoder, FrameStats, ToolCapability, ToolStatus,
};
pub use frame_scorer::{FrameScorer, ScoringWeights, score_frame};
pub use main::{GenerationSummary, PosterGenerator, poster_for_video, resolve_identity};
pub use placeholder::{PLACEHOLDER_HEIGHT, PLACEHOLDER_WIDTH, placeholder_jpeg, write_placeholder};
pub use render_options::{DEFAULT_POSTER_HEIGHT, DEFAULT_POSTER_QUALITY, OutputFormat, RenderOptions};
pub use renderer::{PosterRenderer, RenderResult, RenderStatus};
