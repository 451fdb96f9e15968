mod ffprobe_info;
mod file_fingerprint;
pub mod file_tools;
mod path_validator;
mod process_runner;
pub mod tool_locator;
mod video_scanner;

pub use ffprobe_info::{VideoInfo, get_video_info};
pub use file_fingerprint::calculate_partial_fingerprint;
pub use path_validator::{ensure_directory_exists, is_regular_file, validate_directory_exists};
pub use process_runner::{ProcessOutput, RunError, run_with_timeout};
pub use video_scanner::{VideoFileInfo, is_video_file, scan_video_files};
