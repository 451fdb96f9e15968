use super::process_runner::run_with_timeout;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

pub const FFMPEG_ENV: &str = "AUTO_VIDEO_POSTER_FFMPEG";
pub const FFPROBE_ENV: &str = "AUTO_VIDEO_POSTER_FFPROBE";

/// 解析外部工具路徑
///
/// 順序：
/// 1. 環境變數指定的路徑（必須是存在的檔案）
/// 2. 系統 PATH
/// 3. 執行檔旁邊或其 `bin/` 子目錄
#[must_use]
pub fn resolve_executable(env_key: &str, program: &str) -> Option<PathBuf> {
    if let Some(path) = env::var_os(env_key).map(PathBuf::from)
        && path.is_file()
    {
        return Some(path);
    }

    if let Ok(path) = which::which(program) {
        return Some(path);
    }

    let exe_dir = env::current_exe().ok()?.parent()?.to_path_buf();
    bundled_candidates(&exe_dir, program)
        .into_iter()
        .find(|p| p.is_file())
}

fn bundled_candidates(exe_dir: &Path, program: &str) -> Vec<PathBuf> {
    let file_name = if cfg!(windows) && !program.to_lowercase().ends_with(".exe") {
        format!("{program}.exe")
    } else {
        program.to_string()
    };

    vec![exe_dir.join(&file_name), exe_dir.join("bin").join(&file_name)]
}

#[must_use]
pub fn ffmpeg_path() -> Option<PathBuf> {
    resolve_executable(FFMPEG_ENV, "ffmpeg")
}

#[must_use]
pub fn ffprobe_path() -> Option<PathBuf> {
    resolve_executable(FFPROBE_ENV, "ffprobe")
}

/// 執行 `<program> -version`，回傳輸出的第一行
pub fn version_line(program: &Path, timeout: Duration) -> Result<String, String> {
    let mut command = Command::new(program);
    command.arg("-version");

    let output = run_with_timeout(&mut command, timeout).map_err(|e| e.to_string())?;
    if !output.success() {
        return Err(output.stderr_text());
    }
    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_program_not_resolved() {
        let path = resolve_executable(
            "AUTO_VIDEO_POSTER_TEST_UNSET",
            "definitely-not-an-installed-tool-3f9a",
        );
        assert!(path.is_none());
    }

    #[test]
    fn test_bundled_candidates_order() {
        let candidates = bundled_candidates(Path::new("/opt/app"), "ffmpeg");
        assert_eq!(candidates.len(), 2);
        assert!(candidates[0].starts_with("/opt/app"));
        assert!(candidates[1].starts_with("/opt/app/bin"));
    }
}
