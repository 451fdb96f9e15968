use crate::config::VIDEO_EXTENSIONS;
use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// 掃描時略過的資料夾名稱（小寫比對）
const SKIPPED_DIRECTORIES: [&str; 3] = ["extras", "sample", "samples"];

#[derive(Debug, Clone)]
pub struct VideoFileInfo {
    pub path: PathBuf,
    pub size: u64,
}

pub fn scan_video_files(directory: &Path) -> Result<Vec<VideoFileInfo>> {
    let mut video_files: Vec<VideoFileInfo> = WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped(entry))
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| is_video_file(entry.path()))
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            Some(VideoFileInfo {
                path: entry.into_path(),
                size: metadata.len(),
            })
        })
        .collect();

    video_files.sort_by_key(|file| file.size);
    Ok(video_files)
}

#[must_use]
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_lowercase();
            VIDEO_EXTENSIONS.iter().any(|known| *known == ext)
        })
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
        return true;
    }
    entry.file_type().is_dir() && SKIPPED_DIRECTORIES.contains(&name.to_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_is_video_file() {
        assert!(is_video_file(Path::new("/a/movie.mkv")));
        assert!(is_video_file(Path::new("/a/MOVIE.MP4")));
        assert!(!is_video_file(Path::new("/a/poster.jpg")));
        assert!(!is_video_file(Path::new("/a/no_extension")));
    }

    #[test]
    fn test_scan_skips_hidden_and_extras() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("Extras")).unwrap();
        fs::create_dir_all(root.join(".hidden")).unwrap();
        fs::write(root.join("big.mkv"), vec![0u8; 300]).unwrap();
        fs::write(root.join("small.mp4"), vec![0u8; 100]).unwrap();
        fs::write(root.join("notes.txt"), b"text").unwrap();
        fs::write(root.join("Extras").join("trailer.mp4"), b"x").unwrap();
        fs::write(root.join(".hidden").join("secret.mp4"), b"x").unwrap();

        let files = scan_video_files(root).unwrap();
        assert_eq!(files.len(), 2);
        // 依檔案大小排序
        assert!(files[0].path.ends_with("small.mp4"));
        assert!(files[1].path.ends_with("big.mkv"));
    }
}
