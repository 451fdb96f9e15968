use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// 在同一目錄下產生唯一的暫存檔路徑
///
/// 暫存檔與目標檔位於同一個檔案系統，`rename` 才能保證原子性。
#[must_use]
pub fn temp_sibling(destination: &Path) -> PathBuf {
    let file_name = destination
        .file_name()
        .map_or_else(|| "file".into(), |n| n.to_string_lossy().to_string());
    let parent = destination.parent().unwrap_or(Path::new("."));
    parent.join(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4().simple()))
}

/// 原子寫入：先寫暫存檔再 rename，讀取端永遠看不到寫到一半的檔案
pub fn write_atomic(destination: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = temp_sibling(destination);
    let result = write_and_sync(&temp_path, bytes).and_then(|()| fs::rename(&temp_path, destination));

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_and_sync(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// 判斷檔案是否存在且非空
#[must_use]
pub fn is_non_empty_file(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|meta| meta.is_file() && meta.len() > 0)
}

/// 加上 `file:` 協定前綴，避免以 `-` 開頭的路徑被 ffmpeg/ffprobe 當成選項、
/// 或像 `concat:` 這類字串被當成其他協定
#[must_use]
pub fn file_url(path: &Path) -> OsString {
    let mut url = OsString::from("file:");
    url.push(path.as_os_str());
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_sibling_same_directory() {
        let dest = Path::new("/cache/ab/cd/abcd.jpg");
        let temp = temp_sibling(dest);
        assert_eq!(temp.parent(), dest.parent());
        assert_ne!(temp, temp_sibling(dest));
        assert!(temp.to_string_lossy().ends_with(".tmp"));
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested").join("out.bin");

        write_atomic(&dest, b"first").unwrap();
        write_atomic(&dest, b"second").unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"second");
        let leftovers = fs::read_dir(dest.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_is_non_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty");
        let full = dir.path().join("full");
        fs::write(&empty, b"").unwrap();
        fs::write(&full, b"data").unwrap();

        assert!(!is_non_empty_file(&empty));
        assert!(is_non_empty_file(&full));
        assert!(!is_non_empty_file(dir.path()));
    }

    #[test]
    fn test_file_url_prefix() {
        assert_eq!(file_url(Path::new("-i.mkv")), OsString::from("file:-i.mkv"));
        assert_eq!(
            file_url(Path::new("concat:a.mkv|b.mkv")),
            OsString::from("file:concat:a.mkv|b.mkv")
        );
    }
}
