use anyhow::{Context, Result};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// 每個取樣區塊的大小
const CHUNK_SIZE: u64 = 64 * 1024;
/// 取樣區塊數量（開頭、中段、結尾）
const CHUNK_COUNT: u64 = 3;

/// 計算檔案的部分指紋
///
/// 只讀取平均分布在檔案中的數個區塊，再加上檔案大小一起雜湊，
/// 對數 GB 的影片也能快速完成。
pub fn calculate_partial_fingerprint(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("無法開啟檔案: {}", path.display()))?;
    let size = file
        .metadata()
        .with_context(|| format!("無法讀取檔案資訊: {}", path.display()))?
        .len();

    let mut hasher = blake3::Hasher::new();
    hasher.update(&size.to_le_bytes());

    let mut buffer = vec![0u8; CHUNK_SIZE as usize];
    for position in chunk_positions(size) {
        file.seek(SeekFrom::Start(position))
            .with_context(|| format!("讀取檔案失敗: {}", path.display()))?;
        let bytes_read = read_up_to(&mut file, &mut buffer)
            .with_context(|| format!("讀取檔案失敗: {}", path.display()))?;
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

fn chunk_positions(size: u64) -> Vec<u64> {
    if size == 0 {
        return Vec::new();
    }
    let last_start = size.saturating_sub(CHUNK_SIZE);
    let step = last_start / (CHUNK_COUNT - 1);
    let mut positions: Vec<u64> = (0..CHUNK_COUNT).map(|i| (i * step).min(last_start)).collect();
    positions.dedup();
    positions
}

fn read_up_to(reader: &mut impl Read, buffer: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        let n = reader.read(&mut buffer[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
