use log::warn;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 安裝 Ctrl-C 處理器；批次流程在派發下一個檔案前檢查這個旗標
#[must_use]
pub fn setup_shutdown_signal() -> Arc<AtomicBool> {
    let shutdown_signal = Arc::new(AtomicBool::new(false));
    let signal_clone = Arc::clone(&shutdown_signal);

    ctrlc::set_handler(move || {
        signal_clone.store(true, Ordering::SeqCst);
        warn!("收到中斷信號，等待進行中的海報完成後停止");
        eprintln!("\n收到中斷信號，正在安全關閉...");
    })
    .expect("無法設定 Ctrl-C 處理器");

    shutdown_signal
}

#[must_use]
pub fn is_shutdown_requested(signal: &AtomicBool) -> bool {
    signal.load(Ordering::SeqCst)
}
