use log::{debug, warn};
use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// 檢查子程序狀態的間隔
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// 子程序執行結果
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.status.success()
    }

    #[must_use]
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    /// 無法啟動程序（通常是找不到執行檔）
    #[error("無法啟動程序: {0}")]
    Spawn(#[source] io::Error),
    /// 超過時限，程序已被終止
    #[error("程序執行超過 {} 秒，已終止", .0.as_secs())]
    TimedOut(Duration),
    #[error("無法等待程序結束: {0}")]
    Wait(#[source] io::Error),
}

/// 在時限內執行子程序並收集輸出
///
/// stdout/stderr 由背景執行緒讀取，避免管線塞滿造成子程序卡住。
/// 超時時直接 kill，不等待程序自行結束。
pub fn run_with_timeout(command: &mut Command, timeout: Duration) -> Result<ProcessOutput, RunError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command.spawn().map_err(RunError::Spawn)?;
    let stdout_reader = spawn_reader(child.stdout.take());
    let stderr_reader = spawn_reader(child.stderr.take());

    let status = wait_until(&mut child, timeout);

    let stdout = join_reader(stdout_reader);
    let stderr = join_reader(stderr_reader);

    status.map(|status| ProcessOutput {
        status,
        stdout,
        stderr,
    })
}

fn wait_until(child: &mut Child, timeout: Duration) -> Result<ExitStatus, RunError> {
    let deadline = Instant::now() + timeout;

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if Instant::now() >= deadline => {
                warn!("子程序 [{}] 超時，終止中", child.id());
                if let Err(e) = child.kill() {
                    debug!("終止子程序失敗 [{}]: {e}", child.id());
                }
                let _ = child.wait();
                return Err(RunError::TimedOut(timeout));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(RunError::Wait(e));
            }
        }
    }
}

fn spawn_reader<R>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            let _ = pipe.read_to_end(&mut buffer);
            buffer
        })
    })
}

fn join_reader(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_run_collects_output() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "printf out; printf err 1>&2"]);

        let output = run_with_timeout(&mut cmd, Duration::from_secs(5)).unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, b"out");
        assert_eq!(output.stderr_text(), "err");
    }

    #[test]
    fn test_run_reports_non_zero_exit() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "exit 3"]);

        let output = run_with_timeout(&mut cmd, Duration::from_secs(5)).unwrap();
        assert!(!output.success());
        assert_eq!(output.status.code(), Some(3));
    }

    #[test]
    fn test_run_kills_on_timeout() {
        let mut cmd = Command::new("sleep");
        cmd.arg("5");

        let started = Instant::now();
        let result = run_with_timeout(&mut cmd, Duration::from_millis(200));
        assert!(matches!(result, Err(RunError::TimedOut(_))));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_run_missing_program() {
        let mut cmd = Command::new("/nonexistent/definitely-not-a-tool");
        let result = run_with_timeout(&mut cmd, Duration::from_secs(1));
        assert!(matches!(result, Err(RunError::Spawn(_))));
    }

    #[test]
    fn test_run_error_messages() {
        use std::error::Error as _;

        let timed_out = RunError::TimedOut(Duration::from_secs(30));
        assert_eq!(timed_out.to_string(), "程序執行超過 30 秒，已終止");
        assert!(timed_out.source().is_none());

        let spawn = RunError::Spawn(io::Error::from(io::ErrorKind::NotFound));
        assert!(spawn.to_string().starts_with("無法啟動程序: "));
        assert!(spawn.source().is_some());
    }
}
