use crate::component::poster_generator::{PosterGenerator, ToolCapability, ToolStatus};
use crate::config::Config;
use crate::pause;
use crate::tools::tool_locator;
use anyhow::Result;
use console::{Term, style};
use rust_i18n::t;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

const VERSION_TIMEOUT: Duration = Duration::from_secs(5);

pub fn run_poster_generator(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &mut Config,
) -> Result<()> {
    let mut generator = PosterGenerator::new(config.clone(), Arc::clone(shutdown_signal));

    if let Err(e) = generator.run() {
        eprintln!("{} {}", style(t!("common.error_prefix")).red().bold(), e);
    }

    // 帶回最近使用的路徑
    config.settings.recent_paths = generator.config().settings.recent_paths.clone();

    pause(term)?;
    Ok(())
}

/// 顯示 ffmpeg / ffprobe 的偵測結果，不做任何修改
pub fn show_tool_status(term: &Term, config: &Config) -> Result<()> {
    term.clear_screen()?;
    println!("{}", style(t!("tools.title")).cyan().bold());
    println!();

    let capability = ToolCapability::ffmpeg(config.render_timeout());
    match capability.status() {
        ToolStatus::Available { program, version } => print_found("ffmpeg", program, version),
        ToolStatus::Unavailable => print_missing("ffmpeg", tool_locator::FFMPEG_ENV),
    }

    match tool_locator::ffprobe_path() {
        Some(program) => match tool_locator::version_line(&program, VERSION_TIMEOUT) {
            Ok(version) => print_found("ffprobe", &program, &version),
            Err(_) => print_missing("ffprobe", tool_locator::FFPROBE_ENV),
        },
        None => print_missing("ffprobe", tool_locator::FFPROBE_ENV),
    }

    println!();
    println!("  {} {}", style(t!("tools.cache_dir")).dim(), config.cache_dir().display());

    pause(term)?;
    Ok(())
}

fn print_found(name: &str, program: &Path, version: &str) {
    println!("  {} {name}: {}", style("✓").green(), program.display());
    println!("      {}", style(version).dim());
}

fn print_missing(name: &str, env_key: &str) {
    println!("  {} {name}: {}", style("✗").red(), t!("tools.not_found"));
    println!("      {}", style(t!("tools.env_hint", env = env_key)).dim());
}
