//! 日志系统：控制台（stderr）+ 文件双输出，退出时归档为 zip。

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::{io, panic, thread, time::Duration};

use indicatif::ProgressBar;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{error, info};
use tracing_appender::non_blocking::{self, WorkerGuard};
use tracing_appender::rolling;
use tracing_subscriber::Layer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use zip::CompressionMethod;
use zip::write::FileOptions;

const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024; // 10MB
const ARCHIVE_WAIT_MS: u64 = 300;

/// 正在绘制的进度条；控制台日志写入前先让它让出终端。
static CONSOLE_BAR: RwLock<Option<ProgressBar>> = RwLock::new(None);

/// 登记（或清除）当前进度条，之后的控制台日志经 `suspend` 输出。
pub fn attach_progress_bar(bar: Option<ProgressBar>) {
    if let Ok(mut slot) = CONSOLE_BAR.write() {
        *slot = bar;
    }
}

struct ConsoleWriter;

impl Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let bar = CONSOLE_BAR.read().ok().and_then(|slot| slot.clone());
        match bar {
            Some(bar) => bar.suspend(|| io::stderr().write_all(buf))?,
            None => io::stderr().write_all(buf)?,
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("logging already initialized")]
    AlreadyInitialized,
    #[error("subscriber init failed: {0}")]
    SubscriberInit(#[from] tracing_subscriber::util::TryInitError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("time formatting failed: {0}")]
    Time(#[from] time::error::Format),
}

#[derive(Clone, Copy, Debug)]
pub struct LogOptions {
    pub debug: bool,
    pub use_color: bool,
    pub archive_on_exit: bool,
    pub console: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            debug: false,
            use_color: true,
            archive_on_exit: true,
            console: true,
        }
    }
}

pub struct LogSystem {
    runtime: Arc<LogRuntime>,
}

impl LogSystem {
    /// 在 `base_dir/logs`（缺省为当前目录下 `logs`）初始化日志。
    pub fn init_with_base(options: LogOptions, base_dir: Option<&Path>) -> Result<Self, LogError> {
        let logs_dir = base_dir
            .map(|dir| dir.join("logs"))
            .unwrap_or_else(|| PathBuf::from("logs"));
        fs::create_dir_all(&logs_dir)?;
        let latest_log = logs_dir.join("latest.log");

        if fs::metadata(&latest_log).map(|m| m.len() >= MAX_LOG_BYTES).unwrap_or(false) {
            archive_log_file(&latest_log, &logs_dir)?;
        }

        let file_appender = rolling::never(&logs_dir, "latest.log");
        let (file_writer, guard) = non_blocking::NonBlockingBuilder::default()
            .lossy(false)
            .finish(file_appender);

        let console_layer = fmt::layer()
            .with_target(false)
            .with_level(true)
            .with_thread_names(options.debug)
            .with_ansi(options.use_color)
            .with_writer(BoxMakeWriter::new(|| ConsoleWriter))
            .with_filter(console_filter(&options));

        let file_layer = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_thread_names(true)
            .with_ansi(false)
            .with_writer(file_writer)
            .with_filter(LevelFilter::DEBUG);

        tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .map_err(|e| {
                let msg = e.to_string();
                if msg.contains("global subscriber") || msg.contains("already") {
                    LogError::AlreadyInitialized
                } else {
                    LogError::SubscriberInit(e)
                }
            })?;

        let runtime = Arc::new(LogRuntime {
            logs_dir,
            latest_log,
            guard: Mutex::new(Some(guard)),
            exit_called: AtomicBool::new(false),
            archive_on_exit: options.archive_on_exit,
        });

        runtime.install_signal_handler();
        runtime.install_panic_hook();

        Ok(Self { runtime })
    }

    pub fn logs_dir(&self) -> &Path {
        &self.runtime.logs_dir
    }
}

impl Drop for LogSystem {
    fn drop(&mut self) {
        self.runtime.safe_exit();
    }
}

struct LogRuntime {
    logs_dir: PathBuf,
    latest_log: PathBuf,
    guard: Mutex<Option<WorkerGuard>>,
    exit_called: AtomicBool,
    archive_on_exit: bool,
}

impl LogRuntime {
    fn install_signal_handler(self: &Arc<Self>) {
        let runtime = Arc::clone(self);
        let _ = ctrlc::set_handler(move || {
            runtime.safe_exit();
            std::process::exit(130);
        });
    }

    fn install_panic_hook(self: &Arc<Self>) {
        let runtime = Arc::clone(self);
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            match info.location() {
                Some(location) => {
                    error!("panic at {}:{}: {}", location.file(), location.line(), info)
                }
                None => error!("panic: {info}"),
            }
            runtime.safe_exit();
            previous(info);
        }));
    }

    fn safe_exit(&self) {
        if self.exit_called.swap(true, Ordering::SeqCst) {
            return;
        }

        // 释放 guard 以刷新非阻塞写入队列。
        if let Ok(mut guard) = self.guard.lock() {
            guard.take();
        }

        if !self.archive_on_exit {
            return;
        }

        thread::sleep(Duration::from_millis(ARCHIVE_WAIT_MS));
        if let Err(err) = archive_log_file(&self.latest_log, &self.logs_dir) {
            eprintln!("failed to archive log: {err}");
        }
    }
}

/// 控制台输出级别：关闭控制台时为 OFF，`--debug` 时放开到 DEBUG。
pub fn console_filter(options: &LogOptions) -> LevelFilter {
    match (options.console, options.debug) {
        (false, _) => LevelFilter::OFF,
        (true, true) => LevelFilter::DEBUG,
        (true, false) => LevelFilter::INFO,
    }
}

/// 把 `latest.log` 压缩为 `log_<时间戳>.zip` 并删除原文件；空日志直接删除。
pub(crate) fn archive_log_file(
    latest_log: &Path,
    logs_dir: &Path,
) -> Result<Option<PathBuf>, LogError> {
    if !latest_log.exists() {
        return Ok(None);
    }
    if fs::metadata(latest_log)?.len() == 0 {
        let _ = fs::remove_file(latest_log);
        return Ok(None);
    }

    let timestamp = OffsetDateTime::now_utc().format(format_description!(
        "[year][month][day]_[hour][minute][second]"
    ))?;
    let archive_path = unique_archive_path(logs_dir, &timestamp);

    let file = File::create(&archive_path)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(format!("{timestamp}.log"), options)?;
    let mut source = File::open(latest_log)?;
    io::copy(&mut source, &mut zip)?;
    zip.finish()?;
    drop(source);

    let _ = fs::remove_file(latest_log);
    info!("log archived to {}", archive_path.display());
    Ok(Some(archive_path))
}

fn unique_archive_path(logs_dir: &Path, timestamp: &str) -> PathBuf {
    let first = logs_dir.join(format!("log_{timestamp}.zip"));
    if !first.exists() {
        return first;
    }
    (1..)
        .map(|n| logs_dir.join(format!("log_{timestamp}_{n}.zip")))
        .find(|p| !p.exists())
        .unwrap_or(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn console_level_follows_debug_and_quiet() {
        let base = LogOptions::default();
        assert_eq!(console_filter(&base), LevelFilter::INFO);
        let debug = LogOptions { debug: true, ..base };
        assert_eq!(console_filter(&debug), LevelFilter::DEBUG);
        let quiet = LogOptions { console: false, ..debug };
        assert_eq!(console_filter(&quiet), LevelFilter::OFF);
    }

    #[test]
    fn console_writer_reports_the_whole_buffer() {
        let mut w = ConsoleWriter;
        assert_eq!(w.write(b"").unwrap(), 0);
        attach_progress_bar(Some(ProgressBar::hidden()));
        assert_eq!(w.write(b"line\n").unwrap(), 5);
        attach_progress_bar(None);
    }

    #[test]
    fn archive_skips_missing_and_empty_logs() {
        let dir = TempDir::new().unwrap();
        let latest = dir.path().join("latest.log");
        assert!(archive_log_file(&latest, dir.path()).unwrap().is_none());

        fs::write(&latest, b"").unwrap();
        assert!(archive_log_file(&latest, dir.path()).unwrap().is_none());
        assert!(!latest.exists());
    }

    #[test]
    fn archive_zips_and_removes_latest() {
        let dir = TempDir::new().unwrap();
        let latest = dir.path().join("latest.log");
        fs::write(&latest, b"hello log\n").unwrap();

        let archived = archive_log_file(&latest, dir.path()).unwrap().unwrap();
        assert!(archived.exists());
        assert!(!latest.exists());

        let reader = zip::ZipArchive::new(File::open(&archived).unwrap()).unwrap();
        assert_eq!(reader.len(), 1);
    }
}
