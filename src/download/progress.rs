//! 进度上报与 CLI 进度条管理。

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::info;

use crate::base_system::logging::attach_progress_bar;

pub(crate) struct ProgressReporter {
    bar: Option<ProgressBar>,
    done: u64,
    total: u64,
}

impl ProgressReporter {
    /// `visible` 为 false 时只写日志，不绘制进度条（测试与非交互环境）。
    pub(crate) fn new(total: usize, visible: bool) -> Self {
        let total = total as u64;
        let bar = visible.then(|| {
            let bar = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr());
            if let Ok(style) = ProgressStyle::with_template(
                "{prefix} [{elapsed_precise}] {wide_bar} {pos}/{len} ({eta}) {msg}",
            ) {
                bar.set_style(style.progress_chars("##-"));
            }
            bar.set_prefix("章节下载");
            attach_progress_bar(Some(bar.clone()));
            bar
        });
        Self {
            bar,
            done: 0,
            total,
        }
    }

    pub(crate) fn chapter_done(&mut self, title: &str, ok: bool) {
        self.done += 1;
        let remaining = self.total.saturating_sub(self.done);
        info!(target: "download", done = self.done, remaining, ok, "{} 完成 {} 章 剩 {} 章", title, self.done, remaining);
        if let Some(bar) = &self.bar {
            bar.set_message(title.to_string());
            bar.inc(1);
        }
    }

    pub(crate) fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            attach_progress_bar(None);
            bar.finish_and_clear();
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.finish();
    }
}
