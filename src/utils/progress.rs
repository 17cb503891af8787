use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

const BYTES_TEMPLATE: &str =
    "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";
const COUNT_TEMPLATE: &str = "{msg} [{bar:40.cyan/blue}] {pos}/{len}";
const SPINNER_TEMPLATE: &str = "{spinner} {msg} {bytes}";

/// Receives progress updates for downloads and extractions.
///
/// `total` is zero when the size of the work is unknown.
pub trait Progress {
    /// Begin tracking a transfer measured in bytes.
    fn start(&mut self, label: &str, total: u64);

    /// Begin tracking work measured in items, such as archive members.
    fn start_items(&mut self, label: &str, total: u64) {
        self.start(label, total);
    }

    fn advance(&mut self, amount: u64);
    fn finish(&mut self);
}

/// Terminal progress bar on stderr.
#[derive(Default)]
pub struct ConsoleProgress {
    bar: Option<ProgressBar>,
    hidden: bool,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn hidden() -> Self {
        Self {
            bar: None,
            hidden: true,
        }
    }

    fn begin(&mut self, label: &str, bar: ProgressBar) {
        if let Some(previous) = self.bar.take() {
            previous.finish_and_clear();
        }
        if self.hidden {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        bar.set_message(label.to_string());
        self.bar = Some(bar);
    }

    fn spinner() -> ProgressBar {
        let bar = ProgressBar::new_spinner().with_style(style(SPINNER_TEMPLATE));
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    }
}

fn style(template: &str) -> ProgressStyle {
    match ProgressStyle::with_template(template) {
        Ok(style) => style.progress_chars("=> "),
        Err(e) => {
            log::debug!("invalid progress template {template:?}: {e}");
            ProgressStyle::default_bar()
        }
    }
}

impl Progress for ConsoleProgress {
    fn start(&mut self, label: &str, total: u64) {
        let bar = if total > 0 {
            ProgressBar::new(total).with_style(style(BYTES_TEMPLATE))
        } else {
            Self::spinner()
        };
        self.begin(label, bar);
    }

    fn start_items(&mut self, label: &str, total: u64) {
        let bar = if total > 0 {
            ProgressBar::new(total).with_style(style(COUNT_TEMPLATE))
        } else {
            Self::spinner()
        };
        self.begin(label, bar);
    }

    fn advance(&mut self, amount: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(amount);
        }
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
    }
}

/// Discards all updates.
pub struct NoProgress;

impl Progress for NoProgress {
    fn start(&mut self, _label: &str, _total: u64) {}
    fn advance(&mut self, _amount: u64) {}
    fn finish(&mut self) {}
}
