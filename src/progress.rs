//! Progress bar for batches of reconciliation passes.

use crate::ui;
use declarative::{Error, Outcome, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};

/// Shows a progress bar while a batch runs
pub struct BarProgress {
    bar: Option<ProgressBar>,
    hidden: bool,
}

impl BarProgress {
    pub fn new(hidden: bool) -> Self {
        Self { bar: None, hidden }
    }
}

impl ProgressCallback for BarProgress {
    fn on_batch_start(&mut self, count: usize) {
        if self.hidden {
            return;
        }
        let pb = ProgressBar::new(count as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|s| s.progress_chars("=>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        self.bar = Some(pb);
    }

    fn on_record_start(&mut self, name: &str) {
        if let Some(pb) = &self.bar {
            pb.set_message(name.to_string());
        }
    }

    fn on_record_complete(&mut self, name: &str, result: &Result<Outcome, Error>) {
        if let Some(pb) = &self.bar {
            let symbol = match result {
                Ok(outcome) => ui::outcome_symbol(outcome),
                Err(_) => "✗",
            };
            pb.set_message(format!("{symbol} {name}"));
            pb.inc(1);
        }
    }

    fn on_batch_complete(&mut self) {
        if let Some(pb) = self.bar.take() {
            pb.finish_and_clear();
        }
    }
}
