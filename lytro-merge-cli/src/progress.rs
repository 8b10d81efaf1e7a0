//! Progress display for the merge: numbered phases and a file-copy bar.

use std::cell::{Cell, RefCell};

use indicatif::{ProgressBar, ProgressStyle};

use lytro_merge_import::{MergeProgress, MergeStats};

/// Prints the classic numbered phase lines and drives an indicatif bar
/// while files are being copied. Hidden entirely under `--quiet`.
pub(crate) struct BarProgress {
    quiet: bool,
    phase: Cell<u32>,
    bar: RefCell<Option<ProgressBar>>,
}

impl BarProgress {
    pub(crate) fn new(quiet: bool) -> Self {
        Self {
            quiet,
            phase: Cell::new(0),
            bar: RefCell::new(None),
        }
    }

    /// Remove the bar from the terminal, if one is up.
    pub(crate) fn clear(&self) {
        if let Some(bar) = self.bar.borrow_mut().take() {
            bar.finish_and_clear();
        }
    }
}

impl MergeProgress for BarProgress {
    fn on_phase(&self, message: &str) {
        self.clear();
        let n = self.phase.get() + 1;
        self.phase.set(n);
        log::info!("({}/4) {}", n, message);
    }

    fn on_table(&self, table: &str, created: u64, skipped: u64) {
        log::debug!("    {}: {} created, {} skipped", table, created, skipped);
    }

    fn on_file(&self, current: usize, total: usize, name: &str) {
        if self.quiet {
            return;
        }
        let mut slot = self.bar.borrow_mut();
        let bar = slot.get_or_insert_with(|| {
            let bar = ProgressBar::new(total as u64);
            bar.set_style(
                ProgressStyle::with_template("  {bar:40.cyan/blue} {pos}/{len} {msg}")
                    .expect("static pattern"),
            );
            bar
        });
        bar.set_position(current as u64);
        bar.set_message(name.to_string());
    }

    fn on_complete(&self, _stats: &MergeStats) {
        self.clear();
    }
}
