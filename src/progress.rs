use indicatif::{ProgressBar, ProgressStyle};

/// Per-case progress bar for a sequential run.
pub struct ProgressTracker {
    bar: ProgressBar,
    successful: usize,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .expect("Failed to set progress bar template")
                .progress_chars("#>-")
        );

        bar.set_message("Analyzing cases...");

        Self { bar, successful: 0 }
    }

    pub fn hidden(total: usize) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_length(total as u64);
        Self { bar, successful: 0 }
    }

    pub fn start(&self, name: &str) {
        self.bar.set_message(name.to_string());
    }

    pub fn complete(&mut self, success: bool) {
        if success {
            self.successful += 1;
        }
        self.bar.inc(1);
    }

    pub fn finish(&self) {
        self.bar.finish_with_message(format!(
            "{} of {} cases analyzed",
            self.successful,
            self.bar.position()
        ));
    }
}
