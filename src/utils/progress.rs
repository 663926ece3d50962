use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner that reports which pipeline stage is running.
pub struct ProgressReporter {
    progress_bar: Option<ProgressBar>,
    total_stages: usize,
}

impl ProgressReporter {
    pub fn new_spinner(message: &str, silent: bool) -> Self {
        Self::with_stages(message, 0, silent)
    }

    pub fn with_stages(message: &str, total_stages: usize, silent: bool) -> Self {
        if silent {
            return Self {
                progress_bar: None,
                total_stages,
            };
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            progress_bar: Some(pb),
            total_stages,
        }
    }

    pub fn is_silent(&self) -> bool {
        self.progress_bar.is_none()
    }

    /// Show "[step/total] message" while a stage runs.
    pub fn stage(&self, step: usize, message: &str) {
        if self.total_stages == 0 {
            self.set_message(message);
        } else {
            self.set_message(&format!("[{}/{}] {}", step, self.total_stages, message));
        }
    }

    pub fn set_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(message.to_string());
        }
    }

    pub fn finish_with_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_with_message(message.to_string());
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(ref pb) = self.progress_bar {
            if !pb.is_finished() {
                pb.finish_and_clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_reporter_is_noop() {
        let progress = ProgressReporter::with_stages("Cleaning...", 3, true);
        assert!(progress.is_silent());
        progress.stage(1, "Detecting outliers");
        progress.finish_with_message("done");
    }
}
