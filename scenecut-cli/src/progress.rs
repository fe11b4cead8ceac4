// ============================================================================
// scenecut-cli/src/progress.rs
// ============================================================================
//
// PROGRESS REPORTING: Terminal progress bar for pipeline runs
//
// The core pipeline reports progress as a fraction through a callback. This
// module turns that callback into an indicatif bar on stderr. indicatif hides
// the bar by itself when stderr is not a terminal.

use indicatif::{ProgressBar, ProgressStyle};

const BAR_LENGTH: u64 = 1000;

/// Progress bar fed by a pipeline progress callback.
#[derive(Clone)]
pub struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    /// Creates a bar with `message` as its prefix.
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new(BAR_LENGTH);
        bar.set_style(
            ProgressStyle::with_template("{msg:>10} [{bar:40.cyan/blue}] {percent:>3}% {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.set_message(message.to_string());
        Self { bar }
    }

    /// A bar that never draws, for quiet runs and tests.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Callback for [`scenecut_core::ScenePipeline::with_progress`].
    pub fn callback(&self) -> impl Fn(f64) + Send + Sync + 'static {
        let bar = self.bar.clone();
        move |fraction| bar.set_position(fraction_to_position(fraction))
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    #[cfg(test)]
    fn position(&self) -> u64 {
        self.bar.position()
    }
}

fn fraction_to_position(fraction: f64) -> u64 {
    (fraction.clamp(0.0, 1.0) * BAR_LENGTH as f64).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_moves_bar() {
        let progress = CliProgress::hidden();
        let callback = progress.callback();
        callback(0.25);
        assert_eq!(progress.position(), 250);
        callback(1.5);
        assert_eq!(progress.position(), BAR_LENGTH);
    }
}
