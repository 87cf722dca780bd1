//! Progress indicators for CLI operations
//!
//! Spinners draw to stderr and stay hidden when it is not a terminal, so
//! piped output is unaffected.

use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::time::Duration;

/// Create a spinner for indeterminate operations
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Spinner that also shows elapsed time, for jobs that are polled
pub fn create_wait_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Await `fut` behind a spinner, clearing it afterwards
pub async fn with_spinner<T>(message: &str, fut: impl Future<Output = T>) -> T {
    let pb = create_spinner(message);
    let output = fut.await;
    pb.finish_and_clear();
    output
}
