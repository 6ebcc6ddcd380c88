//! Terminal progress indicators

use benchmaker_application::{ProgressEvent, ProgressSink};
use benchmaker_domain::ResultStatus;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

/// Create a progress bar
pub fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

/// Create a spinner
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Progress sink that advances `bar` once per settled task
pub fn run_progress(bar: ProgressBar) -> ProgressSink {
    Arc::new(move |event: ProgressEvent| {
        bar.set_position(event.done as u64);
        if event.status == ResultStatus::Failed {
            bar.println(format!("failed: {} on {}", event.test_case_id, event.model_id));
        }
        bar.set_message(event.model_id);
    })
}
