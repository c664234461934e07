//! Console progress bars for long-running loops.
use indicatif::{ProgressBar, ProgressStyle};

/// Bar over `len` items labelled `unit`, e.g. "[====] 3/10 clouds (30%) Converting".
pub fn progress_bar(len: usize, unit: &str, message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    let template = format!("[{{bar:40.green/blue}}] {{pos}}/{{len}} {unit} ({{percent}}%) {{msg}}");
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("▉▊▋▌▍▎▏ "),
    );
    pb.set_message(message);
    pb
}
