//! Progress indicators for long-running operations
//!
//! Uses `linya`, which draws to stderr and keeps stdout clean for reports and
//! JSON output.

use linya::{Bar, Progress};

/// Progress bar over the files of one publish
pub struct UploadProgress {
  progress: Progress,
  bar: Bar,
}

impl UploadProgress {
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self { progress, bar }
  }

  /// Mark one more file as uploaded
  pub fn inc(&mut self) {
    self.progress.inc_and_draw(&self.bar, 1);
  }
}
