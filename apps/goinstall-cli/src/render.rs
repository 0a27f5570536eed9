//! Terminal progress display.
//!
//! Turns library [`ProgressEvent`]s into a single, redrawn status line on
//! stderr: byte counts and speed while the archive downloads, then a running
//! file count while it is unpacked.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use goinstall::{ProgressCallback, ProgressEvent};

/// Minimum interval between two redraws.
const REDRAW_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Default)]
struct State {
    download_started: Option<Instant>,
    last_draw: Option<Instant>,
    downloading: bool,
    extracted_files: u64,
}

/// Progress display for one install.
pub struct TerminalProgress {
    archive: String,
    state: Arc<Mutex<State>>,
}

impl TerminalProgress {
    /// Creates a display for the archive named `archive`.
    pub fn new(archive: String) -> Self {
        Self {
            archive,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Returns the callback to hand to the pipeline.
    pub fn callback(&self) -> ProgressCallback {
        let state = Arc::clone(&self.state);
        let archive = self.archive.clone();
        Arc::new(move |event: ProgressEvent| {
            if let Ok(mut state) = state.lock() {
                handle(&mut state, &archive, &event);
            }
        })
    }

    /// Ends the status line with a summary of what was extracted.
    pub fn finish(&self) {
        if let Ok(state) = self.state.lock()
            && state.extracted_files > 0
        {
            eprintln!("\rExtracted {} files.     ", state.extracted_files);
        }
    }
}

fn handle(state: &mut State, archive: &str, event: &ProgressEvent) {
    match event {
        ProgressEvent::Started { label, .. } if label == archive => {
            state.downloading = true;
            state.download_started = Some(Instant::now());
            eprintln!("Downloading {archive}");
        }
        ProgressEvent::Advanced { done, total } if state.downloading => {
            if !due(state) {
                return;
            }
            let elapsed = state
                .download_started
                .map_or(0.0, |start| start.elapsed().as_secs_f64());
            draw_download(*done, total.unwrap_or(0), elapsed);
        }
        ProgressEvent::Finished { label } if label == archive => {
            state.downloading = false;
            eprintln!();
        }
        ProgressEvent::Started { .. } => {
            state.extracted_files += 1;
            if due(state) {
                eprint!("\rExtracting... {} files", state.extracted_files);
                let _ = std::io::stderr().flush();
            }
        }
        ProgressEvent::Advanced { .. } | ProgressEvent::Finished { .. } => {}
    }
}

fn due(state: &mut State) -> bool {
    let now = Instant::now();
    let due = state
        .last_draw
        .is_none_or(|last| now.duration_since(last) >= REDRAW_INTERVAL);
    if due {
        state.last_draw = Some(now);
    }
    due
}

fn draw_download(downloaded: u64, total: u64, elapsed_secs: f64) {
    #[allow(clippy::cast_precision_loss)]
    let percent = if total > 0 {
        (downloaded as f64 / total as f64 * 100.0).min(100.0)
    } else {
        0.0
    };
    #[allow(clippy::cast_precision_loss)]
    let speed = if elapsed_secs > 0.0 {
        downloaded as f64 / elapsed_secs
    } else {
        0.0
    };

    eprint!(
        "\r{}/{} ({percent:.0}%) {}     ",
        format_bytes(downloaded),
        format_bytes(total),
        format_speed(speed)
    );
    let _ = std::io::stderr().flush();
}

/// Formats bytes into a human-readable string (KB, MB, GB).
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    #[allow(clippy::cast_precision_loss)]
    let bytes_f = bytes as f64;

    if bytes_f >= GB {
        format!("{:.2} GB", bytes_f / GB)
    } else if bytes_f >= MB {
        format!("{:.2} MB", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.2} KB", bytes_f / KB)
    } else {
        format!("{bytes} B")
    }
}

/// Formats speed (bytes/sec) into a human-readable string.
fn format_speed(speed: f64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    if speed >= MB {
        format!("{:.2} MB/s", speed / MB)
    } else if speed >= KB {
        format!("{:.2} KB/s", speed / KB)
    } else {
        format!("{speed:.0} B/s")
    }
}
