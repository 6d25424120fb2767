use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// Lifecycle of one translation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Probing,
    Batching,
    Sweeping,
    Done,
    Failed,
    Cancelled,
}

/// Which pass a batch belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Batching,
    Sweeping,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    State(RunState),
    /// Emitted before a batch (or sweep group) is sent.
    Batch {
        phase: Phase,
        batch: usize,
        total: usize,
    },
    /// Emitted after translations of a batch have been written.
    Progress {
        translated: usize,
        total: usize,
        percent: u8,
    },
}

/// Receiver of progress events. Rendering is up to the implementation.
pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: &ProgressEvent);
}

/// Writes progress to the log.
#[derive(Debug, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn on_event(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::State(state) => info!("Translation run: {:?}", state),
            ProgressEvent::Batch { phase, batch, total } => {
                info!("{:?} batch {}/{}", phase, batch, total)
            }
            ProgressEvent::Progress { translated, total, percent } => {
                info!("Translated {}/{} entries ({}%)", translated, total, percent)
            }
        }
    }
}

/// Terminal progress bar over translated entries.
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} entries {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"));
        Self { bar }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleProgress {
    fn on_event(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::State(RunState::Probing) => self.bar.set_message("checking ollama"),
            ProgressEvent::State(RunState::Done) => self.bar.finish_with_message("done"),
            ProgressEvent::State(RunState::Failed) => self.bar.abandon_with_message("failed"),
            ProgressEvent::State(RunState::Cancelled) => self.bar.abandon_with_message("cancelled"),
            ProgressEvent::State(_) => {}
            ProgressEvent::Batch { phase, batch, total } => {
                let label = match phase {
                    Phase::Batching => "batch",
                    Phase::Sweeping => "sweep",
                };
                self.bar.set_message(format!("({} {}/{})", label, batch, total));
            }
            ProgressEvent::Progress { translated, total, .. } => {
                self.bar.set_length(*total as u64);
                self.bar.set_position(*translated as u64);
            }
        }
    }
}

pub fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 10), 0);
        assert_eq!(percent(5, 10), 50);
        assert_eq!(percent(10, 10), 100);
        assert_eq!(percent(12, 10), 100);
        assert_eq!(percent(0, 0), 100);
        assert_eq!(percent(1, 3), 33);
    }

    #[test]
    fn test_console_progress_tracks_entries() {
        let progress = ConsoleProgress::new();
        progress.on_event(&ProgressEvent::Progress { translated: 25, total: 100, percent: 25 });
        assert_eq!(progress.bar.length(), Some(100));
        assert_eq!(progress.bar.position(), 25);
        progress.on_event(&ProgressEvent::State(RunState::Done));
        assert!(progress.bar.is_finished());
    }
}
