//! Progress, completion and error notifications for background work.
//!
//! Corpus scans and archive exports run on a blocking worker and talk back
//! to the caller only through a one-way channel of [`TaskEvent`]s: any
//! number of `Progress` events followed by exactly one terminal event,
//! either `Completed` or `Failed`. Nothing is sent after the terminal event.
//!
//! The CLI renders progress on **stderr** so stdout remains parseable for
//! scripts.

use std::io::Write;

use anyhow::{anyhow, Result};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// One notification from a background task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskEvent<T> {
    /// Percentage of items handled so far, 0–100.
    Progress(u8),
    /// The task finished; carries its result.
    Completed(T),
    /// The task could not run at all.
    Failed(String),
}

/// Receiving half handed to the caller of `spawn_scan` / `spawn_export`.
pub type TaskReceiver<T> = UnboundedReceiver<TaskEvent<T>>;

/// Sending half owned by the worker.
///
/// `finish` consumes the sink, so a worker can emit at most one terminal event.
pub struct TaskSink<T> {
    tx: UnboundedSender<TaskEvent<T>>,
}

impl<T> TaskSink<T> {
    /// Report `done` of `total` items. Does nothing when `total` is zero.
    pub fn progress(&self, done: usize, total: usize) {
        if total == 0 {
            return;
        }
        let percent = percent(done, total);
        // The caller may have dropped the receiver; the worker keeps going.
        let _ = self.tx.send(TaskEvent::Progress(percent));
    }

    /// Emit the terminal event for `result`.
    pub fn finish<E: std::fmt::Display>(self, result: std::result::Result<T, E>) {
        let event = match result {
            Ok(value) => TaskEvent::Completed(value),
            Err(e) => TaskEvent::Failed(e.to_string()),
        };
        let _ = self.tx.send(event);
    }
}

/// Create a connected sink/receiver pair.
pub fn task_channel<T>() -> (TaskSink<T>, TaskReceiver<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (TaskSink { tx }, rx)
}

/// Integer percentage of `done` out of `total`, truncated.
pub fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((done.min(total) * 100) / total) as u8
}

/// Drain a task channel, forwarding progress to `reporter`, and return the
/// task's result.
///
/// A channel that closes without a terminal event means the worker died.
pub async fn wait_for<T>(
    mut rx: TaskReceiver<T>,
    task: &str,
    reporter: &dyn ProgressReporter,
) -> Result<T> {
    while let Some(event) = rx.recv().await {
        match event {
            TaskEvent::Progress(percent) => reporter.report(task, percent),
            TaskEvent::Completed(value) => {
                reporter.done(task);
                return Ok(value);
            }
            TaskEvent::Failed(message) => {
                reporter.done(task);
                return Err(anyhow!(message));
            }
        }
    }
    Err(anyhow!("{} worker stopped without reporting a result", task))
}

/// Renders task progress. Implementations write to stderr (human or JSON).
pub trait ProgressReporter: Send + Sync {
    /// Called for every `Progress` event.
    fn report(&self, task: &str, percent: u8);
    /// Called once when the task reaches its terminal event.
    fn done(&self, _task: &str) {}
}

/// Human-friendly progress on stderr: "scan  42%".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, task: &str, percent: u8) {
        let mut err = std::io::stderr().lock();
        let _ = write!(err, "\r{}  {:>3}%", task, percent);
        let _ = err.flush();
    }

    fn done(&self, _task: &str) {
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err);
        let _ = err.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, task: &str, percent: u8) {
        let obj = serde_json::json!({
            "event": "progress",
            "task": task,
            "percent": percent
        });
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _task: &str, _percent: u8) {}
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Parse the `--progress` flag value.
    pub fn from_flag(value: &str) -> Result<Self> {
        match value {
            "auto" => Ok(Self::default_for_tty()),
            "human" => Ok(ProgressMode::Human),
            "json" => Ok(ProgressMode::Json),
            "off" => Ok(ProgressMode::Off),
            other => Err(anyhow!(
                "Unknown progress mode: '{}'. Must be auto, human, json, or off.",
                other
            )),
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<u8>>);

    impl ProgressReporter for Recorder {
        fn report(&self, _task: &str, percent: u8) {
            self.0.lock().unwrap().push(percent);
        }
    }

    #[test]
    fn percent_truncates() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 66);
        assert_eq!(percent(3, 3), 100);
        assert_eq!(percent(5, 3), 100);
    }

    #[test]
    fn zero_total_emits_nothing() {
        let (sink, mut rx) = task_channel::<()>();
        sink.progress(0, 0);
        sink.finish::<String>(Ok(()));
        assert_eq!(rx.try_recv().unwrap(), TaskEvent::Completed(()));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn parses_progress_flag() {
        assert_eq!(ProgressMode::from_flag("json").unwrap(), ProgressMode::Json);
        assert_eq!(ProgressMode::from_flag("off").unwrap(), ProgressMode::Off);
        assert!(ProgressMode::from_flag("loud").is_err());
    }

    #[tokio::test]
    async fn wait_for_forwards_progress_then_result() {
        let (sink, rx) = task_channel::<u32>();
        sink.progress(1, 2);
        sink.progress(2, 2);
        sink.finish::<String>(Ok(7));
        let recorder = Recorder(Mutex::new(Vec::new()));
        let value = wait_for(rx, "scan", &recorder).await.unwrap();
        assert_eq!(value, 7);
        assert_eq!(*recorder.0.lock().unwrap(), vec![50, 100]);
    }

    #[tokio::test]
    async fn wait_for_surfaces_failure() {
        let (sink, rx) = task_channel::<u32>();
        sink.finish(Err("boom"));
        let err = wait_for(rx, "export", &NoProgress).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[tokio::test]
    async fn dropped_sink_is_an_error() {
        let (sink, rx) = task_channel::<u32>();
        drop(sink);
        assert!(wait_for(rx, "scan", &NoProgress).await.is_err());
    }
}
