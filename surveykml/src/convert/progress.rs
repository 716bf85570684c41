//! Conversion progress reporting.

use std::fmt;

use tokio::sync::mpsc;

/// Pipeline checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage {
    /// Opening and parsing the drawing
    ReadStarted,
    /// Recognized entities have been enumerated
    EntitiesScanned { total: usize },
    /// Entities processed so far
    Converting { done: usize, total: usize },
    /// Writing the output file
    SaveStarted,
    /// Output written
    Done,
}

/// One progress report: a stage and its percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub stage: ProgressStage,
    pub percent: u8,
}

impl Progress {
    pub fn new(stage: ProgressStage) -> Self {
        let percent = match stage {
            ProgressStage::ReadStarted => 10,
            ProgressStage::EntitiesScanned { .. } => 20,
            ProgressStage::Converting { done, total } => {
                let total = total.max(1);
                30 + (done.min(total) * 55 / total) as u8
            }
            ProgressStage::SaveStarted => 88,
            ProgressStage::Done => 100,
        };
        Self { stage, percent }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage {
            ProgressStage::ReadStarted => write!(f, "Reading drawing..."),
            ProgressStage::EntitiesScanned { total } => write!(f, "{} entities found", total),
            ProgressStage::Converting { done, total } => {
                write!(f, "Converting {} / {}...", done, total)
            }
            ProgressStage::SaveStarted => write!(f, "Saving KML file..."),
            ProgressStage::Done => write!(f, "Done"),
        }
    }
}

/// Receiver of progress reports.
///
/// Implementations must be cheap; the pipeline reports from its worker
/// thread and does not wait on the sink.
pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: Progress);
}

/// Discards all progress reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _progress: Progress) {}
}

/// Forwards progress reports over a channel to the caller's task.
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    tx: mpsc::UnboundedSender<Progress>,
}

impl ChannelProgress {
    pub fn new(tx: mpsc::UnboundedSender<Progress>) -> Self {
        Self { tx }
    }

    /// Create a sink and the receiver that observes it.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Progress>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl ProgressSink for ChannelProgress {
    fn report(&self, progress: Progress) {
        // Receiver gone means nobody is watching; keep converting.
        let _ = self.tx.send(progress);
    }
}

impl<F> ProgressSink for F
where
    F: Fn(Progress) + Send + Sync,
{
    fn report(&self, progress: Progress) {
        self(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_percentages() {
        assert_eq!(Progress::new(ProgressStage::ReadStarted).percent, 10);
        assert_eq!(
            Progress::new(ProgressStage::EntitiesScanned { total: 5 }).percent,
            20
        );
        assert_eq!(
            Progress::new(ProgressStage::Converting { done: 0, total: 40 }).percent,
            30
        );
        assert_eq!(
            Progress::new(ProgressStage::Converting { done: 20, total: 40 }).percent,
            57
        );
        assert_eq!(
            Progress::new(ProgressStage::Converting { done: 40, total: 40 }).percent,
            85
        );
        assert_eq!(Progress::new(ProgressStage::SaveStarted).percent, 88);
        assert_eq!(Progress::new(ProgressStage::Done).percent, 100);
    }

    #[test]
    fn test_converting_with_zero_total() {
        let p = Progress::new(ProgressStage::Converting { done: 0, total: 0 });
        assert_eq!(p.percent, 30);
    }

    #[test]
    fn test_channel_progress_survives_dropped_receiver() {
        let (sink, rx) = ChannelProgress::channel();
        drop(rx);
        sink.report(Progress::new(ProgressStage::Done));
    }

    #[test]
    fn test_closure_sink() {
        let seen = std::sync::Mutex::new(Vec::new());
        let sink = |p: Progress| seen.lock().unwrap().push(p.percent);
        sink.report(Progress::new(ProgressStage::SaveStarted));
        assert_eq!(*seen.lock().unwrap(), vec![88]);
    }

    #[test]
    fn test_display() {
        let p = Progress::new(ProgressStage::Converting { done: 10, total: 25 });
        assert_eq!(p.to_string(), "Converting 10 / 25...");
    }
}
