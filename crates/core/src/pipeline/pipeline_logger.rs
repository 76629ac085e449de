use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for a tracking run: progress, per-stage timings and metrics.
///
/// Use cases report through this port so the CLI, tests and any future
/// front end can each decide what to do with the events.
pub trait PipelineLogger: Send {
    /// Called once per frame with a 1-based frame number.
    fn progress(&mut self, current: usize, total: usize);

    /// Time spent in `stage` for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// A per-frame measurement such as the number of faces tracked.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Called once after the last frame. Default: no-op.
    fn summary(&self) {}
}

/// Discards every event.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running count, sum and maximum of a stream of samples.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Series {
    count: usize,
    sum: f64,
    max: f64,
}

impl Series {
    fn push(&mut self, value: f64) {
        if self.count == 0 || value > self.max {
            self.max = value;
        }
        self.count += 1;
        self.sum += value;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Logs throttled progress through `log` and keeps stage statistics for
/// an end-of-run summary.
pub struct StdoutPipelineLogger {
    every: usize,
    stages: BTreeMap<String, Series>,
    metrics: BTreeMap<String, Series>,
    started: Instant,
    frames: usize,
}

impl StdoutPipelineLogger {
    /// Progress is logged every `every` frames and on the last frame.
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
            stages: BTreeMap::new(),
            metrics: BTreeMap::new(),
            started: Instant::now(),
            frames: 0,
        }
    }

    pub fn stage(&self, stage: &str) -> Option<&Series> {
        self.stages.get(stage)
    }

    pub fn metric_series(&self, name: &str) -> Option<&Series> {
        self.metrics.get(name)
    }

    /// Multi-line report, or `None` before anything was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.stages.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Tracked {} frames in {:.1}s:",
            self.frames,
            elapsed_ms / 1000.0
        )];

        for (stage, s) in &self.stages {
            lines.push(format!(
                "  {stage:10} avg {:6.1}ms  max {:6.1}ms  total {:7.0}ms",
                s.mean(),
                s.max(),
                s.sum()
            ));
        }
        for (name, s) in &self.metrics {
            lines.push(format!("  {name}: avg {:.1}, max {:.0}", s.mean(), s.max()));
        }
        if self.frames > 0 && elapsed_ms > 0.0 {
            let fps = self.frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(25)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames = self.frames.max(current);
        if current % self.every != 0 && current != total {
            return;
        }
        if total > 0 {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Tracking: {current}/{total} frames ({pct:.1}%)");
        } else {
            log::info!("Tracking: frame {current}");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.stages
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().push(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

/// Milliseconds since `start`.
pub(crate) fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
