//! Metrics sink contract.
//!
//! Encoders emit one [`StageRecord`] per incremental stage; the evaluation
//! decorator pushes [`EvalCounters`](crate::EvalCounters) snapshots after
//! every solve. Persisted format is JSON lines, one object per record.

use crate::eval::EvalCounters;
use serde::Serialize;

/// Outcome of a stage's probe(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProbeOutcome {
    /// All probes of the stage certified unsatisfiability.
    Unsat,
    /// A probe unexpectedly found a model (encoding defect).
    Sat,
    /// The termination predicate cancelled a probe.
    Interrupted,
}

/// Per-stage record exposed to the metrics sink.
#[derive(Debug, Clone, Serialize)]
pub struct StageRecord {
    /// Stage index (hole count / chain depth / learning step).
    pub stage: u32,
    /// Probe outcome for the stage.
    pub outcome: ProbeOutcome,
    /// Wall-clock time spent in the stage's solve calls.
    pub elapsed_secs: f64,
    /// Number of solve calls the stage issued.
    pub probes: u32,
}

/// Consumer of per-stage records and decorator counters.
pub trait MetricsSink {
    /// Records one stage of an encoder run.
    fn stage(&mut self, record: &StageRecord) {
        let _ = record;
    }

    /// Records a decorator counter snapshot.
    fn eval(&mut self, counters: &EvalCounters) {
        let _ = counters;
    }
}

/// Sink that discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl MetricsSink for NullSink {}

/// Sink collecting records in memory, for tests and summaries.
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Stage records in arrival order.
    pub stages: Vec<StageRecord>,
    /// Counter snapshots in arrival order.
    pub evals: Vec<EvalCounters>,
}

impl MetricsSink for MemorySink {
    fn stage(&mut self, record: &StageRecord) {
        self.stages.push(record.clone());
    }

    fn eval(&mut self, counters: &EvalCounters) {
        self.evals.push(counters.clone());
    }
}

/// Sink writing one JSON object per line.
pub struct JsonLinesSink<W: std::io::Write> {
    out: W,
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Record<'a> {
    Stage(&'a StageRecord),
    Eval(&'a EvalCounters),
}

impl<W: std::io::Write> JsonLinesSink<W> {
    /// Wraps a writer.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn write(&mut self, record: &Record<'_>) {
        if let Err(err) = serde_json::to_writer(&mut self.out, record)
            .map_err(std::io::Error::from)
            .and_then(|()| self.out.write_all(b"\n"))
        {
            tracing::warn!(%err, "failed to write metrics record");
        }
    }
}

impl<W: std::io::Write> MetricsSink for JsonLinesSink<W> {
    fn stage(&mut self, record: &StageRecord) {
        self.write(&Record::Stage(record));
    }

    fn eval(&mut self, counters: &EvalCounters) {
        self.write(&Record::Eval(counters));
    }
}
