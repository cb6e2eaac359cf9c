//! Basic/Helper incremental encoder.
//!
//! Stage `k` (for `k = 1 ..= num_pigeons - 1`) makes hole `k - 1` available:
//! it adds the pairwise at-most-one clauses for the new hole and, per pigeon,
//! a clause asserting the pigeon occupies one of holes `0 .. k` or the
//! stage-`k` helper literal holds. The helper literal soft-disables the
//! clause; each probe hardens its own stage by assuming the negation and
//! must certify unsatisfiability.

use crate::config::EncoderConfig;
use roost_base::{Error, Result, VarAllocator, VarContainer};
use roost_base::{Compose, HelperMap, PigeonHoleMap};
use roost_engine::{Engine, MetricsSink, NullSink, ProbeOutcome, SolveResult, StageRecord};
use std::time::Instant;

/// Allocates the container assembly the basic encoder needs: a pigeon/hole
/// grid and one helper literal per stage.
pub fn container(
    cfg: &EncoderConfig,
    alloc: &mut VarAllocator,
) -> Result<Compose<PigeonHoleMap, HelperMap>> {
    let pigeon_holes = PigeonHoleMap::new(alloc, cfg.num_pigeons, cfg.num_holes())?;
    let helpers = HelperMap::new(alloc, cfg.num_holes())?;
    Ok(Compose::new(pigeon_holes, helpers))
}

/// The Basic/Helper encoder state machine.
pub struct BasicHelperEncoder<C: VarContainer, E: Engine> {
    cfg: EncoderConfig,
    container: C,
    engine: E,
    next_stage: u32,
    sink: Box<dyn MetricsSink>,
}

impl<C: VarContainer, E: Engine> BasicHelperEncoder<C, E> {
    /// Creates the encoder over a container exposing pigeon/hole and helper
    /// capabilities.
    pub fn new(cfg: &EncoderConfig, container: C, engine: E) -> Self {
        Self {
            cfg: cfg.clone(),
            container,
            engine,
            next_stage: 1,
            sink: Box::new(NullSink),
        }
    }

    /// Replaces the metrics sink.
    pub fn with_sink(mut self, sink: Box<dyn MetricsSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The wrapped engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Adds the clauses of stage `k`. Stages must be added in increasing
    /// order, each exactly once.
    pub fn add_stage(&mut self, k: u32) -> Result<()> {
        if k != self.next_stage || k > self.cfg.num_holes() {
            return Err(Error::StageOrder {
                requested: k,
                expected: self.next_stage,
            });
        }
        let pigeon_holes = self
            .container
            .pigeon_holes()
            .expect("basic encoder needs pigeon/hole capability");
        let helpers = self
            .container
            .helpers()
            .expect("basic encoder needs helper capability");

        let hole = k - 1;
        for p in 0..self.cfg.num_pigeons {
            for q in 0..p {
                self.engine.add_clause([
                    -pigeon_holes.pigeon_in_hole(p, hole),
                    -pigeon_holes.pigeon_in_hole(q, hole),
                ]);
            }
        }
        for p in 0..self.cfg.num_pigeons {
            self.engine.add_clause(
                (0..k)
                    .map(|h| pigeon_holes.pigeon_in_hole(p, h))
                    .chain([helpers.helper(k)]),
            );
        }
        tracing::debug!(stage = k, "basic stage encoded");
        self.next_stage += 1;
        Ok(())
    }

    /// Probes an already-added stage: assumes the negated stage helper and
    /// requires the engine to certify unsatisfiability.
    pub fn probe_stage(&mut self, k: u32) -> Result<StageRecord> {
        if k == 0 || k >= self.next_stage {
            return Err(Error::StageOrder {
                requested: k,
                expected: self.next_stage,
            });
        }
        let helpers = self
            .container
            .helpers()
            .expect("basic encoder needs helper capability");
        self.engine.assume(-helpers.helper(k));

        let start = Instant::now();
        let result = self.engine.solve()?;
        let record = StageRecord {
            stage: k,
            outcome: match result {
                SolveResult::Unsat => ProbeOutcome::Unsat,
                SolveResult::Sat => ProbeOutcome::Sat,
                SolveResult::Interrupted => ProbeOutcome::Interrupted,
            },
            elapsed_secs: start.elapsed().as_secs_f64(),
            probes: 1,
        };
        self.sink.stage(&record);
        tracing::info!(stage = k, outcome = ?record.outcome, "basic stage probed");
        match result {
            SolveResult::Unsat => Ok(record),
            SolveResult::Sat => Err(Error::UnexpectedSat { stage: k }),
            SolveResult::Interrupted => Err(Error::Interrupted),
        }
    }

    /// Runs all stages to the terminal state `k = num_pigeons - 1`.
    pub fn run(&mut self) -> Result<Vec<StageRecord>> {
        let mut records = Vec::new();
        for k in 1..=self.cfg.num_holes() {
            self.add_stage(k)?;
            records.push(self.probe_stage(k)?);
        }
        Ok(records)
    }
}
