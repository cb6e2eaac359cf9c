//! 3-literal connector-chain encoder.
//!
//! Each pigeon carries a unary chain over the holes: `connector(p, d)` means
//! the chain is still open entering depth `d`, i.e. the pigeon has not been
//! placed in holes `0 .. d`. The chain starts open (`connector(p, 0)` is a
//! unit) and is optionally forced closed at the top. Stage `h` adds, per
//! pigeon, the transition clause
//! `¬connector(p,h) ∨ pigeon_in_hole(p,h) ∨ connector(p,h+1)` together with
//! the pairwise at-most-one clauses on hole `h`.
//!
//! The default probe at depth `d = h + 1` forces every chain closed by
//! assumption and requires unsatisfiability. The alternate policy probes
//! every pigeon subset large enough to overfill the open holes, optionally
//! materializing each proven subset clause permanently.

use crate::config::EncoderConfig;
use itertools::Itertools;
use roost_base::{Compose, ConnectorMap, PigeonHoleMap};
use roost_base::{Error, Result, VarAllocator, VarContainer};
use roost_engine::{Engine, MetricsSink, NullSink, ProbeOutcome, SolveResult, StageRecord};
use std::time::Instant;

/// Allocates the container assembly the chain encoder needs.
pub fn container(
    cfg: &EncoderConfig,
    alloc: &mut VarAllocator,
) -> Result<Compose<PigeonHoleMap, ConnectorMap>> {
    let pigeon_holes = PigeonHoleMap::new(alloc, cfg.num_pigeons, cfg.num_holes())?;
    let connectors = ConnectorMap::new(alloc, cfg.num_pigeons, cfg.num_pigeons)?;
    Ok(Compose::new(pigeon_holes, connectors))
}

/// The connector-chain encoder state machine.
pub struct ChainEncoder<C: VarContainer, E: Engine> {
    cfg: EncoderConfig,
    container: C,
    engine: E,
    next_hole: u32,
    borders_added: bool,
    sink: Box<dyn MetricsSink>,
}

impl<C: VarContainer, E: Engine> ChainEncoder<C, E> {
    /// Creates the encoder over a container exposing pigeon/hole and
    /// connector capabilities.
    pub fn new(cfg: &EncoderConfig, container: C, engine: E) -> Self {
        Self {
            cfg: cfg.clone(),
            container,
            engine,
            next_hole: 0,
            borders_added: false,
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

    fn add_borders(&mut self) {
        let connectors = self
            .container
            .connectors()
            .expect("chain encoder needs connector capability");
        for p in 0..self.cfg.num_pigeons {
            self.engine.add_clause([connectors.connector(p, 0)]);
        }
        if self.cfg.close_chain_top {
            let top = self.cfg.num_pigeons - 1;
            for p in 0..self.cfg.num_pigeons {
                self.engine.add_clause([-connectors.connector(p, top)]);
            }
        }
        self.borders_added = true;
    }

    /// Adds the transition and at-most-one clauses for hole `h`. Holes must
    /// be added in increasing order, each exactly once.
    pub fn add_stage(&mut self, h: u32) -> Result<()> {
        if h != self.next_hole || h >= self.cfg.num_holes() {
            return Err(Error::StageOrder {
                requested: h,
                expected: self.next_hole,
            });
        }
        if !self.borders_added {
            self.add_borders();
        }
        let pigeon_holes = self
            .container
            .pigeon_holes()
            .expect("chain encoder needs pigeon/hole capability");
        let connectors = self
            .container
            .connectors()
            .expect("chain encoder needs connector capability");

        for p in 0..self.cfg.num_pigeons {
            self.engine.add_clause([
                -connectors.connector(p, h),
                pigeon_holes.pigeon_in_hole(p, h),
                connectors.connector(p, h + 1),
            ]);
        }
        for p in 0..self.cfg.num_pigeons {
            for q in 0..p {
                self.engine.add_clause([
                    -pigeon_holes.pigeon_in_hole(p, h),
                    -pigeon_holes.pigeon_in_hole(q, h),
                ]);
            }
        }
        tracing::debug!(hole = h, "chain stage encoded");
        self.next_hole += 1;
        Ok(())
    }

    /// Issues one probe: assumes the chains of `pigeons` closed at `depth`
    /// and requires unsatisfiability.
    fn probe_subset(&mut self, depth: u32, pigeons: &[u32]) -> Result<()> {
        let connectors = self
            .container
            .connectors()
            .expect("chain encoder needs connector capability");
        for &p in pigeons {
            self.engine.assume(-connectors.connector(p, depth));
        }
        match self.engine.solve()? {
            SolveResult::Unsat => {}
            SolveResult::Sat => return Err(Error::UnexpectedSat { stage: depth }),
            SolveResult::Interrupted => return Err(Error::Interrupted),
        }
        if self.cfg.materialize_proved {
            self.engine
                .add_clause(pigeons.iter().map(|&p| connectors.connector(p, depth)));
        }
        Ok(())
    }

    /// Probes stage `h` at chain depth `h + 1`.
    pub fn probe_stage(&mut self, h: u32) -> Result<StageRecord> {
        if h + 1 != self.next_hole {
            return Err(Error::StageOrder {
                requested: h,
                expected: self.next_hole,
            });
        }
        let n = self.cfg.num_pigeons;
        let depth = h + 1;
        let start = Instant::now();
        let mut probes = 0;

        let outcome = if self.cfg.subset_probes {
            // Every non-empty subset large enough to overfill `depth` holes,
            // largest first.
            let mut failure = None;
            'sizes: for size in (depth + 1..=n).rev() {
                for subset in (0..n).combinations(size as usize) {
                    probes += 1;
                    if let Err(err) = self.probe_subset(depth, &subset) {
                        failure = Some(err);
                        break 'sizes;
                    }
                }
            }
            match failure {
                None => Ok(()),
                Some(err) => Err(err),
            }
        } else {
            probes = 1;
            let all: Vec<u32> = (0..n).collect();
            self.probe_subset(depth, &all)
        };

        let record = StageRecord {
            stage: h,
            outcome: match &outcome {
                Ok(()) => ProbeOutcome::Unsat,
                Err(Error::UnexpectedSat { .. }) => ProbeOutcome::Sat,
                Err(_) => ProbeOutcome::Interrupted,
            },
            elapsed_secs: start.elapsed().as_secs_f64(),
            probes,
        };
        self.sink.stage(&record);
        tracing::info!(hole = h, outcome = ?record.outcome, probes, "chain stage probed");
        outcome.map(|()| record)
    }

    /// Runs all stages to the final chain depth.
    pub fn run(&mut self) -> Result<Vec<StageRecord>> {
        let mut records = Vec::new();
        for h in 0..self.cfg.num_holes() {
            self.add_stage(h)?;
            records.push(self.probe_stage(h)?);
        }
        Ok(records)
    }
}
