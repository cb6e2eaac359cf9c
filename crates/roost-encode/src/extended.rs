//! Extended-resolution chain encoder.
//!
//! Extends the connector-chain formulation with an auxiliary reduction
//! family: for decreasing layer counts `l = num_pigeons .. 3`, four Tseitin
//! clauses per `(layer, pigeon, hole)` triple define `r_{l-1}(p, h)` as
//! `r_l(p, h) ∨ (r_l(p, l-2) ∧ r_l(l-1, h))`, the sub-assignment with the
//! last pigeon and hole of layer `l` eliminated. `r_n` is the pigeon-in-hole
//! family itself.
//!
//! After asserting the full clause set, a learning phase re-derives the
//! pigeonhole facts layer by layer under assumption-scoped probes,
//! materializing each proved fact. For the at-most-one family the encoder
//! additionally verifies that the engine's learned-clause stream reproduces
//! the failed-assumption core it reports for the probe. A probe refuted
//! without any failed assumption carries no assumption-scoped certificate
//! and passes vacuously.

use crate::config::EncoderConfig;
use roost_base::{Compose, ConnectorMap, PigeonHoleMap, ReductionMap};
use roost_base::{Error, Lit, Result, VarAllocator, VarContainer};
use roost_engine::{Engine, MetricsSink, NullSink, ProbeOutcome, SolveResult, StageRecord};
use std::time::Instant;

/// Learned-clause length cap: the expected certificates are binary.
const LEARN_CAP: usize = 2;

/// Allocates the container assembly the extended-resolution encoder needs.
pub fn container(
    cfg: &EncoderConfig,
    alloc: &mut VarAllocator,
) -> Result<Compose<Compose<PigeonHoleMap, ConnectorMap>, ReductionMap>> {
    let pigeon_holes = PigeonHoleMap::new(alloc, cfg.num_pigeons, cfg.num_holes())?;
    let connectors = ConnectorMap::new(alloc, cfg.num_pigeons, cfg.num_pigeons)?;
    let reductions = ReductionMap::new(alloc, cfg.num_pigeons)?;
    Ok(Compose::new(
        Compose::new(pigeon_holes, connectors),
        reductions,
    ))
}

/// The extended-resolution encoder.
pub struct ExtendedResolutionEncoder<C: VarContainer, E: Engine> {
    cfg: EncoderConfig,
    container: C,
    engine: E,
    encoded: bool,
    sink: Box<dyn MetricsSink>,
}

impl<C: VarContainer, E: Engine> ExtendedResolutionEncoder<C, E> {
    /// Creates the encoder over a container exposing pigeon/hole, connector
    /// and reduction capabilities.
    pub fn new(cfg: &EncoderConfig, container: C, engine: E) -> Self {
        Self {
            cfg: cfg.clone(),
            container,
            engine,
            encoded: false,
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

    /// Asserts the full clause set: chain borders (the top border is always
    /// hard here), transitions, at-most-one clauses, and all layer-reduction
    /// definitions.
    pub fn encode(&mut self) -> Result<()> {
        if self.encoded {
            return Err(Error::StageOrder {
                requested: 0,
                expected: 1,
            });
        }
        let n = self.cfg.num_pigeons;
        let pigeon_holes = self
            .container
            .pigeon_holes()
            .expect("extended-resolution encoder needs pigeon/hole capability");
        let connectors = self
            .container
            .connectors()
            .expect("extended-resolution encoder needs connector capability");
        let reductions = self
            .container
            .reductions()
            .expect("extended-resolution encoder needs reduction capability");
        let rv = |layer: u32, p: u32, h: u32| -> Lit {
            if layer == n {
                pigeon_holes.pigeon_in_hole(p, h)
            } else {
                reductions.reduction(layer, p, h)
            }
        };

        self.engine.set_learn(LEARN_CAP);

        for p in 0..n {
            self.engine.add_clause([connectors.connector(p, 0)]);
            self.engine.add_clause([-connectors.connector(p, n - 1)]);
        }
        for h in 0..n - 1 {
            for p in 0..n {
                self.engine.add_clause([
                    -connectors.connector(p, h),
                    pigeon_holes.pigeon_in_hole(p, h),
                    connectors.connector(p, h + 1),
                ]);
            }
            for p in 0..n {
                for q in 0..p {
                    self.engine.add_clause([
                        -pigeon_holes.pigeon_in_hole(p, h),
                        -pigeon_holes.pigeon_in_hole(q, h),
                    ]);
                }
            }
        }

        // Layer reductions, eliminating the last pigeon and hole of each
        // layer: r_{l-1}(p,h) ↔ r_l(p,h) ∨ (r_l(p,l-2) ∧ r_l(l-1,h)).
        for layer in (3..=n).rev() {
            for p in 0..layer - 1 {
                for h in 0..layer.saturating_sub(2) {
                    let v = rv(layer - 1, p, h);
                    let a = rv(layer, p, h);
                    let b = rv(layer, p, layer - 2);
                    let c = rv(layer, layer - 1, h);
                    self.engine.add_clause([-a, v]);
                    self.engine.add_clause([-b, -c, v]);
                    self.engine.add_clause([-v, a, b]);
                    self.engine.add_clause([-v, a, c]);
                }
            }
        }
        tracing::debug!(pigeons = n, "extended-resolution formula encoded");
        self.encoded = true;
        Ok(())
    }

    /// Checks the learned stream of the last solve for the exact clause.
    fn stream_contains(&mut self, expected: &[Lit]) -> bool {
        let mut expected = expected.to_vec();
        expected.sort_unstable();
        self.engine.take_learned().iter().any(|clause| {
            let mut clause = clause.clone();
            clause.sort_unstable();
            clause == expected
        })
    }

    /// Re-derives the pigeonhole facts of `layer`, materializing each proved
    /// clause. At-most-one derivations are checked against the learned
    /// stream when certificate verification is enabled.
    fn learn_layer(&mut self, layer: u32, step: u32) -> Result<StageRecord> {
        let start = Instant::now();
        let mut probes = 0;

        // Literal grid of this layer, indexed [hole][pigeon]. Learning only
        // ever runs on reduction layers; the top layer is the original
        // pigeon/hole grid and needs no re-derivation.
        let grid: Vec<Vec<Lit>> = {
            let reductions = self
                .container
                .reductions()
                .expect("extended-resolution encoder needs reduction capability");
            (0..layer - 1)
                .map(|h| {
                    (0..layer)
                        .map(|p| reductions.reduction(layer, p, h))
                        .collect()
                })
                .collect()
        };

        // At-most-one pigeon per hole at this layer.
        for row in &grid {
            for (i, &a) in row.iter().enumerate() {
                for &b in &row[..i] {
                    self.engine.assume(a);
                    self.engine.assume(b);
                    probes += 1;
                    match self.engine.solve()? {
                        SolveResult::Unsat => {}
                        SolveResult::Sat => {
                            self.emit_record(step, ProbeOutcome::Sat, start, probes);
                            return Err(Error::UnexpectedSat { stage: step });
                        }
                        SolveResult::Interrupted => {
                            self.emit_record(step, ProbeOutcome::Interrupted, start, probes);
                            return Err(Error::Interrupted);
                        }
                    }
                    if self.cfg.verify_certificates {
                        let core: Vec<Lit> = [a, b]
                            .into_iter()
                            .filter(|&l| self.engine.failed(l))
                            .map(|l| -l)
                            .collect();
                        if !core.is_empty() && !self.stream_contains(&core) {
                            self.emit_record(step, ProbeOutcome::Unsat, start, probes);
                            return Err(Error::CertificateMismatch {
                                layer,
                                expected: core,
                            });
                        }
                    }
                    self.engine.add_clause([-a, -b]);
                }
            }
        }

        // At least one hole per pigeon at this layer.
        for p in 0..layer as usize {
            let row: Vec<Lit> = grid.iter().map(|hole| hole[p]).collect();
            for &lit in &row {
                self.engine.assume(-lit);
            }
            probes += 1;
            match self.engine.solve()? {
                SolveResult::Unsat => {}
                SolveResult::Sat => {
                    self.emit_record(step, ProbeOutcome::Sat, start, probes);
                    return Err(Error::UnexpectedSat { stage: step });
                }
                SolveResult::Interrupted => {
                    self.emit_record(step, ProbeOutcome::Interrupted, start, probes);
                    return Err(Error::Interrupted);
                }
            }
            self.engine.add_clause(row);
        }

        Ok(self.emit_record(step, ProbeOutcome::Unsat, start, probes))
    }

    fn emit_record(
        &mut self,
        step: u32,
        outcome: ProbeOutcome,
        start: Instant,
        probes: u32,
    ) -> StageRecord {
        let record = StageRecord {
            stage: step,
            outcome,
            elapsed_secs: start.elapsed().as_secs_f64(),
            probes,
        };
        self.sink.stage(&record);
        tracing::info!(step, outcome = ?outcome, probes, "extended-resolution step");
        record
    }

    /// Encodes the formula and runs the full learning phase, finishing with
    /// a plain solve that must certify unsatisfiability outright.
    pub fn run(&mut self) -> Result<Vec<StageRecord>> {
        self.encode()?;
        let n = self.cfg.num_pigeons;
        let mut records = Vec::new();
        let mut step = 1;
        for layer in (2..n).rev() {
            records.push(self.learn_layer(layer, step)?);
            step += 1;
        }

        let start = Instant::now();
        match self.engine.solve()? {
            SolveResult::Unsat => {
                records.push(self.emit_record(step, ProbeOutcome::Unsat, start, 1));
                Ok(records)
            }
            SolveResult::Sat => {
                self.emit_record(step, ProbeOutcome::Sat, start, 1);
                Err(Error::UnexpectedSat { stage: step })
            }
            SolveResult::Interrupted => {
                self.emit_record(step, ProbeOutcome::Interrupted, start, 1);
                Err(Error::Interrupted)
            }
        }
    }
}
