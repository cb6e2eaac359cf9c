//! Learned-clause evaluation decorator.
//!
//! Wraps an inner engine transparently and classifies every clause the engine
//! learns against the literals most recently assumed, to measure how well
//! assumption-driven search reuses prior work. Never alters the search
//! outcome; it only observes.

use crate::contract::{Engine, SolveResult};
use crate::metrics::{MetricsSink, NullSink};
use roost_base::{Lit, Result};
use serde::Serialize;
use std::collections::BTreeSet;

/// Length cap registered with the inner engine so the decorator sees the
/// learned stream regardless of what outer consumers request.
const INNER_LEARN_CAP: usize = 10_000;

/// Aggregate counters maintained by the decorator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvalCounters {
    /// Total clauses learned across all solves.
    pub num_learned_clauses: u64,
    /// Learned clauses sharing at least one literal with the negated
    /// assumption set of their solve.
    pub num_learned_clauses_with_assumed_literal: u64,
    /// Solve calls issued with a non-empty assumption set.
    pub num_solves_with_assumption: u64,
    /// Such calls where some learned clause equalled the assumption set.
    pub num_solves_with_assumption_found: u64,
    /// Such calls where some learned clause was a subset of the assumption set.
    pub num_solves_with_subset_assumption_found: u64,
}

/// Decorator intercepting the learned-clause stream of an inner engine.
pub struct LearnedClauseEval<E: Engine> {
    inner: E,
    /// Negations of the literals assumed since the last solve.
    assumed: BTreeSet<Lit>,
    /// Learned clauses of the last solve, re-exposed to outer consumers.
    pending: Vec<Vec<Lit>>,
    outer_cap: usize,
    counters: EvalCounters,
    sink: Box<dyn MetricsSink>,
}

impl<E: Engine> LearnedClauseEval<E> {
    /// Wraps `inner`, discarding metrics.
    pub fn new(inner: E) -> Self {
        Self::with_sink(inner, Box::new(NullSink))
    }

    /// Wraps `inner`, reporting counters to `sink` after every solve.
    pub fn with_sink(mut inner: E, sink: Box<dyn MetricsSink>) -> Self {
        inner.set_learn(INNER_LEARN_CAP);
        Self {
            inner,
            assumed: BTreeSet::new(),
            pending: Vec::new(),
            outer_cap: usize::MAX,
            counters: EvalCounters::default(),
            sink,
        }
    }

    /// Current counter values.
    pub fn counters(&self) -> &EvalCounters {
        &self.counters
    }

    /// The wrapped engine.
    pub fn inner(&self) -> &E {
        &self.inner
    }

    fn log_summary(&self) {
        let c = &self.counters;
        tracing::info!(
            num_learned_clauses = c.num_learned_clauses,
            num_learned_clauses_with_assumed_literal = c.num_learned_clauses_with_assumed_literal,
            num_solves_with_assumption = c.num_solves_with_assumption,
            num_solves_with_assumption_found = c.num_solves_with_assumption_found,
            num_solves_with_subset_assumption_found = c.num_solves_with_subset_assumption_found,
            "learned-clause evaluation"
        );
        if c.num_learned_clauses > 0 {
            tracing::info!(
                "useless clauses: {:.1}%",
                c.num_learned_clauses_with_assumed_literal as f64 / c.num_learned_clauses as f64
                    * 100.0
            );
        }
        if c.num_solves_with_assumption > 0 {
            tracing::info!(
                "assumption learned: {:.1}%",
                c.num_solves_with_assumption_found as f64 / c.num_solves_with_assumption as f64
                    * 100.0
            );
            tracing::info!(
                "subset of assumption learned: {:.1}%",
                c.num_solves_with_subset_assumption_found as f64
                    / c.num_solves_with_assumption as f64
                    * 100.0
            );
        }
    }
}

impl<E: Engine> Engine for LearnedClauseEval<E> {
    fn signature(&self) -> String {
        self.inner.signature()
    }

    fn add(&mut self, lit_or_zero: Lit) {
        self.inner.add(lit_or_zero);
    }

    fn assume(&mut self, lit: Lit) {
        self.inner.assume(lit);
        self.assumed.insert(-lit);
    }

    fn solve(&mut self) -> Result<SolveResult> {
        let result = self.inner.solve()?;
        let learned = self.inner.take_learned();

        let mut found_exact = false;
        let mut found_subset = false;
        for clause in &learned {
            self.counters.num_learned_clauses += 1;
            let literals: BTreeSet<Lit> = clause.iter().copied().collect();
            if literals.iter().any(|l| self.assumed.contains(l)) {
                self.counters.num_learned_clauses_with_assumed_literal += 1;
            }
            if !self.assumed.is_empty() {
                found_exact |= literals == self.assumed;
                found_subset |= literals.is_subset(&self.assumed);
            }
        }
        if !self.assumed.is_empty() {
            self.counters.num_solves_with_assumption += 1;
            if found_exact {
                self.counters.num_solves_with_assumption_found += 1;
            }
            if found_subset {
                self.counters.num_solves_with_subset_assumption_found += 1;
            }
        }

        self.assumed.clear();
        self.pending = learned;
        self.sink.eval(&self.counters);
        Ok(result)
    }

    fn val(&self, lit: Lit) -> bool {
        self.inner.val(lit)
    }

    fn failed(&self, lit: Lit) -> bool {
        self.inner.failed(lit)
    }

    fn set_learn(&mut self, max_length: usize) {
        // The inner cap stays fixed; this only filters what callers see.
        self.outer_cap = max_length;
    }

    fn take_learned(&mut self) -> Vec<Vec<Lit>> {
        let cap = self.outer_cap;
        std::mem::take(&mut self.pending)
            .into_iter()
            .filter(|c| c.len() <= cap)
            .collect()
    }

    fn set_terminate(&mut self, callback: Box<dyn FnMut() -> bool>) {
        self.inner.set_terminate(callback);
    }

    fn reset(&mut self) {
        self.inner.reset();
        self.inner.set_learn(INNER_LEARN_CAP);
        self.assumed.clear();
        self.pending.clear();
        self.counters = EvalCounters::default();
    }
}

impl<E: Engine> Drop for LearnedClauseEval<E> {
    fn drop(&mut self) {
        self.sink.eval(&self.counters);
        self.log_summary();
    }
}
