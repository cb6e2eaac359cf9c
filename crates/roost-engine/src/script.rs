//! Scripted engine for deterministic tests.
//!
//! Replays a canned sequence of solve outcomes while recording every clause
//! and assumption it is fed. Decorator and encoder tests use it to control
//! the learned-clause stream exactly.

use crate::contract::{Engine, SolveResult};
use roost_base::{Error, Lit, Result};

/// One scripted solve outcome.
#[derive(Debug, Clone)]
pub struct ScriptedSolve {
    /// Result to report.
    pub result: SolveResult,
    /// Clauses to expose through the learned stream for this solve.
    pub learned: Vec<Vec<Lit>>,
    /// Assumed literals to report as failed after this solve.
    pub failed: Vec<Lit>,
    /// Model literals to report true after this solve.
    pub model: Vec<Lit>,
}

impl ScriptedSolve {
    /// A plain UNSAT outcome with nothing learned.
    pub fn unsat() -> Self {
        Self {
            result: SolveResult::Unsat,
            learned: Vec::new(),
            failed: Vec::new(),
            model: Vec::new(),
        }
    }

    /// A plain SAT outcome.
    pub fn sat() -> Self {
        Self {
            result: SolveResult::Sat,
            learned: Vec::new(),
            failed: Vec::new(),
            model: Vec::new(),
        }
    }

    /// Attaches learned clauses to the outcome.
    pub fn with_learned(mut self, learned: Vec<Vec<Lit>>) -> Self {
        self.learned = learned;
        self
    }

    /// Attaches a failed-assumption set to the outcome.
    pub fn with_failed(mut self, failed: Vec<Lit>) -> Self {
        self.failed = failed;
        self
    }
}

/// Engine stub replaying a script.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    script: std::collections::VecDeque<ScriptedSolve>,
    /// Every committed clause, in add order.
    pub clauses: Vec<Vec<Lit>>,
    /// Assumption sets per solve call, in call order.
    pub assumption_log: Vec<Vec<Lit>>,
    adding: Vec<Lit>,
    assumptions: Vec<Lit>,
    learn_cap: usize,
    current: Option<ScriptedSolve>,
}

impl ScriptedEngine {
    /// Creates an engine that replays `script` in order.
    pub fn new<I: IntoIterator<Item = ScriptedSolve>>(script: I) -> Self {
        Self {
            script: script.into_iter().collect(),
            learn_cap: usize::MAX,
            ..Self::default()
        }
    }

    /// Number of solve calls made so far.
    pub fn num_solves(&self) -> usize {
        self.assumption_log.len()
    }
}

impl Engine for ScriptedEngine {
    fn signature(&self) -> String {
        "roost-scripted".to_string()
    }

    fn add(&mut self, lit_or_zero: Lit) {
        if lit_or_zero == 0 {
            let clause = std::mem::take(&mut self.adding);
            self.clauses.push(clause);
        } else {
            self.adding.push(lit_or_zero);
        }
    }

    fn assume(&mut self, lit: Lit) {
        self.assumptions.push(lit);
    }

    fn solve(&mut self) -> Result<SolveResult> {
        self.assumption_log
            .push(std::mem::take(&mut self.assumptions));
        let step = self
            .script
            .pop_front()
            .ok_or_else(|| Error::Engine("scripted engine ran out of script".into()))?;
        let result = step.result;
        self.current = Some(step);
        Ok(result)
    }

    fn val(&self, lit: Lit) -> bool {
        self.current
            .as_ref()
            .is_some_and(|s| s.model.contains(&lit))
    }

    fn failed(&self, lit: Lit) -> bool {
        self.current
            .as_ref()
            .is_some_and(|s| s.failed.contains(&lit))
    }

    fn set_learn(&mut self, max_length: usize) {
        self.learn_cap = max_length;
    }

    fn take_learned(&mut self) -> Vec<Vec<Lit>> {
        let cap = self.learn_cap;
        match &mut self.current {
            Some(step) => std::mem::take(&mut step.learned)
                .into_iter()
                .filter(|c| c.len() <= cap)
                .collect(),
            None => Vec::new(),
        }
    }

    fn set_terminate(&mut self, _callback: Box<dyn FnMut() -> bool>) {}

    fn reset(&mut self) {
        let script = std::mem::take(&mut self.script);
        *self = Self {
            script,
            learn_cap: usize::MAX,
            ..Self::default()
        };
    }
}
