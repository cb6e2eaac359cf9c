//! Reference CDCL engine.
//!
//! A compact, deterministic conflict-driven engine implementing the
//! [`Engine`](crate::Engine) contract: two-watched-literal propagation,
//! first-UIP learning, activity-based decisions with phase saving, geometric
//! restarts, and minisat-style assumption handling where assumptions occupy
//! the leading decision levels. When an assumption turns out false, a final
//! conflict analysis produces the failed-assumption core; the core clause is
//! recorded into the learned stream alongside regular first-UIP clauses.
//!
//! Engine state is incremental: clauses and root-level assignments persist
//! across solve calls and are never retracted.

use crate::contract::{Engine, SolveResult};
use roost_base::{Lit, Result};

const ACTIVITY_DECAY: f64 = 1.0 / 0.95;
const ACTIVITY_RESCALE: f64 = 1e100;
const TERMINATE_POLL_INTERVAL: u32 = 128;

/// Watch-list slot for a literal: positive and negative phases interleave.
fn watch_slot(lit: Lit) -> usize {
    let v = lit.unsigned_abs() as usize;
    2 * v + usize::from(lit < 0)
}

/// Running search statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineStats {
    /// Decisions made across all solves.
    pub decisions: u64,
    /// Conflicts encountered across all solves.
    pub conflicts: u64,
    /// Restarts performed across all solves.
    pub restarts: u64,
    /// Clauses learned across all solves.
    pub learned: u64,
}

/// The reference CDCL engine.
pub struct CdclEngine {
    ok: bool,
    num_vars: usize,
    clauses: Vec<Vec<Lit>>,
    watches: Vec<Vec<usize>>,
    /// Assignment per variable: 0 unassigned, 1 true, -1 false.
    assign: Vec<i8>,
    level: Vec<u32>,
    reason: Vec<Option<usize>>,
    trail: Vec<Lit>,
    trail_lim: Vec<usize>,
    qhead: usize,
    activity: Vec<f64>,
    var_inc: f64,
    phase: Vec<bool>,
    seen: Vec<bool>,
    /// Literal buffer for the clause under construction.
    adding: Vec<Lit>,
    assumptions: Vec<Lit>,
    learn_cap: usize,
    learned_log: Vec<Vec<Lit>>,
    terminate: Option<Box<dyn FnMut() -> bool>>,
    model: Vec<i8>,
    /// Clause over the failed assumptions' negations, set after Unsat.
    conflict_core: Vec<Lit>,
    stats: EngineStats,
}

impl CdclEngine {
    /// Creates an empty engine.
    pub fn new() -> Self {
        Self {
            ok: true,
            num_vars: 0,
            clauses: Vec::new(),
            watches: vec![Vec::new(); 2],
            assign: vec![0],
            level: vec![0],
            reason: vec![None],
            trail: Vec::new(),
            trail_lim: Vec::new(),
            qhead: 0,
            activity: vec![0.0],
            var_inc: 1.0,
            phase: vec![false],
            seen: vec![false],
            adding: Vec::new(),
            assumptions: Vec::new(),
            learn_cap: 0,
            learned_log: Vec::new(),
            terminate: None,
            model: Vec::new(),
            conflict_core: Vec::new(),
            stats: EngineStats::default(),
        }
    }

    /// Search statistics accumulated so far.
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    fn ensure_var(&mut self, lit: Lit) {
        let v = lit.unsigned_abs() as usize;
        if v >= self.assign.len() {
            self.assign.resize(v + 1, 0);
            self.level.resize(v + 1, 0);
            self.reason.resize(v + 1, None);
            self.activity.resize(v + 1, 0.0);
            self.phase.resize(v + 1, false);
            self.seen.resize(v + 1, false);
            self.watches.resize(2 * v + 2, Vec::new());
        }
        self.num_vars = self.num_vars.max(v);
    }

    fn value(&self, lit: Lit) -> i8 {
        let v = lit.unsigned_abs() as usize;
        if lit > 0 {
            self.assign[v]
        } else {
            -self.assign[v]
        }
    }

    fn decision_level(&self) -> usize {
        self.trail_lim.len()
    }

    fn unchecked_enqueue(&mut self, lit: Lit, reason: Option<usize>) {
        debug_assert_eq!(self.value(lit), 0);
        let v = lit.unsigned_abs() as usize;
        self.assign[v] = if lit > 0 { 1 } else { -1 };
        self.level[v] = self.decision_level() as u32;
        self.reason[v] = reason;
        self.phase[v] = lit > 0;
        self.trail.push(lit);
    }

    fn cancel_until(&mut self, target: usize) {
        if self.decision_level() <= target {
            return;
        }
        let bound = self.trail_lim[target];
        for i in (bound..self.trail.len()).rev() {
            let v = self.trail[i].unsigned_abs() as usize;
            self.assign[v] = 0;
            self.reason[v] = None;
        }
        self.trail.truncate(bound);
        self.trail_lim.truncate(target);
        self.qhead = self.trail.len();
    }

    /// Finishes the clause in `adding`, simplifying against the root level.
    fn commit_clause(&mut self) {
        let mut clause = std::mem::take(&mut self.adding);
        if !self.ok {
            return;
        }
        debug_assert_eq!(self.decision_level(), 0);

        clause.sort_unstable_by_key(|l| (l.unsigned_abs(), *l < 0));
        clause.dedup();
        let tautology = clause.windows(2).any(|w| w[0] == -w[1]);
        let satisfied = tautology || clause.iter().any(|&l| self.value(l) == 1);
        if satisfied {
            return;
        }
        clause.retain(|&l| self.value(l) != -1);
        match clause.len() {
            0 => self.ok = false,
            1 => self.unchecked_enqueue(clause[0], None),
            _ => {
                let ci = self.clauses.len();
                self.watches[watch_slot(clause[0])].push(ci);
                self.watches[watch_slot(clause[1])].push(ci);
                self.clauses.push(clause);
            }
        }
    }

    fn propagate(&mut self) -> Option<usize> {
        while self.qhead < self.trail.len() {
            let p = self.trail[self.qhead];
            self.qhead += 1;
            let falsified = -p;
            let slot = watch_slot(falsified);
            let ws = std::mem::take(&mut self.watches[slot]);
            let mut kept = Vec::with_capacity(ws.len());
            let mut iter = ws.into_iter();
            while let Some(ci) = iter.next() {
                if self.clauses[ci][0] == falsified {
                    self.clauses[ci].swap(0, 1);
                }
                debug_assert_eq!(self.clauses[ci][1], falsified);
                let first = self.clauses[ci][0];
                if self.value(first) == 1 {
                    kept.push(ci);
                    continue;
                }
                let mut moved = false;
                for k in 2..self.clauses[ci].len() {
                    let lk = self.clauses[ci][k];
                    if self.value(lk) != -1 {
                        self.clauses[ci].swap(1, k);
                        self.watches[watch_slot(lk)].push(ci);
                        moved = true;
                        break;
                    }
                }
                if moved {
                    continue;
                }
                kept.push(ci);
                if self.value(first) == -1 {
                    kept.extend(iter);
                    self.watches[slot] = kept;
                    self.qhead = self.trail.len();
                    return Some(ci);
                }
                self.unchecked_enqueue(first, Some(ci));
            }
            self.watches[slot] = kept;
        }
        None
    }

    fn bump(&mut self, v: usize) {
        self.activity[v] += self.var_inc;
        if self.activity[v] > ACTIVITY_RESCALE {
            for a in &mut self.activity {
                *a /= ACTIVITY_RESCALE;
            }
            self.var_inc /= ACTIVITY_RESCALE;
        }
    }

    /// First-UIP conflict analysis. Returns the learned clause (asserting
    /// literal first, second watcher second) and the backjump level.
    fn analyze(&mut self, mut confl: usize) -> (Vec<Lit>, usize) {
        let current = self.decision_level() as u32;
        let mut learnt: Vec<Lit> = vec![0];
        let mut open = 0usize;
        let mut resolved: Option<Lit> = None;
        let mut idx = self.trail.len();

        loop {
            for i in 0..self.clauses[confl].len() {
                let q = self.clauses[confl][i];
                if Some(q) == resolved {
                    continue;
                }
                let v = q.unsigned_abs() as usize;
                if !self.seen[v] && self.level[v] > 0 {
                    self.seen[v] = true;
                    self.bump(v);
                    if self.level[v] >= current {
                        open += 1;
                    } else {
                        learnt.push(q);
                    }
                }
            }

            loop {
                idx -= 1;
                if self.seen[self.trail[idx].unsigned_abs() as usize] {
                    break;
                }
            }
            let pl = self.trail[idx];
            let v = pl.unsigned_abs() as usize;
            self.seen[v] = false;
            open -= 1;
            if open == 0 {
                learnt[0] = -pl;
                break;
            }
            confl = self.reason[v].expect("resolved literal must be propagated");
            resolved = Some(pl);
        }

        for i in 1..learnt.len() {
            self.seen[learnt[i].unsigned_abs() as usize] = false;
        }

        let backjump = if learnt.len() == 1 {
            0
        } else {
            let mut deepest = 1;
            for i in 2..learnt.len() {
                if self.level[learnt[i].unsigned_abs() as usize]
                    > self.level[learnt[deepest].unsigned_abs() as usize]
                {
                    deepest = i;
                }
            }
            learnt.swap(1, deepest);
            self.level[learnt[1].unsigned_abs() as usize] as usize
        };
        (learnt, backjump)
    }

    /// Attaches a learned clause and asserts its first literal. The caller
    /// must already have backjumped to the clause's assertion level.
    fn attach_learnt(&mut self, learnt: Vec<Lit>) {
        self.stats.learned += 1;
        if learnt.len() == 1 {
            debug_assert_eq!(self.decision_level(), 0);
            self.unchecked_enqueue(learnt[0], None);
        } else {
            let ci = self.clauses.len();
            self.watches[watch_slot(learnt[0])].push(ci);
            self.watches[watch_slot(learnt[1])].push(ci);
            let asserting = learnt[0];
            self.clauses.push(learnt);
            self.unchecked_enqueue(asserting, Some(ci));
        }
    }

    /// Computes the failed-assumption core after assumption `p` was found
    /// false, walking reasons back to assumption decisions.
    fn analyze_final(&mut self, p: Lit) {
        self.conflict_core.clear();
        self.conflict_core.push(-p);
        if self.decision_level() > 0 {
            let pv = p.unsigned_abs() as usize;
            self.seen[pv] = true;
            for i in (self.trail_lim[0]..self.trail.len()).rev() {
                let lit = self.trail[i];
                let v = lit.unsigned_abs() as usize;
                if !self.seen[v] {
                    continue;
                }
                match self.reason[v] {
                    None => self.conflict_core.push(-lit),
                    Some(ci) => {
                        for k in 0..self.clauses[ci].len() {
                            let q = self.clauses[ci][k];
                            let qv = q.unsigned_abs() as usize;
                            if q != lit && self.level[qv] > 0 {
                                self.seen[qv] = true;
                            }
                        }
                    }
                }
                self.seen[v] = false;
            }
            self.seen[pv] = false;
        }
        let core = self.conflict_core.clone();
        self.record_learned(&core);
    }

    fn record_learned(&mut self, clause: &[Lit]) {
        if self.learn_cap > 0 && clause.len() <= self.learn_cap {
            self.learned_log.push(clause.to_vec());
        }
    }

    fn pick_branch(&mut self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for v in 1..=self.num_vars {
            if self.assign[v] != 0 {
                continue;
            }
            match best {
                Some(b) if self.activity[v] <= self.activity[b] => {}
                _ => best = Some(v),
            }
        }
        best
    }

    fn poll_terminate(&mut self) -> bool {
        match &mut self.terminate {
            Some(cb) => cb(),
            None => false,
        }
    }
}

impl Default for CdclEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for CdclEngine {
    fn signature(&self) -> String {
        format!("roost-cdcl-{}", env!("CARGO_PKG_VERSION"))
    }

    fn add(&mut self, lit_or_zero: Lit) {
        if lit_or_zero == 0 {
            self.commit_clause();
        } else {
            self.ensure_var(lit_or_zero);
            self.adding.push(lit_or_zero);
        }
    }

    fn assume(&mut self, lit: Lit) {
        debug_assert!(lit != 0);
        self.ensure_var(lit);
        self.assumptions.push(lit);
    }

    fn solve(&mut self) -> Result<SolveResult> {
        let assumptions = std::mem::take(&mut self.assumptions);
        self.learned_log.clear();
        self.conflict_core.clear();
        self.model.clear();

        if !self.ok {
            return Ok(SolveResult::Unsat);
        }

        let mut conflicts_since_restart: u64 = 0;
        let mut restart_limit: u64 = 100;
        let mut since_poll: u32 = 0;

        loop {
            if let Some(confl) = self.propagate() {
                self.stats.conflicts += 1;
                conflicts_since_restart += 1;
                if self.decision_level() == 0 {
                    // refuted outright; permanent for this engine instance
                    self.ok = false;
                    return Ok(SolveResult::Unsat);
                }
                let (learnt, backjump) = self.analyze(confl);
                self.record_learned(&learnt);
                self.cancel_until(backjump);
                self.attach_learnt(learnt);
                self.var_inc *= ACTIVITY_DECAY;
            } else {
                since_poll += 1;
                if since_poll >= TERMINATE_POLL_INTERVAL {
                    since_poll = 0;
                    if self.poll_terminate() {
                        self.cancel_until(0);
                        return Ok(SolveResult::Interrupted);
                    }
                }
                if conflicts_since_restart >= restart_limit {
                    conflicts_since_restart = 0;
                    restart_limit = restart_limit.saturating_mul(2);
                    self.stats.restarts += 1;
                    self.cancel_until(0);
                    continue;
                }
                let dl = self.decision_level();
                if dl < assumptions.len() {
                    let p = assumptions[dl];
                    match self.value(p) {
                        1 => self.trail_lim.push(self.trail.len()),
                        -1 => {
                            self.analyze_final(p);
                            self.cancel_until(0);
                            return Ok(SolveResult::Unsat);
                        }
                        _ => {
                            self.trail_lim.push(self.trail.len());
                            self.unchecked_enqueue(p, None);
                        }
                    }
                } else if let Some(v) = self.pick_branch() {
                    self.stats.decisions += 1;
                    self.trail_lim.push(self.trail.len());
                    let lit = if self.phase[v] { v as Lit } else { -(v as Lit) };
                    self.unchecked_enqueue(lit, None);
                } else {
                    self.model = self.assign.clone();
                    self.cancel_until(0);
                    tracing::debug!(
                        conflicts = self.stats.conflicts,
                        decisions = self.stats.decisions,
                        "solve finished SAT"
                    );
                    return Ok(SolveResult::Sat);
                }
            }
        }
    }

    fn val(&self, lit: Lit) -> bool {
        let v = lit.unsigned_abs() as usize;
        if v >= self.model.len() {
            return false;
        }
        if lit > 0 {
            self.model[v] == 1
        } else {
            self.model[v] == -1
        }
    }

    fn failed(&self, lit: Lit) -> bool {
        self.conflict_core.contains(&-lit)
    }

    fn set_learn(&mut self, max_length: usize) {
        self.learn_cap = max_length;
    }

    fn take_learned(&mut self) -> Vec<Vec<Lit>> {
        std::mem::take(&mut self.learned_log)
    }

    fn set_terminate(&mut self, callback: Box<dyn FnMut() -> bool>) {
        self.terminate = Some(callback);
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}
