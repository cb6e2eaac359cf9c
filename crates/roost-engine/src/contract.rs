//! The incremental search-engine call contract.
//!
//! Every operation is a blocking call/return; the core never issues
//! overlapping calls into one engine instance. Clauses and assumptions are
//! delivered in the exact order the encoder issues them; assumptions apply
//! only to the next [`Engine::solve`] and are discarded once it returns,
//! regardless of outcome.

use roost_base::{Lit, Result};

/// Outcome of a single satisfiability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveResult {
    /// A satisfying assignment was found; [`Engine::val`] is valid.
    Sat,
    /// The formula is unsatisfiable under the staged assumptions;
    /// [`Engine::failed`] is valid.
    Unsat,
    /// The termination predicate cancelled the search.
    Interrupted,
}

/// The call contract into an incremental satisfiability search engine.
///
/// The formula only ever grows: once a clause is added it is permanent for
/// the lifetime of the engine instance, and the only undo mechanism is
/// assumption scoping. The learned-clause callback of the classic interface
/// is replaced by a per-solve stream drained through [`Engine::take_learned`].
pub trait Engine {
    /// A human-readable engine identifier.
    fn signature(&self) -> String;

    /// Appends a literal to the clause under construction, or terminates the
    /// clause on 0.
    fn add(&mut self, lit_or_zero: Lit);

    /// Stages a unit assumption for the next solve only.
    fn assume(&mut self, lit: Lit);

    /// Runs the search under the staged assumptions.
    fn solve(&mut self) -> Result<SolveResult>;

    /// Truth value of `lit` in the model. Valid only after [`SolveResult::Sat`].
    fn val(&self, lit: Lit) -> bool;

    /// Whether the assumed literal `lit` was in the unsatisfiable core.
    /// Valid only after [`SolveResult::Unsat`].
    fn failed(&self, lit: Lit) -> bool;

    /// Caps the length of clauses recorded into the learned stream.
    fn set_learn(&mut self, max_length: usize);

    /// Drains the clauses learned during the most recent solve.
    fn take_learned(&mut self) -> Vec<Vec<Lit>>;

    /// Registers a predicate the engine polls to request early termination.
    fn set_terminate(&mut self, callback: Box<dyn FnMut() -> bool>);

    /// Discards all engine state.
    fn reset(&mut self);

    /// Adds a whole clause: its literals in order, then the terminator.
    fn add_clause<I>(&mut self, lits: I)
    where
        I: IntoIterator<Item = Lit>,
        Self: Sized,
    {
        for lit in lits {
            debug_assert!(lit != 0, "0 terminates a clause and is not a literal");
            self.add(lit);
        }
        self.add(0);
    }
}
