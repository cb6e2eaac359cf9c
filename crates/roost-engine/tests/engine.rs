//! Integration tests for the reference CDCL engine.

use roost_engine::{CdclEngine, Engine, SolveResult};

/// Direct (non-incremental) PHP encoding: `n` pigeons, `holes` holes.
fn add_php(engine: &mut CdclEngine, pigeons: i32, holes: i32) {
    let var = |p: i32, h: i32| p * holes + h + 1;
    for p in 0..pigeons {
        engine.add_clause((0..holes).map(|h| var(p, h)));
    }
    for h in 0..holes {
        for p in 0..pigeons {
            for q in 0..p {
                engine.add_clause([-var(p, h), -var(q, h)]);
            }
        }
    }
}

#[test]
fn empty_formula_is_sat() {
    let mut engine = CdclEngine::new();
    assert_eq!(engine.solve().unwrap(), SolveResult::Sat);
}

#[test]
fn unit_clauses_fix_the_model() {
    let mut engine = CdclEngine::new();
    engine.add_clause([3]);
    engine.add_clause([-5]);
    assert_eq!(engine.solve().unwrap(), SolveResult::Sat);
    assert!(engine.val(3));
    assert!(!engine.val(-3));
    assert!(engine.val(-5));
}

#[test]
fn contradictory_units_are_unsat() {
    let mut engine = CdclEngine::new();
    engine.add_clause([1]);
    engine.add_clause([-1]);
    assert_eq!(engine.solve().unwrap(), SolveResult::Unsat);
    // Absolute refutation: no assumption is in the core.
    assert!(!engine.failed(1));
    assert!(!engine.failed(-1));
}

#[test]
fn implication_chain_propagates() {
    let mut engine = CdclEngine::new();
    engine.add_clause([1]);
    engine.add_clause([-1, 2]);
    engine.add_clause([-2, 3]);
    engine.add_clause([-3, 4]);
    assert_eq!(engine.solve().unwrap(), SolveResult::Sat);
    for v in 1..=4 {
        assert!(engine.val(v));
    }
}

#[test]
fn assumption_core_is_exact() {
    let mut engine = CdclEngine::new();
    engine.set_learn(10);
    engine.add_clause([1, 2]);
    engine.assume(-1);
    engine.assume(-2);
    assert_eq!(engine.solve().unwrap(), SolveResult::Unsat);
    assert!(engine.failed(-1));
    assert!(engine.failed(-2));
    assert!(!engine.failed(1));

    // The failed-assumption core is visible in the learned stream.
    let learned = engine.take_learned();
    let core: Vec<_> = learned
        .iter()
        .filter(|c| {
            let mut c = (*c).clone();
            c.sort_unstable();
            c == [1, 2]
        })
        .collect();
    assert_eq!(core.len(), 1);
}

#[test]
fn assumptions_are_scoped_to_one_solve() {
    let mut engine = CdclEngine::new();
    engine.add_clause([7]);
    engine.assume(-7);
    assert_eq!(engine.solve().unwrap(), SolveResult::Unsat);
    // The next probe carries no assumptions and must be satisfiable again.
    assert_eq!(engine.solve().unwrap(), SolveResult::Sat);
    assert!(engine.val(7));
}

#[test]
fn irrelevant_assumption_is_not_in_core() {
    let mut engine = CdclEngine::new();
    engine.add_clause([1, 2]);
    engine.assume(9);
    engine.assume(-1);
    engine.assume(-2);
    assert_eq!(engine.solve().unwrap(), SolveResult::Unsat);
    assert!(!engine.failed(9));
    assert!(engine.failed(-1));
    assert!(engine.failed(-2));
}

#[test]
fn formula_grows_incrementally() {
    let mut engine = CdclEngine::new();
    engine.add_clause([1, 2]);
    assert_eq!(engine.solve().unwrap(), SolveResult::Sat);
    engine.add_clause([-1]);
    assert_eq!(engine.solve().unwrap(), SolveResult::Sat);
    assert!(engine.val(2));
    engine.add_clause([-2]);
    assert_eq!(engine.solve().unwrap(), SolveResult::Unsat);
}

#[test]
fn learned_stream_is_drained_per_solve() {
    let mut engine = CdclEngine::new();
    engine.set_learn(20);
    add_php(&mut engine, 4, 3);
    assert_eq!(engine.solve().unwrap(), SolveResult::Unsat);
    let first = engine.take_learned();
    assert!(!first.is_empty());
    assert!(engine.take_learned().is_empty());
}

#[test]
fn learn_cap_filters_long_clauses() {
    let mut engine = CdclEngine::new();
    engine.set_learn(2);
    add_php(&mut engine, 5, 4);
    assert_eq!(engine.solve().unwrap(), SolveResult::Unsat);
    assert!(engine.take_learned().iter().all(|c| c.len() <= 2));
}

#[test]
fn pigeonholes_unsat_when_overfull() {
    for n in 2..=6 {
        let mut engine = CdclEngine::new();
        add_php(&mut engine, n, n - 1);
        assert_eq!(
            engine.solve().unwrap(),
            SolveResult::Unsat,
            "php({n}) must be unsat"
        );
    }
}

#[test]
fn pigeonholes_sat_when_enough_holes() {
    let mut engine = CdclEngine::new();
    add_php(&mut engine, 4, 4);
    assert_eq!(engine.solve().unwrap(), SolveResult::Sat);
    // Every pigeon sits somewhere in the model.
    for p in 0..4 {
        assert!((0..4).any(|h| engine.val(p * 4 + h + 1)));
    }
}

#[test]
fn terminate_predicate_interrupts() {
    let mut engine = CdclEngine::new();
    add_php(&mut engine, 7, 6);
    engine.set_terminate(Box::new(|| true));
    assert_eq!(engine.solve().unwrap(), SolveResult::Interrupted);
}

#[test]
fn stats_track_search_effort() {
    let mut engine = CdclEngine::new();
    add_php(&mut engine, 5, 4);
    assert_eq!(engine.solve().unwrap(), SolveResult::Unsat);
    let stats = engine.stats();
    assert!(stats.decisions > 0);
    assert!(stats.conflicts > 0);
    assert!(stats.learned > 0);
}

#[test]
fn reset_discards_all_state() {
    let mut engine = CdclEngine::new();
    engine.add_clause([1]);
    engine.add_clause([-1]);
    assert_eq!(engine.solve().unwrap(), SolveResult::Unsat);
    engine.reset();
    assert_eq!(engine.solve().unwrap(), SolveResult::Sat);
}
