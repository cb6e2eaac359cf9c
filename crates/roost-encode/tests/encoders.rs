//! Encoder state-machine tests over the scripted engine.
//!
//! Variable IDs below follow allocation order: the pigeon/hole grid first,
//! then the encoder's auxiliary family, all from a cursor starting at 1.

use roost_base::{Error, VarAllocator};
use roost_encode::{basic, chain, extended};
use roost_encode::{BasicHelperEncoder, ChainEncoder, EncoderConfig, ExtendedResolutionEncoder};
use roost_engine::{MetricsSink, ProbeOutcome, StageRecord};
use roost_engine::{ScriptedEngine, ScriptedSolve, SolveResult};
use std::cell::RefCell;
use std::rc::Rc;

/// Sink handle cloneable into an encoder while the test keeps a view.
#[derive(Clone, Default)]
struct SharedSink(Rc<RefCell<Vec<StageRecord>>>);

impl MetricsSink for SharedSink {
    fn stage(&mut self, record: &StageRecord) {
        self.0.borrow_mut().push(record.clone());
    }
}

fn basic_encoder(
    cfg: &EncoderConfig,
    script: Vec<ScriptedSolve>,
) -> BasicHelperEncoder<impl roost_base::VarContainer, ScriptedEngine> {
    let mut alloc = VarAllocator::new();
    let container = basic::container(cfg, &mut alloc).unwrap();
    BasicHelperEncoder::new(cfg, container, ScriptedEngine::new(script))
}

fn chain_encoder(
    cfg: &EncoderConfig,
    script: Vec<ScriptedSolve>,
) -> ChainEncoder<impl roost_base::VarContainer, ScriptedEngine> {
    let mut alloc = VarAllocator::new();
    let container = chain::container(cfg, &mut alloc).unwrap();
    ChainEncoder::new(cfg, container, ScriptedEngine::new(script))
}

fn extended_encoder(
    cfg: &EncoderConfig,
    script: Vec<ScriptedSolve>,
) -> ExtendedResolutionEncoder<impl roost_base::VarContainer, ScriptedEngine> {
    let mut alloc = VarAllocator::new();
    let container = extended::container(cfg, &mut alloc).unwrap();
    ExtendedResolutionEncoder::new(cfg, container, ScriptedEngine::new(script))
}

#[test]
fn basic_rejects_out_of_order_stages() {
    let cfg = EncoderConfig::new(3).unwrap();
    let mut enc = basic_encoder(&cfg, vec![]);

    assert!(matches!(
        enc.add_stage(2),
        Err(Error::StageOrder {
            requested: 2,
            expected: 1
        })
    ));
    // Probing an unadded stage is equally illegal.
    assert!(matches!(enc.probe_stage(1), Err(Error::StageOrder { .. })));

    enc.add_stage(1).unwrap();
    assert!(matches!(enc.add_stage(1), Err(Error::StageOrder { .. })));
    // Stage 3 does not exist for three pigeons.
    assert!(matches!(enc.add_stage(3), Err(Error::StageOrder { .. })));
}

#[test]
fn basic_stage_one_clauses_and_probe() {
    // Three pigeons: pigeon_in_hole(p, h) = 1 + 2p + h, helper(k) = 6 + k.
    let cfg = EncoderConfig::new(3).unwrap();
    let mut enc = basic_encoder(&cfg, vec![ScriptedSolve::unsat()]);

    enc.add_stage(1).unwrap();
    assert_eq!(
        enc.engine().clauses,
        vec![
            // At most one pigeon in the newly opened hole 0.
            vec![-3, -1],
            vec![-5, -1],
            vec![-5, -3],
            // Each pigeon in some open hole, unless the helper holds.
            vec![1, 7],
            vec![3, 7],
            vec![5, 7],
        ]
    );

    enc.probe_stage(1).unwrap();
    assert_eq!(enc.engine().assumption_log, vec![vec![-7]]);
}

#[test]
fn basic_probe_reports_unexpected_sat() {
    let cfg = EncoderConfig::new(3).unwrap();
    let mut enc = basic_encoder(&cfg, vec![ScriptedSolve::sat()]);
    enc.add_stage(1).unwrap();
    assert!(matches!(
        enc.probe_stage(1),
        Err(Error::UnexpectedSat { stage: 1 })
    ));
}

#[test]
fn basic_probe_propagates_interrupt() {
    let cfg = EncoderConfig::new(3).unwrap();
    let interrupted = ScriptedSolve {
        result: SolveResult::Interrupted,
        learned: Vec::new(),
        failed: Vec::new(),
        model: Vec::new(),
    };
    let mut enc = basic_encoder(&cfg, vec![interrupted]);
    enc.add_stage(1).unwrap();
    assert!(matches!(enc.probe_stage(1), Err(Error::Interrupted)));
}

#[test]
fn chain_borders_and_stage_zero_clauses() {
    // Three pigeons: pigeon_in_hole(p, h) = 1 + 2p + h, connector(p, d) = 7 + 3p + d.
    let cfg = EncoderConfig::new(3).unwrap();
    let mut enc = chain_encoder(&cfg, vec![ScriptedSolve::unsat(); 2]);

    assert!(matches!(enc.add_stage(1), Err(Error::StageOrder { .. })));
    enc.add_stage(0).unwrap();
    assert_eq!(
        enc.engine().clauses,
        vec![
            // Chains start open.
            vec![7],
            vec![10],
            vec![13],
            // Hard top border.
            vec![-9],
            vec![-12],
            vec![-15],
            // Transitions through hole 0.
            vec![-7, 1, 8],
            vec![-10, 3, 11],
            vec![-13, 5, 14],
            // At most one pigeon in hole 0.
            vec![-3, -1],
            vec![-5, -1],
            vec![-5, -3],
        ]
    );

    enc.probe_stage(0).unwrap();
    enc.add_stage(1).unwrap();
    enc.probe_stage(1).unwrap();
    assert_eq!(
        enc.engine().assumption_log,
        vec![vec![-8, -11, -14], vec![-9, -12, -15]]
    );
}

#[test]
fn chain_open_top_omits_border_units() {
    let cfg = EncoderConfig::new(3).unwrap().close_chain_top(false);
    let mut enc = chain_encoder(&cfg, vec![]);
    enc.add_stage(0).unwrap();
    assert!(!enc.engine().clauses.contains(&vec![-9]));
    assert!(enc.engine().clauses.contains(&vec![7]));
}

#[test]
fn chain_subset_policy_probes_every_oversized_subset() {
    let cfg = EncoderConfig::new(3).unwrap().subset_probes(true);
    let mut enc = chain_encoder(&cfg, vec![ScriptedSolve::unsat(); 5]);

    let records = enc.run().unwrap();
    // Depth 1: the full set and all three pairs. Depth 2: the full set only.
    assert_eq!(records[0].probes, 4);
    assert_eq!(records[1].probes, 1);
    assert_eq!(enc.engine().num_solves(), 5);
    assert_eq!(enc.engine().assumption_log[0], vec![-8, -11, -14]);
    assert_eq!(enc.engine().assumption_log[1], vec![-8, -11]);
}

#[test]
fn chain_materializes_proved_clauses() {
    let cfg = EncoderConfig::new(3).unwrap().materialize_proved(true);
    let mut enc = chain_encoder(&cfg, vec![ScriptedSolve::unsat(); 2]);
    enc.run().unwrap();
    assert!(enc.engine().clauses.contains(&vec![8, 11, 14]));
    assert!(enc.engine().clauses.contains(&vec![9, 12, 15]));
}

#[test]
fn extended_learning_run_with_exact_certificate() {
    // Three pigeons: the single reduction layer holds reduction(2, p, 0) =
    // 16 + 2p, so the one at-most-one probe assumes {18, 16}. With both
    // assumptions failed, the learned stream must carry {-18, -16}.
    let cfg = EncoderConfig::new(3).unwrap();
    let script = vec![
        ScriptedSolve::unsat()
            .with_learned(vec![vec![-16, -18]])
            .with_failed(vec![18, 16]),
        ScriptedSolve::unsat(),
        ScriptedSolve::unsat(),
        ScriptedSolve::unsat(),
    ];
    let mut enc = extended_encoder(&cfg, script);

    let records = enc.run().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].probes, 3);
    assert_eq!(records[1].probes, 1);

    assert_eq!(
        enc.engine().assumption_log,
        vec![vec![18, 16], vec![-16], vec![-18], vec![]]
    );
    // Every derived fact is materialized.
    assert!(enc.engine().clauses.contains(&vec![-18, -16]));
    assert!(enc.engine().clauses.contains(&vec![16]));
    assert!(enc.engine().clauses.contains(&vec![18]));
}

#[test]
fn extended_encode_clause_count() {
    let cfg = EncoderConfig::new(3).unwrap();
    let mut enc = extended_encoder(&cfg, vec![]);
    enc.encode().unwrap();
    // 6 borders + 6 transitions + 6 at-most-one + 8 definition clauses.
    assert_eq!(enc.engine().clauses.len(), 26);
    assert!(enc.engine().clauses.contains(&vec![-1, 16]));
    assert!(enc.engine().clauses.contains(&vec![-2, -5, 16]));
    assert!(enc.engine().clauses.contains(&vec![-16, 1, 2]));
    assert!(enc.engine().clauses.contains(&vec![-16, 1, 5]));
}

#[test]
fn extended_missing_certificate_is_an_error() {
    let cfg = EncoderConfig::new(3).unwrap();
    let script = vec![ScriptedSolve::unsat()
        .with_learned(vec![vec![-16, 5]])
        .with_failed(vec![18, 16])];
    let sink = SharedSink::default();
    let mut enc = extended_encoder(&cfg, script).with_sink(Box::new(sink.clone()));
    match enc.run() {
        Err(Error::CertificateMismatch { layer, expected }) => {
            assert_eq!(layer, 2);
            let mut expected = expected;
            expected.sort_unstable();
            assert_eq!(expected, vec![-18, -16]);
        }
        other => panic!("expected certificate mismatch, got {other:?}"),
    }
    // The failed step still reaches the metrics sink.
    let records = sink.0.borrow();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].outcome, ProbeOutcome::Unsat);
    assert_eq!(records[0].probes, 1);
}

#[test]
fn extended_partial_core_needs_only_its_own_certificate() {
    // Only one assumption failed, so only its unit core must be learned.
    let cfg = EncoderConfig::new(3).unwrap();
    let script = vec![
        ScriptedSolve::unsat()
            .with_learned(vec![vec![-18]])
            .with_failed(vec![18]),
        ScriptedSolve::unsat(),
        ScriptedSolve::unsat(),
        ScriptedSolve::unsat(),
    ];
    let mut enc = extended_encoder(&cfg, script);
    assert!(enc.run().is_ok());
}

#[test]
fn extended_global_refutation_has_no_certificate_to_check() {
    // No failed assumptions: the engine refuted the formula outright, so
    // there is no assumption-scoped core for the probe to reproduce.
    let cfg = EncoderConfig::new(3).unwrap();
    let mut enc = extended_encoder(&cfg, vec![ScriptedSolve::unsat(); 4]);
    assert!(enc.run().is_ok());
}

#[test]
fn extended_verification_can_be_disabled() {
    let cfg = EncoderConfig::new(3).unwrap().verify_certificates(false);
    let script = vec![
        ScriptedSolve::unsat().with_failed(vec![18, 16]),
        ScriptedSolve::unsat(),
        ScriptedSolve::unsat(),
        ScriptedSolve::unsat(),
    ];
    let mut enc = extended_encoder(&cfg, script);
    assert!(enc.run().is_ok());
}

#[test]
fn extended_two_pigeons_has_no_learning_steps() {
    let cfg = EncoderConfig::new(2).unwrap();
    let mut enc = extended_encoder(&cfg, vec![ScriptedSolve::unsat()]);
    let records = enc.run().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].probes, 1);
    assert!(enc.engine().assumption_log[0].is_empty());
}
