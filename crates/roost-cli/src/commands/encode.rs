//! Encode command.

use clap::{Args, ValueEnum};
use roost_base::VarAllocator;
use roost_encode::{basic, chain, extended};
use roost_encode::{BasicHelperEncoder, ChainEncoder, EncoderConfig, ExtendedResolutionEncoder};
use roost_engine::{CdclEngine, Engine, JsonLinesSink, LearnedClauseEval, MetricsSink, NullSink};
use roost_engine::StageRecord;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum EncoderKind {
    /// Direct encoding with per-stage helper literals
    Basic,
    /// 3-literal connector chains per pigeon
    Chain,
    /// Connector chains plus extended-resolution layer reductions
    Er,
}

#[derive(Args)]
pub struct EncodeArgs {
    /// Number of pigeons (at least 2)
    #[arg(required = true)]
    pub pigeons: u32,

    /// Encoder variant
    #[arg(short, long, value_enum, default_value = "basic")]
    pub encoder: EncoderKind,

    /// Leave the upper chain border soft (chain encoder only)
    #[arg(long)]
    pub open_top: bool,

    /// Probe every oversized pigeon subset instead of only the full set
    #[arg(long)]
    pub subset_probes: bool,

    /// Materialize proven subset clauses permanently
    #[arg(long)]
    pub materialize: bool,

    /// Skip learned-clause certificate verification (er encoder only)
    #[arg(long)]
    pub skip_certificates: bool,

    /// Timeout in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Write per-stage metrics as JSON lines to this file
    #[arg(long)]
    pub metrics: Option<PathBuf>,
}

fn stage_sink(metrics: &Option<PathBuf>) -> anyhow::Result<Box<dyn MetricsSink>> {
    Ok(match metrics {
        Some(path) => Box::new(JsonLinesSink::new(fs::File::create(path)?)),
        None => Box::new(NullSink),
    })
}

pub fn run(args: EncodeArgs) -> anyhow::Result<()> {
    let cfg = EncoderConfig::new(args.pigeons)?
        .close_chain_top(!args.open_top)
        .subset_probes(args.subset_probes)
        .materialize_proved(args.materialize)
        .verify_certificates(!args.skip_certificates);
    tracing::info!(
        pigeons = cfg.num_pigeons,
        encoder = ?args.encoder,
        "starting incremental run"
    );

    let mut engine = LearnedClauseEval::new(CdclEngine::new());
    if let Some(secs) = args.timeout {
        let deadline = Instant::now() + Duration::from_secs(secs);
        engine.set_terminate(Box::new(move || Instant::now() >= deadline));
    }

    let mut alloc = VarAllocator::new();
    let start = Instant::now();
    let (records, stats) = match args.encoder {
        EncoderKind::Basic => {
            let container = basic::container(&cfg, &mut alloc)?;
            let mut enc = BasicHelperEncoder::new(&cfg, container, engine)
                .with_sink(stage_sink(&args.metrics)?);
            let records = enc.run()?;
            (records, enc.engine().inner().stats())
        }
        EncoderKind::Chain => {
            let container = chain::container(&cfg, &mut alloc)?;
            let mut enc = ChainEncoder::new(&cfg, container, engine)
                .with_sink(stage_sink(&args.metrics)?);
            let records = enc.run()?;
            (records, enc.engine().inner().stats())
        }
        EncoderKind::Er => {
            let container = extended::container(&cfg, &mut alloc)?;
            let mut enc = ExtendedResolutionEncoder::new(&cfg, container, engine)
                .with_sink(stage_sink(&args.metrics)?);
            let records = enc.run()?;
            (records, enc.engine().inner().stats())
        }
    };
    let elapsed = start.elapsed();

    report(&records);
    println!("s UNSATISFIABLE");
    println!(
        "c Search: {} decisions, {} conflicts, {} restarts, {} learned",
        stats.decisions, stats.conflicts, stats.restarts, stats.learned
    );
    println!("c Time: {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn report(records: &[StageRecord]) {
    for record in records {
        println!(
            "c stage {}: {:?} in {:.3}s ({} probes)",
            record.stage, record.outcome, record.elapsed_secs, record.probes
        );
    }
}
