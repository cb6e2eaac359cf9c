//! Dimspec command.

use clap::Args;
use roost_encode::{Dimspec, EncoderConfig};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Args)]
pub struct DimspecArgs {
    /// Number of pigeons (at least 2)
    #[arg(required = true)]
    pub pigeons: u32,

    /// Output file (stdout if not given)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: DimspecArgs) -> anyhow::Result<()> {
    let cfg = EncoderConfig::new(args.pigeons)?;
    let dimspec = Dimspec::new(&cfg)?;

    match &args.output {
        Some(path) => {
            let mut file = io::BufWriter::new(fs::File::create(path)?);
            dimspec.write(&mut file)?;
            file.flush()?;
            tracing::info!("dimspec written to {:?}", path);
        }
        None => {
            let stdout = io::stdout();
            dimspec.write(&mut stdout.lock())?;
        }
    }
    Ok(())
}
