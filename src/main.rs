use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use simplemc::{AnalogTransport, BoundaryCondition, Settings, Simulation};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "simplemc",
    version,
    about = "Criticality Monte Carlo k-effective calculation in a homogeneous box"
)]
struct Cli {
    /// JSON settings file; missing keys take their default values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Histories per generation.
    #[arg(short = 'n', long)]
    particles: Option<usize>,

    #[arg(short, long)]
    batches: Option<usize>,

    /// Number of final batches recorded in the k-effective estimate.
    #[arg(short, long)]
    active: Option<usize>,

    /// Generations per batch.
    #[arg(short, long)]
    generations: Option<usize>,

    #[arg(short, long)]
    seed: Option<u64>,

    /// Transport worker threads (default: one per core).
    #[arg(short, long)]
    threads: Option<usize>,

    /// Mesh bins per axis for entropy and tallies.
    #[arg(long)]
    bins: Option<usize>,

    #[arg(long, value_enum)]
    boundary: Option<BoundaryArg>,

    /// Switch the mesh flux tally on or off for the active batches.
    #[arg(long)]
    tally: Option<bool>,

    #[arg(long)]
    keff_file: Option<PathBuf>,

    #[arg(long)]
    entropy_file: Option<PathBuf>,

    #[arg(long)]
    tally_file: Option<PathBuf>,

    #[arg(long)]
    bank_file: Option<PathBuf>,

    /// Source site positions after every generation.
    #[arg(long)]
    source_file: Option<PathBuf>,

    /// Start from a source bank saved by an earlier run.
    #[arg(long)]
    load_source: Option<PathBuf>,

    /// Save the final source bank for a later run.
    #[arg(long)]
    save_source: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BoundaryArg {
    Vacuum,
    Reflect,
    Periodic,
}

impl From<BoundaryArg> for BoundaryCondition {
    fn from(arg: BoundaryArg) -> Self {
        match arg {
            BoundaryArg::Vacuum => BoundaryCondition::Vacuum,
            BoundaryArg::Reflect => BoundaryCondition::Reflect,
            BoundaryArg::Periodic => BoundaryCondition::Periodic,
        }
    }
}

impl Cli {
    fn settings(self) -> Result<Settings> {
        let mut s = match &self.config {
            Some(path) => Settings::from_json_file(path)
                .with_context(|| format!("reading settings from {}", path.display()))?,
            None => Settings::default(),
        };
        if let Some(v) = self.particles {
            s.particles = v;
        }
        if let Some(v) = self.batches {
            s.batches = v;
        }
        if let Some(v) = self.active {
            s.active = v;
        }
        if let Some(v) = self.generations {
            s.generations = v;
        }
        if let Some(v) = self.seed {
            s.seed = v;
        }
        if let Some(v) = self.threads {
            s.threads = Some(v);
        }
        if let Some(v) = self.bins {
            s.bins = v;
        }
        if let Some(v) = self.boundary {
            s.boundary = v.into();
        }
        if let Some(v) = self.tally {
            s.tally = v;
        }
        let out = &mut s.output;
        for (slot, value) in [
            (&mut out.keff_file, self.keff_file),
            (&mut out.entropy_file, self.entropy_file),
            (&mut out.tally_file, self.tally_file),
            (&mut out.bank_file, self.bank_file),
            (&mut out.source_file, self.source_file),
            (&mut out.load_source, self.load_source),
            (&mut out.save_source, self.save_source),
        ] {
            if value.is_some() {
                *slot = value;
            }
        }
        Ok(s)
    }
}

fn main() -> Result<()> {
    init_tracing();
    let settings = Cli::parse().settings()?;

    println!("{}", settings);
    println!();

    let mut sim = Simulation::new(settings)
        .context("setting up simulation")?
        .with_status_table(true);
    info!("Starting eigenvalue simulation");
    let summary = sim.run(&AnalogTransport).context("eigenvalue run failed")?;

    println!();
    println!("keff = {:.6} +/- {:.6}", summary.keff_mean, summary.keff_std);
    println!("Elapsed time: {:.3} s", summary.elapsed.as_secs_f64());
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
