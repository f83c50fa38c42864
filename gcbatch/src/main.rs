use std::path::PathBuf;
use std::process;

use clap::Parser;
use gcbatch::batch;
use gcbatch::config::BatchConfig;
use gcbatch::error::Result;
use log::error;

#[derive(Parser, Debug)]
#[command(name = "gcbatch")]
#[command(version)]
#[command(about = "Resolve GC/MS target fragments against per-sample peak lists", long_about = None)]
struct Cli {
    /// Directory holding one peak-list CSV per sample
    #[arg(long, required = true)]
    peaks: PathBuf,

    /// Target list CSV
    #[arg(long, required = true)]
    targets: PathBuf,

    /// Output directory for the feature tables
    #[arg(long, short = 'o', required = true)]
    out: PathBuf,

    /// Worker threads (0 = all cores)
    #[arg(long)]
    threads: Option<usize>,

    /// JSON configuration file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip the shape-similarity seed
    #[arg(long)]
    no_similarity: bool,

    /// Skip the global retention-time shift pass
    #[arg(long)]
    no_shift: bool,

    /// Upper bound of the reference-RT deviation
    #[arg(long)]
    drt_max: Option<f64>,

    /// First-shot passes estimated without the bound floor
    #[arg(long)]
    bound_test_limit: Option<usize>,
}

impl Cli {
    fn batch_config(&self) -> Result<BatchConfig> {
        let mut config = match &self.config {
            Some(path) => BatchConfig::from_json_file(path)?,
            None => BatchConfig::default(),
        };
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if self.no_similarity {
            config.resolve.similarity_seed = false;
        }
        if self.no_shift {
            config.resolve.shift.enabled = false;
        }
        if let Some(drt_max) = self.drt_max {
            config.resolve.drt_max = drt_max;
        }
        if let Some(limit) = self.bound_test_limit {
            config.resolve.bound_test_limit = limit;
        }
        Ok(config)
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = cli
        .batch_config()
        .and_then(|config| batch::run(&config, &cli.peaks, &cli.targets, &cli.out));

    if let Err(e) = result {
        error!("{}", e);
        process::exit(1);
    }
}
