//! Writes a synthetic two-sheet sales workbook to the default data path
//! (or the path given as the first argument).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rusty_tractor::config::DEFAULT_DATA_PATH;
use rusty_tractor::data::sample::{sample_workbook, SampleOptions};

#[derive(Parser)]
#[command(name = "generate_sample")]
#[command(about = "Generate a sample PLE unit-sales workbook", long_about = None)]
struct Cli {
    /// Output workbook
    #[arg(default_value = DEFAULT_DATA_PATH)]
    output: PathBuf,

    /// PRNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// First year of data
    #[arg(long, default_value_t = 2014)]
    start_year: i32,

    /// Number of years
    #[arg(long, default_value_t = 5)]
    years: u32,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let opts = SampleOptions {
        seed: cli.seed,
        start_year: cli.start_year,
        years: cli.years,
        ..Default::default()
    };
    let bytes = sample_workbook(&opts).context("building workbook")?;

    if let Some(parent) = cli.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(&cli.output, bytes)
        .with_context(|| format!("writing {}", cli.output.display()))?;

    println!(
        "Wrote {} years of mower and tractor sales to {}",
        opts.years,
        cli.output.display()
    );
    Ok(())
}
