//! Headless runner: load a workbook, apply filters, print the metrics
//! snapshot as JSON and optionally write the filtered CSV.
//!
//! ```bash
//! rusty-tractor                                  # bundled data/ple_sales.xlsx
//! rusty-tractor --source sales.xlsx --product Tractor --year 2018 --year 2019
//! rusty-tractor --include-world --export out/    # adds World, writes out/filtered_sales.csv
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rusty_tractor::config::DashboardConfig;
use rusty_tractor::{resolve_source, DashboardState, FilterCriteria, Product, Region, Source};

#[derive(Parser)]
#[command(name = "rusty-tractor")]
#[command(about = "Tractor & mower unit-sales metrics", long_about = None)]
struct Cli {
    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Workbook to load instead of the configured default
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Restrict to a product (repeatable)
    #[arg(long = "product", value_parser = parse_product)]
    products: Vec<Product>,

    /// Restrict to a region (repeatable)
    #[arg(long = "region", value_parser = parse_region)]
    regions: Vec<Region>,

    /// Restrict to a year (repeatable)
    #[arg(long = "year")]
    years: Vec<i32>,

    /// Keep the World aggregate rows (also selects World unless --region is given)
    #[arg(long)]
    include_world: bool,

    /// Write the filtered CSV here (file or directory)
    #[arg(short, long)]
    export: Option<PathBuf>,
}

fn parse_product(s: &str) -> Result<Product, String> {
    Product::from_label(s).ok_or_else(|| format!("unknown product '{s}' (Tractor, Mower)"))
}

fn parse_region(s: &str) -> Result<Region, String> {
    Region::from_header(s).ok_or_else(|| format!("unknown region '{s}'"))
}

/// Overlay the command-line filters on the dashboard defaults.
fn cli_criteria(mut criteria: FilterCriteria, cli: &Cli) -> FilterCriteria {
    if !cli.products.is_empty() {
        criteria.products = cli.products.iter().copied().collect();
    }
    if !cli.regions.is_empty() {
        criteria.regions = cli.regions.iter().copied().collect();
    } else if cli.include_world {
        criteria.regions.insert(Region::World);
    }
    if !cli.years.is_empty() {
        criteria.years = cli.years.iter().copied().collect();
    }
    criteria.include_world = cli.include_world;
    criteria
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = DashboardConfig::load(cli.config.as_deref())?;
    let source = match cli.source.clone() {
        Some(path) => Source::Path(path),
        None => resolve_source(None, &config.default_path)?,
    };

    let mut state = DashboardState::new(&config);
    state.load_source(&source)?;

    let criteria = cli_criteria(state.criteria.clone(), &cli);
    state.set_criteria(criteria);

    let snapshot = &state.snapshot;
    if snapshot.is_empty() {
        log::warn!("No data for the selected filters");
    } else {
        log::info!(
            "{} records, {} units, top region {:?}",
            snapshot.record_count,
            snapshot.total_units,
            snapshot.top_region.map(|t| t.region.as_str())
        );
    }
    println!("{}", serde_json::to_string_pretty(snapshot)?);

    if let Some(target) = cli.export {
        let path = if target.is_dir() {
            target.join(&config.export_file_name)
        } else {
            target
        };
        std::fs::write(&path, state.export_csv()?)
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!("Wrote {} rows to {}", state.filtered.len(), path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> FilterCriteria {
        FilterCriteria {
            regions: [Region::China, Region::Europe].into_iter().collect(),
            ..Default::default()
        }
    }

    #[test]
    fn include_world_alone_selects_world() {
        let cli = Cli::parse_from(["rusty-tractor", "--include-world"]);
        let criteria = cli_criteria(defaults(), &cli);
        assert!(criteria.include_world);
        assert!(criteria.regions.contains(&Region::World));
        assert!(criteria.regions.contains(&Region::China));
    }

    #[test]
    fn explicit_regions_win_over_include_world() {
        let cli = Cli::parse_from(["rusty-tractor", "--include-world", "--region", "SA"]);
        let criteria = cli_criteria(defaults(), &cli);
        assert_eq!(
            criteria.regions.into_iter().collect::<Vec<_>>(),
            vec![Region::SouthAmerica]
        );
    }

    #[test]
    fn without_flags_defaults_are_kept() {
        let cli = Cli::parse_from(["rusty-tractor", "--year", "2019"]);
        let criteria = cli_criteria(defaults(), &cli);
        assert!(!criteria.include_world);
        assert!(!criteria.regions.contains(&Region::World));
        assert_eq!(criteria.years.into_iter().collect::<Vec<_>>(), vec![2019]);
    }
}
