extern crate heat_rejection;

use clap::{Args, Parser, Subcommand};
use heat_rejection::output::FileOutput;
use heat_rejection::{
    create_building_groups, ingest_config, run_heat_rejection, CoolingTowerCatalog,
    CoolingTowerSimulator, EnthalpySplitter, HeatRejectionConfig, ScenarioLocator,
};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct HeatRejectionArgs {
    #[command(subcommand)]
    command: Command,
    #[clap(long, short, default_value_t = false, help = "Log debug output")]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Partition the scenario's buildings into heat rejection groups
    Groups(CommonArgs),
    /// Calculate hourly sensible and latent heat rejection for every building group
    Run {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long, help = "Path to cooling tower catalog in .csv format")]
        catalog_file: Option<PathBuf>,
        #[arg(
            long,
            short,
            help = "Path to weather file in .epw format, instead of the scenario's own"
        )]
        epw_file: Option<PathBuf>,
        #[arg(
            long,
            short,
            help = "Directory to write results to, instead of the scenario's outputs"
        )]
        output_dir: Option<PathBuf>,
    },
}

#[derive(Args, Clone, Debug)]
struct CommonArgs {
    scenario: PathBuf,
    #[arg(long, short, help = "Path to heat rejection configuration in .json format")]
    config_file: Option<PathBuf>,
}

impl CommonArgs {
    fn config(&self) -> anyhow::Result<HeatRejectionConfig> {
        match &self.config_file {
            Some(path) => ingest_config(BufReader::new(File::open(path)?)),
            None => Ok(Default::default()),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = HeatRejectionArgs::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    match args.command {
        Command::Groups(common) => {
            let config = common.config()?;
            create_building_groups(&ScenarioLocator::new(&common.scenario), &config)?;
        }
        Command::Run {
            common,
            catalog_file,
            epw_file,
            output_dir,
        } => {
            let config = common.config()?;
            let catalog = match catalog_file {
                Some(path) => CoolingTowerCatalog::from_csv(BufReader::new(File::open(path)?))?,
                None => CoolingTowerCatalog::embedded()?,
            };
            let mut locator = ScenarioLocator::new(&common.scenario);
            if let Some(epw_file) = epw_file {
                locator = locator.with_weather_file(epw_file);
            }
            let output_dir = output_dir.unwrap_or_else(|| locator.heat_rejection_folder());
            let output = FileOutput::new(output_dir.clone(), "{}.csv".to_string());

            let results = run_heat_rejection(
                &locator,
                &config,
                &catalog,
                &CoolingTowerSimulator::new(),
                &EnthalpySplitter,
                &output,
            )?;
            info!(
                "Heat rejection for {} building groups written to {}",
                results.records.len(),
                output_dir.display()
            );
        }
    }

    Ok(())
}
