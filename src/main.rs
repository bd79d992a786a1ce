use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};

use sweetcat::app::ports::MissingValuePort;
use sweetcat::app::{AddHostsUseCase, CheckUseCase};
use sweetcat::config::{Config, DEFAULT_CONFIG_FILE};
use sweetcat::infra::{FileHostOutputAdapter, LookupPorts, NonInteractive, StdinPrompt};
use sweetcat::observability::{init_logging, metrics};
use sweetcat::pipeline::processing::{
    HostAssembler, MassEstimator, ParallaxResolver, ReconciliationEngine,
};

/// Environment variable naming the config file when `--config` is not given.
const CONFIG_ENV: &str = "SWEETCAT_CONFIG";

#[derive(Parser)]
#[command(name = "sweetcat")]
#[command(about = "Keeps SWEET-Cat in sync with the exoplanet.eu host list")]
#[command(version)]
struct Cli {
    /// Config file (default: $SWEETCAT_CONFIG or sweetcat.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare SWEET-Cat with the exoplanet.eu export and write new hosts to the candidate list
    Check {
        #[arg(long)]
        catalog: Option<PathBuf>,
        #[arg(long)]
        exoplanets: Option<PathBuf>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve and append the hosts in the candidate list
    Add {
        /// Ask for values the data sources cannot provide
        #[arg(long)]
        interactive: bool,
        /// Catalog file new records are appended to
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;

    let _guard = init_logging(&config.logging.dir, cli.verbose);
    metrics::init();
    debug!("Using config {}", config_path.display());

    let outcome = match cli.command {
        Commands::Check {
            catalog,
            exoplanets,
            json,
        } => {
            if let Some(path) = catalog {
                config.paths.catalog = path;
            }
            if let Some(path) = exoplanets {
                config.paths.exoplanets = path;
            }
            run_check(&config, json).await
        }
        Commands::Add {
            interactive,
            output,
        } => {
            if let Some(path) = output {
                config.paths.output = path;
            }
            run_add(&config, interactive).await
        }
    };

    if let Some(rendered) = metrics::render() {
        debug!("Run metrics:\n{}", rendered);
    }
    if let Err(e) = &outcome {
        error!("Run failed: {:#}", e);
    }
    outcome
}

async fn run_check(config: &Config, json: bool) -> anyhow::Result<()> {
    let candidates = Arc::new(FileHostOutputAdapter::new(
        config.paths.output.clone(),
        config.paths.names.clone(),
        config.paths.manual.clone(),
    ));
    let use_case = CheckUseCase::new(ReconciliationEngine::new(config.reconciliation()), candidates);
    let report = use_case.run(config).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.is_up_to_date() {
        println!("SWEET-Cat is up to date");
        return Ok(());
    }
    println!(
        "{} new hosts written to {}",
        report.new_stars.len(),
        config.paths.names.display()
    );
    for name in &report.new_stars {
        println!("  + {}", name);
    }
    if !report.stale_stars.is_empty() {
        println!("{} stars no longer in the exoplanet list:", report.stale_stars.len());
        for name in &report.stale_stars {
            println!("  - {}", name);
        }
    }
    Ok(())
}

async fn run_add(config: &Config, interactive: bool) -> anyhow::Result<()> {
    let ports = LookupPorts::from_config(config);
    let values: Arc<dyn MissingValuePort> = if interactive {
        Arc::new(StdinPrompt::stdio())
    } else {
        Arc::new(NonInteractive)
    };

    let resolver = ParallaxResolver::new(
        ports.astrometry.clone(),
        ports.dust.clone(),
        ports.spectroscopic_parallax.clone(),
        config.parallax(),
    );
    let mass = MassEstimator::new(ports.mass.clone(), config.lookup_timeout());
    let assembler = HostAssembler::new(
        ports.cross_match.clone(),
        mass,
        resolver,
        values.clone(),
        config.host(),
    );
    let output = Arc::new(FileHostOutputAdapter::new(
        config.paths.output.clone(),
        config.paths.names.clone(),
        config.paths.manual.clone(),
    ));

    let use_case = AddHostsUseCase::new(assembler, values, output);
    let (summary, catalog) = use_case.run_from_files(config).await?;
    info!("Catalog now holds {} stars", catalog.len());

    println!("Run {}", summary.run_id);
    println!("  added:   {}", summary.added);
    println!("  skipped: {}", summary.skipped);
    println!("  manual:  {} (see {})", summary.manual, config.paths.manual.display());
    println!("  left:    {}", summary.remaining);
    for (flag, count) in &summary.parallax_flags {
        println!("  parallax {}: {}", flag, count);
    }
    if summary.stopped {
        println!("Stopped early; run again to continue with the remaining names");
    }
    Ok(())
}
