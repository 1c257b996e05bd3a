use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use songplays_etl::{warehouse, Pipeline, PipelineConfig, Stage};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Drop, create, load and transform everything (the default).
    Run,
    /// Drop and recreate all staging and star-schema tables.
    CreateTables,
    /// Load the staging tables and build the star schema into existing tables.
    Etl,
    /// Print the SQL of a full run without connecting to the warehouse.
    PrintSql,
}

#[derive(Parser, Debug)]
#[clap(version, about = "Loads listening activity into a star-schema warehouse")]
struct CliArgs {
    /// Path to the TOML pipeline configuration.
    #[clap(value_parser = parse_path)]
    pub config: PathBuf,

    #[clap(subcommand)]
    pub command: Option<Command>,
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    info!("Reading configuration from {:?}...", cli_args.config);
    let config = PipelineConfig::from_file(&cli_args.config)?;
    let pipeline = Pipeline::new(&config);

    let stage = match cli_args.command.unwrap_or(Command::Run) {
        Command::Run => Stage::Full,
        Command::CreateTables => Stage::CreateTables,
        Command::Etl => Stage::Etl,
        Command::PrintSql => {
            print!("{}", pipeline.render(Stage::Full, config.warehouse.dialect())?);
            return Ok(());
        }
    };

    let started = Instant::now();
    let mut warehouse = warehouse::connect(&config.warehouse)?;
    let result = pipeline.run(warehouse.as_mut(), stage);
    if let Err(e) = warehouse.close() {
        warn!("{}", e);
    }
    let report = result?;

    let rows: u64 = report.statements.iter().map(|s| s.rows).sum();
    info!(
        "{:?} stage finished: {} statements, {} rows written in {:?}",
        stage,
        report.statements.len(),
        rows,
        started.elapsed()
    );
    Ok(())
}
