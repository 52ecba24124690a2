use anyhow::Result;
use clap::{Parser, Subcommand};
use latam_indicators::{Pipeline, PipelineConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "latam-indicators")]
#[command(about = "Unify and summarize Latin American socio-economic indicators")]
#[command(version)]
struct Args {
    /// YAML pipeline config; built-in defaults when omitted
    #[arg(short, long, env = "INDICATORS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Raw indicator CSVs → unified table
    Transform,
    /// Unified table → KPI views
    Analyze,
    /// Transform, then analyze
    Run,
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    // ─── 2) config ───────────────────────────────────────────────────
    let args = Args::parse();
    let config = PipelineConfig::load(args.config.as_deref())?;
    let pipeline = Pipeline::new(config);
    info!(command = ?args.command, "startup");

    // ─── 3) run the requested stage(s) ───────────────────────────────
    match args.command {
        Command::Transform => {
            let report = pipeline.transform()?;
            info!(
                rows = report.table.len(),
                dropped_incomplete = report.stats.dropped_incomplete,
                dropped_duplicates = report.stats.dropped_duplicates,
                "unified table ready"
            );
        }
        Command::Analyze => {
            pipeline.analyze()?;
        }
        Command::Run => {
            pipeline.run()?;
        }
    }

    info!("all done");
    Ok(())
}
