use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use gaya_belajar::csv_batch;
use gaya_belajar::models::BatchRequest;
use gaya_belajar::orchestrator::Orchestrator;
use gaya_belajar::predictor::ForestModel;
use gaya_belajar::schema::FeatureSchema;
use gaya_belajar::server;

#[derive(Parser)]
#[command(name = "gaya-belajar")]
#[command(about = "Learning style prediction service", long_about = None)]
struct Cli {
    /// Path to the JSON model artifact
    #[arg(long, env = "MODEL_PATH", default_value = "model_gaya_belajar.json", global = true)]
    model_path: PathBuf,

    /// Reject non-numeric feature values during validation
    #[arg(long, env = "STRICT_VALIDATION", global = true)]
    strict: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve predictions over HTTP
    Serve {
        #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:5000")]
        bind: SocketAddr,
    },
    /// Score a CSV of learner rows
    Predict {
        #[arg(long)]
        csv: PathBuf,
        /// Write results as CSV instead of printing JSON lines
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("gaya_belajar=debug,tower_http=debug,info")
        } else {
            EnvFilter::new("gaya_belajar=info,tower_http=info,warn")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_orchestrator(cli: &Cli) -> anyhow::Result<Orchestrator> {
    let schema = FeatureSchema::default();
    let model = ForestModel::load(&cli.model_path, &schema)
        .with_context(|| format!("failed to load model from {}", cli.model_path.display()))?;

    info!(
        path = %cli.model_path.display(),
        classes = model.class_count(),
        trees = model.tree_count(),
        strict = cli.strict,
        "model loaded"
    );

    Ok(Orchestrator::new(Arc::new(model)).with_strict_validation(cli.strict))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let orchestrator = load_orchestrator(&cli)?;

    match cli.command {
        Commands::Serve { bind } => {
            server::serve(bind, orchestrator)
                .await
                .with_context(|| format!("server on {bind} failed"))?;
        }
        Commands::Predict { csv, out } => {
            let records = csv_batch::read_records(&csv)?;
            let request = BatchRequest::Batch(records);
            let output = orchestrator.run(&request)?;

            match out {
                Some(out) => {
                    csv_batch::write_csv(&out, output.results())?;
                    println!(
                        "Scored {} learners from {} into {}.",
                        output.results().len(),
                        csv.display(),
                        out.display()
                    );
                }
                None => csv_batch::write_json_lines(std::io::stdout().lock(), output.results())?,
            }
        }
    }

    Ok(())
}
