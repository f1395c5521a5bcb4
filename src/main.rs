use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crime_insight::config::Config;
use crime_insight::dataset;
use crime_insight::ml;

#[derive(Parser)]
#[command(name = "crime-insight")]
#[command(about = "Crime severity prediction and hotspot analysis", long_about = None)]
struct Cli {
    /// Override the historical dataset path from configuration
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Predict the severity of a single incident
    Predict {
        /// Incident location
        location: String,
        /// Incident time
        time: String,
        /// Crime type
        crime_type: String,
    },
    /// Print the fitted hotspot clusters
    Hotspots {
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print model metadata and training metrics
    Info,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crime_insight=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(path) = cli.dataset {
        config.dataset.path = path;
    }

    info!(path = %config.dataset.path.display(), "loading historical dataset");
    let records = dataset::load_csv(&config.dataset.path)?;
    let pipeline = ml::train_pipeline(&records, &config)?;

    match cli.command {
        Command::Predict {
            location,
            time,
            crime_type,
        } => {
            let message = pipeline
                .service
                .predict_message(&location, &time, &crime_type)?;
            println!("{}", message);
        }
        Command::Hotspots { json } => {
            let report = pipeline.hotspot_report()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "Map center: ({:.4}, {:.4})",
                    report.map_center_latitude, report.map_center_longitude
                );
                for hotspot in &report.hotspots {
                    println!(
                        "Cluster {}: center ({:.4}, {:.4}), {} incidents",
                        hotspot.cluster,
                        hotspot.center_latitude,
                        hotspot.center_longitude,
                        hotspot.incident_count
                    );
                }
            }
        }
        Command::Info => {
            let metadata = pipeline.service.metadata();
            println!("Kernel: {}", metadata.kernel);
            println!("Gamma: {:.6}", metadata.gamma);
            println!("Classes: {}", pipeline.service.classes().join(", "));
            println!("Training samples: {}", metadata.n_training_samples);
            println!(
                "Training accuracy: {:.3}",
                metadata.training_metrics.accuracy
            );
            println!("Trained at: {}", metadata.trained_at.to_rfc3339());
        }
    }

    Ok(())
}
