use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;

use oas_pipeline::client::PetClient;
use oas_pipeline::config::{load_config, validate_config, ApiConfig, ConfigError};
use oas_pipeline::observability::logging::init_logging;
use oas_pipeline::observability::Instrumentation;
use oas_pipeline::petstore::{Pet, PetStatus};

#[derive(Parser)]
#[command(name = "pet-cli")]
#[command(about = "Command line client for the petstore API", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file; `[client]` and the metric prefix are read from it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API base URL, overriding `client.base_url`.
    #[arg(short, long)]
    url: Option<String>,

    /// Per-call timeout in milliseconds, overriding `client.request_timeout_ms`.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Print the client-side metrics after the call.
    #[arg(long)]
    print_metrics: bool,

    /// Log level for client diagnostics, overriding `observability.log_level`.
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new pet
    Add {
        name: String,
        #[arg(long)]
        status: Option<PetStatus>,
        #[arg(long = "photo-url")]
        photo_urls: Vec<String>,
    },
    /// Show a pet by id
    Get { id: i64 },
    /// Delete a pet by id
    Delete { id: i64 },
    /// Update a pet's name and/or status
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        status: Option<PetStatus>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ApiConfig::default(),
    };
    if let Some(url) = cli.url {
        config.client.base_url = url;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.client.request_timeout_ms = timeout_ms;
    }
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    init_logging(&config.observability)?;

    let metrics = if cli.print_metrics {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::set_global_recorder(recorder)
            .map_err(|_| "a metrics recorder is already installed")?;
        Some(handle)
    } else {
        None
    };

    let instruments = Arc::new(Instrumentation::from_config(&config.observability));
    let client = PetClient::from_config(&config.client, instruments)?;

    match cli.command {
        Commands::Add {
            name,
            status,
            photo_urls,
        } => {
            let pet = Pet {
                id: None,
                name,
                photo_urls,
                status,
            };
            let created = client.add_pet(&pet).await?;
            println!("{}", serde_json::to_string_pretty(&created)?);
        }
        Commands::Get { id } => match client.get_pet_by_id(id).await? {
            Some(pet) => println!("{}", serde_json::to_string_pretty(&pet)?),
            None => eprintln!("Pet {id} not found"),
        },
        Commands::Delete { id } => {
            client.delete_pet(id).await?;
            println!("Deleted pet {id}");
        }
        Commands::Update { id, name, status } => {
            client.update_pet(id, name.as_deref(), status).await?;
            println!("Updated pet {id}");
        }
    }

    if let Some(handle) = metrics {
        print!("{}", handle.render());
    }
    Ok(())
}
