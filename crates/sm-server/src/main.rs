//! sm-mutate - operator entry point for dataset mutations

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mediator::AsyncMediator;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sm_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use sm_common::User;
use sqlx::postgres::PgPoolOptions;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use sm_server::auth::SubmitterPolicy;
use sm_server::config::Config;
use sm_server::cqrs::build_mediator;
use sm_server::engine::EngineGateway;
use sm_server::features::datasets::{
    AddOpticalImageCommand, DeleteDatasetCommand, DeleteOpticalImageCommand,
    ReprocessingNeededQuery, SubmitDatasetCommand, UpdateDatasetCommand,
};
use sm_server::features::MutationContext;
use sm_server::locks::DatasetLocks;
use sm_server::metadata::MetadataSchema;
use sm_server::processing_config::ProcessingConfigDeriver;
use sm_server::registry::HttpMolecularDatabaseRegistry;
use sm_server::store::PgDatasetStore;
use sm_server::MutationResult;

#[derive(Parser, Debug)]
#[command(name = "sm-mutate")]
#[command(author, version, about = "Submit and edit SM datasets", long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Email of the user the mutation is performed for
    #[arg(long, env = "SM_USER_EMAIL", global = true)]
    user_email: Option<String>,

    /// Act with admin rights
    #[arg(long, global = true)]
    admin: bool,

    /// Enable debug logging on the console
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a dataset for processing
    Submit {
        /// JSON file with the dataset input
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long, default_value_t = 0)]
        priority: i32,

        /// Drop prior results before processing
        #[arg(long)]
        del_first: bool,
    },

    /// Update a stored dataset in place
    Update {
        /// JSON file with the update input
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long, default_value_t = 0)]
        priority: i32,
    },

    /// Delete a dataset and its optical image
    Delete { dataset_id: String },

    /// Report whether an update would need reprocessing
    CheckReprocessing {
        /// JSON file with the update input
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Attach an optical image to a dataset
    AddOpticalImage {
        dataset_id: String,

        /// Image URL, or a path on the image storage service
        #[arg(long)]
        url: String,

        /// Transform as a JSON document
        #[arg(long)]
        transform: Option<String>,
    },

    /// Remove the optical image of a dataset
    DeleteOpticalImage { dataset_id: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::default()
        .with_level(if cli.verbose { LogLevel::Debug } else { LogLevel::Info })
        .with_output(LogOutput::Console)
        .with_files("./logs", "sm-mutate")
        .with_filter(if cli.verbose { "sm_server=debug" } else { "sm_server=info,sqlx=warn" });

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);
    let log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Warning: logging disabled: {}", e);
            None
        },
    };

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {:#}", e);
            2
        },
    };

    // Flush file logs before exiting
    drop(log_guard);
    process::exit(code);
}

/// Run the command; the returned code is 0 on success and 1 on a mutation failure
async fn run(cli: Cli) -> Result<i32> {
    let user = acting_user(&cli)?;

    let config = Config::load()?;
    let ctx = build_context(&config).await?;
    let mut mediator = build_mediator(ctx);

    info!(user = %user.email, admin = user.is_admin(), "Dispatching {:?}", cli.command);

    let outcome: MutationResult<String> = match cli.command {
        Command::Submit {
            input,
            priority,
            del_first,
        } => {
            let command = SubmitDatasetCommand {
                input: read_json(&input)?,
                priority,
                del_first,
                user,
            };
            mediator.send(command).await.map_err(dispatch_error)?
        },
        Command::Update { input, priority } => {
            let command = UpdateDatasetCommand {
                input: read_json(&input)?,
                priority,
                user,
            };
            mediator.send(command).await.map_err(dispatch_error)?
        },
        Command::Delete { dataset_id } => {
            let command = DeleteDatasetCommand { dataset_id, user };
            mediator.send(command).await.map_err(dispatch_error)?
        },
        Command::CheckReprocessing { input } => {
            let query = ReprocessingNeededQuery {
                input: read_json(&input)?,
                user,
            };
            let needed: MutationResult<bool> = mediator.send(query).await.map_err(dispatch_error)?;
            needed.map(|needed| needed.to_string())
        },
        Command::AddOpticalImage {
            dataset_id,
            url,
            transform,
        } => {
            let transform = match transform {
                Some(raw) => serde_json::from_str(&raw).context("Transform is not valid JSON")?,
                None => Value::Null,
            };
            let command = AddOpticalImageCommand {
                dataset_id,
                image_url: url,
                transform,
                user,
            };
            mediator.send(command).await.map_err(dispatch_error)?
        },
        Command::DeleteOpticalImage { dataset_id } => {
            let command = DeleteOpticalImageCommand { dataset_id, user };
            mediator.send(command).await.map_err(dispatch_error)?
        },
    };

    match outcome {
        Ok(body) => {
            println!("{}", body);
            Ok(0)
        },
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&e.payload())?);
            Ok(1)
        },
    }
}

fn acting_user(cli: &Cli) -> Result<User> {
    let email = cli
        .user_email
        .clone()
        .context("--user-email (or SM_USER_EMAIL) is required")?;
    Ok(if cli.admin {
        User::admin(email)
    } else {
        User::new(email)
    })
}

async fn build_context(config: &Config) -> Result<MutationContext> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout_secs))
        .connect(&config.database.url)
        .await
        .context("Failed to connect to the dataset database")?;

    let store = Arc::new(PgDatasetStore::new(pool));
    let schema = MetadataSchema::bundled().context("Bundled metadata schema is invalid")?;

    Ok(MutationContext {
        store: store.clone(),
        permissions: Arc::new(SubmitterPolicy::new(store)),
        registry: Arc::new(HttpMolecularDatabaseRegistry::new(&config.registry)?),
        config_deriver: Arc::new(ProcessingConfigDeriver),
        engine: EngineGateway::new(&config.engine)?,
        schema: Arc::new(schema),
        locks: DatasetLocks::new(),
        image_storage_url: config.image_storage.base_url.clone(),
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

fn dispatch_error<E: std::fmt::Debug>(e: E) -> anyhow::Error {
    anyhow::anyhow!("Request dispatch failed: {:?}", e)
}
