use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use shopify_extract::extraction::{ExtractionRequest, ExtractionStatus, Extractor};
use shopify_extract::query::TEMPLATES;
use shopify_extract::{
    AccessToken, ApiVersion, ClientId, Credentials, ExtractorConfig, HostUrl, ShopDomain,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Extract data from a Shopify store through the Admin GraphQL API.
#[derive(Debug, Parser)]
#[command(name = "shopify-extract", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Read credentials from this key=value file instead of the environment
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Directory for extraction output and the schema cache
    #[arg(long, global = true, env = "SHOPIFY_EXTRACT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Send requests to this host instead of the store domain
    #[arg(long, global = true)]
    api_host: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run an extraction and write the records to the data directory
    Extract(ExtractArgs),
    /// Print the query an extraction would run
    Query {
        /// Resource (e.g. `products`) or template id
        target: String,
        /// Comma-separated node fields for a generated query
        #[arg(long, value_delimiter = ',')]
        fields: Option<Vec<String>>,
    },
    /// Inspect or reset the schema cache
    Schema {
        #[command(subcommand)]
        action: SchemaAction,
    },
    /// List the predefined templates
    Templates,
    /// List saved extraction files
    Files,
    /// Write credentials to a key=value file
    SaveCredentials(SaveCredentialsArgs),
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Resource (e.g. `products`) or template id
    target: String,
    /// Comma-separated node fields for a generated query
    #[arg(long, value_delimiter = ',')]
    fields: Option<Vec<String>>,
    /// Run the query in this file as written
    #[arg(long)]
    query_file: Option<PathBuf>,
    /// Also write a CSV export
    #[arg(long)]
    csv: bool,
    /// Keep every fetched page under `pages/`
    #[arg(long)]
    persist_pages: bool,
    /// Records per page
    #[arg(long)]
    page_size: Option<u32>,
    /// Concurrent secondary queries per batch
    #[arg(long)]
    batch_size: Option<usize>,
}

#[derive(Debug, Subcommand)]
enum SchemaAction {
    /// Show the cached schema's version, age and size
    Show,
    /// Delete the cache file
    Clear,
    /// Introspect again and rewrite the cache
    Refresh,
}

#[derive(Debug, Args)]
struct SaveCredentialsArgs {
    /// Store name or `*.myshopify.com` domain
    #[arg(long)]
    store: String,
    /// Admin API access token
    #[arg(long)]
    token: String,
    /// App client ID
    #[arg(long)]
    client_id: Option<String>,
    /// API version, e.g. `2025-01`
    #[arg(long)]
    api_version: Option<String>,
    /// Destination file
    #[arg(long, default_value = ".env")]
    path: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(error) => {
            tracing::debug!(?error);
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<ExitCode> {
    match &cli.command {
        Command::Templates => {
            for template in TEMPLATES {
                let kind = if template.is_dependent() {
                    "dependent"
                } else {
                    "plain"
                };
                println!(
                    "{:<26} {:<10} {} ({})",
                    template.id, kind, template.label, template.resource
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::SaveCredentials(args) => {
            let api_version = args
                .api_version
                .as_deref()
                .map_or_else(|| Ok(ApiVersion::latest()), str::parse)?;
            let credentials = Credentials::new(
                ShopDomain::new(args.store.as_str())?,
                AccessToken::new(args.token.as_str())?,
                args.client_id.as_deref().map(ClientId::new).transpose()?,
                api_version,
            );
            credentials.write_env_file(&args.path)?;
            println!("Saved credentials to {}", args.path.display());
            Ok(ExitCode::SUCCESS)
        }
        Command::Extract(args) => {
            let extractor = Extractor::new(config(&cli, Some(args))?);
            extract(&extractor, args).await
        }
        Command::Query { target, fields } => {
            let extractor = Extractor::new(config(&cli, None)?);
            let resolved = extractor.resolve_query(target, fields.as_deref()).await?;
            eprintln!("# origin: {:?}, fields: {}", resolved.origin, resolved.fields.join(", "));
            println!("{}", resolved.query);
            Ok(ExitCode::SUCCESS)
        }
        Command::Schema { action } => {
            let extractor = Extractor::new(config(&cli, None)?);
            let info = match action {
                SchemaAction::Show => extractor.schema_cache_info()?,
                SchemaAction::Refresh => extractor.refresh_schema().await?,
                SchemaAction::Clear => {
                    if extractor.clear_schema_cache()? {
                        println!("Schema cache cleared");
                    } else {
                        println!("No schema cache to clear");
                    }
                    return Ok(ExitCode::SUCCESS);
                }
            };
            match info {
                Some(info) => println!("{}", serde_json::to_string_pretty(&info)?),
                None => println!("No schema cache"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Files => {
            let extractor = Extractor::new(config(&cli, None)?);
            for path in extractor.store().list()? {
                println!("{}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn config(cli: &Cli, extract: Option<&ExtractArgs>) -> CliResult<ExtractorConfig> {
    let credentials = match &cli.env_file {
        Some(path) => Credentials::from_env_file(path)?,
        None => {
            // A missing .env is fine; the variables may already be set.
            let _ = dotenvy::dotenv();
            Credentials::from_env()?
        }
    };

    let mut builder = ExtractorConfig::builder().credentials(credentials);
    if let Some(dir) = &cli.data_dir {
        builder = builder.data_dir(dir);
    }
    if let Some(host) = &cli.api_host {
        builder = builder.api_host(HostUrl::new(host.as_str())?);
    }
    if let Some(args) = extract {
        builder = builder.persist_pages(args.persist_pages);
        if let Some(size) = args.page_size {
            builder = builder.page_size(size);
        }
        if let Some(size) = args.batch_size {
            builder = builder.batch_size(size);
        }
    }
    Ok(builder.build()?)
}

async fn extract(extractor: &Extractor, args: &ExtractArgs) -> CliResult<ExitCode> {
    let mut request = if shopify_extract::query::find_template(&args.target).is_some() {
        ExtractionRequest::template(&args.target)
    } else {
        ExtractionRequest::resource(&args.target)
    };
    if let Some(path) = &args.query_file {
        request = request.with_query(std::fs::read_to_string(path)?);
    }
    if let Some(fields) = &args.fields {
        request = request.with_fields(fields.clone());
    }

    let session = extractor.start(request)?;
    let mut last_progress = 0;
    loop {
        tokio::time::sleep(Duration::from_millis(500)).await;
        let snapshot = extractor.status(session)?;
        if snapshot.status.is_terminal() {
            break;
        }
        if snapshot.progress != last_progress {
            last_progress = snapshot.progress;
            eprintln!(
                "[{:>3}%] {} ({} records)",
                snapshot.progress, snapshot.status, snapshot.records_processed
            );
        }
    }

    let snapshot = extractor.wait(session).await?;
    match snapshot.status {
        ExtractionStatus::Completed => {
            let records = snapshot.data.unwrap_or_default();
            if let Some(path) = &snapshot.output_path {
                println!("{} records written to {}", records.len(), path.display());
            }
            if args.csv {
                let path = extractor.store().save_csv(&args.target, &records)?;
                println!("CSV written to {}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        ExtractionStatus::Cancelled => {
            eprintln!("Extraction cancelled");
            Ok(ExitCode::FAILURE)
        }
        _ => {
            eprintln!(
                "Extraction failed: {}",
                snapshot.error.as_deref().unwrap_or("unknown error")
            );
            Ok(ExitCode::FAILURE)
        }
    }
}
