use anyhow::Context;
use clap::{Parser, Subcommand};
use shelfmate::{RecommendQuery, RecommendationService, ShelfmateConfig};
use shelfmate_storage::DataStore;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Complementary and similar product recommendations
#[derive(Parser, Debug)]
#[command(name = "shelfmate")]
#[command(about = "Complementary and similar product recommendations", long_about = None)]
struct Args {
    /// Path to a JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the data directory (overrides the config file)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Log level (RUST_LOG takes precedence when set)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recommend products for a parent product id
    Recommend {
        /// Parent product id
        #[arg(long)]
        parent_id: Option<String>,

        /// Look for complementary products instead of similar ones
        #[arg(long)]
        complementary: bool,

        /// Number of recommendations
        #[arg(short, long, default_value_t = 3, allow_negative_numbers = true)]
        k: i64,

        /// Number of similarity-table candidates to rerank
        #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
        pool_size: i64,

        /// Reranking timeout in milliseconds (overrides the config file)
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Print the candidate pool and ranking strategy along with the ids
        #[arg(long)]
        explain: bool,
    },
    /// Compile the raw data files into a dataset snapshot
    Snapshot,
}

fn init_tracing(log_level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let mut config = match &args.config {
        Some(path) => ShelfmateConfig::load(path)
            .with_context(|| format!("failed to load config {:?}", path))?,
        None => ShelfmateConfig::default(),
    };
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }

    info!("Starting Shelfmate v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {:?}", config.data_dir);

    match args.command {
        Command::Snapshot => {
            let store = DataStore::open_raw(&config.data_dir)
                .context("failed to load raw data files")?;
            let snapshot = store.create_snapshot().context("failed to write snapshot")?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Command::Recommend {
            parent_id,
            complementary,
            k,
            pool_size,
            timeout_ms,
            explain,
        } => {
            if timeout_ms.is_some() {
                config.request_timeout_ms = timeout_ms;
            }

            // Built and dropped outside any async runtime: the HTTP encoder
            // owns a blocking client that must not be dropped inside one.
            let service = RecommendationService::from_config(&config)
                .context("failed to initialize recommendation service")?;

            let query = RecommendQuery {
                parent_id,
                complementary,
                k: Some(k),
                pool_size: Some(pool_size),
            };

            let recommendation = service.recommend_blocking(query)?;
            if explain {
                println!("{}", serde_json::to_string_pretty(&recommendation)?);
            } else {
                println!("{}", serde_json::to_string(&recommendation.ids)?);
            }

            service.shutdown();
        }
    }

    Ok(())
}
