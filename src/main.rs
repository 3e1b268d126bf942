use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod log;
mod model;
mod profiler;
mod render;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "collectionstats")]
#[command(about = "Per-collection MongoDB operation rates from the database profiler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn profiling on for a while, then report what each collection did.
    Profile {
        /// The database to connect to, e.g. `test`.
        database: String,

        /// Hostname (or IP) of the MongoDB server.
        #[arg(short = 'o', long, default_value = config::DEFAULT_HOST)]
        host: String,

        /// Port of the MongoDB server.
        #[arg(short = 'p', long, default_value_t = config::DEFAULT_PORT)]
        port: u16,

        /// Full connection string; overrides --host and --port.
        #[arg(long)]
        uri: Option<String>,

        /// Number of seconds to keep profiling on.
        #[arg(short = 'i', long, default_value_t = config::DEFAULT_INTERVAL_SECS)]
        interval: u64,

        /// Maximum size of the profiling collection, in bytes.
        #[arg(short = 's', long, default_value_t = config::DEFAULT_SIZE_BYTES)]
        size: u64,

        /// Maximum number of documents to keep in the profiling collection.
        #[arg(short = 'm', long, default_value_t = config::DEFAULT_MAX_OBJECTS)]
        max_objects: u64,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Report on an exported system.profile dump (JSON array or JSON lines).
    Report {
        #[arg(long)]
        log: String,

        /// Length of the window the dump covers, in seconds.
        #[arg(short = 'i', long)]
        interval: f64,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// Print rates as JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Maximum table width, in columns.
    #[arg(long, default_value_t = config::DEFAULT_MAX_WIDTH)]
    max_width: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Profile {
            database,
            host,
            port,
            uri,
            interval,
            size,
            max_objects,
            output,
        } => {
            let cfg = config::Config {
                host,
                port,
                uri,
                database,
                interval_secs: interval,
                size_bytes: size,
                max_objects,
            };
            cfg.validate()?;

            // 1) Profile everything for the window, then restore the level.
            let session = profiler::ProfilerSession::connect(&cfg).await?;
            let summary = session.run_window(&cfg).await?;
            tracing::info!(
                "collected {} profiling data points, profiling level back at {}",
                summary.collected,
                summary.original_level
            );
            if summary.possibly_rolled_over {
                tracing::warn!(
                    "the profiling collection holds at most {} documents and may have \
                     dropped the oldest ones; consider increasing --size and --max-objects",
                    cfg.max_objects
                );
            }

            // 2) Aggregate straight off the cursor.
            tracing::info!("aggregating {}", profiler::PROFILE_COLLECTION);
            let mut agg = model::ProfileAggregator::new();
            session.fold_entries(&mut agg).await?;
            tracing::debug!(seen = agg.seen(), skipped = agg.skipped(), "entries read");
            let counts = agg.finish();

            // 3) Normalize by the configured window and print.
            let rates = model::to_rates(&counts, cfg.interval_secs as f64)?;
            emit(&rates, &output)?;
        }
        Commands::Report {
            log: path,
            interval,
            output,
        } => {
            // 1) Parse dump.
            let entries = log::parse_dump_file(&path)?;
            tracing::info!("read {} profiling entries from {}", entries.len(), path);

            // 2) Aggregate.
            let counts = model::aggregate(&entries);

            // 3) Normalize and print.
            let rates = model::to_rates(&counts, interval)?;
            emit(&rates, &output)?;
        }
    }

    Ok(())
}

fn emit(rates: &model::Rates, output: &OutputArgs) -> Result<()> {
    if output.json {
        println!("{}", render::render_json(rates)?);
    } else {
        print!("{}", render::render_table(rates, output.max_width));
    }
    Ok(())
}
