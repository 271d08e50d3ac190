use bucket_thumbs::config::{self, PipelineConfig};
use bucket_thumbs::dispatch::{Dispatcher, PipelineError};
use bucket_thumbs::imaging::RustCodec;
use bucket_thumbs::outcome::InvocationOutcome;
use bucket_thumbs::store::{FsStore, ObjectStore, S3Store};
use bucket_thumbs::{offload, output, plan};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bucket-thumbs")]
#[command(about = "Event-triggered thumbnail fan-out for object storage")]
#[command(long_about = "\
Event-triggered thumbnail fan-out for object storage

Each invocation handles one object-created event: the image is fetched,
decoded once, and resized into every configured size concurrently. Variants
are written to the source bucket's sibling (source name + suffix) under
\"{size}_{key}\", keeping the source format and content type.

  photos/sunset.jpg (4000x3000)
    → photos-resized/120_sunset.jpg   (160x120)
    → photos-resized/512_sunset.jpg   (683x512)
    → photos-resized/1024_sunset.jpg  (1366x1024)

Objects with a missing or unsupported extension are skipped, which counts as
success. The exit status is non-zero when any variant failed or the source
could not be processed.

Run 'bucket-thumbs gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Pipeline config file (stock defaults when omitted)
    #[arg(long, env = "BUCKET_THUMBS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log line format (logs go to stderr; filter with RUST_LOG)
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum StoreKind {
    /// Local directory, one subdirectory per bucket
    Fs,
    /// Amazon S3, configured from the standard AWS environment
    S3,
}

#[derive(clap::Args)]
struct InvokeArgs {
    /// Event JSON file, or `-` to read it from stdin
    #[arg(long, default_value = "-")]
    event: String,

    /// Object store backend
    #[arg(long, value_enum, default_value_t = StoreKind::Fs)]
    store: StoreKind,

    /// Root directory for the `fs` store
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Print the outcome as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Handle one object-created event
    Invoke(InvokeArgs),
    /// Show the variants that would be produced for a source size
    Plan {
        /// Source width in pixels
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        width: u32,
        /// Source height in pixels
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        height: u32,
        /// Source object key
        #[arg(long, default_value = "image.jpg")]
        key: String,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Command::Invoke(args) => {
            let pipeline = config::load_config(cli.config.as_deref())?;
            offload::init_thread_pool(config::effective_threads(&pipeline.processing));
            let event = read_event(&args.event)?;

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            match runtime.block_on(invoke(&args, pipeline, &event)) {
                Ok(outcome) => {
                    if args.json {
                        println!("{}", serde_json::to_string_pretty(&outcome)?);
                    } else {
                        output::print_outcome(&outcome);
                    }
                    if outcome.is_failure() {
                        std::process::exit(1);
                    }
                }
                Err(e) => {
                    if args.json {
                        let report = serde_json::json!({
                            "status": "error",
                            "error": e.to_string(),
                            "retriable": e.is_retriable(),
                        });
                        println!("{}", serde_json::to_string_pretty(&report)?);
                    }
                    return Err(e.into());
                }
            }
        }
        Command::Plan { width, height, key } => {
            let pipeline = config::load_config(cli.config.as_deref())?;
            let plans = plan::plan_all((width, height), &pipeline.variants.sizes, &key);
            output::print_plans((width, height), &key, &plans);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

async fn invoke(
    args: &InvokeArgs,
    pipeline: PipelineConfig,
    event: &str,
) -> Result<InvocationOutcome, PipelineError> {
    let store: Arc<dyn ObjectStore> = match args.store {
        StoreKind::Fs => Arc::new(FsStore::new(args.root.clone())),
        StoreKind::S3 => Arc::new(S3Store::from_env().await),
    };
    let dispatcher = Dispatcher::new(Arc::new(RustCodec::new()), store, pipeline);
    dispatcher.handle_json(event).await
}

fn read_event(source: &str) -> std::io::Result<String> {
    if source == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(source)
    }
}

/// Logs go to stderr so `--json` output on stdout stays machine-readable.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(bucket_thumbs::DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
