use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::fmt::Debug;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use vast_loader::events::{EventKind, LoaderEvent};
use vast_loader::transport::{HttpTransport, Transport};
use vast_loader::{parser, stitcher, LoadOptions, Loader};

/// Resolve VAST wrapper chains
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and parse a single VAST tag without following wrappers
    Parse {
        #[command(flatten)]
        fetch: FetchArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Follow wrappers until an InLine ad is found and print the chain
    Load {
        #[command(flatten)]
        chain: ChainArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Log every loader event as it happens
        #[arg(long)]
        trace_events: bool,
    },

    /// Load the chain and merge the wrappers' tracking into the InLine ad
    Stitch {
        #[command(flatten)]
        chain: ChainArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args)]
struct FetchArgs {
    /// URL, file:// URI or path of the VAST tag
    #[arg(short, long)]
    input: String,

    /// Per-request timeout in milliseconds
    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,
}

impl FetchArgs {
    fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Fetch flags plus the wrapper-following limit
#[derive(Args)]
struct ChainArgs {
    #[command(flatten)]
    fetch: FetchArgs,

    /// Maximum number of tags to fetch
    #[arg(long, default_value_t = vast_loader::loader::DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

impl ChainArgs {
    fn options(&self) -> LoadOptions {
        LoadOptions::default()
            .with_max_depth(self.max_depth)
            .with_timeout(self.fetch.timeout())
    }
}

#[derive(Args)]
struct OutputArgs {
    /// Pretty print the output
    #[arg(short, long)]
    pretty: bool,

    /// Print JSON instead of Rust debug output
    #[arg(long)]
    json: bool,

    /// Output file path (if not specified, prints to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl OutputArgs {
    async fn emit<T: Serialize + Debug>(&self, value: &T) -> Result<(), Box<dyn std::error::Error>> {
        let rendered = match (self.json, self.pretty) {
            (true, true) => serde_json::to_string_pretty(value)?,
            (true, false) => serde_json::to_string(value)?,
            (false, true) => format!("{:#?}", value),
            (false, false) => format!("{:?}", value),
        };

        if let Some(path) = &self.output {
            tokio::fs::write(path, rendered).await?;
            log::info!("Output written to {}", path.display());
        } else {
            println!("{}", rendered);
        }
        Ok(())
    }
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Also picks up the library's `log` records
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn trace_events(loader: &mut Loader) {
    for kind in EventKind::ALL {
        loader.on(kind, |event| match event {
            LoaderEvent::WillFetch { uri } => log::info!("willFetch {}", uri),
            LoaderEvent::DidFetch { uri, body } => log::info!("didFetch {} ({} bytes)", uri, body.len()),
            LoaderEvent::WillParse { uri, .. } => log::info!("willParse {}", uri),
            LoaderEvent::DidParse { document } => {
                log::info!("didParse {} as {:?}", document.uri, document.kind)
            }
            LoaderEvent::Error { error } => {
                log::error!("error (VAST code {}): {}", error.vast_code(), error)
            }
        });
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Parse { fetch, output } => {
            let transport = HttpTransport::new(fetch.timeout())?;
            let content = transport.fetch(&fetch.input).await?;
            let vast = parser::parse_vast(&content)?;
            output.emit(&vast).await?;
        }
        Commands::Load {
            chain: args,
            output,
            trace_events: trace,
        } => {
            let mut loader = Loader::http(args.options())?;
            if *trace {
                trace_events(&mut loader);
            }
            let chain = loader.load(&args.fetch.input).await?;
            output.emit(&chain).await?;
        }
        Commands::Stitch { chain: args, output } => {
            let chain = vast_loader::load(&args.fetch.input, args.options()).await?;
            let vast = stitcher::stitch(&chain)?;
            output.emit(&vast).await?;
        }
    }

    Ok(())
}
