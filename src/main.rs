use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use subsift::app::App;
use subsift::config::FilterConfig;

/// Drop subdomains that only resolve because of wildcard DNS.
#[derive(Debug, Parser)]
#[command(name = "subsift", version)]
struct Cli {
    /// File with one candidate subdomain per line
    input: PathBuf,

    /// YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of concurrent filter workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Attempts per query before a timeout counts as "not found"
    #[arg(short = 'a', long)]
    max_attempts: Option<u32>,

    /// Per-query timeout in milliseconds
    #[arg(short = 't', long)]
    timeout_ms: Option<u64>,

    /// Upstream resolver (ip or ip:port); repeat to replace the built-in list
    #[arg(short = 'r', long = "resolver")]
    resolvers: Vec<String>,

    /// Length of the random label used for wildcard checks
    #[arg(short = 'l', long)]
    label_length: Option<usize>,

    /// Log level used when RUST_LOG is not set
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<(PathBuf, FilterConfig)> {
        let mut config = match &self.config {
            Some(path) => subsift::config::load_config(path)?,
            None => FilterConfig::default(),
        };
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(attempts) = self.max_attempts {
            config.max_attempts = attempts;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.query_timeout_ms = timeout_ms;
        }
        if !self.resolvers.is_empty() {
            config.resolvers = self.resolvers;
        }
        if let Some(len) = self.label_length {
            config.label_length = len;
        }
        if let Some(level) = self.log_level {
            config.log.level = level;
        }
        config.validate()?;
        Ok((self.input, config))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let (input, config) = Cli::parse().into_config()?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log.level)),
        )
        .init();

    info!(input = %input.display(), "subsift starting");

    let app = App::new(config)?;
    let report = app.run(&input).await?;

    for name in &report.accepted {
        println!("{}", name);
    }

    Ok(())
}
