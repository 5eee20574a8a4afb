pub mod input;
pub mod pipeline;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::config::FilterConfig;
use crate::dns::{AddressLookup, ResolverPool, UdpResolver};

use pipeline::FilterPipeline;

pub use pipeline::{FilterReport, Verdict};

pub struct App {
    pipeline: FilterPipeline,
}

impl App {
    pub fn new(config: FilterConfig) -> Result<Self> {
        config.validate()?;
        let pool = Arc::new(ResolverPool::new(config.resolver_addrs()?)?);
        info!(
            resolvers = pool.len(),
            workers = config.workers,
            timeout_ms = config.query_timeout_ms,
            "resolver pool ready"
        );
        let lookup = Arc::new(UdpResolver::new(pool, config.query_timeout()));
        Ok(Self::with_lookup(&config, lookup))
    }

    /// Builds the app over an arbitrary lookup backend.
    pub fn with_lookup(config: &FilterConfig, lookup: Arc<dyn AddressLookup>) -> Self {
        Self {
            pipeline: FilterPipeline::new(lookup, config),
        }
    }

    pub fn pipeline(&self) -> &FilterPipeline {
        &self.pipeline
    }

    pub async fn run(&self, input: &Path) -> Result<FilterReport> {
        let candidates = input::load_candidates(input)?;
        info!(count = candidates.len(), "candidates loaded");
        Ok(self.pipeline.run(candidates).await)
    }
}
