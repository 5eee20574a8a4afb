//! 并发过滤流水线
//!
//! 固定数量的 worker 从共享队列取候选子域名，依次做：
//! 区域泛解析判定（带缓存）→ 子域名自身泛解析探测 → 收集通过者。

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::config::FilterConfig;
use crate::dns::{AddressLookup, RetryingResolver, WildcardProber, ZoneCache};

/// 单个候选名的最终判定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    ZoneWildcard,
    NameWildcard,
    Malformed,
}

/// 一次过滤运行的结果
#[derive(Debug, Default, Clone)]
pub struct FilterReport {
    /// 通过的子域名，顺序取决于调度，不保证与输入一致
    pub accepted: Vec<String>,
    pub zone_wildcard: usize,
    pub name_wildcard: usize,
    pub malformed: usize,
    pub zones_probed: usize,
}

impl FilterReport {
    fn record(&mut self, name: String, verdict: Verdict) {
        match verdict {
            Verdict::Accepted => self.accepted.push(name),
            Verdict::ZoneWildcard => self.zone_wildcard += 1,
            Verdict::NameWildcard => self.name_wildcard += 1,
            Verdict::Malformed => self.malformed += 1,
        }
    }

    fn merge(&mut self, other: FilterReport) {
        self.accepted.extend(other.accepted);
        self.zone_wildcard += other.zone_wildcard;
        self.name_wildcard += other.name_wildcard;
        self.malformed += other.malformed;
    }

    pub fn rejected(&self) -> usize {
        self.zone_wildcard + self.name_wildcard + self.malformed
    }

    pub fn total(&self) -> usize {
        self.accepted.len() + self.rejected()
    }
}

/// Parent zone of `name`: everything after the first label.
///
/// Names without a separator, or with an empty first label or empty zone,
/// have no usable zone and yield `None`.
pub fn zone_of(name: &str) -> Option<&str> {
    let (label, zone) = name.split_once('.')?;
    if label.is_empty() || zone.is_empty() || zone == "." {
        return None;
    }
    Some(zone)
}

#[derive(Clone)]
pub struct FilterPipeline {
    cache: Arc<ZoneCache>,
    prober: Arc<WildcardProber>,
    workers: usize,
}

impl FilterPipeline {
    pub fn new(lookup: Arc<dyn AddressLookup>, config: &FilterConfig) -> Self {
        let resolver = RetryingResolver::new(lookup, config.max_attempts);
        let prober = Arc::new(WildcardProber::new(resolver, config.label_length));
        Self {
            cache: Arc::new(ZoneCache::new(prober.clone())),
            prober,
            workers: config.workers,
        }
    }

    pub fn cache(&self) -> &ZoneCache {
        &self.cache
    }

    pub async fn evaluate(&self, name: &str) -> Verdict {
        let Some(zone) = zone_of(name) else {
            warn!(name = name, "malformed candidate name, skipping");
            return Verdict::Malformed;
        };

        if self.cache.classify(zone).await {
            debug!(name = name, zone = zone, "rejected: wildcard zone");
            return Verdict::ZoneWildcard;
        }

        if self.prober.probe(name).await {
            debug!(name = name, "rejected: wildcard name");
            return Verdict::NameWildcard;
        }

        debug!(name = name, "accepted");
        Verdict::Accepted
    }

    /// Filters `candidates` with up to `workers` concurrent tasks.
    pub async fn run(&self, candidates: Vec<String>) -> FilterReport {
        let total = candidates.len();
        let workers = self.workers.min(total);
        let mut report = FilterReport::default();
        if workers == 0 {
            return report;
        }

        let (tx, rx) = mpsc::channel::<String>(workers * 2);
        let rx = Arc::new(Mutex::new(rx));

        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let rx = rx.clone();
            let pipeline = self.clone();
            handles.push(tokio::spawn(async move {
                let mut local = FilterReport::default();
                loop {
                    let next = rx.lock().await.recv().await;
                    let Some(name) = next else {
                        break;
                    };
                    let verdict = pipeline.evaluate(&name).await;
                    local.record(name, verdict);
                }
                local
            }));
        }

        for name in candidates {
            if tx.send(name).await.is_err() {
                break;
            }
        }
        drop(tx);

        for handle in handles {
            match handle.await {
                Ok(local) => report.merge(local),
                Err(e) => warn!(error = %e, "filter worker failed"),
            }
        }
        report.zones_probed = self.cache.probes();

        info!(
            candidates = report.total(),
            accepted = report.accepted.len(),
            rejected = report.rejected(),
            zone_wildcard = report.zone_wildcard,
            name_wildcard = report.name_wildcard,
            malformed = report.malformed,
            zones_probed = report.zones_probed,
            "filtering finished"
        );
        report
    }
}
