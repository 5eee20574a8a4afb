use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::debug;

use super::wildcard::WildcardProber;

enum ZoneState {
    Ready(bool),
    /// 有任务正在探测；等待者订阅该 sender，leader 放弃时 sender 随条目一起被丢弃
    Pending(watch::Sender<Option<bool>>),
}

/// 区域泛解析判定缓存，进程内单次运行有效
pub struct ZoneCache {
    prober: Arc<WildcardProber>,
    zones: Mutex<HashMap<String, ZoneState>>,
    probes: AtomicUsize,
}

/// Zones are compared case-insensitively and without the root dot.
pub fn normalize_zone(zone: &str) -> String {
    zone.trim_end_matches('.').to_ascii_lowercase()
}

impl ZoneCache {
    pub fn new(prober: Arc<WildcardProber>) -> Self {
        Self {
            prober,
            zones: Mutex::new(HashMap::new()),
            probes: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ZoneState>> {
        self.zones.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, zone: &str) -> Option<bool> {
        match self.lock().get(&normalize_zone(zone)) {
            Some(ZoneState::Ready(wildcard)) => Some(*wildcard),
            _ => None,
        }
    }

    /// Number of zone probes actually sent upstream.
    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::Relaxed)
    }

    /// Returns whether `zone` is a wildcard zone, probing it on first use.
    ///
    /// Concurrent callers for the same zone share one probe. If the probing
    /// task goes away before finishing, one of the waiters takes over.
    pub async fn classify(&self, zone: &str) -> bool {
        let key = normalize_zone(zone);

        loop {
            let mut rx = {
                let mut zones = self.lock();
                match zones.get(&key) {
                    Some(ZoneState::Ready(wildcard)) => {
                        debug!(zone = key.as_str(), wildcard = *wildcard, "zone cache hit");
                        return *wildcard;
                    }
                    Some(ZoneState::Pending(tx)) => tx.subscribe(),
                    None => {
                        let (tx, _) = watch::channel(None);
                        zones.insert(key.clone(), ZoneState::Pending(tx));
                        break;
                    }
                }
            };

            if rx.changed().await.is_ok() {
                let result = *rx.borrow();
                if let Some(wildcard) = result {
                    debug!(zone = key.as_str(), wildcard = wildcard, "zone cache hit after wait");
                    return wildcard;
                }
            }
            debug!(zone = key.as_str(), "zone probe abandoned, retrying");
        }

        // leader：guard 保证任何退出路径都会清理 Pending 条目
        let guard = LeaderGuard {
            cache: self,
            key: &key,
            finished: false,
        };
        debug!(zone = key.as_str(), "classifying zone");
        self.probes.fetch_add(1, Ordering::Relaxed);
        let wildcard = self.prober.probe(&key).await;
        guard.finish(wildcard);
        wildcard
    }
}

struct LeaderGuard<'a> {
    cache: &'a ZoneCache,
    key: &'a str,
    finished: bool,
}

impl LeaderGuard<'_> {
    fn finish(mut self, wildcard: bool) {
        let previous = self
            .cache
            .lock()
            .insert(self.key.to_string(), ZoneState::Ready(wildcard));
        if let Some(ZoneState::Pending(tx)) = previous {
            let _ = tx.send(Some(wildcard));
        }
        self.finished = true;
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut zones = self.cache.lock();
        if matches!(zones.get(self.key), Some(ZoneState::Pending(_))) {
            // 丢弃 sender 即唤醒所有等待者
            zones.remove(self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::common::SiftError;
    use crate::dns::resolver::RetryingResolver;
    use crate::dns::AddressLookup;

    /// 计数的慢速 lookup，后缀匹配 `wildcard_suffix` 的名字返回 true
    struct SlowLookup {
        count: Arc<AtomicUsize>,
        wildcard_suffix: &'static str,
        delay: Duration,
    }

    #[async_trait]
    impl AddressLookup for SlowLookup {
        async fn lookup(&self, name: &str) -> Result<bool, SiftError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(name.ends_with(self.wildcard_suffix))
        }
    }

    fn cache_with(delay_ms: u64) -> (Arc<ZoneCache>, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let lookup = SlowLookup {
            count: count.clone(),
            wildcard_suffix: ".wild.test",
            delay: Duration::from_millis(delay_ms),
        };
        let prober = WildcardProber::new(RetryingResolver::new(Arc::new(lookup), 3), 6);
        (Arc::new(ZoneCache::new(Arc::new(prober))), count)
    }

    #[tokio::test]
    async fn classification_is_memoized() {
        let (cache, count) = cache_with(0);

        assert!(cache.classify("wild.test").await);
        assert!(!cache.classify("tame.test").await);
        assert_eq!(count.load(Ordering::SeqCst), 2);

        for _ in 0..5 {
            assert!(cache.classify("wild.test").await);
            assert!(!cache.classify("tame.test").await);
        }
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(cache.get("wild.test"), Some(true));
        assert_eq!(cache.get("unknown.test"), None);
    }

    #[tokio::test]
    async fn zone_keys_ignore_case_and_root_dot() {
        let (cache, count) = cache_with(0);

        assert!(cache.classify("Wild.TEST").await);
        assert!(cache.classify("wild.test.").await);
        assert!(cache.classify("wild.test").await);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get("WILD.test"), Some(true));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_misses_probe_once() {
        let (cache, count) = cache_with(50);

        let mut handles = Vec::new();
        for _ in 0..32 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.classify("wild.test").await }));
        }
        for h in handles {
            assert!(h.await.unwrap());
        }

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(cache.probes(), 1);
    }

    #[tokio::test]
    async fn cancelled_leader_does_not_block_later_callers() {
        let (cache, count) = cache_with(100);

        let first = tokio::time::timeout(Duration::from_millis(10), cache.classify("wild.test")).await;
        assert!(first.is_err());
        assert_eq!(cache.get("wild.test"), None);

        let second = tokio::time::timeout(Duration::from_secs(2), cache.classify("wild.test"))
            .await
            .expect("classify must finish after the first caller was cancelled");
        assert!(second);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn waiter_takes_over_from_aborted_leader() {
        let (cache, _count) = cache_with(100);

        let leader = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.classify("tame.test").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let waiter = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.classify("tame.test").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        leader.abort();

        let result = tokio::time::timeout(Duration::from_secs(2), waiter)
            .await
            .expect("waiter must not hang")
            .unwrap();
        assert!(!result);
        assert_eq!(cache.get("tame.test"), Some(false));
    }
}
