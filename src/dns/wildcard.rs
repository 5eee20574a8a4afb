//! 泛解析（wildcard）探测
//!
//! 在目标域名下拼一个随机的、不可能被配置过的标签去查询。
//! 如果这个名字也能解析，说明目标是泛解析区域。

use rand::Rng;
use tracing::debug;

use super::resolver::RetryingResolver;

pub struct WildcardProber {
    resolver: RetryingResolver,
    label_length: usize,
}

impl WildcardProber {
    pub fn new(resolver: RetryingResolver, label_length: usize) -> Self {
        Self {
            resolver,
            label_length,
        }
    }

    /// Returns `true` when a random label under `target` resolves.
    pub async fn probe(&self, target: &str) -> bool {
        let probe_name = format!("{}.{}", random_label(self.label_length), target);
        let wildcard = self.resolver.resolve(&probe_name).await;
        debug!(
            target = target,
            probe = probe_name.as_str(),
            wildcard = wildcard,
            "wildcard probe"
        );
        wildcard
    }
}

/// 随机小写字母标签
pub fn random_label(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| rng.gen_range(b'a'..=b'z') as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::common::SiftError;
    use crate::dns::AddressLookup;

    #[test]
    fn label_is_lowercase_ascii() {
        for len in [1, 6, 8, 63] {
            let label = random_label(len);
            assert_eq!(label.len(), len);
            assert!(label.bytes().all(|b| b.is_ascii_lowercase()));
        }
    }

    #[test]
    fn labels_vary() {
        let a = random_label(12);
        let b = random_label(12);
        assert_ne!(a, b);
    }

    struct RecordingLookup {
        seen: Mutex<Vec<String>>,
        answer: bool,
    }

    #[async_trait]
    impl AddressLookup for RecordingLookup {
        async fn lookup(&self, name: &str) -> Result<bool, SiftError> {
            self.seen.lock().unwrap().push(name.to_string());
            Ok(self.answer)
        }
    }

    #[tokio::test]
    async fn probe_queries_random_child_of_target() {
        let lookup = Arc::new(RecordingLookup {
            seen: Mutex::new(Vec::new()),
            answer: true,
        });
        let prober = WildcardProber::new(RetryingResolver::new(lookup.clone(), 3), 6);

        assert!(prober.probe("example.com").await);

        let seen = lookup.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (label, rest) = seen[0].split_once('.').unwrap();
        assert_eq!(label.len(), 6);
        assert_eq!(rest, "example.com");
    }

    #[tokio::test]
    async fn negative_probe_means_not_wildcard() {
        let lookup = Arc::new(RecordingLookup {
            seen: Mutex::new(Vec::new()),
            answer: false,
        });
        let prober = WildcardProber::new(RetryingResolver::new(lookup, 3), 8);
        assert!(!prober.probe("www.example.com").await);
    }
}
