use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::common::SiftError;

/// 上游递归 DNS 服务器池，按轮询方式分配
pub struct ResolverPool {
    endpoints: Vec<SocketAddr>,
    counter: AtomicUsize,
}

impl ResolverPool {
    pub fn new(endpoints: Vec<SocketAddr>) -> Result<Self, SiftError> {
        if endpoints.is_empty() {
            return Err(SiftError::Config("resolver pool cannot be empty".into()));
        }
        Ok(Self {
            endpoints,
            counter: AtomicUsize::new(0),
        })
    }

    /// Returns the endpoint at `cursor % len` and advances the cursor.
    pub fn next(&self) -> SocketAddr {
        let idx = self.counter.fetch_add(1, Ordering::Relaxed) % self.endpoints.len();
        self.endpoints[idx]
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }
}
