pub mod cache;
pub mod pool;
pub mod resolver;
pub mod wildcard;

use async_trait::async_trait;

use crate::common::SiftError;

pub use cache::ZoneCache;
pub use pool::ResolverPool;
pub use resolver::{RetryingResolver, UdpResolver};
pub use wildcard::WildcardProber;

/// 单次 A 记录查询
///
/// `Ok(true)` 表示 NOERROR 且至少一条应答，`Ok(false)` 表示不存在或查询失败，
/// `Err` 只用于可重试的超时。
#[async_trait]
pub trait AddressLookup: Send + Sync {
    async fn lookup(&self, name: &str) -> Result<bool, SiftError>;
}
