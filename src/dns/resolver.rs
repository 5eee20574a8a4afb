use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_resolver::proto::rr::{Name, RecordType};
use hickory_resolver::proto::serialize::binary::BinEncodable;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::common::SiftError;

use super::pool::ResolverPool;
use super::AddressLookup;

const MAX_UDP_PAYLOAD: usize = 4096;

/// 基于 UDP 的单次 A 记录查询，上游按轮询从 [`ResolverPool`] 选取
pub struct UdpResolver {
    pool: Arc<ResolverPool>,
    timeout: Duration,
}

impl UdpResolver {
    pub fn new(pool: Arc<ResolverPool>, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// 每次查询使用独立的临时 socket，只接收来自目标服务器的应答
    async fn exchange(&self, query: &Message, server: SocketAddr) -> Result<Message, SiftError> {
        let bind: SocketAddr = if server.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind).await?;
        socket.connect(server).await?;
        socket.send(&query.to_vec()?).await?;

        let mut buf = [0u8; MAX_UDP_PAYLOAD];
        let len = socket.recv(&mut buf).await?;
        let response = Message::from_vec(&buf[..len])?;
        if response.id() != query.id() {
            return Err(SiftError::Protocol(format!(
                "response id {} does not match query id {}",
                response.id(),
                query.id()
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl AddressLookup for UdpResolver {
    async fn lookup(&self, name: &str) -> Result<bool, SiftError> {
        let server = self.pool.next();
        let query = match build_query(name) {
            Ok(query) => query,
            Err(e) => {
                debug!(name = name, error = %e, "cannot build DNS query");
                return Ok(false);
            }
        };

        match timeout(self.timeout, self.exchange(&query, server)).await {
            Err(_) => Err(SiftError::Timeout {
                name: name.to_string(),
                server,
            }),
            Ok(Err(e)) if e.is_retryable() => Err(SiftError::Timeout {
                name: name.to_string(),
                server,
            }),
            Ok(Err(e)) => {
                debug!(name = name, server = %server, error = %e, "DNS query failed");
                Ok(false)
            }
            Ok(Ok(response)) => Ok(has_address_answer(name, &response)),
        }
    }
}

/// 构造 A/IN 查询，RD=1
pub fn build_query(name: &str) -> Result<Message, SiftError> {
    let mut fqdn = Name::from_ascii(name)?;
    fqdn.set_fqdn(true);

    let mut msg = Message::new();
    msg.set_id(rand::random::<u16>())
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true)
        .add_query(Query::query(fqdn, RecordType::A));
    Ok(msg)
}

fn has_address_answer(name: &str, response: &Message) -> bool {
    if response.response_code() != ResponseCode::NoError {
        debug!(name = name, rcode = ?response.response_code(), "DNS answer not successful");
        return false;
    }
    if response.answers().is_empty() {
        debug!(name = name, "DNS answer has no records");
        return false;
    }
    trace!(name = name, count = response.answers().len(), "resolved");
    true
}

/// 超时重试包装：超时消耗一次尝试次数，其它结果立即返回
pub struct RetryingResolver {
    inner: Arc<dyn AddressLookup>,
    max_attempts: u32,
}

impl RetryingResolver {
    pub fn new(inner: Arc<dyn AddressLookup>, max_attempts: u32) -> Self {
        Self {
            inner,
            max_attempts,
        }
    }

    pub async fn resolve(&self, name: &str) -> bool {
        for attempt in 1..=self.max_attempts {
            match self.inner.lookup(name).await {
                Ok(found) => return found,
                Err(e) if e.is_retryable() => {
                    trace!(name = name, attempt = attempt, error = %e, "retrying DNS query");
                }
                Err(e) => {
                    debug!(name = name, error = %e, "DNS query failed");
                    return false;
                }
            }
        }
        debug!(
            name = name,
            attempts = self.max_attempts,
            "all DNS attempts timed out"
        );
        false
    }
}
