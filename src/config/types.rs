use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use serde::Deserialize;

use crate::common::SiftError;

/// 内置公共递归 DNS 服务器
pub const DEFAULT_RESOLVERS: &[&str] = &[
    "1.0.0.1:53",
    "1.1.1.1:53",
    "134.195.4.2:53",
    "149.112.112.112:53",
    "159.89.120.99:53",
    "185.228.168.9:53",
    "185.228.169.9:53",
    "195.46.39.39:53",
    "195.46.39.40:53",
    "205.171.2.65:53",
    "205.171.3.65:53",
    "208.67.220.220:53",
    "208.67.222.222:53",
    "216.146.35.35:53",
    "216.146.36.36:53",
    "64.6.64.6:53",
    "64.6.65.6:53",
    "74.82.42.42:53",
    "76.223.122.150:53",
    "76.76.10.0:53",
    "76.76.19.19:53",
    "76.76.2.0:53",
    "77.88.8.1:53",
    "77.88.8.8:53",
    "8.20.247.20:53",
    "8.26.56.26:53",
    "8.8.4.4:53",
    "8.8.8.8:53",
    "84.200.69.80:53",
    "84.200.70.40:53",
    "89.233.43.71:53",
    "9.9.9.9:53",
    "91.239.100.100:53",
    "94.140.14.14:53",
    "94.140.15.15:53",
];

/// DNS labels are limited to 63 octets.
pub const MAX_LABEL_LENGTH: usize = 63;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FilterConfig {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default = "default_resolvers")]
    pub resolvers: Vec<String>,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
    #[serde(default = "default_label_length")]
    pub label_length: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            log: LogConfig::default(),
            resolvers: default_resolvers(),
            workers: default_workers(),
            max_attempts: default_max_attempts(),
            query_timeout_ms: default_query_timeout_ms(),
            label_length: default_label_length(),
        }
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<(), SiftError> {
        if self.workers == 0 {
            return Err(SiftError::Config("workers must be at least 1".into()));
        }
        if self.max_attempts == 0 {
            return Err(SiftError::Config("max-attempts must be at least 1".into()));
        }
        if self.query_timeout_ms == 0 {
            return Err(SiftError::Config("query-timeout-ms must be at least 1".into()));
        }
        if self.label_length == 0 || self.label_length > MAX_LABEL_LENGTH {
            return Err(SiftError::Config(format!(
                "label-length must be between 1 and {}, got {}",
                MAX_LABEL_LENGTH, self.label_length
            )));
        }
        self.resolver_addrs().map(|_| ())
    }

    /// 解析 resolvers 列表为 SocketAddr，空列表视为配置错误
    pub fn resolver_addrs(&self) -> Result<Vec<SocketAddr>, SiftError> {
        if self.resolvers.is_empty() {
            return Err(SiftError::Config("at least one resolver is required".into()));
        }
        self.resolvers
            .iter()
            .map(|s| parse_resolver_addr(s))
            .collect()
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

/// 解析 "ip" 或 "ip:port" 或 "[ipv6]" 或 "[ipv6]:port" 格式，默认端口 53
pub fn parse_resolver_addr(s: &str) -> Result<SocketAddr, SiftError> {
    let s = s.trim();
    if let Ok(ip) = s.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, 53));
    }
    if let Ok(addr) = s.parse::<SocketAddr>() {
        return Ok(addr);
    }
    let stripped = s.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = stripped.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, 53));
    }
    Err(SiftError::Config(format!("invalid resolver address: {}", s)))
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_resolvers() -> Vec<String> {
    DEFAULT_RESOLVERS.iter().map(|s| s.to_string()).collect()
}

fn default_workers() -> usize {
    100
}

fn default_max_attempts() -> u32 {
    3
}

fn default_query_timeout_ms() -> u64 {
    1000
}

fn default_label_length() -> usize {
    6
}
