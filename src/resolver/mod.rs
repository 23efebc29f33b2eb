//! Hostname → IP resolution with a TTL cache.
//!
//! Resolution never fails: anything that cannot be turned into an address
//! comes back as [`SENTINEL_IP`], and failed lookups are cached like
//! successful ones so a dead host is not queried again until its entry
//! expires.

pub mod cache;
pub mod lookup;

pub use cache::ResolverCache;
pub use lookup::{Clock, HostLookup, SystemClock, SystemLookup};

use crate::domain::SENTINEL_IP;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

pub struct HostnameResolver {
    cache: ResolverCache,
    lookup: Box<dyn HostLookup>,
    clock: Box<dyn Clock>,
}

impl HostnameResolver {
    pub fn new(ttl: Duration) -> Self {
        Self::with_backends(ttl, SystemLookup, SystemClock)
    }

    pub fn with_backends(
        ttl: Duration,
        lookup: impl HostLookup + 'static,
        clock: impl Clock + 'static,
    ) -> Self {
        Self {
            cache: ResolverCache::new(ttl),
            lookup: Box::new(lookup),
            clock: Box::new(clock),
        }
    }

    pub fn cache(&self) -> &ResolverCache {
        &self.cache
    }

    /// Resolves a hostname, `host:port` pair or IP literal to an IP string.
    pub fn resolve(&self, host_or_ip: &str) -> String {
        if host_or_ip.is_empty() {
            return SENTINEL_IP.to_string();
        }

        if let Some(ip) = parse_literal(host_or_ip) {
            return ip.to_string();
        }

        let host = strip_port(host_or_ip);
        if let Ok(ip) = host.parse::<IpAddr>() {
            return ip.to_string();
        }

        if let Some(ip) = self.cache.get(host, self.clock.now()) {
            return ip;
        }

        let resolved = match self.lookup.lookup(host) {
            Ok(addrs) => select_address(&addrs),
            Err(e) => {
                debug!("Hostname lookup failed for {}: {}", host, e);
                None
            }
        };

        let ip = match resolved {
            Some(ip) => {
                debug!("Resolved {} to {}", host, ip);
                ip.to_string()
            }
            None => {
                debug!("No address for {}, caching {}", host, SENTINEL_IP);
                SENTINEL_IP.to_string()
            }
        };

        self.cache.insert(host, ip.clone(), self.clock.now());
        ip
    }
}

impl Default for HostnameResolver {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl std::fmt::Debug for HostnameResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostnameResolver")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Bare IP literals, including unbracketed IPv6, and `[v6]:port` / `v4:port`
/// socket addresses.
fn parse_literal(input: &str) -> Option<IpAddr> {
    input
        .parse::<IpAddr>()
        .ok()
        .or_else(|| input.parse::<SocketAddr>().ok().map(|addr| addr.ip()))
}

fn strip_port(input: &str) -> &str {
    if input.contains('[') {
        return input;
    }
    match input.rsplit_once(':') {
        Some((host, _port)) => host,
        None => input,
    }
}

fn select_address(addrs: &[IpAddr]) -> Option<IpAddr> {
    addrs
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
}
