//! Rate limiting middleware using a fixed window per client.
//!
//! Every route shares one budget: a client gets `requests_per_window` requests,
//! after which it is refused until its window elapses.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::error::ApiError;
use crate::config::RateLimitConfig;
use crate::AppState;

const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again later.";

/// Entry in the rate limit tracker
#[derive(Debug, Clone)]
struct RateLimitEntry {
    /// Requests counted in the current window
    count: u32,
    /// Start of the current window
    window_start: Instant,
}

/// Thread-safe rate limiter using dashmap
#[derive(Debug)]
pub struct RateLimiter {
    /// Map of client IP -> RateLimitEntry
    entries: DashMap<IpAddr, RateLimitEntry>,
    config: RateLimitConfig,
    window_duration: Duration,
}

/// Information about rate limit status
#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    /// Remaining requests in the current window
    pub remaining: u32,
    /// Maximum requests per window
    pub limit: u32,
    /// Seconds until the window resets
    pub reset_after: u64,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            entries: DashMap::new(),
            window_duration: Duration::from_secs(config.window_seconds),
            config,
        }
    }

    pub fn limit(&self) -> u32 {
        self.config.requests_per_window
    }

    /// Count a request against `ip`.
    /// Returns Ok(info) if allowed, Err(retry_after_seconds) if rate limited.
    pub fn check_rate_limit(&self, ip: IpAddr) -> Result<RateLimitInfo, u64> {
        self.check_at(ip, Instant::now())
    }

    fn check_at(&self, ip: IpAddr, now: Instant) -> Result<RateLimitInfo, u64> {
        if !self.config.enabled {
            return Ok(RateLimitInfo {
                remaining: u32::MAX,
                limit: u32::MAX,
                reset_after: 0,
            });
        }

        let limit = self.config.requests_per_window;
        let mut entry = self.entries.entry(ip).or_insert_with(|| RateLimitEntry {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) >= self.window_duration {
            entry.count = 0;
            entry.window_start = now;
        }

        let reset_after = self
            .window_duration
            .saturating_sub(now.duration_since(entry.window_start))
            .as_secs();

        if entry.count < limit {
            entry.count += 1;
            Ok(RateLimitInfo {
                remaining: limit - entry.count,
                limit,
                reset_after,
            })
        } else {
            Err(reset_after.max(1))
        }
    }

    /// Clean up expired entries to prevent memory leaks
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        self.entries
            .retain(|_, entry| now.duration_since(entry.window_start) < self.window_duration);
    }

    /// Get the number of tracked entries (for monitoring)
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

/// Resolve the client address. Proxy headers count only when `trust_proxy` is set.
pub fn extract_client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_proxy: bool,
) -> IpAddr {
    let peer_ip = || {
        peer.map(|addr| addr.ip())
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
    };

    if !trust_proxy {
        return peer_ip();
    }

    // X-Forwarded-For: take the first IP in the list (original client)
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|ip| ip.trim().parse::<IpAddr>().ok());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|ip| ip.trim().parse::<IpAddr>().ok())
    };

    forwarded.or_else(real_ip).unwrap_or_else(peer_ip)
}

/// Rate limiting middleware applied to every route
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let ip = extract_client_ip(
        request.headers(),
        peer,
        state.config.rate_limit.trust_proxy_headers,
    );

    match state.rate_limiter.check_rate_limit(ip) {
        Ok(info) => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", HeaderValue::from(info.limit));
            headers.insert("X-RateLimit-Remaining", HeaderValue::from(info.remaining));
            headers.insert("X-RateLimit-Reset", HeaderValue::from(info.reset_after));
            response
        }
        Err(retry_after) => {
            tracing::warn!(%ip, retry_after, "Rate limit exceeded");
            let mut response = ApiError::rate_limited(RATE_LIMIT_MESSAGE).into_response();
            let headers = response.headers_mut();
            headers.insert("Retry-After", HeaderValue::from(retry_after));
            headers.insert(
                "X-RateLimit-Limit",
                HeaderValue::from(state.rate_limiter.limit()),
            );
            headers.insert("X-RateLimit-Remaining", HeaderValue::from(0u32));
            headers.insert("X-RateLimit-Reset", HeaderValue::from(retry_after));
            response
        }
    }
}

/// Spawn a background task to periodically clean up expired rate limit entries
pub fn spawn_cleanup_task(rate_limiter: Arc<RateLimiter>, cleanup_interval_secs: u64) {
    tokio::spawn(async move {
        let interval = Duration::from_secs(cleanup_interval_secs.max(1));
        loop {
            tokio::time::sleep(interval).await;
            rate_limiter.cleanup_expired();
            tracing::debug!(
                "Rate limiter cleanup complete, {} entries remaining",
                rate_limiter.entry_count()
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> RateLimitConfig {
        RateLimitConfig {
            enabled: true,
            requests_per_window: 10,
            window_seconds: 60,
            cleanup_interval: 300,
            trust_proxy_headers: false,
        }
    }

    #[test]
    fn test_rate_limiter_allows_requests_under_limit() {
        let limiter = RateLimiter::new(test_config());
        let ip: IpAddr = "192.168.1.1".parse().unwrap();

        for i in 0..10 {
            let result = limiter.check_rate_limit(ip);
            assert!(result.is_ok(), "Request {} should be allowed", i);
        }
    }

    #[test]
    fn test_remaining_counts_down() {
        let limiter = RateLimiter::new(test_config());
        let ip: IpAddr = "192.168.1.1".parse().unwrap();

        assert_eq!(limiter.check_rate_limit(ip).unwrap().remaining, 9);
        assert_eq!(limiter.check_rate_limit(ip).unwrap().remaining, 8);
    }

    #[test]
    fn test_rate_limiter_blocks_after_limit() {
        let limiter = RateLimiter::new(test_config());
        let ip: IpAddr = "192.168.1.1".parse().unwrap();

        for _ in 0..10 {
            let _ = limiter.check_rate_limit(ip);
        }

        let result = limiter.check_rate_limit(ip);
        assert!(result.is_err(), "Request should be rate limited");
        assert!(result.unwrap_err() >= 1);
    }

    #[test]
    fn test_window_resets_after_duration() {
        let limiter = RateLimiter::new(test_config());
        let ip: IpAddr = "192.168.1.1".parse().unwrap();
        let start = Instant::now();

        for _ in 0..10 {
            let _ = limiter.check_at(ip, start);
        }
        assert!(limiter.check_at(ip, start + Duration::from_secs(59)).is_err());
        assert!(limiter.check_at(ip, start + Duration::from_secs(60)).is_ok());
    }

    #[test]
    fn test_different_ips_have_separate_limits() {
        let limiter = RateLimiter::new(test_config());
        let ip1: IpAddr = "192.168.1.1".parse().unwrap();
        let ip2: IpAddr = "192.168.1.2".parse().unwrap();

        for _ in 0..10 {
            let _ = limiter.check_rate_limit(ip1);
        }

        let result = limiter.check_rate_limit(ip2);
        assert!(result.is_ok(), "Different IP should have its own limit");
    }

    #[test]
    fn test_disabled_rate_limiting() {
        let mut config = test_config();
        config.enabled = false;
        let limiter = RateLimiter::new(config);
        let ip: IpAddr = "192.168.1.1".parse().unwrap();

        for _ in 0..100 {
            let result = limiter.check_rate_limit(ip);
            assert!(result.is_ok(), "All requests should be allowed when disabled");
        }
    }

    #[test]
    fn test_cleanup_expired() {
        let limiter = RateLimiter::new(test_config());
        let ip: IpAddr = "192.168.1.1".parse().unwrap();

        let _ = limiter.check_rate_limit(ip);
        assert_eq!(limiter.entry_count(), 1);

        // Cleanup shouldn't remove recent entries
        limiter.cleanup_expired();
        assert_eq!(limiter.entry_count(), 1);
    }

    #[test]
    fn test_proxy_headers_ignored_unless_trusted() {
        let peer: SocketAddr = "10.0.0.9:4000".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "198.51.100.1".parse().unwrap());
        headers.insert("x-real-ip", "203.0.113.7".parse().unwrap());

        assert_eq!(extract_client_ip(&headers, Some(peer), false), peer.ip());
        assert_eq!(
            extract_client_ip(&headers, None, false),
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        );
    }

    #[test]
    fn test_extract_client_ip_precedence_when_trusted() {
        let peer: SocketAddr = "10.0.0.9:4000".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(extract_client_ip(&headers, Some(peer), true), peer.ip());
        assert_eq!(
            extract_client_ip(&headers, None, true),
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        );

        headers.insert("x-real-ip", "203.0.113.7".parse().unwrap());
        assert_eq!(
            extract_client_ip(&headers, Some(peer), true),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );

        headers.insert("x-forwarded-for", "198.51.100.1, 10.0.0.1".parse().unwrap());
        assert_eq!(
            extract_client_ip(&headers, Some(peer), true),
            "198.51.100.1".parse::<IpAddr>().unwrap()
        );
    }
}
