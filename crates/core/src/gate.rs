//! Request admission: rate limiting and anti-SSRF URL validation.
//!
//! Nothing in the pipeline touches the network before [`RequestGate::admit`]
//! has accepted the request.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use time::OffsetDateTime;
use url::{Host, Url};

use crate::{AnnonceError, Result};

/// Literal hosts that must never be fetched.
const BLOCKED_HOSTS: &[&str] = &["localhost", "::1", "[::1]", "0.0.0.0"];

/// Dotted prefixes of loopback, private and link-local IPv4 ranges.
const BLOCKED_HOST_PREFIXES: &[&str] = &["127.", "0.", "10.", "192.168.", "169.254."];

/// Hostname suffixes reserved for local or internal networks.
const BLOCKED_HOST_SUFFIXES: &[&str] = &[".local", ".localhost", ".internal", ".lan", ".home.arpa", ".intranet"];

/// Quota applied per client key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Maximum number of requests inside one window.
    pub max_requests: u32,
    /// Window length.
    pub window: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self { max_requests: 10, window: Duration::from_secs(5 * 60) }
    }
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    reset: Instant,
}

#[derive(Debug)]
struct LimiterState {
    entries: HashMap<String, WindowEntry>,
    last_cleanup: Instant,
}

/// Fixed-window request counter keyed by client.
///
/// The only state shared between concurrent extractions; guarded by a mutex
/// so increment-and-check is atomic.
#[derive(Debug)]
pub struct RateLimiter {
    policy: RateLimitPolicy,
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(LimiterState { entries: HashMap::new(), last_cleanup: Instant::now() }),
        }
    }

    /// Counts one request for `key` and reports whether it is allowed.
    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    /// Same as [`RateLimiter::check`] with an explicit clock reading.
    pub fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let wall_now = OffsetDateTime::now_utc();
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if now.saturating_duration_since(state.last_cleanup) >= Self::CLEANUP_INTERVAL {
            state.entries.retain(|_, entry| entry.reset > now);
            state.last_cleanup = now;
        }

        let entry = state
            .entries
            .entry(key.to_string())
            .and_modify(|entry| {
                if now >= entry.reset {
                    *entry = WindowEntry { count: 0, reset: now + self.policy.window };
                }
            })
            .or_insert(WindowEntry { count: 0, reset: now + self.policy.window });

        entry.count = entry.count.saturating_add(1);
        let reset_at = wall_now + entry.reset.saturating_duration_since(now);

        if entry.count > self.policy.max_requests {
            RateDecision { allowed: false, remaining: 0, reset_at }
        } else {
            RateDecision { allowed: true, remaining: self.policy.max_requests - entry.count, reset_at }
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitPolicy::default())
    }
}

/// Checks a host against the private/loopback/link-local blocklist.
pub fn is_blocked_host(host: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() {
        return true;
    }

    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = bare.parse::<IpAddr>() {
        return is_blocked_ip(&ip);
    }

    if BLOCKED_HOST_SUFFIXES.iter().any(|suffix| host.ends_with(suffix)) {
        return true;
    }

    is_literal_prefix_blocked(&host)
}

fn is_literal_prefix_blocked(host: &str) -> bool {
    BLOCKED_HOSTS.contains(&host)
        || BLOCKED_HOST_PREFIXES.iter().any(|prefix| host.starts_with(prefix))
        || is_private_172(host)
}

/// 172.16.0.0/12 written as a dotted prefix.
fn is_private_172(host: &str) -> bool {
    let mut parts = host.split('.');
    matches!(
        (parts.next(), parts.next().and_then(|p| p.parse::<u8>().ok())),
        (Some("172"), Some(16..=31))
    )
}

/// Checks an IP address against loopback, private, link-local and unspecified ranges.
pub fn is_blocked_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_blocked_ipv4(v4),
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_blocked_ipv4(&mapped);
            }
            is_blocked_ipv6(v6)
        }
    }
}

fn is_blocked_ipv4(ip: &Ipv4Addr) -> bool {
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.octets()[0] == 0
        // 100.64.0.0/10 carrier-grade NAT
        || (ip.octets()[0] == 100 && (64..128).contains(&ip.octets()[1]))
}

fn is_blocked_ipv6(ip: &Ipv6Addr) -> bool {
    if let Some(embedded) = embedded_ipv4(ip) {
        return is_blocked_ipv4(&embedded);
    }
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link-local
        || (first & 0xffc0) == 0xfe80
}

/// IPv4 carried by an IPv4-compatible (`::a.b.c.d`) or NAT64 (`64:ff9b::/96`) address.
fn embedded_ipv4(ip: &Ipv6Addr) -> Option<Ipv4Addr> {
    let segments = ip.segments();
    let compatible = segments[..6].iter().all(|s| *s == 0) && (segments[6] != 0 || segments[7] > 1);
    let nat64 = segments[0] == 0x64 && segments[1] == 0xff9b && segments[2..6].iter().all(|s| *s == 0);
    if !(compatible || nat64) {
        return None;
    }
    let [.., a, b, c, d] = ip.octets();
    Some(Ipv4Addr::new(a, b, c, d))
}

/// Validates a listing URL without performing any network call.
///
/// Order: parse, host blocklist, then scheme, so that an internal target is
/// always reported as [`AnnonceError::BlockedHost`].
pub fn validate_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AnnonceError::InvalidInput("URL is required".to_string()));
    }

    let url = Url::parse(raw).map_err(|e| AnnonceError::InvalidInput(format!("{}: {}", raw, e)))?;

    let host = match url.host() {
        Some(Host::Domain(domain)) => domain.to_string(),
        Some(Host::Ipv4(ip)) => {
            if is_blocked_ip(&IpAddr::V4(ip)) {
                return Err(AnnonceError::BlockedHost(ip.to_string()));
            }
            ip.to_string()
        }
        Some(Host::Ipv6(ip)) => {
            if is_blocked_ip(&IpAddr::V6(ip)) {
                return Err(AnnonceError::BlockedHost(ip.to_string()));
            }
            ip.to_string()
        }
        None => return Err(AnnonceError::InvalidInput(format!("{}: URL has no host", raw))),
    };

    if is_blocked_host(&host) {
        return Err(AnnonceError::BlockedHost(host));
    }

    if url.scheme() != "https" {
        return Err(AnnonceError::InvalidInput(format!(
            "{}: only https URLs are accepted",
            raw
        )));
    }

    Ok(url)
}

/// Rate limiter plus URL validation in front of the pipeline.
#[derive(Debug, Default)]
pub struct RequestGate {
    limiter: RateLimiter,
}

impl RequestGate {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self { limiter: RateLimiter::new(policy) }
    }

    /// Admits a request or rejects it with `RateLimited`, `InvalidInput` or `BlockedHost`.
    pub fn admit(&self, url: &str, client_key: &str) -> Result<Url> {
        let decision = self.limiter.check(client_key);
        if !decision.allowed {
            return Err(AnnonceError::RateLimited { reset_at: decision.reset_at });
        }
        validate_url(url)
    }
}
