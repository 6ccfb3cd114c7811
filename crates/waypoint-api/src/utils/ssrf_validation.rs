//! SSRF (Server-Side Request Forgery) validation utilities
//!
//! Rejects URLs that would make the server talk to itself or to the private
//! network:
//! - non-http(s) schemes
//! - `localhost`, `*.localhost` and `0.0.0.0`
//! - literal IP hosts in loopback, private, link-local or unique-local ranges
//!
//! `validate_image_url` never touches the network. Resolved addresses are
//! checked separately by the fetcher's resolver (see `services::fetcher`).

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use url::{Host, Url};

/// Reason a candidate URL was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlRejection {
    #[error("Malformed URL: {0}")]
    Malformed(String),

    #[error("Blocked host: {0}")]
    BlockedHost(String),

    #[error("Blocked IP address: {0}")]
    BlockedIp(IpAddr),
}

/// Validate a user-supplied URL before fetching it.
///
/// Checks, in order: scheme, hostname, literal IP range. DNS names are not
/// resolved here.
pub fn validate_image_url(raw: &str) -> Result<Url, UrlRejection> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlRejection::Malformed(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlRejection::Malformed(format!(
            "unsupported scheme '{}'",
            url.scheme()
        )));
    }

    let host = url
        .host()
        .ok_or_else(|| UrlRejection::Malformed("URL must have a host".to_string()))?;

    match host {
        Host::Domain(domain) => {
            let domain = domain.trim_end_matches('.').to_lowercase();
            if domain == "localhost" || domain.ends_with(".localhost") || domain == "0.0.0.0" {
                return Err(UrlRejection::BlockedHost(domain));
            }
        }
        Host::Ipv4(ip) => {
            if ip.is_unspecified() {
                return Err(UrlRejection::BlockedHost(ip.to_string()));
            }
            if is_private_ip(&IpAddr::V4(ip)) {
                return Err(UrlRejection::BlockedIp(IpAddr::V4(ip)));
            }
        }
        Host::Ipv6(ip) => {
            if is_private_ip(&IpAddr::V6(ip)) {
                return Err(UrlRejection::BlockedIp(IpAddr::V6(ip)));
            }
        }
    }

    Ok(url)
}

/// Check if an IP address is private/internal
///
/// Returns true for:
/// - IPv4 private ranges: 10.0.0.0/8, 172.16.0.0/12, 192.168.0.0/16
/// - IPv4 localhost: 127.0.0.0/8
/// - IPv4 link-local: 169.254.0.0/16
/// - IPv4 multicast: 224.0.0.0/4
/// - IPv4 reserved: 0.0.0.0/8
/// - IPv6 loopback: ::1
/// - IPv6 link-local: fe80::/10
/// - IPv6 unique local: fc00::/7
/// - IPv6 unspecified: ::
/// - IPv4-mapped IPv6 addresses whose IPv4 part is any of the above
pub fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => is_private_ipv4(ipv4),
        IpAddr::V6(ipv6) => {
            if let Some(mapped) = ipv6.to_ipv4_mapped() {
                return is_private_ipv4(&mapped);
            }
            ipv6.is_loopback()
                || ipv6.is_unspecified()
                || ipv6.is_multicast()
                || is_ipv6_link_local(ipv6)
                || is_ipv6_unique_local(ipv6)
        }
    }
}

fn is_private_ipv4(ipv4: &Ipv4Addr) -> bool {
    let octets = ipv4.octets();
    octets[0] == 10 // 10.0.0.0/8
        || (octets[0] == 172 && octets[1] >= 16 && octets[1] <= 31) // 172.16.0.0/12
        || (octets[0] == 192 && octets[1] == 168) // 192.168.0.0/16
        || octets[0] == 127 // 127.0.0.0/8 (localhost)
        || (octets[0] == 169 && octets[1] == 254) // 169.254.0.0/16 (link-local)
        || (octets[0] >= 224 && octets[0] <= 239) // 224.0.0.0/4 (multicast)
        || octets[0] == 0 // 0.0.0.0/8 (reserved)
}

/// Check if IPv6 address is link-local (fe80::/10)
fn is_ipv6_link_local(ip: &Ipv6Addr) -> bool {
    let segments = ip.segments();
    segments[0] & 0xffc0 == 0xfe80 // fe80::/10
}

/// Check if IPv6 address is unique local (fc00::/7)
fn is_ipv6_unique_local(ip: &Ipv6Addr) -> bool {
    let segments = ip.segments();
    segments[0] & 0xfe00 == 0xfc00 // fc00::/7
}
