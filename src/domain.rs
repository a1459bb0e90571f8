//! Hostname handling: page URL → host → registrable domain.

use crate::errors::IcpError;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static IPV4_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,3}\.){3}\d{1,3}$").expect("IPv4 pattern is valid")
});

const MAX_HOST_LEN: usize = 253;

/// Reduce a hostname to its registrable domain.
///
/// Dotted-quad addresses are returned as-is. Anything with more than two
/// labels keeps only the last two (`www.example.com` → `example.com`). This is
/// a heuristic: suffixes such as `com.cn` are not recognised.
pub fn extract_main_domain(hostname: &str) -> String {
    if IPV4_PATTERN.is_match(hostname) {
        return hostname.to_string();
    }

    let parts: Vec<&str> = hostname.split('.').collect();
    if parts.len() > 2 {
        parts[parts.len() - 2..].join(".")
    } else {
        hostname.to_string()
    }
}

/// Trim, lowercase and sanity-check a raw hostname.
pub fn normalize_host(raw: &str) -> Result<String, IcpError> {
    let mut host = raw.trim().to_lowercase();

    // Remove trailing dot if present (common in DNS contexts)
    if host.ends_with('.') {
        host.pop();
    }

    if host.is_empty() {
        return Err(IcpError::InvalidHost("Empty host".to_string()));
    }

    if host.len() > MAX_HOST_LEN {
        return Err(IcpError::InvalidHost("Host name too long".to_string()));
    }

    if host.contains("..") || host.starts_with('.') {
        return Err(IcpError::InvalidHost(format!("Invalid host format: {}", host)));
    }

    Ok(host)
}

/// Pull the host out of a page URL such as the one in the browser's address bar.
pub fn host_from_url(page_url: &str) -> Result<String, IcpError> {
    let parsed = Url::parse(page_url.trim())?;
    let host = parsed
        .host_str()
        .ok_or_else(|| IcpError::InvalidHost(format!("URL has no host: {}", page_url)))?;

    // IPv6 hosts come back bracketed
    normalize_host(host.trim_start_matches('[').trim_end_matches(']'))
}
