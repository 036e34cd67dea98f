//! IPFS gateway URLs.

/// Scheme prefix some producers store in front of a CID.
pub const IPFS_SCHEME: &str = "ipfs://";

/// Fallback public gateway used when the primary one fails to serve a file.
pub const FALLBACK_IPFS_GATEWAY: &str = "https://ipfs.io/ipfs";

/// Resolve a stored CID to a gateway URL.
///
/// Empty values and the literal `"null"` resolve to `None`. Values that are
/// already http(s) URLs pass through unchanged.
pub fn ipfs_url(gateway: &str, cid: &str) -> Option<String> {
    let clean = cid.trim();
    let clean = clean.strip_prefix(IPFS_SCHEME).unwrap_or(clean).trim();
    if clean.is_empty() || clean == "null" {
        return None;
    }
    if clean.starts_with("http://") || clean.starts_with("https://") {
        return Some(clean.to_string());
    }
    Some(format!("{}/{}", gateway.trim_end_matches('/'), clean))
}

/// Candidate URLs for displaying a stored file, primary gateway first.
pub fn ipfs_urls_with_fallback(gateway: &str, cid: &str) -> Vec<String> {
    let mut urls = Vec::new();
    if let Some(primary) = ipfs_url(gateway, cid) {
        let fallback = ipfs_url(FALLBACK_IPFS_GATEWAY, cid);
        urls.push(primary);
        if let Some(fallback) = fallback {
            if !urls.contains(&fallback) {
                urls.push(fallback);
            }
        }
    }
    urls
}
