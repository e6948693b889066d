//! URL normalization and filtering

use url::Url;

const SKIP_PREFIXES: &[&str] = &["mailto:", "tel:", "javascript:", "#", "data:"];

const SKIP_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".png", ".jpeg", ".svg", ".gif", ".zip", ".doc", ".docx", ".xlsx", ".xls",
    ".pptx", ".ppt", ".ics", ".mp3", ".mp4", ".avi", ".mov", ".wmv", ".css", ".js",
];

/// Canonical form used as a node id: lower-case scheme and host, no trailing
/// slash on the path (root stays `/`), no query or fragment.
pub fn normalize(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    let port = url.port().map(|p| format!(":{}", p)).unwrap_or_default();

    let path = url.path().trim_end_matches('/');
    let path = if path.is_empty() { "/" } else { path };

    format!("{}://{}{}{}", url.scheme().to_lowercase(), host, port, path)
}

/// Host compared for same-site checks, ignoring a leading `www.`
pub fn site_of(host: &str) -> String {
    let host = host.to_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

/// Fragment-only and non-navigational hrefs
pub fn has_skip_prefix(href: &str) -> bool {
    SKIP_PREFIXES.iter().any(|p| href.starts_with(p))
}

/// Whether `url` is an HTML page on `site` worth visiting
pub fn is_crawlable(url: &str, site: &str) -> bool {
    if url.is_empty() || has_skip_prefix(url) {
        return false;
    }

    let lower = url.to_lowercase();
    if SKIP_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https")
                && parsed.host_str().map(site_of).as_deref() == Some(site)
        }
        Err(_) => false,
    }
}

/// Display title derived from the last path segment, or the host for the root
pub fn title_of(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };

    let path = parsed.path().trim_matches('/');
    match path.rsplit('/').next().filter(|s| !s.is_empty()) {
        Some(segment) => title_case(&segment.replace(['-', '_'], " ")),
        None => parsed.host_str().unwrap_or_default().to_string(),
    }
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;

    for ch in text.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }

    out
}
