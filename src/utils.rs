use crate::generator::BaseUrl;

/// Parse a candidate base URL, keeping it only when it has both a scheme and a host.
pub fn parse_base_url(candidate: &str) -> Option<BaseUrl> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }
    BaseUrl::parse(candidate).ok()
}

/// Keep the valid URLs from `lines`, logging the rest.
pub fn collect_base_urls<'a, I>(lines: I) -> Vec<BaseUrl>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = Vec::new();
    for line in lines {
        if line.trim().is_empty() { continue; }
        match parse_base_url(line) {
            Some(url) => out.push(url),
            None => tracing::warn!(input = %line.trim(), "ignoring invalid target url"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url() {
        assert!(parse_base_url("https://example.com/admin").is_some());
        assert!(parse_base_url("  http://10.0.0.1:8080/x ").is_some());
        assert!(parse_base_url("example.com/admin").is_none());
        assert!(parse_base_url("/admin").is_none());
        assert!(parse_base_url("mailto:someone@example.com").is_none());
        assert!(parse_base_url("").is_none());
    }

    #[test]
    fn test_collect_skips_invalid() {
        let urls = collect_base_urls("http://a.com,nope,,https://b.com/x".split(','));
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].to_string(), "http://a.com");
        assert_eq!(urls[1].to_string(), "https://b.com/x");
    }
}
