//! Deterministic expansion of one base URL into bypass probe targets.
//!
//! For a base URL the stream is, in order:
//! 1. an `Origin: null` probe,
//! 2. one probe per trusted-IP spoof header,
//! 3. one probe per rewrite header (path moved into the header, URL stripped of it),
//! 4. every path template crossed with every path payload.
//!
//! Templates are built per path segment (plus an upper-cased copy when it
//! differs) and one more with the placeholder appended to the whole path.
//! Segments are trimmed and upper-cased in decoded form, then re-escaped.

use std::fmt;
use std::iter;

use anyhow::Context;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::{Position, Url};

use crate::catalog::{PayloadCatalog, SPOOF_VALUE};

/// Bytes escaped inside a rebuilt path segment; sub-delims allowed in paths stay literal.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b',')
    .remove(b':')
    .remove(b';')
    .remove(b'=')
    .remove(b'@');

/// One probe to perform. An empty `header_key` means no header override.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Target {
    pub host: String,
    pub header_key: String,
    pub header_value: String,
}

impl Target {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            header_key: String::new(),
            header_value: String::new(),
        }
    }

    pub fn with_header(host: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            header_key: key.into(),
            header_value: value.into(),
        }
    }

    pub fn has_header(&self) -> bool {
        !self.header_key.is_empty()
    }

    /// `key:value`, or empty when no header is overridden.
    pub fn header_description(&self) -> String {
        if self.has_header() {
            format!("{}:{}", self.header_key, self.header_value)
        } else {
            String::new()
        }
    }
}

/// A validated base URL that remembers whether the input named a path.
///
/// `url::Url` reports `/` for `http://example.com`; the generator needs to
/// tell that apart from `http://example.com/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl {
    url: Url,
    has_path: bool,
}

impl BaseUrl {
    pub fn parse(input: &str) -> anyhow::Result<Self> {
        let input = input.trim();
        let url = Url::parse(input).with_context(|| format!("invalid url {:?}", input))?;
        match url.host_str() {
            Some(host) if !host.is_empty() => {}
            _ => anyhow::bail!("url {:?} has no host", input),
        }
        Ok(Self {
            has_path: has_explicit_path(input),
            url,
        })
    }

    /// Percent-decoded path, empty when the input had none.
    pub fn path(&self) -> String {
        percent_decode_str(self.encoded_path())
            .decode_utf8_lossy()
            .into_owned()
    }

    fn encoded_path(&self) -> &str {
        if self.has_path {
            self.url.path()
        } else {
            ""
        }
    }

    /// This URL with `path` (already encoded) in place of its own.
    fn with_path(&self, path: &str) -> String {
        let sep = if path.is_empty() || path.starts_with('/') { "" } else { "/" };
        format!(
            "{}{}{}{}",
            &self.url[..Position::BeforePath],
            sep,
            path,
            &self.url[Position::AfterPath..]
        )
    }
}

impl From<Url> for BaseUrl {
    fn from(url: Url) -> Self {
        Self { url, has_path: true }
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.with_path(self.encoded_path()))
    }
}

// Authority ends at the first `/`, `?` or `#`; only a slash starts a path.
fn has_explicit_path(input: &str) -> bool {
    let Some((_, rest)) = input.split_once(':') else { return false };
    let rest = rest.trim_start_matches(['/', '\\']);
    match rest.find(['/', '\\', '?', '#']) {
        Some(i) => matches!(rest.as_bytes()[i], b'/' | b'\\'),
        None => false,
    }
}

pub struct TargetGenerator<'a> {
    base: BaseUrl,
    catalog: &'a PayloadCatalog,
}

impl<'a> TargetGenerator<'a> {
    /// `base` must already carry a scheme and a host.
    pub fn new(base: impl Into<BaseUrl>, catalog: &'a PayloadCatalog) -> Self {
        Self { base: base.into(), catalog }
    }

    /// Template URLs still holding the placeholder, in generation order.
    pub fn templates(&self) -> impl Iterator<Item = String> + 'a {
        let catalog: &'a PayloadCatalog = self.catalog;
        let token = catalog.placeholder.as_str();
        let base = self.base.clone();
        let path = base.path();
        let segments: Vec<String> = path.split('/').map(str::to_owned).collect();

        let appended = base.with_path(&encode_path(&format!("{}{}", path, token)));

        (0..segments.len())
            .flat_map(move |index| segment_templates(&base, &segments, index, token))
            .chain(iter::once(appended))
    }

    /// Lazily yields every target for this base URL.
    pub fn targets(self) -> impl Iterator<Item = Target> + 'a {
        let catalog: &'a PayloadCatalog = self.catalog;
        let token = catalog.placeholder.as_str();
        let host = self.base.to_string();
        let stripped = self.base.with_path("");
        let path = self.base.path();

        let origin = iter::once(Target::with_header(host.clone(), "Origin", "null"));

        let spoofs = catalog
            .spoof_headers
            .iter()
            .map(move |name| Target::with_header(host.clone(), name.as_str(), SPOOF_VALUE));

        let rewrites = catalog
            .rewrite_headers
            .iter()
            .map(move |name| Target::with_header(stripped.clone(), name.as_str(), path.clone()));

        let mutations = self.templates().flat_map(move |template| {
            catalog
                .path_payloads
                .iter()
                .filter_map(move |payload| mutation_target(&template, token, payload))
        });

        origin.chain(spoofs).chain(rewrites).chain(mutations)
    }
}

/// Chains the target streams of several base URLs into one.
pub fn generate_all<'a>(bases: &'a [BaseUrl], catalog: &'a PayloadCatalog) -> impl Iterator<Item = Target> + 'a {
    bases
        .iter()
        .flat_map(move |base| TargetGenerator::new(base.clone(), catalog).targets())
}

/// Replaces only the first occurrence of `token`.
pub fn replace_placeholder(template: &str, token: &str, payload: &str) -> String {
    template.replacen(token, payload, 1)
}

fn segment_templates(base: &BaseUrl, segments: &[String], index: usize, token: &str) -> Vec<String> {
    let mut parts = segments.to_vec();
    parts[index] = format!("{}{}", token, parts[index].trim());
    let mut out = vec![base.with_path(&encode_path(&parts.join("/")))];

    let upper = parts[index].to_uppercase();
    if upper != parts[index] {
        parts[index] = upper;
        out.push(base.with_path(&encode_path(&parts.join("/"))));
    }
    out
}

/// Re-escape a decoded path segment by segment, keeping `/` as separator.
fn encode_path(decoded: &str) -> String {
    decoded
        .split('/')
        .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

// A variant that no longer parses is dropped; the rest of the run continues.
fn mutation_target(template: &str, token: &str, payload: &str) -> Option<Target> {
    let host = replace_placeholder(template, token, payload);
    match Url::parse(&host) {
        Ok(_) => Some(Target::new(host)),
        Err(e) => {
            tracing::warn!(error = %e, host = %host, "skipping malformed variant");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_first_targets_are_header_probes() {
        let catalog = PayloadCatalog::default();
        let targets: Vec<Target> = TargetGenerator::new(base("http://example.com/admin"), &catalog)
            .targets()
            .take(17)
            .collect();

        assert_eq!(targets[0], Target::with_header("http://example.com/admin", "Origin", "null"));
        assert_eq!(targets[1].header_key, "X-Custom-IP-Authorization");
        assert_eq!(targets[14].header_key, "X-Host");
        assert!(targets[1..15].iter().all(|t| t.header_value == "127.0.0.1"));
        assert_eq!(targets[15], Target::with_header("http://example.com", "X-Original-URL", "/admin"));
        assert_eq!(targets[16], Target::with_header("http://example.com", "X-rewrite-url", "/admin"));
    }

    #[test]
    fn test_rewrite_keeps_query() {
        let catalog = PayloadCatalog::default();
        let rewrite = TargetGenerator::new(base("https://example.com/a/b?x=1"), &catalog)
            .targets()
            .nth(15)
            .unwrap();
        assert_eq!(rewrite.host, "https://example.com?x=1");
        assert_eq!(rewrite.header_value, "/a/b");
    }

    #[test]
    fn test_templates_for_simple_path() {
        let catalog = PayloadCatalog::default();
        let templates: Vec<String> = TargetGenerator::new(base("http://example.com/a/b"), &catalog)
            .templates()
            .collect();
        assert_eq!(
            templates,
            vec![
                "http://example.com/FUZZ/a/b",
                "http://example.com/FUZZa/b",
                "http://example.com/FUZZA/b",
                "http://example.com/a/FUZZb",
                "http://example.com/a/FUZZB",
                "http://example.com/a/bFUZZ",
            ]
        );
    }

    fn templates_of(input: &str) -> Vec<String> {
        let catalog = PayloadCatalog::default();
        TargetGenerator::new(BaseUrl::parse(input).unwrap(), &catalog)
            .templates()
            .collect()
    }

    #[test]
    fn test_encoded_space_is_trimmed() {
        assert_eq!(
            templates_of("http://example.com/%20x"),
            vec![
                "http://example.com/FUZZ/%20x",
                "http://example.com/FUZZx",
                "http://example.com/FUZZX",
                "http://example.com/%20xFUZZ",
            ]
        );
    }

    #[test]
    fn test_non_ascii_segment_is_upper_cased() {
        assert_eq!(
            templates_of("http://example.com/%C3%A9"),
            vec![
                "http://example.com/FUZZ/%C3%A9",
                "http://example.com/FUZZ%C3%A9",
                "http://example.com/FUZZ%C3%89",
                "http://example.com/%C3%A9FUZZ",
            ]
        );
    }

    #[test]
    fn test_bare_host_has_empty_path() {
        assert_eq!(
            templates_of("http://example.com"),
            vec!["http://example.com/FUZZ", "http://example.com/FUZZ"]
        );
        assert_eq!(templates_of("http://example.com/").len(), 3);

        let catalog = PayloadCatalog::default();
        let base = BaseUrl::parse("http://example.com?q=1").unwrap();
        assert_eq!(base.to_string(), "http://example.com?q=1");
        assert_eq!(base.path(), "");
        let targets: Vec<Target> = TargetGenerator::new(base, &catalog).targets().collect();
        assert_eq!(targets[0].host, "http://example.com?q=1");
        assert_eq!(targets[15], Target::with_header("http://example.com?q=1", "X-Original-URL", ""));
        assert_eq!(targets.len(), 93);
    }

    #[test]
    fn test_explicit_path_detection() {
        assert!(has_explicit_path("http://example.com/"));
        assert!(has_explicit_path("http://user:pw@example.com:8080/a?b"));
        assert!(!has_explicit_path("http://example.com"));
        assert!(!has_explicit_path("http://[::1]:8080?x=/y"));
        assert!(!has_explicit_path("https://example.com#/frag"));
    }

    #[test]
    fn test_reserved_characters_escaped_like_path_encoding() {
        assert_eq!(
            templates_of("http://example.com/a%25b;c")[1],
            "http://example.com/FUZZa%25b;c"
        );
    }

    #[test]
    fn test_replace_placeholder_first_only() {
        assert_eq!(
            replace_placeholder("http://h/FUZZ/FUZZ", "FUZZ", "../"),
            "http://h/..//FUZZ"
        );
    }

    #[test]
    fn test_header_description() {
        assert_eq!(Target::new("http://h/").header_description(), "");
        assert_eq!(
            Target::with_header("http://h/", "X-Host", "127.0.0.1").header_description(),
            "X-Host:127.0.0.1"
        );
    }
}
