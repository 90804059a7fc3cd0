use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};

use crate::generator::Target;
use crate::http_client::{self, ConnectionPool};
use crate::probe::Prober;

/// GET prober drawing clients from a shared [`ConnectionPool`].
pub struct HttpProber {
    pool: Arc<ConnectionPool>,
}

impl HttpProber {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }
}

/// Headers for one probe. The target header overwrites a default of the same name.
pub fn probe_headers(target: &Target) -> anyhow::Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(http_client::USER_AGENT));
    if target.has_header() {
        let name = HeaderName::from_bytes(target.header_key.as_bytes())
            .with_context(|| format!("invalid header name {:?}", target.header_key))?;
        let value = HeaderValue::from_str(&target.header_value)
            .with_context(|| format!("invalid value for header {}", target.header_key))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, target: &Target, timeout: Duration) -> anyhow::Result<u16> {
        let headers = probe_headers(target)?;
        // released on every path when the guard drops
        let client = self.pool.acquire(timeout).await?;
        let resp = client
            .client
            .get(&target.host)
            .headers(headers)
            .timeout(client.timeout)
            .send()
            .await?;
        let status = resp.status().as_u16();
        tracing::debug!(status, host = %target.host, header = %target.header_description(), "probe completed");
        Ok(status)
    }
}
