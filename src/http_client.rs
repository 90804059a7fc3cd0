use std::time::Duration;

use anyhow::Context;
use reqwest::{Client, ClientBuilder};

use crate::pool::{Pool, PoolGuard};

/// Browser-like agent sent with every probe.
pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:60.0) Gecko/20100101 Firefox/60.0";

/// Build the transport shared by every pooled client.
///
/// Certificate validation is off: bypass targets are routinely self-signed
/// and a TLS failure must not hide a probe.
pub fn create_transport(max_connections: usize) -> anyhow::Result<Client> {
    ClientBuilder::new()
        // Connection pooling
        .pool_max_idle_per_host(max_connections)
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .tcp_nodelay(true)

        // Compression
        .gzip(true)

        // TLS
        .use_rustls_tls()
        .danger_accept_invalid_certs(true)

        .redirect(reqwest::redirect::Policy::limited(10))
        .user_agent(USER_AGENT)
        .build()
        .context("failed to build HTTP transport")
}

/// A client handed out by [`ConnectionPool`]. The timeout is reset on every
/// acquire; the transport is the only state carried between uses.
#[derive(Clone)]
pub struct PooledClient {
    pub client: Client,
    pub timeout: Duration,
}

pub struct ConnectionPool {
    inner: Pool<PooledClient>,
}

impl ConnectionPool {
    /// At most `max_clients` clients are ever out at once; the transport
    /// keeps up to `max_connections` idle connections per host.
    pub fn new(max_clients: usize, max_connections: usize) -> anyhow::Result<Self> {
        let transport = create_transport(max_connections)?;
        Ok(Self::with_transport(max_clients, transport))
    }

    pub fn with_transport(max_clients: usize, transport: Client) -> Self {
        let inner = Pool::new(max_clients, move || PooledClient {
            client: transport.clone(),
            timeout: Duration::ZERO,
        });
        Self { inner }
    }

    pub async fn acquire(&self, timeout: Duration) -> anyhow::Result<PoolGuard<'_, PooledClient>> {
        let mut client = self.inner.acquire().await?;
        client.timeout = timeout;
        Ok(client)
    }

    pub fn release(&self, client: PoolGuard<'_, PooledClient>) {
        self.inner.release(client);
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    pub fn in_use(&self) -> usize {
        self.inner.in_use()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_creation() {
        assert!(create_transport(100).is_ok());
    }

    #[tokio::test]
    async fn test_timeout_set_per_acquire() {
        let pool = ConnectionPool::new(1, 100).unwrap();
        assert_eq!(pool.capacity(), 1);
        let first = pool.acquire(Duration::from_secs(3)).await.unwrap();
        assert_eq!(first.timeout, Duration::from_secs(3));
        pool.release(first);

        let second = pool.acquire(Duration::from_secs(7)).await.unwrap();
        assert_eq!(second.timeout, Duration::from_secs(7));
        assert_eq!(pool.in_use(), 1);
    }
}
