pub mod http_probe;

use std::time::Duration;

use async_trait::async_trait;

use crate::generator::Target;

pub use http_probe::HttpProber;

/// Executes one request for one target.
///
/// `Ok` carries the status of any completed HTTP exchange, whatever its
/// class. `Err` means no response was received at all.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: &Target, timeout: Duration) -> anyhow::Result<u16>;
}
