pub mod catalog;
pub mod config;
pub mod generator;
pub mod pool;
pub mod http_client;
pub mod probe;
pub mod queue;
pub mod concurrent;
pub mod output;
pub mod utils;

pub use crate::catalog::PayloadCatalog;
pub use crate::concurrent::{DispatchState, DispatchStats, ProbeDispatcher};
pub use crate::generator::{BaseUrl, Target, TargetGenerator};
pub use crate::output::ProbeResult;
