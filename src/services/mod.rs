//! Network services: proxy parsing, client construction, failover

pub mod failover;
pub mod fetch_errors;
pub mod proxy;
pub mod transport;

pub use failover::{with_failover, Served};
pub use fetch_errors::FetchError;
pub use proxy::{build_client, ProxyDescriptor};
pub use transport::{ProxiedClient, Transport};
