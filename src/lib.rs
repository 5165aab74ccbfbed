//! Kiva Mining Monitor Library
//!
//! Polls the Kivanet mining-rewards API for a set of accounts and renders a
//! console table of balances, mining time and status every cycle.
//!
//! Requests can go out directly or through a list of proxies. With proxies,
//! each request fails over to the next proxy until one answers, and an
//! account's later calls start from the proxy that served its previous call.

pub mod collector;
pub mod config;
pub mod display;
pub mod loader;
pub mod scheduler;
pub mod services;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use collector::Collector;
pub use config::{Config, KivaApi};
pub use display::{format_increment, BalanceTracker, StatsDisplay};
pub use loader::{load_lines, load_proxies, load_tokens};
pub use scheduler::Scheduler;
pub use services::{FetchError, ProxyDescriptor, Transport};
pub use types::{calculate_mining_time, AccountStats, AccountStatus};
