//! Fixed-interval poll loop

use crate::collector::Collector;
use crate::display::StatsDisplay;
use crate::types::AccountStats;
use futures::future::join_all;
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Drives collection cycles over every token and hands results to the display
pub struct Scheduler {
    collector: Collector,
    tokens: Vec<String>,
    display: StatsDisplay,
    poll_interval: Duration,
    account_timeout: Duration,
}

impl Scheduler {
    pub fn new(
        collector: Collector,
        tokens: Vec<String>,
        poll_interval: Duration,
        account_timeout: Duration,
    ) -> Self {
        let display = StatsDisplay::new(collector.is_proxied());
        Self {
            collector,
            tokens,
            display,
            poll_interval,
            account_timeout,
        }
    }

    pub fn display(&self) -> &StatsDisplay {
        &self.display
    }

    /// Collect every account concurrently and wait for all of them.
    /// Results are in token order regardless of completion order.
    pub async fn run_cycle(&self) -> Vec<AccountStats> {
        let started = std::time::Instant::now();

        let stats = join_all(
            self.tokens
                .iter()
                .map(|token| self.collector.collect(token, self.account_timeout)),
        )
        .await;

        let failed = stats.iter().filter(|s| s.status.is_error()).count();
        debug!(
            "Cycle finished in {:?}: {} ok, {} failed",
            started.elapsed(),
            stats.len() - failed,
            failed
        );
        stats
    }

    /// Run one cycle and render it
    pub async fn run_once(&mut self) -> Vec<AccountStats> {
        let stats = self.run_cycle().await;
        self.display.render(&stats);
        stats
    }

    /// Poll until Ctrl+C
    pub async fn run(self) {
        self.run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    }

    /// Poll until `shutdown` resolves.
    ///
    /// A cycle always finishes, display included, before the next tick is
    /// awaited. Ticks missed while a slow cycle runs are skipped, not queued.
    /// Shutdown is watched during cycles too; an interrupted cycle is dropped
    /// without rendering.
    pub async fn run_until<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(
            "Polling {} accounts every {}s",
            self.tokens.len(),
            self.poll_interval.as_secs()
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = &mut shutdown => break,
            }
            tokio::select! {
                _ = self.run_once() => {}
                _ = &mut shutdown => {
                    debug!("Shutdown requested mid-cycle");
                    break;
                }
            }
        }

        info!("Shutting down");
    }
}
