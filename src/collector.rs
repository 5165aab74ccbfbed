//! Per-account collection from the Kivanet API
//!
//! Each account costs three sequential calls: user info, account info and
//! sign info. The record is filled in as calls return, and the first failure
//! stops the remaining calls for that account only.

use crate::config::{Config, KivaApi};
use crate::services::{FetchError, Transport};
use crate::types::{
    calculate_mining_time, AccountInfo, AccountStats, AccountStatus, Envelope, SignInfo, UserInfo,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Collects account records through a shared transport
pub struct Collector {
    api: KivaApi,
    transport: Transport,
    currency_suffix: String,
}

impl Collector {
    pub fn new(config: &Config, transport: Transport) -> Self {
        Self {
            api: config.api(),
            transport,
            currency_suffix: config.currency_suffix.clone(),
        }
    }

    pub fn is_proxied(&self) -> bool {
        self.transport.is_proxied()
    }

    /// Build one account's record, bounded by `limit`.
    ///
    /// Never fails: errors and timeouts end up in `status`, with whatever
    /// fields were filled before the failure left in place.
    pub async fn collect(&self, token: &str, limit: Duration) -> AccountStats {
        let mut stats = AccountStats::new();

        let outcome = tokio::time::timeout(limit, self.fill(token, &mut stats)).await;
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(
                    "Account {} failed: {}",
                    stats.id.as_deref().unwrap_or("<unknown>"),
                    e
                );
                stats.status = AccountStatus::Error(e.to_string());
            }
            Err(_) => {
                warn!(
                    "Account {} timed out after {}s",
                    stats.id.as_deref().unwrap_or("<unknown>"),
                    limit.as_secs()
                );
                stats.status = AccountStatus::Error(format!("timed out after {}s", limit.as_secs()));
            }
        }

        stats
    }

    async fn fill(&self, token: &str, stats: &mut AccountStats) -> Result<(), FetchError> {
        let headers = request_headers(token)?;
        let mut hint = 0;

        let user: UserInfo = self
            .fetch_object(&self.api.user_info_url(), &headers, &mut hint, stats)
            .await?;
        stats.id = user.id;
        stats.nickname = user.nick_name;

        let account: AccountInfo = self
            .fetch_object(&self.api.account_info_url(), &headers, &mut hint, stats)
            .await?;
        stats.balance = Some(format!("{} {}", account.balance, self.currency_suffix));
        stats.balance_value = account.balance_value();

        let sign: SignInfo = self
            .fetch_object(&self.api.sign_info_url(), &headers, &mut hint, stats)
            .await?;
        stats.mining_time = Some(calculate_mining_time(sign.sign_time, sign.now_time));

        debug!(
            "Account {} collected: balance={:?} mining={:?}",
            stats.id.as_deref().unwrap_or_default(),
            stats.balance,
            stats.mining_time
        );
        Ok(())
    }

    /// GET one endpoint, move `hint` to the proxy that served it, unwrap `object`
    async fn fetch_object<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &HeaderMap,
        hint: &mut usize,
        stats: &mut AccountStats,
    ) -> Result<T, FetchError> {
        let (body, served_by) = self.transport.get_json(url, headers, *hint).await?;

        if let Some(index) = served_by {
            *hint = index;
            stats.proxy = self.transport.proxy_label(index);
        }

        Envelope::unwrap_object(body).map_err(FetchError::Decode)
    }
}

fn request_headers(token: &str) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|_| FetchError::InvalidToken("contains characters not allowed in a header".to_string()))?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);

    Ok(headers)
}
