//! Request transport: direct, or through a failover list of proxies

use super::failover::with_failover;
use super::fetch_errors::FetchError;
use super::proxy::{build_client, ProxyDescriptor};
use reqwest::header::HeaderMap;
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// A proxy with its pre-built client
#[derive(Debug, Clone)]
pub struct ProxiedClient {
    pub proxy: ProxyDescriptor,
    pub client: Client,
}

impl fmt::Display for ProxiedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.proxy.label())
    }
}

/// How requests leave the process
#[derive(Debug, Clone)]
pub enum Transport {
    Direct(Client),
    Proxied(Vec<ProxiedClient>),
}

impl Transport {
    pub fn direct(timeout: Duration) -> Result<Self, FetchError> {
        Ok(Transport::Direct(build_client(None, timeout)?))
    }

    /// Build one client per proxy. Fails on the first proxy reqwest rejects.
    pub fn proxied(proxies: Vec<ProxyDescriptor>, timeout: Duration) -> Result<Self, FetchError> {
        let clients = proxies
            .into_iter()
            .map(|proxy| {
                let client = build_client(Some(&proxy), timeout)?;
                Ok(ProxiedClient { proxy, client })
            })
            .collect::<Result<Vec<_>, FetchError>>()?;

        Ok(Transport::Proxied(clients))
    }

    pub fn is_proxied(&self) -> bool {
        matches!(self, Transport::Proxied(_))
    }

    /// `host:port` of the proxy at `index`, if any
    pub fn proxy_label(&self, index: usize) -> Option<String> {
        match self {
            Transport::Direct(_) => None,
            Transport::Proxied(clients) => clients.get(index).map(|c| c.proxy.label()),
        }
    }

    /// GET `url` and decode the JSON body.
    ///
    /// Returns the index of the proxy that served the request, or `None` for
    /// the direct transport. `hint` is where the proxy scan starts.
    pub async fn get_json(
        &self,
        url: &str,
        headers: &HeaderMap,
        hint: usize,
    ) -> Result<(Value, Option<usize>), FetchError> {
        match self {
            Transport::Direct(client) => {
                let value = send_get(client, url, headers).await?;
                Ok((value, None))
            }
            Transport::Proxied(clients) => {
                let served = with_failover(clients.as_slice(), hint, url, |index| {
                    send_get(&clients[index].client, url, headers)
                })
                .await?;
                Ok((served.value, Some(served.route_index)))
            }
        }
    }
}

async fn send_get(client: &Client, url: &str, headers: &HeaderMap) -> Result<Value, FetchError> {
    debug!("GET {}", url);

    let response = client
        .get(url)
        .headers(headers.clone())
        .send()
        .await
        .map_err(|e| FetchError::from_reqwest(&e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FetchError::from_response(status.as_u16(), &body));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| FetchError::Decode(e.to_string()))
}
