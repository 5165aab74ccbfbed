//! Proxy failover
//!
//! Runs one request through an ordered list of routes, moving to the next
//! route as soon as one fails. Every route is tried at most once per request
//! and there is no delay between attempts.

use super::fetch_errors::FetchError;
use std::fmt::Display;
use std::future::Future;
use tracing::{debug, warn};

/// A successful result together with the route that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Served<T> {
    pub value: T,
    pub route_index: usize,
}

/// Execute `f` against successive routes until one succeeds.
///
/// Scanning starts at `start` (taken modulo the route count) and wraps around,
/// so a caller can pass the index that served its previous request. The closure
/// receives the index of the route to use. Fails with
/// `FetchError::ProxiesExhausted` once every route has failed, or immediately
/// when `routes` is empty.
pub async fn with_failover<R, T, F, Fut>(
    routes: &[R],
    start: usize,
    operation_name: &str,
    mut f: F,
) -> Result<Served<T>, FetchError>
where
    R: Display,
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let total = routes.len();
    if total == 0 {
        warn!("[Failover] {}: no proxies configured", operation_name);
        return Err(FetchError::ProxiesExhausted {
            attempts: 0,
            last_error: "no proxies configured".to_string(),
        });
    }

    let first = start % total;
    let mut last_error = None;

    for attempt in 0..total {
        let index = (first + attempt) % total;

        match f(index).await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(
                        "[Failover] {} succeeded via {} after {} failed attempt(s)",
                        operation_name, routes[index], attempt
                    );
                }
                return Ok(Served {
                    value,
                    route_index: index,
                });
            }
            Err(err) => {
                warn!(
                    "[Failover] {} via {} failed (attempt {}/{}): {}",
                    operation_name,
                    routes[index],
                    attempt + 1,
                    total,
                    err
                );
                last_error = Some(err);
            }
        }
    }

    Err(FetchError::ProxiesExhausted {
        attempts: total,
        last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUTES: [&str; 4] = ["p0", "p1", "p2", "p3"];

    #[tokio::test]
    async fn test_first_route_succeeds() {
        let mut attempted = Vec::new();
        let served = with_failover(&ROUTES, 0, "test", |i| {
            attempted.push(i);
            async move { Ok::<_, FetchError>(i * 10) }
        })
        .await
        .unwrap();

        assert_eq!(served, Served { value: 0, route_index: 0 });
        assert_eq!(attempted, vec![0]);
    }

    #[tokio::test]
    async fn test_fails_over_until_route_k() {
        let k = 2;
        let mut attempted = Vec::new();
        let served = with_failover(&ROUTES, 0, "test", |i| {
            attempted.push(i);
            async move {
                if i < k {
                    Err(FetchError::Timeout)
                } else {
                    Ok(format!("body from {}", i))
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(served.route_index, k);
        assert_eq!(served.value, "body from 2");
        assert_eq!(attempted, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_all_routes_fail() {
        let mut attempted = Vec::new();
        let err = with_failover(&ROUTES, 0, "test", |i| {
            attempted.push(i);
            async move { Err::<(), _>(FetchError::Network(format!("refused by {}", i))) }
        })
        .await
        .unwrap_err();

        assert_eq!(attempted, vec![0, 1, 2, 3]);
        match err {
            FetchError::ProxiesExhausted { attempts, last_error } => {
                assert_eq!(attempts, 4);
                assert!(last_error.contains("refused by 3"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_route_list_fails_without_attempts() {
        let routes: [&str; 0] = [];
        let mut calls = 0;
        let err = with_failover(&routes, 0, "test", |_| {
            calls += 1;
            async { Ok::<_, FetchError>(()) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls, 0);
        assert!(matches!(err, FetchError::ProxiesExhausted { attempts: 0, .. }));
    }

    #[tokio::test]
    async fn test_start_hint_wraps_around() {
        let mut attempted = Vec::new();
        let served = with_failover(&ROUTES, 6, "test", |i| {
            attempted.push(i);
            async move {
                if i == 1 {
                    Ok(i)
                } else {
                    Err(FetchError::Timeout)
                }
            }
        })
        .await
        .unwrap();

        // 6 % 4 == 2, so the scan order is 2, 3, 0, 1
        assert_eq!(attempted, vec![2, 3, 0, 1]);
        assert_eq!(served.route_index, 1);
    }
}
