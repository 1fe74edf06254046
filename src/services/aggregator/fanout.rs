use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use crate::config::{NodePeer, Peer};
use crate::services::remote::RemoteError;

/// Identifies a peer inside one fan-out round.
pub trait PeerKey {
    fn key(&self) -> &str;
}

impl PeerKey for Peer {
    fn key(&self) -> &str {
        &self.name
    }
}

impl PeerKey for NodePeer {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Why one peer produced no payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerFailure {
    pub kind: &'static str,
    pub message: String,
}

impl PeerFailure {
    pub fn new(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<RemoteError> for PeerFailure {
    fn from(e: RemoteError) -> Self {
        Self::new(e.kind(), e.to_string())
    }
}

impl std::fmt::Display for PeerFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone)]
pub struct PeerOutcome<T> {
    pub peer: String,
    pub result: Result<T, PeerFailure>,
}

impl<T> PeerOutcome<T> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FanOutOptions {
    /// Upper bound for one peer call. The clock starts once a permit is held,
    /// so waiting behind `max_concurrency` does not count against it.
    pub timeout: Duration,
    pub max_concurrency: usize,
}

impl Default for FanOutOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_concurrency: 32,
        }
    }
}

/// Call `fetch` once per peer concurrently and collect one outcome per peer.
///
/// Never fails as a whole. Outcomes come back in completion order.
pub async fn fan_out<P, T, E, F, Fut>(
    peers: impl IntoIterator<Item = P>,
    options: FanOutOptions,
    fetch: F,
) -> Vec<PeerOutcome<T>>
where
    P: PeerKey + Send + 'static,
    T: Send + 'static,
    E: Into<PeerFailure> + Send + 'static,
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let peers: Vec<P> = peers.into_iter().collect();
    if peers.is_empty() {
        return Vec::new();
    }

    let expected: Vec<String> = peers.iter().map(|p| p.key().to_string()).collect();
    let (tx, mut rx) = mpsc::channel::<PeerOutcome<T>>(peers.len());
    let permits = Arc::new(Semaphore::new(options.max_concurrency.max(1)));
    let fetch = Arc::new(fetch);
    let timeout = options.timeout;

    let mut join_set = JoinSet::new();
    for peer in peers {
        let tx = tx.clone();
        let permits = permits.clone();
        let fetch = fetch.clone();

        join_set.spawn(async move {
            let name = peer.key().to_string();
            let _permit = permits.acquire_owned().await;

            let result = match tokio::time::timeout(timeout, (*fetch)(peer)).await {
                Ok(result) => result.map_err(Into::into),
                Err(_) => Err(PeerFailure::new(
                    "timeout",
                    format!("no response within {}s", timeout.as_secs_f32()),
                )),
            };

            // Capacity equals the peer count, so this never waits.
            let _ = tx.send(PeerOutcome { peer: name, result }).await;
        });
    }
    drop(tx);

    while let Some(joined) = join_set.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "Fan-out task ended abnormally");
        }
    }

    let mut outcomes = Vec::with_capacity(expected.len());
    while let Some(outcome) = rx.recv().await {
        outcomes.push(outcome);
    }

    if outcomes.len() < expected.len() {
        for name in expected {
            if !outcomes.iter().any(|o| o.peer == name) {
                outcomes.push(PeerOutcome {
                    peer: name,
                    result: Err(PeerFailure::new("aborted", "collection task aborted")),
                });
            }
        }
    }

    outcomes
}
