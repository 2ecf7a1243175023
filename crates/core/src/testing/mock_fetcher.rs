//! Mock fetcher for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

use crate::fetcher::{FetchOutcome, Fetcher};

/// Mock implementation of the Fetcher trait.
///
/// By default every member yields `Transcript("transcript for <id>")`.
/// Outcomes can be overridden per member, a member can be made to panic,
/// and a gate can hold every fetch until it is reopened:
///
/// ```rust,ignore
/// let fetcher = MockFetcher::new();
/// fetcher.close_gate();
/// // ... job is now parked on its first fetch ...
/// fetcher.open_gate();
/// ```
#[derive(Debug)]
pub struct MockFetcher {
    outcomes: Arc<RwLock<HashMap<String, FetchOutcome>>>,
    panics: Arc<RwLock<HashSet<String>>>,
    fetched: Arc<RwLock<Vec<String>>>,
    gate: watch::Sender<bool>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            outcomes: Arc::new(RwLock::new(HashMap::new())),
            panics: Arc::new(RwLock::new(HashSet::new())),
            fetched: Arc::new(RwLock::new(Vec::new())),
            gate,
        }
    }

    /// Text returned for members without an override.
    pub fn default_transcript(member_id: &str) -> String {
        format!("transcript for {member_id}")
    }

    /// Return `outcome` for `member_id`.
    pub async fn set_outcome(&self, member_id: impl Into<String>, outcome: FetchOutcome) {
        self.outcomes.write().await.insert(member_id.into(), outcome);
    }

    /// Report an error with `detail` for `member_id`.
    pub async fn fail_on(&self, member_id: impl Into<String>, detail: impl Into<String>) {
        self.set_outcome(member_id, FetchOutcome::Error(detail.into()))
            .await;
    }

    /// Panic when `member_id` is fetched.
    pub async fn panic_on(&self, member_id: impl Into<String>) {
        self.panics.write().await.insert(member_id.into());
    }

    /// Hold every subsequent fetch until [`open_gate`](Self::open_gate).
    pub fn close_gate(&self) {
        self.gate.send_replace(false);
    }

    /// Release held fetches.
    pub fn open_gate(&self) {
        self.gate.send_replace(true);
    }

    /// Member IDs fetched so far, in call order.
    pub async fn fetched_ids(&self) -> Vec<String> {
        self.fetched.read().await.clone()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, member_id: &str) -> FetchOutcome {
        self.fetched.write().await.push(member_id.to_string());

        let mut gate = self.gate.subscribe();
        // The sender lives as long as self, so this only returns once open.
        let _ = gate.wait_for(|open| *open).await;

        if self.panics.read().await.contains(member_id) {
            panic!("mock fetcher panicked on {member_id}");
        }

        self.outcomes
            .read()
            .await
            .get(member_id)
            .cloned()
            .unwrap_or_else(|| FetchOutcome::Transcript(Self::default_transcript(member_id)))
    }
}
