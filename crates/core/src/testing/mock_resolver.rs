//! Mock resolver for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::resolver::{ResolveError, Resolver};

#[derive(Debug, Clone)]
enum Behavior {
    Members(Vec<String>),
    Fail(String),
    Panic(String),
}

/// Mock implementation of the Resolver trait.
///
/// Returns a configured member list (empty by default), fails with a
/// configured message, or panics. Every resolved URL is recorded.
#[derive(Debug)]
pub struct MockResolver {
    name: String,
    behavior: Arc<RwLock<Behavior>>,
    delay: Arc<RwLock<Option<Duration>>>,
    urls: Arc<RwLock<Vec<String>>>,
}

impl Default for MockResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockResolver {
    /// Create a resolver that returns an empty list.
    pub fn new() -> Self {
        Self::with_behavior(Behavior::Members(Vec::new()))
    }

    /// Create a resolver that returns the given members in order.
    pub fn with_members<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_behavior(Behavior::Members(
            members.into_iter().map(Into::into).collect(),
        ))
    }

    /// Create a resolver whose every call fails.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Fail(message.into()))
    }

    /// Create a resolver whose every call panics.
    pub fn panicking(message: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Panic(message.into()))
    }

    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            name: "mock".to_string(),
            behavior: Arc::new(RwLock::new(behavior)),
            delay: Arc::new(RwLock::new(None)),
            urls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Override the reported strategy name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Return these members from now on.
    pub async fn set_members<I, S>(&self, members: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.behavior.write().await =
            Behavior::Members(members.into_iter().map(Into::into).collect());
    }

    /// Fail with this message from now on.
    pub async fn set_error(&self, message: impl Into<String>) {
        *self.behavior.write().await = Behavior::Fail(message.into());
    }

    /// Sleep before answering each call.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Number of resolve calls made.
    pub async fn call_count(&self) -> usize {
        self.urls.read().await.len()
    }

    /// URLs passed to resolve, in call order.
    pub async fn recorded_urls(&self) -> Vec<String> {
        self.urls.read().await.clone()
    }
}

#[async_trait]
impl Resolver for MockResolver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(&self, source_url: &str) -> Result<Vec<String>, ResolveError> {
        self.urls.write().await.push(source_url.to_string());

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let behavior = self.behavior.read().await.clone();
        match behavior {
            Behavior::Members(members) => Ok(members),
            Behavior::Fail(message) => Err(ResolveError::CommandFailed(message)),
            Behavior::Panic(message) => panic!("{message}"),
        }
    }
}
