use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use url::Url;

use crate::data_models::{
    ErrorPayload, FALLBACK_ERROR_MESSAGE, Query, ResearchRequest, ResearchResult,
};
use crate::error::ClientError;

/// Fixed path of the research endpoint, relative to the service base URL.
pub const RESEARCH_PATH: &str = "/api/research";

/// Shared "request in flight" flag. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag(Arc<AtomicBool>);

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Marks the flag busy, or returns `None` if it already was.
    pub fn acquire(&self) -> Option<BusyGuard> {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| BusyGuard(self.0.clone()))
    }
}

/// Clears the busy flag when dropped, whichever way the call ended.
#[derive(Debug)]
pub struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Anything that can answer a research query.
#[async_trait]
pub trait ResearchService: Send + Sync {
    async fn research(&self, query: &Query) -> Result<ResearchResult, ClientError>;
}

pub struct ResearchClient {
    http: reqwest::Client,
    endpoint: Url,
    busy: BusyFlag,
}

impl ResearchClient {
    pub fn new(base_url: &Url, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            endpoint: base_url.join(RESEARCH_PATH)?,
            busy: BusyFlag::new(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Validates `raw` and submits it. Blank input fails before any request is made.
    pub async fn submit_query(&self, raw: &str) -> Result<ResearchResult, ClientError> {
        let query = Query::parse(raw)?;
        self.research(&query).await
    }

    async fn exchange(&self, query: &Query) -> Result<ResearchResult, ClientError> {
        let result = self.post(query).await;
        if let Err(e) = &result {
            tracing::error!("research query failed: {e}");
        }
        result
    }

    async fn post(&self, query: &Query) -> Result<ResearchResult, ClientError> {
        tracing::info!("submitting research query to {}: {query}", self.endpoint);

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&ResearchRequest { query })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorPayload>()
                .await
                .ok()
                .and_then(|payload| payload.message())
                .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string());
            tracing::warn!("research service answered {status}: {message}");
            return Err(ClientError::Service(message));
        }

        let result = response.json::<ResearchResult>().await?;
        tracing::debug!(
            "received summary of {} words with {} sources",
            result.word_count,
            result.sources.len()
        );
        Ok(result)
    }
}

#[async_trait]
impl ResearchService for ResearchClient {
    async fn research(&self, query: &Query) -> Result<ResearchResult, ClientError> {
        let Some(_guard) = self.busy.acquire() else {
            return Err(ClientError::InFlight);
        };
        self.exchange(query).await
    }
}

/// A [`ResearchClient`] shared by many independent submitters, such as the
/// visitors of the preview server. Each call is its own submission and only
/// the caller's surface tracks busy state, so overlapping calls all go out.
pub struct ConcurrentClient {
    inner: ResearchClient,
}

impl ConcurrentClient {
    pub fn new(inner: ResearchClient) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ResearchService for ConcurrentClient {
    async fn research(&self, query: &Query) -> Result<ResearchResult, ClientError> {
        self.inner.exchange(query).await
    }
}
