//! Client for the hosted chat-completions API.

use std::pin::Pin;
use std::time::Duration;

use async_stream::try_stream;
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use tracing::{debug, warn};
use url::Url;

use crate::error::ApiError;
use crate::types::{ChatRequest, ChatResponse, StreamChunk, DEFAULT_BASE_URL};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
/// Default retry budget for retryable statuses (429, 5xx).
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Base delay for exponential backoff between retries.
const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// A stream of parsed chunks from a streaming completion.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, ApiError>> + Send>>;

/// Builder for [`ChatClient`].
///
/// # Example
///
/// ```rust,ignore
/// use quill_model::ChatClient;
///
/// let client = ChatClient::builder(api_key)
///     .with_base_url("https://integrate.api.nvidia.com/v1")
///     .with_timeout(std::time::Duration::from_secs(60))
///     .build()?;
/// ```
pub struct ChatClientBuilder {
    api_key: String,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
}

impl ChatClientBuilder {
    fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Override the API base URL (e.g. for a compatible endpoint).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the retry budget for retryable statuses.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Validate the configuration and build the client.
    pub fn build(self) -> Result<ChatClient, ApiError> {
        if self.api_key.trim().is_empty() {
            return Err(ApiError::MissingApiKey);
        }

        let endpoint = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let endpoint =
            Url::parse(&endpoint).map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))?;

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ApiError::Connection(e.to_string()))?;

        debug!(endpoint = %endpoint, "chat client initialized");
        Ok(ChatClient {
            http,
            endpoint,
            api_key: self.api_key,
            timeout: self.timeout,
            max_retries: self.max_retries,
        })
    }
}

/// Client for the hosted chat-completions endpoint.
///
/// Bearer-authenticated JSON POSTs; 429 and 5xx responses are retried
/// with exponential backoff up to the configured budget. Streaming
/// responses are parsed from the server-sent-events body.
#[derive(Debug)]
pub struct ChatClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: String,
    timeout: Duration,
    max_retries: u32,
}

impl ChatClient {
    /// Start building a client with the given API key.
    pub fn builder(api_key: impl Into<String>) -> ChatClientBuilder {
        ChatClientBuilder::new(api_key)
    }

    /// Send a non-streaming completion request.
    pub async fn complete(&self, mut request: ChatRequest) -> Result<ChatResponse, ApiError> {
        request.stream = false;
        let response = self.send_with_retry(&request).await?;
        response.json::<ChatResponse>().await.map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Send a streaming completion request.
    ///
    /// The returned stream yields parsed chunks until the server's
    /// `[DONE]` sentinel. Unparseable data lines are skipped with a
    /// warning, mirroring the endpoint's keep-alive behavior; transport
    /// failures end the stream with [`ApiError::Stream`].
    pub async fn complete_stream(&self, mut request: ChatRequest) -> Result<ChunkStream, ApiError> {
        request.stream = true;
        let response = self.send_with_retry(&request).await?;

        let stream = try_stream! {
            let mut events = response.bytes_stream().eventsource();
            while let Some(event) = events.next().await {
                let event = event.map_err(|e| ApiError::Stream(e.to_string()))?;
                if event.data == "[DONE]" {
                    debug!("stream completed");
                    break;
                }
                match serde_json::from_str::<StreamChunk>(&event.data) {
                    Ok(chunk) => yield chunk,
                    Err(error) => {
                        warn!(%error, "skipping unparseable stream chunk");
                    }
                }
            }
        };
        Ok(Box::pin(stream))
    }

    async fn send_with_retry(&self, request: &ChatRequest) -> Result<reqwest::Response, ApiError> {
        let mut attempt: u32 = 0;
        loop {
            let mut builder =
                self.http.post(self.endpoint.clone()).bearer_auth(&self.api_key).json(request);
            // The whole-request timeout would cut off long-lived streams;
            // streaming requests rely on the connect timeout instead.
            if !request.stream {
                builder = builder.timeout(self.timeout);
            }
            let result = builder.send().await;

            let error = match result {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status().as_u16();
                    let body = response.text().await.ok().filter(|b| !b.is_empty());
                    ApiError::from_status(status, body)
                }
                Err(e) if e.is_timeout() => ApiError::Timeout { seconds: self.timeout.as_secs() },
                Err(e) => ApiError::Connection(e.to_string()),
            };

            if !error.is_retryable() || attempt >= self.max_retries {
                return Err(error);
            }

            let delay = RETRY_BASE_DELAY * 2u32.pow(attempt);
            warn!(%error, attempt, delay_ms = delay.as_millis() as u64, "retrying request");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
