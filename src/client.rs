//! HTTP client for the query service.
//!
//! Wraps `reqwest` for the streaming endpoint (`POST /query/stream`), its
//! non-streaming companion (`POST /query`), and the read-only metadata
//! endpoints. The streaming response body is decoded incrementally into
//! [`QueryEvent`]s; see [`crate::sse`] for the framing and classification
//! rules and [`crate::session`] for the lifecycle guarantees layered on top.

use crate::error::{ClientError, SessionError};
use crate::models::{
    HealthResponse, QueryRequest, QueryResponse, SchemaResponse, TableListResponse,
};
use crate::session::{drive, CancelToken, SessionOutcome, SessionState, StreamHandler, StreamSession};
use crate::sse::{classify, FrameDecoder, QueryEvent};
use futures_util::stream::{self, Stream};
use futures_util::StreamExt;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::collections::VecDeque;
use std::pin::Pin;
use tracing::debug;

/// Default service address; override with `NLQ_BASE_URL` or
/// [`QueryClient::with_base_url`].
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Environment variable consulted by [`QueryClient::from_env`].
pub const BASE_URL_ENV: &str = "NLQ_BASE_URL";

/// A cancellable, single-consumer sequence of classified stream events.
///
/// Finite and non-restartable: once it yields `StreamEnd`, an error, or
/// ends, it is exhausted.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<QueryEvent, ClientError>> + Send>>;

/// Error body shape used by the service for non-success statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
}

/// Client for the query service API.
pub struct QueryClient {
    /// Base URL of the service.
    pub base_url: String,
    /// Reusable HTTP client.
    client: Client,
}

impl QueryClient {
    /// Create a client against [`DEFAULT_BASE_URL`].
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string())
    }

    /// Create a client against a custom base URL.
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            base_url,
            client: Client::new(),
        }
    }

    /// Create a client from the `NLQ_BASE_URL` environment variable,
    /// falling back to [`DEFAULT_BASE_URL`].
    pub fn from_env() -> Self {
        let base_url =
            std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(base_url)
    }

    /// Open the streaming endpoint for one query.
    ///
    /// A non-success status is rejected here, before any body is read, with
    /// the most specific message available (service `detail` field, else
    /// HTTP status text). On success the returned stream yields classified
    /// events in delivery order; malformed frames are logged and skipped,
    /// never surfaced.
    pub async fn query_stream(&self, request: &QueryRequest) -> Result<EventStream, ClientError> {
        let url = format!("{}/query/stream", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Accept", "text/event-stream")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        struct StreamState {
            bytes: stream::BoxStream<'static, reqwest::Result<bytes::Bytes>>,
            decoder: FrameDecoder,
            pending: VecDeque<QueryEvent>,
            exhausted: bool,
        }

        let state = StreamState {
            bytes: response.bytes_stream().boxed(),
            decoder: FrameDecoder::new(),
            pending: VecDeque::new(),
            exhausted: false,
        };

        let events = stream::unfold(state, |mut state| async move {
            loop {
                // Events are only queued while pending is empty, so after a
                // transport error nothing stale is left to drain.
                if let Some(event) = state.pending.pop_front() {
                    return Some((Ok(event), state));
                }
                if state.exhausted {
                    return None;
                }
                match state.bytes.next().await {
                    Some(Ok(chunk)) => {
                        for frame in state.decoder.feed(&chunk) {
                            match classify(&frame) {
                                Ok(events) => state.pending.extend(events),
                                Err(e) => {
                                    debug!(error = %e, "skipping malformed stream frame")
                                }
                            }
                        }
                        if state.decoder.is_finished() {
                            state.pending.push_back(QueryEvent::StreamEnd);
                            state.exhausted = true;
                        }
                    }
                    Some(Err(e)) => {
                        state.exhausted = true;
                        return Some((Err(ClientError::Http(e)), state));
                    }
                    None => {
                        state.exhausted = true;
                        // Connection closed mid-frame: the trailing partial
                        // line gets one classification attempt.
                        if let Some(frame) = state.decoder.flush() {
                            match classify(&frame) {
                                Ok(events) => state.pending.extend(events),
                                Err(e) => {
                                    debug!(error = %e, "discarding malformed trailing frame")
                                }
                            }
                        }
                        if state.decoder.is_finished() {
                            state.pending.push_back(QueryEvent::StreamEnd);
                        }
                    }
                }
            }
        });

        Ok(Box::pin(events))
    }

    /// Run one streaming query end to end: open the stream, drive it through
    /// `handler`, and return the outcome with the final accumulated state.
    ///
    /// Every call resolves to exactly one of Completed / Errored /
    /// Cancelled; a request that fails before the stream opens surfaces
    /// through `on_error` like any other transport failure, unless
    /// cancellation was already requested, in which case no callback fires
    /// and the outcome is Cancelled.
    pub async fn run_query<H: StreamHandler>(
        &self,
        request: &QueryRequest,
        handler: &mut H,
        cancel: CancelToken,
    ) -> (SessionOutcome, SessionState) {
        let mut session = StreamSession::new();
        let events = match self.query_stream(request).await {
            Ok(events) => events,
            Err(e) => {
                session.mark_terminal();
                // Cancellation wins over a failed start: no callback fires
                // once cancellation has been requested.
                if cancel.is_cancelled() {
                    return (SessionOutcome::Cancelled, session.into_state());
                }
                handler.on_error(&SessionError::Transport(e), session.state());
                return (SessionOutcome::Errored, session.into_state());
            }
        };
        let outcome = drive(events, &mut session, handler, cancel).await;
        (outcome, session.into_state())
    }

    /// Non-streaming query. The response is the degenerate single-frame case
    /// of the stream contract; merge it with
    /// [`StreamSession::apply_response`].
    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, ClientError> {
        let url = format!("{}/query", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;
        Self::json_or_error(response).await
    }

    /// List the tables the service can query.
    pub async fn tables(&self) -> Result<TableListResponse, ClientError> {
        let url = format!("{}/tables", self.base_url);
        let response = self.client.get(&url).send().await?;
        Self::json_or_error(response).await
    }

    /// Fetch one table's schema.
    pub async fn schema(&self, table: &str) -> Result<SchemaResponse, ClientError> {
        let url = format!("{}/schema/{}", self.base_url, table);
        let response = self.client.get(&url).send().await?;
        Self::json_or_error(response).await
    }

    /// Whether the service answers its health endpoint with a success
    /// status.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Ok(false);
        }
        let body: HealthResponse = response.json().await?;
        Ok(body.status == "ok" || body.status == "healthy")
    }

    async fn json_or_error<T: serde::de::DeserializeOwned>(
        response: Response,
    ) -> Result<T, ClientError> {
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        Ok(response.json().await?)
    }

    /// Build the most specific error for a non-success response:
    /// service-provided `detail` > HTTP status text > generic fallback.
    async fn status_error(response: Response) -> ClientError {
        let status = response.status();
        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail);
        let message = detail.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
        ClientError::Server {
            status: status.as_u16(),
            message,
        }
    }
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new()
    }
}
