// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! REST transport for openHAB.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::event::{DEFAULT_CHANNEL_CAPACITY, RawItemEvent};
use crate::protocol::{EventStreamDecoder, RawItem, Transport};

// ============================================================================
// RestConfig
// ============================================================================

/// Credentials for the openHAB REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// HTTP basic authentication.
    Basic {
        /// Username for authentication.
        username: String,
        /// Password for authentication.
        password: String,
    },
    /// API token, sent as a bearer token.
    Token(String),
}

/// Configuration for the REST transport.
///
/// # Examples
///
/// ```
/// use openhab_items::protocol::RestConfig;
/// use std::time::Duration;
///
/// let config = RestConfig::new("http://openhab.local:8080/rest/")
///     .with_token("oh.items.abc123")
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.base_url(), "http://openhab.local:8080/rest");
/// ```
#[derive(Debug, Clone)]
pub struct RestConfig {
    base_url: String,
    credentials: Option<Credentials>,
    timeout: Duration,
    event_topics: String,
}

impl RestConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default topic filter of the event stream.
    pub const DEFAULT_EVENT_TOPICS: &'static str = "openhab/items/*";

    /// Creates a configuration for the REST root, e.g. `http://host:8080/rest`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: None,
            timeout: Self::DEFAULT_TIMEOUT,
            event_topics: Self::DEFAULT_EVENT_TOPICS.to_string(),
        }
    }

    /// Sets basic authentication credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials::Basic {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Sets an API token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::Token(token.into()));
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the topic filter of the event stream.
    #[must_use]
    pub fn with_event_topics(mut self, topics: impl Into<String>) -> Self {
        self.event_topics = topics.into();
        self
    }

    /// Returns the REST root URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the credentials if set.
    #[must_use]
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the event topic filter.
    #[must_use]
    pub fn event_topics(&self) -> &str {
        &self.event_topics
    }

    /// Creates a `RestTransport` from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is not an HTTP(S) URL or the HTTP
    /// client cannot be created.
    pub fn into_transport(self) -> Result<RestTransport, TransportError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(TransportError::InvalidAddress(self.base_url));
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(TransportError::Http)?;

        // The event stream stays open indefinitely; only connecting is bounded
        let stream_client = Client::builder()
            .connect_timeout(self.timeout)
            .build()
            .map_err(TransportError::Http)?;

        Ok(RestTransport {
            base_url: self.base_url,
            client,
            stream_client,
            credentials: self.credentials,
            event_topics: self.event_topics,
        })
    }
}

// ============================================================================
// RestTransport
// ============================================================================

/// Transport over openHAB's REST API.
///
/// | Operation | Request |
/// |-----------|---------|
/// | update    | `PUT {base}/items/{name}/state` |
/// | command   | `POST {base}/items/{name}` |
/// | fetch     | `GET {base}/items/{name}` |
/// | delete    | `DELETE {base}/items/{name}` |
/// | events    | `GET {base}/events?topics=...` |
///
/// # Examples
///
/// ```no_run
/// use openhab_items::protocol::{RestConfig, RestTransport, Transport};
///
/// # async fn example() -> openhab_items::Result<()> {
/// let transport = RestTransport::new(RestConfig::new("http://openhab:8080/rest"))?;
/// transport.send_command("Kitchen_Light", "ON").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RestTransport {
    base_url: String,
    client: Client,
    stream_client: Client,
    credentials: Option<Credentials>,
    event_topics: String,
}

impl RestTransport {
    /// Creates a transport from a configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid.
    pub fn new(config: RestConfig) -> Result<Self, TransportError> {
        config.into_transport()
    }

    /// Returns the REST root URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn item_url(&self, item: &str, suffix: &str) -> String {
        format!(
            "{}/items/{}{suffix}",
            self.base_url,
            urlencoding::encode(item)
        )
    }

    fn events_url(&self) -> String {
        format!(
            "{}/events?topics={}",
            self.base_url,
            urlencoding::encode(&self.event_topics)
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some(Credentials::Basic { username, password }) => {
                request.basic_auth(username, Some(password))
            }
            Some(Credentials::Token(token)) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends a request and maps failure statuses.
    async fn execute(&self, request: RequestBuilder, item: &str) -> Result<Response, TransportError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(TransportError::Http)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(TransportError::AuthenticationFailed);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(TransportError::NotFound(item.to_string()));
        }
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                path: response.url().path().to_string(),
            });
        }

        Ok(response)
    }

    async fn send_text(
        &self,
        request: RequestBuilder,
        item: &str,
        body: &str,
    ) -> Result<(), TransportError> {
        let request = request
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(body.to_string());
        self.execute(request, item).await?;
        Ok(())
    }

    /// Opens the server's event stream.
    ///
    /// A background task reads the stream and forwards decoded item events
    /// until the server closes it, the connection fails or the receiver is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns error if the stream cannot be opened.
    pub async fn open_event_stream(&self) -> Result<mpsc::Receiver<RawItemEvent>, TransportError> {
        let url = self.events_url();

        tracing::debug!(url = %url, "Opening event stream");

        let request = self
            .stream_client
            .get(&url)
            .header(reqwest::header::ACCEPT, "text/event-stream");
        let mut response = self.execute(request, "events").await?;

        let (tx, rx) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            let mut decoder = EventStreamDecoder::new();
            loop {
                match response.chunk().await {
                    Ok(Some(chunk)) => {
                        for event in decoder.feed(&chunk) {
                            if tx.send(event).await.is_err() {
                                tracing::debug!("Event receiver dropped, closing stream");
                                return;
                            }
                        }
                    }
                    Ok(None) => {
                        tracing::info!("Event stream closed by server");
                        return;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Event stream failed");
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }
}

impl Transport for RestTransport {
    async fn send_update(&self, item: &str, state: &str) -> Result<(), TransportError> {
        let url = self.item_url(item, "/state");
        tracing::debug!(url = %url, state = %state, "Sending item update");
        self.send_text(self.client.put(&url), item, state).await
    }

    async fn send_command(&self, item: &str, command: &str) -> Result<(), TransportError> {
        let url = self.item_url(item, "");
        tracing::debug!(url = %url, command = %command, "Sending item command");
        self.send_text(self.client.post(&url), item, command).await
    }

    async fn fetch_item(&self, item: &str) -> Result<RawItem, TransportError> {
        let url = self.item_url(item, "");
        tracing::debug!(url = %url, "Fetching item");

        let request = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json");
        let body = self
            .execute(request, item)
            .await?
            .text()
            .await
            .map_err(TransportError::Http)?;

        tracing::debug!(body = %body, "Received item");

        serde_json::from_str(&body).map_err(|e| TransportError::InvalidResponse(e.to_string()))
    }

    async fn delete_item(&self, item: &str) -> Result<(), TransportError> {
        let url = self.item_url(item, "");
        tracing::debug!(url = %url, "Deleting item");
        self.execute(self.client.delete(&url), item).await?;
        Ok(())
    }
}
