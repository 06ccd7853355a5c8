//! HTTP client for the published schedule

use crate::error::{Error, Result};
use crate::models::WireSchedule;
use crate::timetable::Schedule;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default schedule endpoint (local `pmolive serve`)
pub const DEFAULT_SCHEDULE_URL: &str = "http://127.0.0.1:8080/schedule";

/// Default timeout for schedule requests
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default User-Agent
pub const DEFAULT_USER_AGENT: &str = "pmolive/0.1.0";

/// Anything that can hand out a fresh schedule snapshot.
///
/// The refresh coordinator only depends on this trait, so tests can feed it
/// canned snapshots without a server.
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    /// Fetch the current snapshot.
    ///
    /// Implementations must only return snapshots where every channel has at
    /// least one item.
    async fn fetch(&self) -> Result<Schedule>;
}

/// Schedule HTTP client
///
/// ```no_run
/// use pmoschedule::{ScheduleClient, ScheduleSource};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = ScheduleClient::builder()
///         .url("http://127.0.0.1:8080/schedule")
///         .build()?;
///     let schedule = client.fetch().await?;
///     println!("{} channels", schedule.channel_count());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ScheduleClient {
    client: Client,
    url: Url,
    request_timeout: Duration,
}

impl ScheduleClient {
    /// Create a client for the default local endpoint
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a builder for configuring the client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Download and decode the published document, without checking channels
    pub async fn fetch_wire(&self) -> Result<WireSchedule> {
        debug!("Fetching schedule: {}", self.url);

        let response = self
            .client
            .get(self.url.clone())
            .timeout(self.request_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::other(format!(
                "Schedule server returned error status: {}",
                response.status()
            )));
        }

        // Le corps est lu en texte pour que les erreurs JSON passent par Error::Json
        let body = response.text().await?;
        let wire: WireSchedule = serde_json::from_str(&body)?;
        Ok(wire)
    }
}

#[async_trait]
impl ScheduleSource for ScheduleClient {
    async fn fetch(&self) -> Result<Schedule> {
        let schedule = self.fetch_wire().await?.into_schedule()?;
        schedule.ensure_playable()?;

        debug!(
            channels = schedule.channel_count(),
            "Received schedule snapshot"
        );
        Ok(schedule)
    }
}

/// Builder for configuring a ScheduleClient
#[derive(Debug)]
pub struct ClientBuilder {
    client: Option<Client>,
    url: String,
    request_timeout: Duration,
    user_agent: String,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            client: None,
            url: DEFAULT_SCHEDULE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom HTTP client
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the schedule URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set a custom User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ScheduleClient> {
        let url = Url::parse(&self.url)?;

        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .user_agent(&self.user_agent)
                .timeout(self.request_timeout)
                .build()?,
        };

        Ok(ScheduleClient {
            client,
            url,
            request_timeout: self.request_timeout,
        })
    }
}
