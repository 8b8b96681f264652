//! Classifier invocation from the caller's side
//!
//! The classifier is reached either in-process or over HTTP. Either way the
//! caller always gets a [`CommandResponse`]; transport failures become the
//! fixed apology reply and are never retried.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::{Classifier, CommandResponse};
use crate::{Error, Result};

/// Path of the classifier endpoint on a Nova server
pub const COMMAND_PATH: &str = "/api/command";

/// Something that answers commands
#[async_trait]
pub trait Assistant: Send + Sync {
    /// Answer a command; never fails
    async fn respond(&self, command: &str) -> CommandResponse;

    /// Short label for logging
    fn name(&self) -> &'static str;
}

/// Classifies in-process
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalAssistant {
    classifier: Classifier,
}

impl LocalAssistant {
    /// Create a local assistant
    #[must_use]
    pub const fn new(classifier: Classifier) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl Assistant for LocalAssistant {
    async fn respond(&self, command: &str) -> CommandResponse {
        self.classifier.classify(command)
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommandRequest<'a> {
    command: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
}

/// Classifies through a remote Nova server
pub struct RemoteAssistant {
    client: reqwest::Client,
    endpoint: String,
    user_id: Option<String>,
}

impl RemoteAssistant {
    /// Create a client for the server at `base_url`
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}{COMMAND_PATH}", base_url.trim_end_matches('/')),
            user_id: None,
        })
    }

    /// Attach a user ID to every request
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Endpoint URL used for classification
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Make the remote call without the fallback mapping
    ///
    /// # Errors
    ///
    /// Returns `Error::Classification` on transport failure, a non-2xx
    /// status or an undecodable body
    pub async fn send(&self, command: &str) -> Result<CommandResponse> {
        let request = CommandRequest {
            command,
            user_id: self.user_id.as_deref(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Classification(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Classification(format!("classifier returned {status}: {body}")));
        }

        response
            .json::<CommandResponse>()
            .await
            .map_err(|e| Error::Classification(e.to_string()))
    }
}

#[async_trait]
impl Assistant for RemoteAssistant {
    async fn respond(&self, command: &str) -> CommandResponse {
        match self.send(command).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, endpoint = %self.endpoint, "error sending command to classifier");
                CommandResponse::transport_failure()
            }
        }
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
