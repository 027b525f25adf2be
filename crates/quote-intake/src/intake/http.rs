use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Url};
use tracing::debug;

use super::dispatch::{
    ConfirmationRequest, ConfirmationTrigger, DispatchError, RelayEndpoint, RelayPayload,
};

/// Posts the shaped request form-encoded to a hosted form relay.
///
/// No timeout is configured here; the client's transport defaults apply.
#[derive(Debug, Clone)]
pub struct HttpRelayEndpoint {
    client: Client,
    url: Url,
}

impl HttpRelayEndpoint {
    pub fn new(client: Client, url: Url) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl RelayEndpoint for HttpRelayEndpoint {
    async fn submit(&self, payload: &RelayPayload) -> Result<(), DispatchError> {
        let response = self
            .client
            .post(self.url.clone())
            .header(ACCEPT, "application/json")
            .form(payload.entries())
            .send()
            .await?;

        let status = response.status();
        debug!(status = status.as_u16(), "relay endpoint responded");
        if status.is_success() {
            Ok(())
        } else {
            Err(DispatchError::Status(status.as_u16()))
        }
    }
}

/// Invokes the confirmation-email function with a JSON body.
#[derive(Debug, Clone)]
pub struct HttpConfirmationTrigger {
    client: Client,
    url: Url,
    api_key: Option<String>,
}

impl HttpConfirmationTrigger {
    pub fn new(client: Client, url: Url, api_key: Option<String>) -> Self {
        Self {
            client,
            url,
            api_key,
        }
    }

    fn credentials(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let Some(key) = self.api_key.as_deref() else {
            return headers;
        };
        if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {key}")) {
            headers.insert(AUTHORIZATION, bearer);
        }
        if let Ok(value) = HeaderValue::from_str(key) {
            headers.insert("apikey", value);
        }
        headers
    }
}

#[async_trait]
impl ConfirmationTrigger for HttpConfirmationTrigger {
    async fn trigger(&self, request: &ConfirmationRequest) -> Result<(), DispatchError> {
        let response = self
            .client
            .post(self.url.clone())
            .headers(self.credentials())
            .json(request)
            .send()
            .await?;

        response.error_for_status()?;
        Ok(())
    }
}
