use std::cell::RefCell;
use std::time::Duration;

use compost_core::{ConversationId, DirectConfig};
use compost_logging::{compost_debug, compost_info};
use reqwest::header::{CONTENT_TYPE, COOKIE};
use serde::{Deserialize, Serialize};
use url::Url;

use super::DeletionStrategy;
use crate::error::DeleteError;
use crate::page::HostPage;

#[derive(Debug, Deserialize)]
struct SessionResponse {
    #[serde(rename = "accessToken")]
    access_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct VisibilityPatch {
    is_visible: bool,
}

#[derive(Debug, Deserialize)]
struct PatchResponse {
    #[serde(default)]
    success: Option<bool>,
}

/// Hides conversations through the host's backend API.
///
/// The bearer token comes from the session endpoint and is fetched at most
/// once per strategy instance.
pub struct DirectCallStrategy {
    client: reqwest::Client,
    config: DirectConfig,
    base: Url,
    token: RefCell<Option<String>>,
}

impl DirectCallStrategy {
    pub fn new(config: DirectConfig) -> Result<Self, DeleteError> {
        let base = Url::parse(&config.base_url)
            .map_err(|err| DeleteError::InvalidEndpoint(format!("{}: {err}", config.base_url)))?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| DeleteError::Network(err.to_string()))?;
        Ok(Self {
            client,
            config,
            base,
            token: RefCell::new(None),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, DeleteError> {
        self.base
            .join(path)
            .map_err(|err| DeleteError::InvalidEndpoint(format!("{path}: {err}")))
    }

    fn with_cookie(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.session_cookie {
            Some(cookie) => request.header(COOKIE, cookie.as_str()),
            None => request,
        }
    }

    async fn access_token(&self) -> Result<String, DeleteError> {
        let cached = self.token.borrow().clone();
        if let Some(token) = cached {
            return Ok(token);
        }

        let url = self.endpoint(&self.config.session_path)?;
        let response = self
            .with_cookie(self.client.get(url))
            .send()
            .await
            .map_err(|err| DeleteError::CredentialFetchFailed(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DeleteError::CredentialFetchFailed(format!(
                "session endpoint answered {}",
                status.as_u16()
            )));
        }
        let body = response
            .bytes()
            .await
            .map_err(|err| DeleteError::CredentialFetchFailed(err.to_string()))?;
        let session: SessionResponse = serde_json::from_slice(&body)
            .map_err(|err| DeleteError::CredentialFetchFailed(err.to_string()))?;
        let token = session
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                DeleteError::CredentialFetchFailed("session carries no access token".to_string())
            })?;

        compost_info!("Got access token");
        *self.token.borrow_mut() = Some(token.clone());
        Ok(token)
    }
}

#[async_trait::async_trait(?Send)]
impl<P: HostPage + 'static> DeletionStrategy<P> for DirectCallStrategy {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn requires_identifier(&self) -> bool {
        true
    }

    fn item_delay(&self) -> Duration {
        self.config.item_delay
    }

    async fn delete_one(
        &self,
        id: Option<&ConversationId>,
        _item: P::Element,
    ) -> Result<(), DeleteError> {
        let id = id.ok_or(DeleteError::IdentityUnresolved)?;
        let token = self.access_token().await?;
        let url = self.endpoint(&format!("{}{}", self.config.conversation_path, id))?;
        let body = serde_json::to_vec(&VisibilityPatch { is_visible: false })
            .map_err(|err| DeleteError::Network(err.to_string()))?;

        compost_debug!("PATCH {url}");
        let response = self
            .with_cookie(self.client.patch(url))
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeleteError::RemoteDeleteFailed(status.as_u16()));
        }
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        match serde_json::from_slice::<PatchResponse>(&body) {
            Ok(PatchResponse {
                success: Some(true),
            }) => Ok(()),
            _ => Err(DeleteError::RemoteRejected),
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> DeleteError {
    if err.is_timeout() {
        return DeleteError::Network(format!("timed out: {err}"));
    }
    DeleteError::Network(err.to_string())
}
