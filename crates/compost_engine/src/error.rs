use thiserror::Error;

/// Why one conversation could not be deleted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeleteError {
    #[error("no identifier could be derived for the conversation")]
    IdentityUnresolved,
    #[error("session credential request failed: {0}")]
    CredentialFetchFailed(String),
    #[error("delete request failed with status {0}")]
    RemoteDeleteFailed(u16),
    #[error("delete request was not acknowledged")]
    RemoteRejected,
    #[error("network error: {0}")]
    Network(String),
    #[error("ui control not found: {0}")]
    UiControlNotFound(String),
    #[error("timed out waiting for {0}")]
    UiWaitTimeout(String),
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl DeleteError {
    /// Without a credential no further item can succeed.
    pub fn halts_batch(&self) -> bool {
        matches!(self, DeleteError::CredentialFetchFailed(_))
    }
}
