use thiserror::Error;

/// Failure of a call against the TownHall API.
///
/// `Server` displays the server's own message untouched so callers can show
/// it to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("could not reach the TownHall API: {0}")]
    Network(String),
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("unexpected response from the TownHall API: {0}")]
    Decode(String),
    #[error("another request is still in progress")]
    Busy,
    #[error("not signed in; run `townhall login` first")]
    NotSignedIn,
}

impl ClientError {
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        ClientError::Server {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }
}
