use crate::error::ClientError;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// The API could not be reached at all.
    Network,
    /// The API answered and refused, or answered with something unreadable.
    Application,
    /// A previous action is still in flight.
    Busy,
}

/// The single way failures are shown to the user: one message, one kind,
/// and whether re-running the same action might succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub retryable: bool,
}

impl Notice {
    pub fn application(message: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::Application,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn hint(&self) -> Option<&'static str> {
        match self.kind {
            NoticeKind::Network => Some("check that the TownHall API is running, then try again"),
            NoticeKind::Busy => Some("wait for the current request to finish"),
            NoticeKind::Application if self.retryable => Some("try again in a moment"),
            NoticeKind::Application => None,
        }
    }
}

impl From<&ClientError> for Notice {
    fn from(err: &ClientError) -> Self {
        let (kind, retryable) = match err {
            ClientError::Network(_) => (NoticeKind::Network, true),
            ClientError::Busy => (NoticeKind::Busy, true),
            ClientError::Server { status, .. } => (NoticeKind::Application, *status >= 500),
            ClientError::Decode(_) | ClientError::NotSignedIn => (NoticeKind::Application, false),
        };
        Notice {
            kind,
            message: err.to_string(),
            retryable,
        }
    }
}

impl From<ClientError> for Notice {
    fn from(err: ClientError) -> Self {
        Notice::from(&err)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: {}", self.message)?;
        if let Some(hint) = self.hint() {
            write!(f, " ({hint})")?;
        }
        Ok(())
    }
}

impl std::error::Error for Notice {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn server_message_is_shown_verbatim() {
        let notice = Notice::from(ClientError::server(400, "Event is full"));
        assert_eq!(notice.kind, NoticeKind::Application);
        assert_eq!(notice.message, "Event is full");
        assert_eq!(notice.to_string(), "Error: Event is full");
    }

    #[test]
    fn network_failures_are_retryable() {
        let notice = Notice::from(ClientError::Network("connection refused".into()));
        assert_eq!(notice.kind, NoticeKind::Network);
        assert!(notice.retryable);
        assert!(notice.to_string().contains("try again"));
    }

    #[test]
    fn server_errors_retry_only_on_5xx() {
        assert!(Notice::from(ClientError::server(503, "down")).retryable);
        assert!(!Notice::from(ClientError::server(403, "nope")).retryable);
    }
}
