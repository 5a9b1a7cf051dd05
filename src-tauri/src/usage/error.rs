/// Errors that end a poll cycle in the error state.
#[derive(Debug, Clone, PartialEq)]
pub enum PollError {
    /// No session key in the environment or keyring
    MissingSession,
    /// Session key cannot be sent as a cookie
    InvalidSessionKey,
    /// Bootstrap document fetched but the organization id could not be extracted
    OrgUnresolved(String),
    /// Network/transport error
    Network(String),
    /// Endpoint returned a non-success status
    Http { endpoint: &'static str, status: u16 },
    /// Response body was not the expected JSON
    Parse(String),
    /// Usage document lacked a required field
    MissingField(&'static str),
}

impl PollError {
    /// True when the failure happened before an organization id was known.
    pub fn is_unresolved(&self) -> bool {
        matches!(
            self,
            PollError::MissingSession
                | PollError::InvalidSessionKey
                | PollError::OrgUnresolved(_)
                | PollError::Http {
                    endpoint: "bootstrap",
                    ..
                }
        )
    }
}

impl std::fmt::Display for PollError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollError::MissingSession => write!(
                f,
                "Not signed in. Set USAGE_SESSION_KEY or use \"Set session key from clipboard\"."
            ),
            PollError::InvalidSessionKey => {
                write!(f, "Session key contains invalid characters. Set it again.")
            }
            PollError::OrgUnresolved(e) => write!(f, "Could not resolve organization: {}", e),
            PollError::Network(e) => write!(f, "Network error: {}", e),
            PollError::Http { endpoint, status } => match status {
                401 | 403 => write!(f, "Not signed in ({} returned {})", endpoint, status),
                429 => write!(f, "Rate limited ({} returned 429)", endpoint),
                _ => write!(f, "{} request failed with status {}", endpoint, status),
            },
            PollError::Parse(e) => write!(f, "Failed to parse response: {}", e),
            PollError::MissingField(field) => write!(f, "Usage data missing {}", field),
        }
    }
}

impl std::error::Error for PollError {}
