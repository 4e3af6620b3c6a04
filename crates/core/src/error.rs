use thiserror::Error;

/// Failure of a single request against the backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),

    /// 401: the credential (or the login attempt) was rejected.
    #[error("{message}")]
    Unauthorized { message: String },

    /// Any other 4xx/5xx that carried a readable message.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// Non-success status with no usable body.
    #[error("request failed (HTTP {0})")]
    Status(u16),

    #[error("malformed response: {0}")]
    Decode(String),

    /// The request could not be built from local input; nothing was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// True only for responses that mean "this credential is no longer valid".
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Rejected { status, .. } => Some(*status),
            ApiError::Status(status) => Some(*status),
            ApiError::Network(_) | ApiError::Decode(_) | ApiError::InvalidRequest(_) => None,
        }
    }

    /// The server-provided message, if the response carried one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { message } | ApiError::Rejected { message, .. } => {
                Some(message.as_str())
            }
            _ => None,
        }
    }

    /// Maps an HTTP status plus an optional body message onto the taxonomy.
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        match (status, message) {
            (401, Some(message)) => ApiError::Unauthorized { message },
            (401, None) => ApiError::Unauthorized {
                message: "Unauthorized".to_string(),
            },
            (status, Some(message)) => ApiError::Rejected { status, message },
            (status, None) => ApiError::Status(status),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("credential storage unavailable")]
    Unavailable,

    #[error("credential storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of a failed login/register, surfaced to the user as one message.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_401_counts_as_auth_rejection() {
        assert!(ApiError::from_status(401, None).is_auth_rejection());
        assert!(!ApiError::from_status(403, Some("nope".into())).is_auth_rejection());
        assert!(!ApiError::Network("offline".into()).is_auth_rejection());
    }

    #[test]
    fn status_mapping_keeps_server_message() {
        let err = ApiError::from_status(409, Some("Email already registered".into()));
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.server_message(), Some("Email already registered"));
        assert_eq!(err.to_string(), "Email already registered");

        let bare = ApiError::from_status(502, None);
        assert_eq!(bare.server_message(), None);
        assert_eq!(bare.to_string(), "request failed (HTTP 502)");
    }

    #[test]
    fn unbuildable_request_is_local_not_network() {
        let err = ApiError::InvalidRequest("invalid image content type".into());
        assert_eq!(err.status(), None);
        assert!(!err.is_auth_rejection());
        assert!(err.to_string().starts_with("invalid request: "));
    }
}
