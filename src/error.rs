use thiserror::Error;

/// Errors surfaced by the client. Nothing is retried or swallowed; every
/// failure reaches the caller with the operation that produced it.
#[derive(Debug, Error)]
pub enum VectoError {
    /// Local input was rejected before any request was issued.
    #[error("{operation}: invalid input: {message}")]
    Validation {
        operation: &'static str,
        message: String,
    },

    /// The request never produced an HTTP response.
    #[error("{operation}: request to {path} failed: {source}")]
    Transport {
        operation: &'static str,
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("{operation}: service returned {status} for {path}: {message}")]
    Api {
        operation: &'static str,
        path: String,
        status: u16,
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("{operation}: unexpected response: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },

    /// A named resource does not exist and nothing was asked to create it.
    #[error("{operation}: {resource} not found")]
    NotFound {
        operation: &'static str,
        resource: String,
    },

    #[error("configuration error: {0}")]
    Config(String),

    /// A local image source could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = VectoError> = std::result::Result<T, E>;

impl VectoError {
    pub(crate) fn validation(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            operation,
            message: message.into(),
        }
    }

    pub(crate) fn decode(operation: &'static str, message: impl std::fmt::Display) -> Self {
        Self::Decode {
            operation,
            message: message.to_string(),
        }
    }

    /// HTTP status of an [`VectoError::Api`] error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }

    /// True for a 404 from the service as well as a local name lookup miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. }) || self.status() == Some(404)
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(500..=599))
    }
}
