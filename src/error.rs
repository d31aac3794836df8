//! Error types for the notes client core.
//!
//! Transport failures are classified once, in the transport layer, and then
//! wrapped by the resource services into operation errors that keep the
//! original cause (status and raw body) for diagnosis.

use std::fmt;

use thiserror::Error;

/// Result type alias for notes operations
pub type NotesResult<T> = Result<T, NotesError>;

/// How a request failed before or while talking to the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The request never reached the server (connection refused, DNS, reset)
    Network,
    /// The request exceeded its time bound and was cancelled
    Timeout,
    /// Cross-origin rejection by the browser fetch layer
    Cors,
    /// The server answered with a 4xx/5xx status
    Http,
    /// A 2xx response whose body could not be read as the expected JSON
    Decode,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportErrorKind::Network => "network",
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Cors => "cors",
            TransportErrorKind::Http => "http",
            TransportErrorKind::Decode => "decode",
        };
        f.write_str(name)
    }
}

/// A classified transport-level failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    /// HTTP status, present for `Http` errors
    pub status: Option<u16>,
    /// Raw response body, present when the server answered
    pub body: Option<String>,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            body: None,
            message: message.into(),
        }
    }

    /// Create an error for a non-success HTTP status
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Http,
            status: Some(status),
            body: Some(body.into()),
            message: format!("server responded with status {}", status),
        }
    }

    /// 403 usually means the server's security/CORS configuration rejects us,
    /// not that the resource is missing.
    pub fn is_forbidden(&self) -> bool {
        self.status == Some(403)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} error ({}): {}", self.kind, status, self.message),
            None => write!(f, "{} error: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for TransportError {}

/// Main error type for notes operations
#[derive(Error, Debug)]
pub enum NotesError {
    #[error("Validation error in {field}: {message}")]
    Validation { field: String, message: String },

    #[error("{message}")]
    Fetch {
        message: String,
        #[source]
        source: TransportError,
    },

    #[error("{message}")]
    Create {
        message: String,
        #[source]
        source: TransportError,
    },

    #[error("{message}")]
    Update {
        message: String,
        #[source]
        source: TransportError,
    },

    #[error("{message}")]
    Delete {
        message: String,
        #[source]
        source: TransportError,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NotesError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        NotesError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn fetch(message: impl Into<String>, source: TransportError) -> Self {
        NotesError::Fetch {
            message: message.into(),
            source,
        }
    }

    pub fn create(message: impl Into<String>, source: TransportError) -> Self {
        NotesError::Create {
            message: message.into(),
            source,
        }
    }

    pub fn update(message: impl Into<String>, source: TransportError) -> Self {
        NotesError::Update {
            message: message.into(),
            source,
        }
    }

    pub fn delete(message: impl Into<String>, source: TransportError) -> Self {
        NotesError::Delete {
            message: message.into(),
            source,
        }
    }

    /// The transport failure underneath this error, if any
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            NotesError::Fetch { source, .. }
            | NotesError::Create { source, .. }
            | NotesError::Update { source, .. }
            | NotesError::Delete { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn transport_kind(&self) -> Option<TransportErrorKind> {
        self.transport().map(|e| e.kind)
    }

    /// HTTP status reported by the server, preserved through wrapping
    pub fn status(&self) -> Option<u16> {
        self.transport().and_then(|e| e.status)
    }

    /// Raw response body reported by the server, preserved through wrapping
    pub fn raw_body(&self) -> Option<&str> {
        self.transport().and_then(|e| e.body.as_deref())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, NotesError::Validation { .. })
    }
}
