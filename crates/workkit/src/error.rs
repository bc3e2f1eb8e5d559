//! Error types for work distribution.
//!
//! The taxonomy is a closed set so callers can branch on [`Error::NotFound`]
//! versus [`Error::Transport`] without inspecting messages. Every variant that
//! touches the hub carries the consumer, work name and operation involved.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for work operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Transport-level operation an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Connection health wait before the first call.
    HealthCheck,
    /// Fetch a single work.
    Get,
    /// List works for one consumer.
    List,
    /// Create a work.
    Create,
    /// Merge-patch an existing work.
    Patch,
    /// Delete a work.
    Delete,
    /// Enumerate the consumer registry.
    ListConsumers,
}

impl Operation {
    /// Short lowercase name used in messages and logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HealthCheck => "health check",
            Self::Get => "get",
            Self::List => "list",
            Self::Create => "create",
            Self::Patch => "patch",
            Self::Delete => "delete",
            Self::ListConsumers => "list consumers",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categories of errors, for caller-side retry policy and user feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input or configuration; fix the request.
    Input,
    /// The work or manifest does not exist.
    NotFound,
    /// Someone else modified the work concurrently.
    Conflict,
    /// Connection or RPC failure (transient).
    Transport,
    /// The caller cancelled or the deadline passed.
    Cancelled,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Whether a caller-side retry layer may reasonably try again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport | Self::Conflict)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Input => "Invalid input",
            Self::NotFound => "Not found",
            Self::Conflict => "Concurrent modification",
            Self::Transport => "Hub communication failure",
            Self::Cancelled => "Cancelled",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Input => "Check the manifests, consumer name and work name",
            Self::NotFound => "Verify the consumer and work name, or apply the work first",
            Self::Conflict => "The work changed while applying; re-run apply",
            Self::Transport => "Check the hub URL and connectivity, then try again",
            Self::Cancelled => "Increase the timeout or re-run the command",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while decoding, building, applying or reading works.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A document is not a well-formed resource.
    #[error("malformed resource in document {index}: {message}")]
    MalformedResource {
        /// Zero-based document position in the input.
        index: usize,
        /// What is wrong with it.
        message: String,
    },

    /// The input contained no resources.
    #[error("no resources found in input")]
    EmptyInput,

    /// A manifest and its identifier or status entry do not line up.
    #[error("resource identifier mismatch in work {work}: {message}")]
    ResourceIdentifierMismatch {
        /// Work being inspected.
        work: String,
        /// Details.
        message: String,
    },

    /// The work does not exist on the consumer.
    #[error("work {name:?} not found for consumer {consumer:?}")]
    NotFound {
        /// Consumer queried.
        consumer: String,
        /// Work name queried.
        name: String,
    },

    /// Connection or RPC failure.
    #[error("{operation} failed for consumer {consumer:?}{}: {message}", fmt_name(.name))]
    Transport {
        /// Operation that failed.
        operation: Operation,
        /// Consumer involved (empty for registry and health calls).
        consumer: String,
        /// Work name involved, if any.
        name: Option<String>,
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// The work was modified concurrently.
    #[error("conflict on work {name:?} for consumer {consumer:?}: {message}")]
    Conflict {
        /// Consumer involved.
        consumer: String,
        /// Work name involved.
        name: String,
        /// Details.
        message: String,
    },

    /// Missing or invalid configuration (consumer name, work name, hub URL).
    #[error("configuration error: {0}")]
    Config(String),

    /// The operation was cancelled or its deadline passed.
    #[error("{operation} cancelled")]
    Cancelled {
        /// Operation that was aborted.
        operation: Operation,
    },

    /// IO error reading input.
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        /// Path involved in the error.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn fmt_name(name: &Option<String>) -> String {
    name.as_ref()
        .map(|n| format!(" (work {n:?})"))
        .unwrap_or_default()
}

impl Error {
    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a transport error.
    pub fn transport(
        operation: Operation,
        consumer: impl Into<String>,
        name: Option<&str>,
        message: impl Into<String>,
        status: Option<u16>,
    ) -> Self {
        Self::Transport {
            operation,
            consumer: consumer.into(),
            name: name.map(str::to_string),
            message: message.into(),
            status,
        }
    }

    /// Create a not-found error.
    pub fn not_found(consumer: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            consumer: consumer.into(),
            name: name.into(),
        }
    }

    /// Create a malformed-resource error.
    pub fn malformed(index: usize, message: impl Into<String>) -> Self {
        Self::MalformedResource {
            index,
            message: message.into(),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::MalformedResource { .. } | Error::EmptyInput | Error::Config(_) => {
                ErrorCategory::Input
            }
            Error::ResourceIdentifierMismatch { .. } | Error::NotFound { .. } => {
                ErrorCategory::NotFound
            }
            Error::Conflict { .. } => ErrorCategory::Conflict,
            Error::Transport { .. } => ErrorCategory::Transport,
            Error::Cancelled { .. } => ErrorCategory::Cancelled,
            Error::Io { .. } => ErrorCategory::Input,
            Error::Json(_) => ErrorCategory::Other,
        }
    }

    /// Whether a caller-side retry layer may reasonably try again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Whether the work or the requested manifest is absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }

    /// Whether this error came from cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled { .. })
    }
}
