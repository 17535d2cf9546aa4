use std::path::Path;

use crate::{destination::Destination, progress::ProgressReporter};

/// Shown alongside timeouts: the usual cause is a host firewall that drops
/// connections from the bot's address.
pub const TIMEOUT_HINT: &str = "the host did not respond in time; check that its firewall or IP allow-list admits this server";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    Auth,
    Timeout,
    Other,
}

impl std::fmt::Display for ConnectionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Auth => "auth",
            Self::Timeout => "timeout",
            Self::Other => "other",
        })
    }
}

/// Classified failure of an upload attempt.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("authentication rejected: {detail}")]
    Auth { detail: String },

    #[error("timed out: {detail}")]
    Timeout { detail: String },

    #[error("{detail}")]
    Other { detail: String },
}

impl TransportError {
    #[must_use]
    pub fn kind(&self) -> ConnectionErrorKind {
        match self {
            Self::Auth { .. } => ConnectionErrorKind::Auth,
            Self::Timeout { .. } => ConnectionErrorKind::Timeout,
            Self::Other { .. } => ConnectionErrorKind::Other,
        }
    }

    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::Auth { detail } | Self::Timeout { detail } | Self::Other { detail } => detail,
        }
    }

    pub fn auth(detail: impl Into<String>) -> Self {
        Self::Auth {
            detail: detail.into(),
        }
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::Timeout {
            detail: detail.into(),
        }
    }

    pub fn other(detail: impl Into<String>) -> Self {
        Self::Other {
            detail: detail.into(),
        }
    }

    /// Classify a socket or file error by kind.
    pub fn from_io(context: &str, err: &std::io::Error) -> Self {
        use std::io::ErrorKind;
        let detail = format!("{context}: {err}");
        match err.kind() {
            ErrorKind::TimedOut | ErrorKind::WouldBlock => Self::timeout(detail),
            _ => Self::other(detail),
        }
    }
}

/// Moves a local file to the destination host.
///
/// Implementations block; callers run them on a blocking worker thread.
pub trait Transport: Send + Sync {
    /// Upload `local` to `remote_path`, calling `progress` after each chunk.
    /// Returns the number of bytes written.
    fn upload(
        &self,
        destination: &Destination,
        local: &Path,
        remote_path: &str,
        progress: &ProgressReporter,
    ) -> Result<u64, TransportError>;
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, std::io};

    #[rstest]
    #[case(io::ErrorKind::TimedOut, ConnectionErrorKind::Timeout)]
    #[case(io::ErrorKind::WouldBlock, ConnectionErrorKind::Timeout)]
    #[case(io::ErrorKind::ConnectionRefused, ConnectionErrorKind::Other)]
    #[case(io::ErrorKind::NotFound, ConnectionErrorKind::Other)]
    fn io_errors_classify_by_kind(#[case] kind: io::ErrorKind, #[case] expected: ConnectionErrorKind) {
        let err = TransportError::from_io("connect", &io::Error::new(kind, "boom"));
        assert_eq!(err.kind(), expected);
        assert_eq!(err.detail(), "connect: boom");
    }
}
