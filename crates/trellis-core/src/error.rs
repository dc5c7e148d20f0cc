use std::{fmt, io};

/// Convenience alias around the crate's error kind.
pub type Result<T> = std::result::Result<T, ErrorKind>;

/// Failures a connection or its owner can observe.
///
/// Duplicate or stale frames are deliberately absent: the protocol is
/// self-healing through retransmission, so the filters drop those silently
/// rather than surfacing an error.
#[derive(Debug)]
pub enum ErrorKind {
    /// A frame header was shorter than its fixed width. The datagram is
    /// discarded; the connection is unaffected.
    MalformedFrame,
    /// A datagram carried a channel tag outside the known set. Reported and
    /// dropped, not fatal.
    UnknownChannel(u8),
    /// The raw transport rejected a send. The reliability modules keep the
    /// payload queued and will retry where applicable.
    SendFailure(io::Error),
    /// The raw transport failed while receiving. In-flight state is
    /// unaffected.
    ReceiveFailure(io::Error),
    /// Nothing was received within the configured timeout; the connection is
    /// closed and must be discarded by its owner.
    ConnectionTimeout,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::MalformedFrame => {
                write!(f, "frame header shorter than its fixed width")
            }
            ErrorKind::UnknownChannel(tag) => {
                write!(f, "unrecognized channel tag: {}", tag)
            }
            ErrorKind::SendFailure(e) => write!(f, "transport send failed: {}", e),
            ErrorKind::ReceiveFailure(e) => write!(f, "transport receive failed: {}", e),
            ErrorKind::ConnectionTimeout => write!(f, "connection timed out"),
        }
    }
}

impl std::error::Error for ErrorKind {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ErrorKind::SendFailure(e) | ErrorKind::ReceiveFailure(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_channel_tag() {
        let err = ErrorKind::UnknownChannel(9);
        assert!(err.to_string().contains('9'));
    }

    #[test]
    fn test_source_wraps_io_error() {
        use std::error::Error;
        let err = ErrorKind::SendFailure(io::Error::new(io::ErrorKind::Other, "boom"));
        assert!(err.source().is_some());
        assert!(ErrorKind::ConnectionTimeout.source().is_none());
    }
}
