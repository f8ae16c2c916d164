//! Server error types.
//!
//! Most failure handling in the relay is local: a transport error is
//! terminal for the task that hit it, a parse failure falls through the
//! dispatch tiers, and an encoding failure abandons that one send. Only
//! the HTTP surface propagates errors to its caller.

use std::io;

/// Errors surfaced by [`crate::server::ParleyServer`].
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind the listen address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address that could not be bound.
        addr: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Any other I/O failure on the listener.
    #[error("listener I/O error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_error_names_the_address() {
        let err = ServerError::Bind {
            addr: "127.0.0.1:80".into(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        let msg = err.to_string();
        assert!(msg.contains("127.0.0.1:80"));
    }

    #[test]
    fn io_error_converts() {
        let err: ServerError = io::Error::from(io::ErrorKind::AddrInUse).into();
        assert!(matches!(err, ServerError::Io(_)));
    }
}
