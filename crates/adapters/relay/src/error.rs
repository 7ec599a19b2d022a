//! Relay adapter error types.

use hap_domain::error::HapError;

/// Errors specific to the relay adapter.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Could not open a connection to the board.
    #[error("failed to connect to relay board at {host}:{port}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// The connection was opened but the frame could not be written.
    #[error("failed to send frame to relay board at {host}:{port}")]
    Write {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },
}

impl RelayError {
    /// Convert into a [`HapError::Hardware`] for propagation across port
    /// boundaries.
    pub fn into_domain(self) -> HapError {
        HapError::Hardware(Box::new(self))
    }
}

impl From<RelayError> for HapError {
    fn from(err: RelayError) -> Self {
        err.into_domain()
    }
}
