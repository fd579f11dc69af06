//! # Error Module
//!
//! This module provides custom error types for the `lineport` application.
//! It uses the `thiserror` crate for ergonomic error handling.

use thiserror::Error;

/// Result type alias for `lineport` operations.
pub type Result<T> = std::result::Result<T, LinePortError>;

/// Main error type for the `lineport` application.
#[derive(Debug, Error)]
pub enum LinePortError {
    /// Failed to open serial port.
    #[error("Failed to open serial port '{port_name}': {reason}")]
    PortOpen { port_name: String, reason: String },

    /// A send was attempted while no connection is open.
    #[error("Not connected to a serial port")]
    NotConnected,

    /// Failed to write a frame to the serial port.
    #[error("Failed to write to serial port: {0}")]
    PortWrite(String),

    /// Failed to read from the serial port.
    #[error("Failed to read from serial port: {0}")]
    PortRead(String),

    /// File I/O error.
    #[error("File I/O error: {0}")]
    FileIo(#[from] std::io::Error),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl LinePortError {
    /// Creates a new port open error.
    #[must_use]
    pub fn port_open(port_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PortOpen {
            port_name: port_name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new port write error.
    #[must_use]
    pub fn port_write(msg: impl Into<String>) -> Self {
        Self::PortWrite(msg.into())
    }

    /// Creates a new port read error.
    #[must_use]
    pub fn port_read(msg: impl Into<String>) -> Self {
        Self::PortRead(msg.into())
    }

    /// Creates a new invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_open_error() {
        let error = LinePortError::port_open("/dev/ttyUSB0", "Permission denied");
        let msg = error.to_string();
        assert!(msg.contains("/dev/ttyUSB0"));
        assert!(msg.contains("Permission denied"));
    }

    #[test]
    fn test_not_connected_error() {
        let error = LinePortError::NotConnected;
        assert!(error.to_string().contains("Not connected"));
    }

    #[test]
    fn test_port_write_error() {
        let error = LinePortError::port_write("Broken pipe");
        assert!(error.to_string().contains("Broken pipe"));
    }

    #[test]
    fn test_file_io_error_from() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error = LinePortError::from(io);
        assert!(matches!(error, LinePortError::FileIo(_)));
    }
}
