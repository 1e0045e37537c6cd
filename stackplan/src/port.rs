//! Validated network port numbers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A valid network port number (1-65535).
///
/// Port 0 is rejected, including when deserializing registry files.
///
/// # Examples
///
/// ```
/// use stackplan::Port;
///
/// let port = Port::try_from(1935).unwrap();
/// assert_eq!(port.value(), 1935);
/// assert!(Port::try_from(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Port(u16);

impl Port {
    /// Secure shell, used for operator administrative access.
    pub const SSH: Self = Self(22);
    /// Plain HTTP.
    pub const HTTP: Self = Self(80);
    /// HTTPS.
    pub const HTTPS: Self = Self(443);
    /// RTMP media ingest.
    pub const RTMP: Self = Self(1935);
    /// Alternate HTTP, used for HLS playback.
    pub const HTTP_ALT: Self = Self(8080);
    /// PostgreSQL.
    pub const POSTGRES: Self = Self(5432);
    /// Redis.
    pub const REDIS: Self = Self(6379);

    /// Returns the underlying port number.
    #[must_use]
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Returns `true` if this is a privileged port (< 1024).
    ///
    /// # Examples
    ///
    /// ```
    /// use stackplan::Port;
    ///
    /// assert!(Port::HTTP.is_privileged());
    /// assert!(!Port::try_from(8080).unwrap().is_privileged());
    /// ```
    #[must_use]
    pub const fn is_privileged(self) -> bool {
        self.0 < 1024
    }
}

impl TryFrom<u16> for Port {
    type Error = InvalidPortError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        if value == 0 {
            Err(InvalidPortError {
                value,
                reason: "port 0 is invalid".into(),
            })
        } else {
            Ok(Self(value))
        }
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for invalid port numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPortError {
    /// The invalid port value.
    pub value: u16,
    /// The reason the port is invalid.
    pub reason: String,
}

impl fmt::Display for InvalidPortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid port {}: {}", self.value, self.reason)
    }
}

impl std::error::Error for InvalidPortError {}
