//! Error types for ripr.

use thiserror::Error;

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, RiprError>;

#[derive(Error, Debug)]
pub enum RiprError {
    #[error("failed to establish a connection to the backing store")]
    ConnectionFailed(#[source] redis::RedisError),

    #[error("failed to initialize the sentinel boundaries")]
    DatabaseInit(#[source] Box<RiprError>),

    #[error("stored boundaries are inconsistent: {0}")]
    DatabaseInconsistent(String),

    #[error("invalid range, use one of: <ip>, <ip>/<1-32>, <ip> - <ip>")]
    InvalidRange,

    #[error("invalid IPv4 address")]
    InvalidIp,

    #[error("IPv6 addresses and ranges are not supported")]
    Ipv6NotSupported,

    #[error("could not retrieve any results from the store")]
    NoResult(#[source] redis::RedisError),

    #[error("the IP is not contained in any stored range")]
    IpNotFound,

    #[error("the store rejected a command batch")]
    Store(#[source] redis::RedisError),
}

impl RiprError {
    /// True for the lookup outcome that is a signal rather than a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RiprError::IpNotFound)
    }
}
