use thiserror::Error;

/// Why a radio transmission failed, mirroring the black-box radio's status
/// codes.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioFailReason {
    #[error("no acknowledgement from destination")]
    NoAck,
    #[error("routing could not complete")]
    RoutingNotIdle,
    #[error("transmission was aborted")]
    Aborted,
    #[error("the radio reported a generic failure")]
    Fail,
}

/// Why an S0 operation failed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityFailReason {
    #[error("MAC verification failed")]
    MacMismatch,
    #[error("could not decrypt: malformed ciphertext")]
    DecryptStructural,
    #[error("no nonce registered for this exchange")]
    NonceUnknown,
    #[error("security bootstrap timed out")]
    BootstrapTimeout,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("radio transmission failed: {0}")]
    RadioFail(RadioFailReason),
    #[error("security failure: {0}")]
    SecurityFail(SecurityFailReason),
    #[error("operation timed out")]
    Timeout,
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),
    #[error("component is busy with another request")]
    Busy,
    #[error("command or command class not supported")]
    NotSupported,
    #[error("resource pool exhausted: {0}")]
    PoolExhausted(&'static str),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
