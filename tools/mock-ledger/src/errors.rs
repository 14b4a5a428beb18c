use crate::types::{MethodId, Ordinal};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MockError {
    #[error("unmocked call to {method} (ordinal {ordinal}) with arguments {arguments}")]
    UnmockedMethodCall {
        method: MethodId,
        ordinal: Ordinal,
        arguments: String,
    },
    #[error("stub for {method} matched call {ordinal} but has no behavior left")]
    BehaviorExhausted { method: MethodId, ordinal: Ordinal },
    #[error("{method} raised on call {ordinal}: {message}")]
    Raised {
        method: MethodId,
        ordinal: Ordinal,
        message: String,
    },
    #[error("invalid stub: {0}")]
    InvalidStub(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("config parse error: {0}")]
    ConfigParse(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("trace parse error: {0}")]
    TraceParse(String),
}
