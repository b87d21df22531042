use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
    #[error("JSON value does not match the signature: {0}")]
    TypeMismatch(String),
    #[error("Message builder rejected a value: {0}")]
    Encode(String),
    #[error("Failed to parse introspection XML: {0}")]
    IntrospectionParse(String),
    #[error("Object mapper request failed: {0}")]
    Resolver(String),
    #[error("Bus call failed: {0}")]
    Bus(String),
    #[error("Malformed request: {0}")]
    BadRequest(String),
    #[error("No objects found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
}

pub type Result<T> = std::result::Result<T, Error>;
