use std::fmt;

/// Failures talking to the platform.
///
/// These stay inside the gateway: the trait methods translate them into
/// absence or a [`crate::CreateFailure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Network failure, timeout, or unreadable response body.
    Transport(String),
    /// Non-2xx response.
    Http { status: u16, body: String },
    /// The platform returned GraphQL `errors`.
    Api(String),
    /// The response body is not the JSON shape expected.
    Decode(String),
    /// Credentials or endpoint settings are missing or invalid.
    Config(String),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Transport(msg) => write!(f, "transport error: {msg}"),
            GatewayError::Http { status, body } => write!(f, "http error status={status}: {body}"),
            GatewayError::Api(msg) => write!(f, "platform api error: {msg}"),
            GatewayError::Decode(msg) => write!(f, "decode error: {msg}"),
            GatewayError::Config(msg) => write!(f, "config error: {msg}"),
        }
    }
}

impl std::error::Error for GatewayError {}
