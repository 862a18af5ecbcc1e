use thiserror::Error;

/// An error while resolving one segment through the directions service.
#[derive(Error, Debug)]
pub enum Error {
    /// The configured endpoint is not a valid URL
    #[error("invalid directions endpoint: {0}")]
    Url(#[from] url::ParseError),
    /// The request could not be sent or the response could not be read
    #[error("transport failure: {0}")]
    Transport(String),
    /// The service answered with a non-success HTTP status
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },
    /// The response body is not a directions document
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    /// The service returned no route between the two points
    #[error("no route returned (status {status}){}", .message.as_ref().map(|m| format!(": {}", m)).unwrap_or_default())]
    NoRoute {
        status: String,
        message: Option<String>,
    },
    /// The route geometry is not a valid encoded polyline
    #[error("invalid polyline: {0}")]
    Polyline(String),
}
