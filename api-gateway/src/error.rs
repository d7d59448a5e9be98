// api-gateway/src/error.rs
use common::{ApiError, StorageError};
use serde_json::Value;

const GENERIC_SERVER_MESSAGE: &str = "An error occurred";
const NO_RESPONSE_MESSAGE: &str = "No response from server. Please check your connection.";
const UNKNOWN_MESSAGE: &str = "An unknown error occurred";

/// Raw outcome of a failed gateway call, before normalization
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The server answered with a non-2xx status
    #[error("server responded with status {status}")]
    Response { status: u16, data: Value },
    /// The request went out but nothing came back
    #[error("no response from server: {0}")]
    NoResponse(String),
    /// Anything that failed before sending or after receiving
    #[error("{}", .message.as_deref().unwrap_or("request failed"))]
    Other { message: Option<String> },
}

impl GatewayError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other { message: Some(message.into()) }
    }

    pub(crate) fn from_send(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::other(err.to_string())
        } else {
            Self::NoResponse(err.to_string())
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Response { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<StorageError> for GatewayError {
    fn from(err: StorageError) -> Self {
        Self::other(err.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::other(err.to_string())
    }
}

impl From<url::ParseError> for GatewayError {
    fn from(err: url::ParseError) -> Self {
        Self::other(format!("invalid URL: {}", err))
    }
}

/// Normalize any gateway failure into the uniform `{status, message}` shape.
///
/// Priority: server response, then missing response, then everything else.
pub fn handle_api_error(error: &GatewayError) -> ApiError {
    match error {
        GatewayError::Response { status, data } => {
            let message = truthy_text(data.get("detail"))
                .or_else(|| truthy_text(data.get("message")))
                .unwrap_or_else(|| GENERIC_SERVER_MESSAGE.to_string());
            ApiError::new(*status, message)
        },
        GatewayError::NoResponse(_) => ApiError::new(0, NO_RESPONSE_MESSAGE),
        GatewayError::Other { message } => ApiError::new(
            0,
            message
                .as_deref()
                .filter(|m| !m.is_empty())
                .unwrap_or(UNKNOWN_MESSAGE),
        ),
    }
}

/// Text of a JSON field if it would be truthy in the backend's JS clients.
/// Structured values (e.g. validation error lists) are kept as JSON text.
fn truthy_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(number) if number.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, data: Value) -> GatewayError {
        GatewayError::Response { status, data }
    }

    #[test]
    fn response_with_detail() {
        let error = response(400, json!({ "detail": "Bad request" }));
        assert_eq!(handle_api_error(&error), ApiError::new(400, "Bad request"));
    }

    #[test]
    fn response_falls_back_to_message() {
        let error = response(409, json!({ "message": "Email already registered" }));
        assert_eq!(handle_api_error(&error), ApiError::new(409, "Email already registered"));

        let error = response(409, json!({ "detail": "", "message": "Email already registered" }));
        assert_eq!(handle_api_error(&error).message, "Email already registered");
    }

    #[test]
    fn response_without_text_is_generic() {
        for data in [json!({}), Value::Null, json!("Internal Server Error"), json!({ "detail": null })] {
            let error = response(500, data);
            assert_eq!(handle_api_error(&error), ApiError::new(500, "An error occurred"));
        }
    }

    #[test]
    fn structured_detail_is_rendered() {
        let error = response(422, json!({ "detail": [{ "msg": "field required" }] }));
        let normalized = handle_api_error(&error);
        assert_eq!(normalized.status, 422);
        assert!(normalized.message.contains("field required"));
    }

    #[test]
    fn no_response() {
        let error = GatewayError::NoResponse("connection refused".into());
        assert_eq!(
            handle_api_error(&error),
            ApiError::new(0, "No response from server. Please check your connection.")
        );
    }

    #[test]
    fn other_errors_keep_their_message() {
        assert_eq!(
            handle_api_error(&GatewayError::other("Unknown error")),
            ApiError::new(0, "Unknown error")
        );
        assert_eq!(
            handle_api_error(&GatewayError::Other { message: None }),
            ApiError::new(0, "An unknown error occurred")
        );
    }
}
