// api-gateway/src/interceptors.rs
use common::storage::{TOKEN_KEY, USER_KEY};
use common::LocalStorage;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::Value;

use crate::error::GatewayError;

/// Whoever owns navigation gets told when the session is no longer valid
pub trait Navigator: Send + Sync {
    fn redirect_to_login(&self);
}

/// Request hook: attach the stored token as a bearer credential, if any
pub fn attach_bearer(builder: RequestBuilder, storage: &dyn LocalStorage) -> RequestBuilder {
    match storage.get_item(TOKEN_KEY) {
        Some(token) if !token.is_empty() => {
            tracing::trace!("Attaching bearer token to request");
            builder.bearer_auth(token)
        },
        _ => builder,
    }
}

/// Response hook: pass 2xx through, turn everything else into a
/// [`GatewayError::Response`]. A 401 also ends the local session first.
pub async fn inspect_response(
    response: Response,
    storage: &dyn LocalStorage,
    navigator: Option<&dyn Navigator>,
) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::UNAUTHORIZED {
        expire_session(storage, navigator);
    }

    // Error bodies are usually JSON; anything else is kept as text so the
    // normalizer falls back to its generic message
    let body = response.text().await.unwrap_or_default();
    let data = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body).unwrap_or(Value::String(body))
    };

    tracing::debug!("Request failed with status {}", status);
    Err(GatewayError::Response {
        status: status.as_u16(),
        data,
    })
}

fn expire_session(storage: &dyn LocalStorage, navigator: Option<&dyn Navigator>) {
    tracing::info!("Received 401, clearing stored session");

    for key in [TOKEN_KEY, USER_KEY] {
        if let Err(e) = storage.remove_item(key) {
            tracing::warn!("Failed to remove {} from storage: {}", key, e);
        }
    }

    match navigator {
        Some(navigator) => navigator.redirect_to_login(),
        None => tracing::debug!("No navigator installed, skipping login redirect"),
    }
}
