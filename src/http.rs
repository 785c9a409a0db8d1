//! Purpose: Glue between HTTP requests and the decode engine.
//! Exports: `Qt`, `QueryRejection`, `ErrorEnvelope`, `decode_uri`, `decode_request`.
//! Role: Thin axum adapter; builds a `ParamMap` from the request URI and calls `decode`.
//! Invariants: No decoding logic lives here; errors map to status via `to_status_code`.
//! Invariants: Rejection bodies use the `{"error":{...}}` JSON envelope.

use std::fmt;
use std::ops::{Deref, DerefMut};

use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::core::decode::decode;
use crate::core::error::{Error, to_status_code};
use crate::core::field::Record;
use crate::core::params::ParamMap;

pub fn decode_uri<T: Record>(uri: &Uri, target: &mut T) -> Result<(), Error> {
    decode(&ParamMap::parse(uri.query().unwrap_or_default()), target)
}

pub fn decode_request<B, T: Record>(request: &Request<B>, target: &mut T) -> Result<(), Error> {
    decode_uri(request.uri(), target)
}

/// Extractor that decodes the request query into `T`, starting from `T::default()`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Qt<T>(pub T);

impl<T> Deref for Qt<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Qt<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for Qt<T>
where
    T: Record + Default + Send,
    S: Send + Sync,
{
    type Rejection = QueryRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let mut value = T::default();
        decode_uri(&parts.uri, &mut value).map_err(|error| {
            tracing::debug!(uri = %parts.uri, %error, "rejecting query parameters");
            QueryRejection { error }
        })?;
        Ok(Qt(value))
    }
}

#[derive(Debug)]
pub struct QueryRejection {
    error: Error,
}

impl QueryRejection {
    pub fn error(&self) -> &Error {
        &self.error
    }

    pub fn into_error(self) -> Error {
        self.error
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(to_status_code(self.error.kind()))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<Error> for QueryRejection {
    fn from(error: Error) -> Self {
        Self { error }
    }
}

impl fmt::Display for QueryRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid query parameters: {}", self.error)
    }
}

impl std::error::Error for QueryRejection {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// The `{"error":{...}}` body shared by HTTP rejections and the CLI.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected: Option<String>,
}

impl ErrorEnvelope {
    pub fn from_error(err: &Error) -> Self {
        Self {
            error: ErrorBody {
                kind: format!("{:?}", err.kind()),
                message: err.message().unwrap_or("error").to_string(),
                field: err.field().map(str::to_string),
                key: err.key().map(str::to_string),
                value: err.value().map(str::to_string),
                expected: err.expected().map(|kind| kind.to_string()),
            },
        }
    }
}

impl IntoResponse for QueryRejection {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorEnvelope::from_error(&self.error))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorEnvelope, QueryRejection};
    use crate::core::error::{Error, ErrorKind};
    use crate::core::field::ValueKind;
    use axum::http::StatusCode;

    #[test]
    fn envelope_skips_missing_context() {
        let err = Error::new(ErrorKind::InvalidTarget).with_message("missing target");
        let value = serde_json::to_value(ErrorEnvelope::from_error(&err)).expect("json");
        assert_eq!(
            value,
            serde_json::json!({"error": {"kind": "InvalidTarget", "message": "missing target"}})
        );
    }

    #[test]
    fn coercion_rejection_is_bad_request() {
        let err = Error::new(ErrorKind::Coercion)
            .with_message("cannot parse value into an integer")
            .with_field("limit")
            .with_key("limit")
            .with_value("hello")
            .with_expected(ValueKind::Integer);
        let rejection = QueryRejection::from(err);
        assert_eq!(rejection.status(), StatusCode::BAD_REQUEST);

        let value =
            serde_json::to_value(ErrorEnvelope::from_error(rejection.error())).expect("json");
        assert_eq!(value["error"]["kind"], "Coercion");
        assert_eq!(value["error"]["field"], "limit");
        assert_eq!(value["error"]["value"], "hello");
        assert_eq!(value["error"]["expected"], "integer");
    }

    #[test]
    fn invalid_target_is_server_error() {
        let rejection = QueryRejection::from(Error::new(ErrorKind::InvalidTarget));
        assert_eq!(rejection.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(rejection.into_error().kind(), ErrorKind::InvalidTarget);
    }
}
