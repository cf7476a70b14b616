//! Response emission.
//!
//! # Responsibilities
//! - Write a handler's [`ProxyResponse`] as an HTTP response
//! - Synthesize the generic failure response
//!
//! # Design Decisions
//! - Single-valued headers are written first, then every multi-valued entry
//!   in list order; a key present in both maps repeats, nothing is deduplicated
//! - Status and body are set only after all headers are in place
//! - The failure response carries no headers and a fixed `error` body, so no
//!   handler detail ever reaches the client

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Response, StatusCode};

use crate::event::ProxyResponse;

/// Body of the generic failure response.
pub const FAILURE_BODY: &str = "error";

/// Error raised when a handler's response cannot be written as HTTP.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("invalid status code {0}")]
    Status(u16),

    #[error("invalid header name `{0}`")]
    HeaderName(String),

    #[error("invalid value for header `{0}`")]
    HeaderValue(String),

    #[error("body marked base64 but does not decode: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Turn a proxy event response into an HTTP response.
pub fn emit(response: ProxyResponse) -> Result<Response<Body>, EmitError> {
    let mut headers = HeaderMap::with_capacity(
        response.headers.len() + response.multi_value_headers.len(),
    );

    for (name, value) in &response.headers {
        headers.append(header_name(name)?, header_value(name, value)?);
    }
    for (name, values) in &response.multi_value_headers {
        let header = header_name(name)?;
        for value in values {
            headers.append(header.clone(), header_value(name, value)?);
        }
    }

    let status = StatusCode::from_u16(response.status_code)
        .map_err(|_| EmitError::Status(response.status_code))?;
    let body = response.body_bytes()?;

    let mut http_response = Response::new(Body::from(body));
    *http_response.headers_mut() = headers;
    *http_response.status_mut() = status;
    Ok(http_response)
}

/// Status 500, body `error`, no headers.
pub fn failure_response() -> Response<Body> {
    let mut response = Response::new(Body::from(FAILURE_BODY));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

fn header_name(name: &str) -> Result<HeaderName, EmitError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|_| EmitError::HeaderName(name.to_string()))
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, EmitError> {
    HeaderValue::from_str(value).map_err(|_| EmitError::HeaderValue(name.to_string()))
}
