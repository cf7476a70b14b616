//! HTTP services as proxy event handlers.
//!
//! The reverse of [`ProxyAdapter`](crate::http::ProxyAdapter): code written
//! as an HTTP `tower::Service` (an `axum::Router`, say) is driven by proxy
//! events. The event is rebuilt into a request, the service answers it, and
//! the response is folded back into a [`ProxyResponse`].
//!
//! # Design Decisions
//! - Any response body type is accepted and buffered up to a size limit
//! - The service is cloned per event under a lock, so it only has to be `Send`
//! - A cancelled token abandons the in-flight call and fails the event

use std::fmt;
use std::sync::{Mutex, PoisonError};

use axum::body::{Body, Bytes, HttpBody};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Response, Uri};
use base64::{engine::general_purpose::STANDARD, Engine};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio_util::sync::CancellationToken;
use tower::{Service, ServiceExt};

use crate::event::values::{multi_value_headers, single_value};
use crate::event::{MultiValueMap, ProxyRequest, ProxyResponse, SingleValueMap};
use crate::handler::{BoxError, ProxyHandler};
use crate::http::request::DEFAULT_MAX_BODY_SIZE;

/// Error raised while converting between events and HTTP messages.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("invalid http method `{0}`")]
    Method(String),

    #[error("invalid request uri `{0}`")]
    Uri(String),

    #[error("invalid header `{0}`")]
    Header(String),

    #[error("body marked base64 but does not decode: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("failed to read response body: {0}")]
    Body(#[source] axum::Error),

    #[error("request cancelled before the service answered")]
    Cancelled,
}

/// [`ProxyHandler`] backed by an HTTP service.
pub struct ServiceHandler<S> {
    service: Mutex<S>,
    max_body_size: usize,
}

/// Drive `service` with proxy events.
pub fn service_handler<S>(service: S) -> ServiceHandler<S> {
    ServiceHandler {
        service: Mutex::new(service),
        max_body_size: DEFAULT_MAX_BODY_SIZE,
    }
}

impl<S> ServiceHandler<S> {
    /// Largest response body that will be buffered.
    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }
}

impl<S: Clone> ServiceHandler<S> {
    fn service(&self) -> S {
        self.service
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<S: Clone> Clone for ServiceHandler<S> {
    fn clone(&self) -> Self {
        Self {
            service: Mutex::new(self.service()),
            max_body_size: self.max_body_size,
        }
    }
}

impl<S> fmt::Debug for ServiceHandler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceHandler")
            .field("max_body_size", &self.max_body_size)
            .finish_non_exhaustive()
    }
}

impl<S, B> ProxyHandler for ServiceHandler<S>
where
    S: Service<Request<Body>, Response = Response<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Into<BoxError>,
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    fn call(
        &self,
        cancel: CancellationToken,
        request: ProxyRequest,
    ) -> BoxFuture<'static, Result<ProxyResponse, BoxError>> {
        let service = self.service();
        let max_body_size = self.max_body_size;
        async move {
            let http_request = into_http_request(request)?;
            let exchange = async {
                let http_response = service
                    .oneshot(http_request)
                    .await
                    .map_err(Into::<BoxError>::into)?;
                let response = from_http_response(http_response, max_body_size).await?;
                Ok::<_, BoxError>(response)
            };

            tokio::select! {
                _ = cancel.cancelled() => Err(ConvertError::Cancelled.into()),
                result = exchange => result,
            }
        }
        .boxed()
    }
}

/// Rebuild the HTTP request a proxy event describes.
pub fn into_http_request(request: ProxyRequest) -> Result<Request<Body>, ConvertError> {
    let method = if request.http_method.is_empty() {
        Method::GET
    } else {
        Method::from_bytes(request.http_method.as_bytes())
            .map_err(|_| ConvertError::Method(request.http_method.clone()))?
    };

    let query = encode_query(
        &request.multi_value_query_string_parameters,
        &request.query_string_parameters,
    );
    let target = match (request.path.is_empty(), query.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/?{query}"),
        (false, true) => request.path.clone(),
        (false, false) => format!("{}?{query}", request.path),
    };
    let uri: Uri = target.parse().map_err(|_| ConvertError::Uri(target.clone()))?;

    let headers = request_headers(&request.multi_value_headers, &request.headers)?;

    let body = if request.is_base64_encoded {
        STANDARD.decode(&request.body)?
    } else {
        request.body.into_bytes()
    };

    let mut http_request = Request::new(Body::from(body));
    *http_request.method_mut() = method;
    *http_request.uri_mut() = uri;
    *http_request.headers_mut() = headers;
    Ok(http_request)
}

/// Fold an HTTP response into a proxy event response, buffering at most
/// `max_body_size` bytes of body.
pub async fn from_http_response<B>(
    response: Response<B>,
    max_body_size: usize,
) -> Result<ProxyResponse, ConvertError>
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let (parts, body) = response.into_parts();

    let bytes = axum::body::to_bytes(Body::new(body), max_body_size)
        .await
        .map_err(ConvertError::Body)?;
    let (body, is_base64_encoded) = match String::from_utf8(bytes.to_vec()) {
        Ok(text) => (text, false),
        Err(_) => (STANDARD.encode(&bytes), true),
    };

    let multi_value_headers = multi_value_headers(&parts.headers);
    Ok(ProxyResponse {
        status_code: parts.status.as_u16(),
        headers: single_value(&multi_value_headers),
        multi_value_headers,
        body,
        is_base64_encoded,
    })
}

/// Multi-valued parameters win; single-valued ones fill in missing keys.
/// Keys are sorted so the rebuilt URI is stable.
fn encode_query(multi: &MultiValueMap, single: &SingleValueMap) -> String {
    let mut pairs: Vec<(&str, &str)> = Vec::new();
    for (key, values) in multi {
        pairs.extend(values.iter().map(|value| (key.as_str(), value.as_str())));
    }
    for (key, value) in single {
        if !multi.contains_key(key) {
            pairs.push((key.as_str(), value.as_str()));
        }
    }
    // Stable sort keeps the value order within a key.
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

fn request_headers(
    multi: &MultiValueMap,
    single: &SingleValueMap,
) -> Result<HeaderMap, ConvertError> {
    let mut headers = HeaderMap::new();
    for (name, values) in multi {
        let header = parse_name(name)?;
        for value in values {
            headers.append(header.clone(), parse_value(name, value)?);
        }
    }
    for (name, value) in single {
        let header = parse_name(name)?;
        if !headers.contains_key(&header) {
            headers.insert(header, parse_value(name, value)?);
        }
    }
    Ok(headers)
}

fn parse_name(name: &str) -> Result<HeaderName, ConvertError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|_| ConvertError::Header(name.to_string()))
}

fn parse_value(name: &str, value: &str) -> Result<HeaderValue, ConvertError> {
    HeaderValue::from_str(value).map_err(|_| ConvertError::Header(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::Router;
    use std::collections::HashMap;
    use std::convert::Infallible;
    use std::time::Duration;
    use tower::service_fn;
    use tower::util::BoxCloneService;

    fn users_router() -> Router {
        Router::new()
            .route(
                "/users/{id}",
                get(|Path(id): Path<String>, Query(q): Query<HashMap<String, String>>| async move {
                    let tag = q.get("tag").cloned().unwrap_or_default();
                    (
                        [("x-user", id.clone()), ("x-tag", tag)],
                        format!("user {id}"),
                    )
                }),
            )
            .route("/echo", post(|body: String| async move { body }))
    }

    #[tokio::test]
    async fn test_router_as_handler() {
        let handler = service_handler(users_router());

        let mut request = ProxyRequest {
            http_method: "GET".into(),
            path: "/users/42".into(),
            ..Default::default()
        };
        request
            .multi_value_query_string_parameters
            .insert("tag".into(), vec!["a b".into()]);

        let response = handler
            .call(CancellationToken::new(), request)
            .await
            .unwrap();

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, "user 42");
        assert_eq!(response.headers["X-User"], "42");
        assert_eq!(response.multi_value_headers["X-Tag"], ["a b"]);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let handler = service_handler(users_router());
        let request = ProxyRequest {
            http_method: "GET".into(),
            path: "/nope".into(),
            ..Default::default()
        };

        let response = handler
            .call(CancellationToken::new(), request)
            .await
            .unwrap();
        assert_eq!(response.status_code, StatusCode::NOT_FOUND.as_u16());
    }

    #[tokio::test]
    async fn test_base64_request_body_decoded() {
        let handler = service_handler(users_router());
        let request = ProxyRequest {
            http_method: "POST".into(),
            path: "/echo".into(),
            body: STANDARD.encode("hello"),
            is_base64_encoded: true,
            ..Default::default()
        };

        let response = handler
            .call(CancellationToken::new(), request)
            .await
            .unwrap();
        assert_eq!(response.body, "hello");
        assert!(!response.is_base64_encoded);
    }

    #[test]
    fn test_into_http_request_headers_and_query() {
        let mut request = ProxyRequest {
            http_method: "PUT".into(),
            path: "/items".into(),
            ..Default::default()
        };
        request
            .multi_value_headers
            .insert("Accept".into(), vec!["text/html".into(), "text/plain".into()]);
        request.headers.insert("Accept".into(), "ignored".into());
        request.headers.insert("X-Only-Single".into(), "1".into());
        request
            .multi_value_query_string_parameters
            .insert("b".into(), vec!["2".into(), "3".into()]);
        request.query_string_parameters.insert("a".into(), "1".into());

        let http_request = into_http_request(request).unwrap();

        assert_eq!(http_request.method(), Method::PUT);
        assert_eq!(http_request.uri().path(), "/items");
        assert_eq!(http_request.uri().query(), Some("a=1&b=2&b=3"));
        let accept: Vec<_> = http_request.headers().get_all("accept").iter().collect();
        assert_eq!(accept, ["text/html", "text/plain"]);
        assert_eq!(http_request.headers()["x-only-single"], "1");
    }

    #[test]
    fn test_into_http_request_rejects_bad_method() {
        let request = ProxyRequest {
            http_method: "NOT A METHOD".into(),
            ..Default::default()
        };
        assert!(matches!(into_http_request(request), Err(ConvertError::Method(_))));
    }

    #[tokio::test]
    async fn test_plain_service_fn_with_string_body() {
        let handler = service_handler(service_fn(|request: Request<Body>| async move {
            let reply = format!("{} {}", request.method(), request.uri().path());
            Ok::<_, Infallible>(Response::new(reply))
        }));
        let request = ProxyRequest {
            http_method: "DELETE".into(),
            path: "/items/7".into(),
            ..Default::default()
        };

        let response = handler
            .call(CancellationToken::new(), request)
            .await
            .unwrap();
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, "DELETE /items/7");
    }

    #[tokio::test]
    async fn test_boxed_clone_service_is_accepted() {
        let service: BoxCloneService<Request<Body>, Response<Body>, Infallible> =
            BoxCloneService::new(users_router());
        let adapter = crate::http::ProxyAdapter::new(
            service_handler(service),
            "/",
            HashMap::<String, String>::new(),
        )
        .unwrap();

        let response = adapter
            .handle(Request::builder().uri("/users/9").body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cancelled_token_abandons_service_call() {
        let handler = service_handler(service_fn(|_request: Request<Body>| async move {
            std::future::pending::<()>().await;
            Ok::<_, Infallible>(Response::new(String::new()))
        }));
        let cancel = CancellationToken::new();
        let call = handler.call(cancel.clone(), ProxyRequest::default());
        cancel.cancel();

        let err = tokio::time::timeout(Duration::from_secs(1), call)
            .await
            .expect("call did not stop after cancellation")
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConvertError>(),
            Some(ConvertError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn test_response_body_over_limit_fails() {
        let handler = service_handler(service_fn(|_request: Request<Body>| async move {
            Ok::<_, Infallible>(Response::new("x".repeat(64)))
        }))
        .with_max_body_size(16);

        let err = handler
            .call(CancellationToken::new(), ProxyRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConvertError>(),
            Some(ConvertError::Body(_))
        ));
    }
}
