//! Request translation.
//!
//! # Responsibilities
//! - Buffer the whole request body (no streaming to handlers)
//! - Build multi-valued headers and query parameters, then the single-valued view
//! - Extract path parameters with the adapter's compiled template
//! - Attach stage variables and request context
//!
//! # Design Decisions
//! - A body read failure is a recoverable error, answered like a handler error
//! - The path is passed through exactly as received, no normalization
//! - Bodies that are not UTF-8 are base64-encoded instead of rejected

use axum::body::Body;
use axum::http::Request;
use base64::{engine::general_purpose::STANDARD, Engine};

use crate::event::values::{multi_value_headers, multi_value_query, single_value};
use crate::event::{ProxyRequest, ProxyRequestContext, StageVariables};
use crate::http::request_id::{new_request_id, X_REQUEST_ID};
use crate::routing::PathTemplate;

/// Default cap on a buffered request body (2MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Error raised while turning an HTTP request into a proxy event.
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    /// The transport failed mid-body or the body exceeded the size limit.
    #[error("failed to read request body: {0}")]
    Body(#[source] axum::Error),
}

/// Builds [`ProxyRequest`]s for one resource pattern.
#[derive(Debug, Clone)]
pub struct RequestTranslator {
    template: PathTemplate,
    stage_variables: StageVariables,
    stage: String,
    max_body_size: usize,
}

impl RequestTranslator {
    /// Translator with no stage name and the default body limit.
    pub fn new(template: PathTemplate, stage_variables: StageVariables) -> Self {
        Self {
            template,
            stage_variables,
            stage: String::new(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Stage name reported in each request context.
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = stage.into();
        self
    }

    /// Largest request body that will be buffered.
    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    pub fn stage_variables(&self) -> &StageVariables {
        &self.stage_variables
    }

    /// Read the request to completion and build its proxy event.
    pub async fn translate(&self, request: Request<Body>) -> Result<ProxyRequest, TranslateError> {
        let (parts, body) = request.into_parts();

        let bytes = axum::body::to_bytes(body, self.max_body_size)
            .await
            .map_err(TranslateError::Body)?;
        let (body, is_base64_encoded) = match String::from_utf8(bytes.to_vec()) {
            Ok(text) => (text, false),
            Err(_) => (STANDARD.encode(&bytes), true),
        };

        let path = parts.uri.path().to_string();
        let http_method = parts.method.to_string();

        let multi_value_headers = multi_value_headers(&parts.headers);
        let multi_value_query_string_parameters = multi_value_query(parts.uri.query());

        let request_id = parts
            .headers
            .get(X_REQUEST_ID)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(new_request_id);

        Ok(ProxyRequest {
            resource: self.template.pattern().to_string(),
            path_parameters: self.template.match_path(&path),
            headers: single_value(&multi_value_headers),
            multi_value_headers,
            query_string_parameters: single_value(&multi_value_query_string_parameters),
            multi_value_query_string_parameters,
            stage_variables: StageVariables::clone(&self.stage_variables),
            request_context: ProxyRequestContext {
                request_id,
                stage: self.stage.clone(),
                resource_path: self.template.pattern().to_string(),
                http_method: http_method.clone(),
                path: path.clone(),
            },
            path,
            http_method,
            body,
            is_base64_encoded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn translator(pattern: &str) -> RequestTranslator {
        let mut vars = HashMap::new();
        vars.insert("var1".to_string(), "varValue1".to_string());
        RequestTranslator::new(PathTemplate::compile(pattern).unwrap(), Arc::new(vars))
            .with_stage("test")
    }

    #[tokio::test]
    async fn test_translate_post() {
        let translator = translator("/users/{userId}");
        let request = Request::builder()
            .method("POST")
            .uri("/users/123?abc=123")
            .header("content-type", "application/json")
            .header("x-request-id", "req-1")
            .body(Body::from("req_body"))
            .unwrap();

        let event = translator.translate(request).await.unwrap();

        assert_eq!(event.resource, "/users/{userId}");
        assert_eq!(event.http_method, "POST");
        assert_eq!(event.path, "/users/123");
        assert_eq!(event.path_parameters["userId"], "123");
        assert_eq!(event.query_string_parameters["abc"], "123");
        assert_eq!(event.multi_value_query_string_parameters["abc"], ["123"]);
        assert_eq!(event.headers["Content-Type"], "application/json");
        assert_eq!(event.multi_value_headers["Content-Type"], ["application/json"]);
        assert_eq!(event.body, "req_body");
        assert!(!event.is_base64_encoded);
        assert_eq!(event.stage_variables["var1"], "varValue1");
        assert_eq!(event.request_context.request_id, "req-1");
        assert_eq!(event.request_context.stage, "test");
    }

    #[tokio::test]
    async fn test_stage_variables_shared_not_copied() {
        let translator = translator("/");
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let event = translator.translate(request).await.unwrap();
        assert!(Arc::ptr_eq(&event.stage_variables, translator.stage_variables()));
    }

    #[tokio::test]
    async fn test_path_not_matching_yields_no_params() {
        let translator = translator("/greet/{name}");
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let event = translator.translate(request).await.unwrap();
        assert!(event.path_parameters.is_empty());
        assert_eq!(event.path, "/");
        assert_eq!(event.http_method, "GET");
    }

    #[tokio::test]
    async fn test_path_passed_through_verbatim() {
        let translator = translator("/files/{name}");
        let request = Request::builder()
            .uri("/files/a%20b//x/../y")
            .body(Body::empty())
            .unwrap();

        let event = translator.translate(request).await.unwrap();
        assert_eq!(event.path, "/files/a%20b//x/../y");
    }

    #[tokio::test]
    async fn test_binary_body_is_base64() {
        let translator = translator("/");
        let request = Request::builder()
            .uri("/")
            .body(Body::from(vec![0xffu8, 0x00, 0x10]))
            .unwrap();

        let event = translator.translate(request).await.unwrap();
        assert!(event.is_base64_encoded);
        assert_eq!(event.body, "/wAQ");
    }

    #[tokio::test]
    async fn test_missing_request_id_is_generated() {
        let translator = translator("/");
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let event = translator.translate(request).await.unwrap();
        assert_eq!(event.request_context.request_id.len(), 36);
    }

    #[tokio::test]
    async fn test_body_over_limit_fails() {
        let translator = translator("/").with_max_body_size(4);
        let request = Request::builder()
            .uri("/")
            .body(Body::from("too long"))
            .unwrap();

        assert!(matches!(
            translator.translate(request).await,
            Err(TranslateError::Body(_))
        ));
    }
}
