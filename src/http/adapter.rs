//! Adapter entry point.
//!
//! # Data Flow
//! ```text
//! Request<Body>
//!     → RequestTranslator::translate   (buffer body, build ProxyRequest)
//!     → ProxyHandler::call             (awaited inline, with a cancellation token)
//!     → emit                           (ProxyResponse → Response<Body>)
//!
//! Any failure along the way → failure_response (500, "error")
//! ```
//!
//! # Design Decisions
//! - Template and stage variables fixed at construction, shared read-only
//! - No spawning, pooling or queuing; the request runs on the server's task
//! - The token is cancelled when the request future is dropped or finishes;
//!   the adapter never aborts work on its own

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, Response};
use axum::Router;
use tokio_util::sync::CancellationToken;

use crate::config::AdapterConfig;
use crate::event::StageVariables;
use crate::handler::ProxyHandler;
use crate::http::request::RequestTranslator;
use crate::http::response::{emit, failure_response};
use crate::observability::metrics;
use crate::routing::{PathTemplate, TemplateError};

/// Error raised while building an adapter.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("invalid resource pattern: {0}")]
    Template(#[from] TemplateError),
}

/// Serves one proxy event handler behind one resource pattern.
///
/// Cheap to clone; clones share the compiled template and the handler.
#[derive(Clone)]
pub struct ProxyAdapter {
    translator: Arc<RequestTranslator>,
    handler: Arc<dyn ProxyHandler>,
}

impl std::fmt::Debug for ProxyAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyAdapter")
            .field("translator", &self.translator)
            .finish_non_exhaustive()
    }
}

impl ProxyAdapter {
    /// Compile `pattern` and bind it to `handler`.
    pub fn new<H>(
        handler: H,
        pattern: &str,
        stage_variables: impl Into<StageVariables>,
    ) -> Result<Self, AdapterError>
    where
        H: ProxyHandler,
    {
        let template = PathTemplate::compile(pattern)?;
        Ok(Self {
            translator: Arc::new(RequestTranslator::new(template, stage_variables.into())),
            handler: Arc::new(handler),
        })
    }

    /// Build from the `[route]`, `[stage_variables]` and `[limits]` sections.
    pub fn from_config<H>(handler: H, config: &AdapterConfig) -> Result<Self, AdapterError>
    where
        H: ProxyHandler,
    {
        Ok(Self::new(handler, &config.route.resource, config.stage_variables.clone())?
            .with_stage(config.route.stage.clone())
            .with_max_body_size(config.limits.max_body_size))
    }

    /// Stage name reported in each request context.
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        let translator = Arc::unwrap_or_clone(self.translator).with_stage(stage);
        self.translator = Arc::new(translator);
        self
    }

    /// Largest request body that will be buffered.
    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        let translator = Arc::unwrap_or_clone(self.translator).with_max_body_size(max_body_size);
        self.translator = Arc::new(translator);
        self
    }

    pub fn template(&self) -> &PathTemplate {
        self.translator.template()
    }

    pub fn stage_variables(&self) -> &StageVariables {
        self.translator.stage_variables()
    }

    /// Handle one HTTP request end to end. Never fails; errors become a 500.
    pub async fn handle(&self, request: Request<Body>) -> Response<Body> {
        let start_time = Instant::now();
        let method = request.method().to_string();

        let cancel = CancellationToken::new();
        let _cancel_on_drop = cancel.clone().drop_guard();

        let event = match self.translator.translate(request).await {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(method = %method, error = %e, "Failed to translate request");
                metrics::record_request(&method, 500, start_time);
                return failure_response();
            }
        };

        let request_id = event.request_context.request_id.clone();
        tracing::debug!(
            request_id = %request_id,
            method = %method,
            path = %event.path,
            path_parameters = event.path_parameters.len(),
            "Invoking handler"
        );

        let proxy_response = match self.handler.call(cancel, event).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "Handler returned an error");
                metrics::record_handler_error();
                metrics::record_request(&method, 500, start_time);
                return failure_response();
            }
        };

        match emit(proxy_response) {
            Ok(response) => {
                metrics::record_request(&method, response.status().as_u16(), start_time);
                response
            }
            Err(e) => {
                tracing::error!(request_id = %request_id, error = %e, "Failed to emit handler response");
                metrics::record_request(&method, 500, start_time);
                failure_response()
            }
        }
    }

    /// A router that sends every method and path to this adapter.
    pub fn into_router(self) -> Router {
        Router::new().fallback(adapter_handler).with_state(self)
    }
}

async fn adapter_handler(
    State(adapter): State<ProxyAdapter>,
    request: Request<Body>,
) -> Response<Body> {
    adapter.handle(request).await
}
