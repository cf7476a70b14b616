//! Proxy event adapter.
//!
//! Runs handlers written against the cloud gateway "proxy event" contract
//! behind an ordinary HTTP server, and HTTP services behind proxy events.
//!
//! ```no_run
//! use std::collections::HashMap;
//! use proxy_event_adapter::{handler_fn, BoxError, ProxyAdapter, ProxyRequest, ProxyResponse};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let handler = handler_fn(|request: ProxyRequest| async move {
//!     let user = request.path_parameter("userId").unwrap_or_default().to_string();
//!     Ok::<_, BoxError>(ProxyResponse::new(200).with_body(user))
//! });
//!
//! let adapter = ProxyAdapter::new(handler, "/users/{userId}", HashMap::new())?;
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, adapter.into_router()).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod event;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::AdapterConfig;
pub use event::{ProxyRequest, ProxyRequestContext, ProxyResponse, StageVariables};
pub use handler::{context_handler_fn, handler_fn, BoxError, ProxyHandler};
pub use http::{service_handler, HttpServer, ProxyAdapter};
pub use lifecycle::Shutdown;
pub use routing::PathTemplate;
pub use tokio_util::sync::CancellationToken;
