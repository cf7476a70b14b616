//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request_id.rs (X-Request-ID assigned or kept)
//!     → adapter.rs (entry point)
//!         → request.rs (HTTP request → ProxyRequest)
//!         → handler (business logic, outside this crate)
//!         → response.rs (ProxyResponse → HTTP response)
//!     → Send to client
//!
//! Reverse direction:
//!     ProxyRequest → service.rs → any tower::Service → ProxyResponse
//! ```

pub mod adapter;
pub mod request;
pub mod request_id;
pub mod response;
pub mod server;
pub mod service;

pub use adapter::{AdapterError, ProxyAdapter};
pub use request::{RequestTranslator, TranslateError};
pub use request_id::X_REQUEST_ID;
pub use response::{emit, failure_response, EmitError};
pub use server::HttpServer;
pub use service::{service_handler, ConvertError, ServiceHandler};
