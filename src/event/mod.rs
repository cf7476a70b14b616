//! Proxy event value objects.
//!
//! # Data Flow
//! ```text
//! HTTP request
//!     → values.rs (multi-valued headers/query, single-valued by first value)
//!     → request.rs (ProxyRequest handed to the handler)
//!
//! Handler result
//!     → response.rs (ProxyResponse consumed once by the emitter)
//! ```
//!
//! # Design Decisions
//! - Field names follow the gateway JSON format so events serialize as-is
//! - Stage variables are shared via `Arc`, never deep-copied per request
//! - Non-UTF-8 bodies travel as base64 with `is_base64_encoded` set

pub mod request;
pub mod response;
pub mod values;

pub use request::{ProxyRequest, ProxyRequestContext, StageVariables};
pub use response::ProxyResponse;
pub use values::{MultiValueMap, SingleValueMap};
