//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Resource pattern (at startup):
//!     "/users/{userId}"
//!     → template.rs (escape literals, substitute placeholders)
//!     → Freeze as immutable PathTemplate
//!
//! Incoming request path:
//!     "/users/123"
//!     → PathTemplate::match_path
//!     → { "userId": "123" } or {} when the path does not fit
//! ```
//!
//! # Design Decisions
//! - One pattern per adapter; this is not a multi-route dispatcher
//! - Template compiled once, shared read-only across requests
//! - No wildcard or greedy placeholders

pub mod template;

pub use template::{PathParameters, PathTemplate, TemplateError};
