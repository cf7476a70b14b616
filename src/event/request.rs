//! Proxy event request.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::event::values::{MultiValueMap, SingleValueMap};
use crate::routing::PathParameters;

/// Stage variables shared by every request an adapter produces.
pub type StageVariables = Arc<HashMap<String, String>>;

/// A normalized inbound request, in the gateway proxy event shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyRequest {
    /// The resource pattern the adapter was built with.
    pub resource: String,

    /// Request path exactly as received.
    pub path: String,

    pub http_method: String,

    pub headers: SingleValueMap,

    pub multi_value_headers: MultiValueMap,

    pub query_string_parameters: SingleValueMap,

    pub multi_value_query_string_parameters: MultiValueMap,

    pub path_parameters: PathParameters,

    pub stage_variables: StageVariables,

    pub request_context: ProxyRequestContext,

    pub body: String,

    /// Set when `body` holds base64 because the raw bytes were not UTF-8.
    pub is_base64_encoded: bool,
}

impl ProxyRequest {
    /// First value of a header, looked up case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// First value of a query parameter.
    pub fn query_parameter(&self, name: &str) -> Option<&str> {
        self.query_string_parameters.get(name).map(String::as_str)
    }

    /// Value a template placeholder captured.
    pub fn path_parameter(&self, name: &str) -> Option<&str> {
        self.path_parameters.get(name).map(String::as_str)
    }

    /// Look up a stage variable.
    pub fn stage_variable(&self, name: &str) -> Option<&str> {
        self.stage_variables.get(name).map(String::as_str)
    }
}

/// Per-request metadata a gateway would attach.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyRequestContext {
    pub request_id: String,
    pub stage: String,
    pub resource_path: String,
    pub http_method: String,
    pub path: String,
}
