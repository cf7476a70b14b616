//! Proxy event response.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::event::values::{MultiValueMap, SingleValueMap};

/// What a handler returns, in the gateway proxy event shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyResponse {
    pub status_code: u16,

    pub headers: SingleValueMap,

    pub multi_value_headers: MultiValueMap,

    pub body: String,

    /// Set when `body` is base64 and must be decoded before it is written.
    pub is_base64_encoded: bool,
}

impl Default for ProxyResponse {
    fn default() -> Self {
        Self::new(200)
    }
}

impl ProxyResponse {
    /// Empty response with the given status.
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            headers: SingleValueMap::new(),
            multi_value_headers: MultiValueMap::new(),
            body: String::new(),
            is_base64_encoded: false,
        }
    }

    /// Set a single-valued header, replacing an earlier one with the same key.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Append one value to a multi-valued header.
    pub fn with_multi_value_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.multi_value_headers
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Set a text body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self.is_base64_encoded = false;
        self
    }

    /// Store raw bytes as a base64 body.
    pub fn with_binary_body(mut self, body: impl AsRef<[u8]>) -> Self {
        self.body = STANDARD.encode(body);
        self.is_base64_encoded = true;
        self
    }

    /// The body as it should go on the wire.
    pub fn body_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        if self.is_base64_encoded {
            STANDARD.decode(&self.body)
        } else {
            Ok(self.body.as_bytes().to_vec())
        }
    }
}
