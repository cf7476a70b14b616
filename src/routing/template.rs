//! Path template compilation and parameter extraction.
//!
//! # Responsibilities
//! - Compile a resource pattern such as `/users/{userId}` once, at startup
//! - Match a concrete request path against it
//! - Extract placeholder values by name
//!
//! # Design Decisions
//! - Placeholders capture one run of `[A-Za-z0-9_]`, so they never cross a `/`
//! - Literal text is escaped; `.` or `+` in a pattern match themselves
//! - Matching is anchored to the whole path and case-sensitive
//! - A path that does not fit yields no parameters rather than an error
//! - Repeated placeholder names are accepted and the rightmost capture wins

use std::collections::HashMap;
use std::fmt;

use regex::Regex;

/// Placeholder name to matched path segment.
pub type PathParameters = HashMap<String, String>;

/// Expression substituted for every `{name}` placeholder.
const SEGMENT_CAPTURE: &str = "([A-Za-z0-9_]+)";

/// Error raised while compiling a resource pattern.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// A brace that does not belong to a well-formed `{name}` placeholder.
    #[error("malformed placeholder in pattern `{pattern}` at byte {position}")]
    Malformed { pattern: String, position: usize },

    /// The translated expression was rejected by the regex engine.
    #[error("pattern `{pattern}` failed to compile: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled resource pattern.
///
/// Immutable after construction and cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    pattern: String,
    regex: Regex,
    /// Placeholder names in the order their capture groups appear.
    names: Vec<String>,
}

impl PathTemplate {
    /// Compile a resource pattern.
    pub fn compile(pattern: impl Into<String>) -> Result<Self, TemplateError> {
        let pattern = pattern.into();
        let (expression, names) = translate_pattern(&pattern)?;
        let regex = Regex::new(&expression).map_err(|source| TemplateError::Regex {
            pattern: pattern.clone(),
            source,
        })?;

        Ok(Self {
            pattern,
            regex,
            names,
        })
    }

    /// The pattern exactly as it was supplied.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Placeholder names, left to right, duplicates included.
    pub fn placeholder_names(&self) -> &[String] {
        &self.names
    }

    /// Strict match: `None` when the path does not fit the template.
    pub fn captures(&self, path: &str) -> Option<PathParameters> {
        let captures = self.regex.captures(path)?;

        let mut params = PathParameters::with_capacity(self.names.len());
        // Group 0 is the whole match.
        for (name, group) in self.names.iter().zip(captures.iter().skip(1)) {
            if let Some(value) = group {
                params.insert(name.clone(), value.as_str().to_string());
            }
        }
        Some(params)
    }

    /// Permissive match: a path that does not fit yields an empty map.
    pub fn match_path(&self, path: &str) -> PathParameters {
        self.captures(path).unwrap_or_default()
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Turn `/users/{userId}` into `^/users/([A-Za-z0-9_]+)$` plus `["userId"]`.
fn translate_pattern(pattern: &str) -> Result<(String, Vec<String>), TemplateError> {
    let malformed = |position| TemplateError::Malformed {
        pattern: pattern.to_string(),
        position,
    };

    let bytes = pattern.as_bytes();
    let mut expression = String::with_capacity(pattern.len() + 16);
    let mut names = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    expression.push('^');
    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                let close = pattern[i + 1..]
                    .find('}')
                    .map(|offset| i + 1 + offset)
                    .ok_or_else(|| malformed(i))?;
                let name = &pattern[i + 1..close];
                if name.is_empty() || !name.bytes().all(is_word_byte) {
                    return Err(malformed(i));
                }

                expression.push_str(&regex::escape(&pattern[literal_start..i]));
                expression.push_str(SEGMENT_CAPTURE);
                names.push(name.to_string());

                i = close + 1;
                literal_start = i;
            }
            b'}' => return Err(malformed(i)),
            _ => i += 1,
        }
    }
    expression.push_str(&regex::escape(&pattern[literal_start..]));
    expression.push('$');

    Ok((expression, names))
}
