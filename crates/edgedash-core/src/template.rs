//! Dashboard template loading and token substitution.
//!
//! A template is a JSON dashboard with three literal placeholder tokens.
//! Substitution is purely textual; the result is only interpreted as JSON
//! after every token has been replaced.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{CoreError, TemplateError};

pub const EDGE_NAME_TOKEN: &str = "${EDGE_NAME}";
pub const DATASOURCE_UID_TOKEN: &str = "${DATASOURCE_UID}";
pub const UID_SUFFIX_TOKEN: &str = "${UID_SUFFIX}";

/// Values substituted into a template for one edge.
#[derive(Debug, Clone, Copy)]
pub struct TemplateValues<'a> {
    pub edge_name: &'a str,
    pub datasource_uid: &'a str,
    pub uid_suffix: &'a str,
}

/// The raw text of a dashboard template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardTemplate {
    source: String,
}

impl DashboardTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Read a template file.
    pub async fn load(path: &Path) -> Result<Self, CoreError> {
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CoreError::TemplateRead {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), bytes = source.len(), "loaded dashboard template");
        Ok(Self::new(source))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Tokens this template never mentions.
    pub fn missing_tokens(&self) -> Vec<&'static str> {
        [EDGE_NAME_TOKEN, DATASOURCE_UID_TOKEN, UID_SUFFIX_TOKEN]
            .into_iter()
            .filter(|token| !self.source.contains(token))
            .collect()
    }

    /// Log templates that will render identically for several edges.
    pub fn warn_on_missing_tokens(&self) {
        for token in self.missing_tokens() {
            warn!(token, "dashboard template does not use placeholder");
        }
        if !self.source.contains(UID_SUFFIX_TOKEN) {
            warn!("without {UID_SUFFIX_TOKEN} every edge upserts the same dashboard uid");
        }
    }

    /// Replace every occurrence of every token in a single left-to-right
    /// pass. Substituted values are never scanned for tokens again.
    pub fn render(&self, values: &TemplateValues<'_>) -> String {
        let tokens = [
            (EDGE_NAME_TOKEN, values.edge_name),
            (DATASOURCE_UID_TOKEN, values.datasource_uid),
            (UID_SUFFIX_TOKEN, values.uid_suffix),
        ];

        let mut out = String::with_capacity(self.source.len());
        let mut rest = self.source.as_str();
        while let Some(pos) = rest.find("${") {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if let Some((token, value)) = tokens.iter().find(|(token, _)| tail.starts_with(token)) {
                out.push_str(value);
                rest = &tail[token.len()..];
            } else {
                out.push_str("${");
                rest = &tail[2..];
            }
        }
        out.push_str(rest);
        out
    }

    /// Render and decode into a dashboard object carrying a string `uid`.
    pub fn render_document(
        &self,
        values: &TemplateValues<'_>,
    ) -> Result<Map<String, Value>, TemplateError> {
        let rendered = self.render(values);
        let document = match serde_json::from_str::<Value>(&rendered)? {
            Value::Object(map) => map,
            other => {
                return Err(TemplateError::NotAnObject {
                    found: json_kind(&other),
                });
            }
        };
        match document.get("uid") {
            Some(Value::String(uid)) if !uid.is_empty() => Ok(document),
            _ => Err(TemplateError::MissingUid),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
