//! Inbound event shapes
//!
//! Two event layouts reach the router: the newer HTTP-style event with
//! `requestContext.http.{method,path}` and the legacy REST-style event
//! with top-level `httpMethod`/`path`. Both collapse into one
//! [`RouteDescriptor`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Inbound request event
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub request_context: Option<RequestContext>,
    /// REST-style method
    #[serde(default)]
    pub http_method: Option<String>,
    /// REST-style path
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    pub path_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    #[serde(default)]
    pub http: Option<HttpContext>,
    #[serde(default)]
    pub stage: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HttpContext {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

/// Canonical method and stage-free resource path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    pub method: String,
    pub path: String,
}

impl RouteDescriptor {
    /// `"METHOD /path"`, used in diagnostics
    pub fn route_key(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

impl Event {
    /// Build an HTTP-style event
    pub fn http(method: &str, path: &str) -> Self {
        Self {
            request_context: Some(RequestContext {
                http: Some(HttpContext {
                    method: Some(method.to_string()),
                    path: Some(path.to_string()),
                }),
                stage: None,
            }),
            ..Self::default()
        }
    }

    /// Build a REST-style event
    #[cfg(test)]
    pub fn rest(method: &str, path: &str) -> Self {
        Self {
            http_method: Some(method.to_string()),
            path: Some(path.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_stage(mut self, stage: &str) -> Self {
        self.request_context
            .get_or_insert_with(RequestContext::default)
            .stage = Some(stage.to_string());
        self
    }

    #[must_use]
    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.query_string_parameters
            .get_or_insert_with(HashMap::new)
            .insert(name.to_string(), value.to_string());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Method and raw path, HTTP-style shape first
    fn raw_route(&self) -> Option<(&str, &str)> {
        let http = self
            .request_context
            .as_ref()
            .and_then(|ctx| ctx.http.as_ref())
            .and_then(|http| Some((http.method.as_deref()?, http.path.as_deref()?)));
        http.or_else(|| Some((self.http_method.as_deref()?, self.path.as_deref()?)))
    }

    fn stage(&self) -> Option<&str> {
        self.request_context
            .as_ref()
            .and_then(|ctx| ctx.stage.as_deref())
            .filter(|s| !s.is_empty())
    }

    /// Normalize the event into a route descriptor
    ///
    /// Returns `None` when neither event shape is present.
    pub fn descriptor(&self) -> Option<RouteDescriptor> {
        let (method, raw_path) = self.raw_route()?;
        let path = match self.stage() {
            Some(stage) => strip_stage(raw_path, stage),
            None => raw_path,
        };
        Some(RouteDescriptor {
            method: method.to_ascii_uppercase(),
            path: if path.is_empty() { "/" } else { path }.to_string(),
        })
    }

    /// Query string parameters, empty when absent
    pub fn query_params(&self) -> &HashMap<String, String> {
        static EMPTY: std::sync::OnceLock<HashMap<String, String>> = std::sync::OnceLock::new();
        self.query_string_parameters
            .as_ref()
            .unwrap_or_else(|| EMPTY.get_or_init(HashMap::new))
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query_params().get(name).map(String::as_str)
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_parameters
            .as_ref()
            .and_then(|params| params.get(name))
            .map(String::as_str)
    }

    /// Raw request path as the front door saw it, stage included
    pub fn raw_path(&self) -> Option<&str> {
        self.raw_route().map(|(_, path)| path)
    }
}

/// Strip a leading `/<stage>` segment
///
/// Only whole segments are stripped: stage `pro` turns `/pro/spaces`
/// into `/spaces` but leaves `/profile` alone.
fn strip_stage<'a>(path: &'a str, stage: &str) -> &'a str {
    let Some(rest) = path
        .strip_prefix('/')
        .and_then(|p| p.strip_prefix(stage))
    else {
        return path;
    };
    if rest.is_empty() || rest.starts_with('/') {
        rest
    } else {
        path
    }
}
