//! # Route and Provider Descriptors
//!
//! What a micro-app contributes to the consuming web framework. The registry
//! only concatenates these in registration order; matching precedence is the
//! web layer's business.

use std::fmt;

use serde::{Deserialize, Serialize};

/// HTTP method of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// A route a micro-app mounts on the web layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    pub method: HttpMethod,
    pub path: String,
    /// Name of the handler inside the owning module.
    pub handler: String,
}

impl RouteDescriptor {
    pub fn new(method: HttpMethod, path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            handler: handler.into(),
        }
    }

    pub fn get(path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path, handler)
    }

    pub fn post(path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path, handler)
    }
}

impl fmt::Display for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {}", self.method, self.path, self.handler)
    }
}

/// Lifetime of a provided dependency inside the web layer's injector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderScope {
    #[default]
    Singleton,
    Request,
    Transient,
}

/// A dependency-injection provider a micro-app exposes to the web layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    /// Injection token the web layer resolves by.
    pub token: String,
    /// Service-locator name backing this provider, if any.
    pub service: Option<String>,
    pub scope: ProviderScope,
}

impl ProviderDescriptor {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            service: None,
            scope: ProviderScope::default(),
        }
    }

    /// Back this provider with a named service from the locator.
    pub fn backed_by(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_scope(mut self, scope: ProviderScope) -> Self {
        self.scope = scope;
        self
    }
}
