//! Detection result data model
//!
//! Constructors enforce the result invariants: `found` always mirrors
//! whether components are present, and failed results carry none.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of authentication mechanisms the detector reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Traditional,
    #[serde(rename = "oauth")]
    OAuth,
    Passwordless,
}

impl ComponentType {
    pub const ALL: [ComponentType; 3] = [
        ComponentType::Traditional,
        ComponentType::OAuth,
        ComponentType::Passwordless,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentType::Traditional => "traditional",
            ComponentType::OAuth => "oauth",
            ComponentType::Passwordless => "passwordless",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-correlated details; which fields are set depends on the source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub providers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthComponent {
    #[serde(rename = "type")]
    pub kind: ComponentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default)]
    pub details: ComponentDetails,
}

impl AuthComponent {
    #[must_use]
    pub fn new(kind: ComponentType, details: ComponentDetails) -> Self {
        Self {
            kind,
            snippet: None,
            details,
        }
    }

    #[must_use]
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    /// Providers named in the details, lowercased
    #[must_use]
    pub fn providers(&self) -> Vec<String> {
        self.details
            .providers
            .iter()
            .flatten()
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect()
    }
}

/// Which path produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMethod {
    Ai,
    Pattern,
    /// Model ran but found nothing, heuristics did
    Hybrid,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub success: bool,
    pub url: String,
    pub found: bool,
    pub components: Vec<AuthComponent>,
    #[serde(rename = "detectionMethod")]
    pub method: DetectionMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,
    /// Base64 JPEG of the viewport
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
}

impl DetectionResult {
    /// Successful detection; `found` follows from `components`
    #[must_use]
    pub fn detected(
        url: impl Into<String>,
        components: Vec<AuthComponent>,
        method: DetectionMethod,
    ) -> Self {
        Self {
            success: true,
            url: url.into(),
            found: !components.is_empty(),
            components,
            method,
            error: None,
            page_title: None,
            screenshot: None,
        }
    }

    #[must_use]
    pub fn failure(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            url: url.into(),
            found: false,
            components: Vec::new(),
            method: DetectionMethod::None,
            error: Some(error.into()),
            page_title: None,
            screenshot: None,
        }
    }

    #[must_use]
    pub fn with_page_report(mut self, title: Option<String>, screenshot: Option<String>) -> Self {
        self.page_title = title.filter(|t| !t.is_empty());
        self.screenshot = screenshot;
        self
    }
}
