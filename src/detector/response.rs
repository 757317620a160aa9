//! Model response parsing
//!
//! Models wrap JSON in prose or code fences and sometimes emit comments or
//! trailing commas. We take the first balanced object, scrub those, and
//! validate it into typed components. Anything that does not fit the
//! contract is an error so the caller can fall back to heuristics.

use serde::Deserialize;

use super::types::{AuthComponent, ComponentDetails, ComponentType};
use crate::error::{AuthDetectError, Result};

#[derive(Debug, Deserialize)]
struct RawAnswer {
    #[serde(default)]
    found: Option<bool>,
    #[serde(default)]
    components: Vec<RawComponent>,
}

#[derive(Debug, Deserialize)]
struct RawComponent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    details: RawDetails,
}

#[derive(Debug, Default, Deserialize)]
struct RawDetails {
    #[serde(default)]
    fields: Option<Vec<String>>,
    #[serde(default)]
    providers: Option<Vec<String>>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default, alias = "locatorHint", alias = "locator_hint")]
    locator: Option<String>,
    #[serde(default)]
    note: Option<String>,
}

/// Validated model answer; `found` always matches `components`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelAnswer {
    pub components: Vec<AuthComponent>,
    /// What the model claimed, before reconciliation
    pub claimed_found: Option<bool>,
}

impl ModelAnswer {
    #[must_use]
    pub fn found(&self) -> bool {
        !self.components.is_empty()
    }
}

/// First balanced `{...}` block, ignoring braces inside string literals
#[must_use]
pub fn extract_json_block(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Remove `//` and `/* */` comments and trailing commas outside strings
#[must_use]
pub fn scrub_json(block: &str) -> String {
    let chars: Vec<char> = block.chars().collect();
    let mut out = String::with_capacity(block.len());
    let mut i = 0;
    let mut in_string = false;
    let mut escaped = false;

    while i < chars.len() {
        let ch = chars[i];
        if in_string {
            out.push(ch);
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            i += 1;
            continue;
        }

        match ch {
            '"' => {
                in_string = true;
                out.push(ch);
                i += 1;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i += 2;
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if !matches!(next, Some('}' | ']')) {
                    out.push(ch);
                }
                i += 1;
            }
            _ => {
                out.push(ch);
                i += 1;
            }
        }
    }
    out
}

fn component_type(raw: &str) -> Result<ComponentType> {
    let normalized = raw.trim();
    ComponentType::ALL
        .into_iter()
        .find(|kind| kind.as_str().eq_ignore_ascii_case(normalized))
        .ok_or_else(|| AuthDetectError::AiResponse(format!("unknown component type {raw:?}")))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn non_empty_list(values: Option<Vec<String>>) -> Option<Vec<String>> {
    values
        .map(|list| {
            list.into_iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|list| !list.is_empty())
}

/// Parse raw model text into validated components
pub fn parse_model_response(raw: &str) -> Result<ModelAnswer> {
    let block = extract_json_block(raw)
        .ok_or_else(|| AuthDetectError::AiResponse("no JSON object in model response".into()))?;
    let answer: RawAnswer = serde_json::from_str(&scrub_json(block))
        .map_err(|e| AuthDetectError::AiResponse(format!("invalid JSON: {e}")))?;

    let components = answer
        .components
        .into_iter()
        .map(|raw| -> Result<AuthComponent> {
            let kind = component_type(&raw.kind)?;
            let details = ComponentDetails {
                fields: non_empty_list(raw.details.fields),
                providers: non_empty_list(raw.details.providers),
                method: non_blank(raw.details.method),
                locator_hint: non_blank(raw.details.locator),
                note: non_blank(raw.details.note),
            };
            Ok(AuthComponent::new(kind, details))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ModelAnswer {
        components,
        claimed_found: answer.found,
    })
}
