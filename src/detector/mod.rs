//! Authentication detection
//!
//! The model path sends a screenshot plus a relevance-ranked excerpt to a
//! vision model and resolves each proposed component against the live
//! page. Without a model, or whenever the model path fails, the heuristic
//! pattern path runs instead. Model failures never fail the request.

pub mod ai_client;
pub mod excerpt;
pub mod fallback;
pub mod pattern;
pub mod prompt;
pub mod response;
pub mod snippet;
pub mod types;

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::AuthDetectConfig;
use crate::dom::DomProbe;
use crate::error::{AuthDetectError, Result};

pub use ai_client::{GeminiClient, VisionModel};
pub use excerpt::build_excerpt;
pub use pattern::detect_patterns;
pub use prompt::build_prompt;
pub use response::{ModelAnswer, parse_model_response};
pub use snippet::{SnippetSettings, attach_snippets, placeholder};
pub use types::{
    AuthComponent, ComponentDetails, ComponentType, DetectionMethod, DetectionResult,
};

pub struct Detector {
    model: Option<Arc<dyn VisionModel>>,
    ai_timeout: Duration,
    snippets: SnippetSettings,
    pattern_lookup_timeout: Duration,
    max_excerpt_bytes: usize,
    min_excerpt_bytes: usize,
}

impl Detector {
    pub fn new(config: &AuthDetectConfig, model: Option<Arc<dyn VisionModel>>) -> Self {
        Self {
            model,
            ai_timeout: config.ai_timeout(),
            snippets: SnippetSettings::from(config),
            pattern_lookup_timeout: config.pattern_lookup_timeout(),
            max_excerpt_bytes: config.max_excerpt_bytes(),
            min_excerpt_bytes: config.min_excerpt_bytes(),
        }
    }

    /// Detector using Gemini when a key is configured, patterns otherwise
    pub fn from_config(config: &AuthDetectConfig) -> Result<Self> {
        let model = GeminiClient::from_config(config)?.map(|client| Arc::new(client) as Arc<dyn VisionModel>);
        if model.is_none() {
            info!("No GEMINI_API_KEY configured, using pattern detection only");
        }
        Ok(Self::new(config, model))
    }

    #[must_use]
    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Detect authentication components on a rendered page
    ///
    /// `dom` must query the same page `html` was serialized from.
    pub async fn detect(
        &self,
        html: &str,
        url: &str,
        screenshot: Option<&[u8]>,
        dom: &dyn DomProbe,
        request_id: &str,
    ) -> DetectionResult {
        let started = Instant::now();
        let Some(model) = self.model.as_deref() else {
            let components = self.patterns(dom, request_id).await;
            return DetectionResult::detected(url, components, DetectionMethod::Pattern);
        };

        let result = match self.ask_model(model, html, url, screenshot, request_id).await {
            Ok(answer) if answer.found() => {
                let components = attach_snippets(dom, answer.components, self.snippets, request_id).await;
                DetectionResult::detected(url, components, DetectionMethod::Ai)
            }
            Ok(_) => {
                let components = self.patterns(dom, request_id).await;
                if components.is_empty() {
                    DetectionResult::detected(url, components, DetectionMethod::Ai)
                } else {
                    info!(
                        request_id = %request_id,
                        components = components.len(),
                        "Model found nothing, patterns did"
                    );
                    DetectionResult::detected(url, components, DetectionMethod::Hybrid)
                }
            }
            Err(e) => {
                warn!(request_id = %request_id, error = %e, "AI detection failed, using patterns");
                let components = self.patterns(dom, request_id).await;
                DetectionResult::detected(url, components, DetectionMethod::Pattern)
            }
        };

        info!(
            request_id = %request_id,
            method = ?result.method,
            components = result.components.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Detection complete"
        );
        result
    }

    async fn patterns(&self, dom: &dyn DomProbe, request_id: &str) -> Vec<AuthComponent> {
        detect_patterns(dom, self.snippets.max_chars, self.pattern_lookup_timeout, request_id).await
    }

    async fn ask_model(
        &self,
        model: &dyn VisionModel,
        html: &str,
        url: &str,
        screenshot: Option<&[u8]>,
        request_id: &str,
    ) -> Result<ModelAnswer> {
        let excerpt = build_excerpt(html, self.max_excerpt_bytes, self.min_excerpt_bytes);
        let prompt = build_prompt(url, &excerpt, screenshot.is_some());

        let raw = tokio::time::timeout(self.ai_timeout, model.generate(&prompt, screenshot))
            .await
            .map_err(|_| AuthDetectError::Timeout {
                operation: "AI detection",
                after: self.ai_timeout,
            })??;

        let answer = parse_model_response(&raw)?;
        info!(
            request_id = %request_id,
            excerpt_bytes = excerpt.len(),
            components = answer.components.len(),
            "Model answered"
        );
        Ok(answer)
    }
}
