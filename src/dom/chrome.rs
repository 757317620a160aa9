//! `DomProbe` over a live CDP page
//!
//! Every query is a single script evaluation combining the locator runtime
//! with the serialized `Locator`, so resolution semantics match the static
//! implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::Page;
use serde::Deserialize;

use super::locator::Locator;
use super::probe::DomProbe;
use crate::page_extractor::js_scripts::{LOCATOR_RUNTIME, VISIBILITY_RUNTIME};

#[derive(Clone)]
pub struct ChromeDom {
    page: Page,
}

#[derive(Deserialize)]
struct Located {
    html: Option<String>,
}

#[derive(Deserialize)]
struct Clicked {
    clicked: bool,
}

#[derive(Deserialize)]
struct Visible {
    visible: bool,
}

impl ChromeDom {
    #[must_use]
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    #[must_use]
    pub fn page(&self) -> &Page {
        &self.page
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, script: String, what: &str) -> Result<T> {
        self.page
            .evaluate(script)
            .await
            .with_context(|| format!("Failed to evaluate {what} script"))?
            .into_value::<T>()
            .with_context(|| format!("Failed to parse {what} result"))
    }
}

fn locator_script(locator: &Locator, body: &str) -> Result<String> {
    let loc = serde_json::to_string(locator).context("Failed to serialize locator")?;
    Ok(format!(
        "(() => {{ {LOCATOR_RUNTIME} const el = __authLocate({loc}); {body} }})()"
    ))
}

#[async_trait]
impl DomProbe for ChromeDom {
    async fn outer_html(&self, locator: &Locator) -> Result<Option<String>> {
        let script = locator_script(locator, "return { html: el ? el.outerHTML : null };")?;
        let located: Located = self.eval(script, "locator").await?;
        Ok(located.html)
    }

    async fn click(&self, locator: &Locator) -> Result<bool> {
        let script = locator_script(
            locator,
            "if (!el) return { clicked: false }; \
             if (el.scrollIntoView) el.scrollIntoView({ block: 'center' }); \
             el.click(); return { clicked: true };",
        )?;
        let clicked: Clicked = self.eval(script, "click").await?;
        Ok(clicked.clicked)
    }

    async fn any_visible(&self, selectors: &[&str]) -> Result<bool> {
        let selectors = serde_json::to_string(selectors).context("Failed to serialize selectors")?;
        let script = format!(
            "(() => {{ {VISIBILITY_RUNTIME} \
             const visible = {selectors}.some((s) => {{ \
               try {{ return Array.from(document.querySelectorAll(s)).some(__authVisible); }} \
               catch (e) {{ return false; }} \
             }}); \
             return {{ visible }}; }})()"
        );
        let visible: Visible = self.eval(script, "visibility").await?;
        Ok(visible.visible)
    }
}
