//! `DomProbe` over a fixed HTML document
//!
//! Used for pages captured without a live session and for exercising the
//! detector without a browser. The document never changes, so waits resolve
//! immediately and clicks have no effect beyond reporting presence.

use anyhow::Result;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

use super::locator::{Locator, normalize_text};
use super::probe::DomProbe;

#[derive(Debug, Clone)]
pub struct StaticDom {
    html: String,
}

impl StaticDom {
    #[must_use]
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    #[must_use]
    pub fn html(&self) -> &str {
        &self.html
    }

    fn find_outer_html(&self, locator: &Locator) -> Option<String> {
        let document = Html::parse_document(&self.html);
        locate(&document, locator).map(|el| el.html())
    }

    fn has_visible(&self, selectors: &[&str]) -> bool {
        let document = Html::parse_document(&self.html);
        selectors.iter().any(|raw| {
            Selector::parse(raw)
                .map(|selector| document.select(&selector).any(is_rendered))
                .unwrap_or(false)
        })
    }
}

#[async_trait]
impl DomProbe for StaticDom {
    async fn outer_html(&self, locator: &Locator) -> Result<Option<String>> {
        Ok(self.find_outer_html(locator))
    }

    async fn click(&self, locator: &Locator) -> Result<bool> {
        Ok(self.find_outer_html(locator).is_some())
    }

    async fn any_visible(&self, selectors: &[&str]) -> Result<bool> {
        Ok(self.has_visible(selectors))
    }

    async fn wait_for(&self, locator: &Locator, _timeout: Duration) -> Result<Option<String>> {
        Ok(self.find_outer_html(locator))
    }
}

fn locate<'a>(document: &'a Html, locator: &Locator) -> Option<ElementRef<'a>> {
    match locator {
        Locator::Css { selector } => {
            let selector = Selector::parse(selector).ok()?;
            document.select(&selector).next()
        }
        Locator::Text { text, exact } => {
            let wanted = normalize_text(text);
            let matches = |el: &ElementRef<'_>| text_matches(el, &wanted, *exact);
            document
                .root_element()
                .descendants()
                .filter_map(ElementRef::wrap)
                .filter(|el| !matches!(el.value().name(), "html" | "head" | "body" | "script" | "style" | "title"))
                .find(|el| matches(el) && !el.children().filter_map(ElementRef::wrap).any(|child| matches(&child)))
                .map(promote_to_clickable)
        }
        Locator::HasText { selector, text } => {
            let selector = Selector::parse(selector).ok()?;
            let wanted = normalize_text(text);
            document
                .select(&selector)
                .find(|el| text_matches(el, &wanted, false))
        }
        Locator::Has { selector, inner } => {
            let outer = Selector::parse(selector).ok()?;
            let inner = Selector::parse(inner).ok()?;
            document
                .select(&outer)
                .find(|el| el.select(&inner).next().is_some())
        }
    }
}

fn text_matches(el: &ElementRef<'_>, wanted: &str, exact: bool) -> bool {
    let text = normalize_text(&el.text().collect::<String>());
    if exact { text == wanted } else { text.contains(wanted) }
}

fn is_clickable(el: &ElementRef<'_>) -> bool {
    matches!(el.value().name(), "button" | "a") || el.value().attr("role") == Some("button")
}

fn promote_to_clickable(el: ElementRef<'_>) -> ElementRef<'_> {
    if is_clickable(&el) {
        return el;
    }
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(is_clickable)
        .unwrap_or(el)
}

fn is_hidden(el: &ElementRef<'_>) -> bool {
    let value = el.value();
    if value.attr("hidden").is_some() || value.attr("aria-hidden") == Some("true") {
        return true;
    }
    value.attr("style").is_some_and(|style| {
        let style: String = style.chars().filter(|c| !c.is_whitespace()).collect();
        let style = style.to_ascii_lowercase();
        style.contains("display:none") || style.contains("visibility:hidden")
    })
}

fn is_rendered(el: ElementRef<'_>) -> bool {
    !is_hidden(&el)
        && !el
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| is_hidden(&ancestor))
}
