//! In-page extraction: navigation, readiness, content and the modal reveal.

pub mod extractors;
pub mod js_scripts;
pub mod modal;

pub use extractors::{
    ReadinessTimings, ShadowContent, capture_screenshot, extract_accessibility_signals,
    extract_html, extract_shadow_dom, extract_title, merge_shadow_html, navigate,
    wait_for_page_load,
};
pub use modal::{MODAL_SELECTORS, ModalTimings, modal_triggers, reveal_modal};
